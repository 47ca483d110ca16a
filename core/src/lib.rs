pub mod clock;
pub mod csv_io;
pub mod db;
pub mod estimator;
pub mod models;
pub mod progress;
pub mod projection;
pub mod service;
pub mod store;
pub mod tips;

pub use progress::compute_progress;
pub use projection::project_goal_date;
pub use service::TrackerService;
pub use tips::select_tip;
