mod goal;
mod helpers;
mod import;
mod meal;
mod stats;
mod weight;

use heft_core::TrackerService;
use heft_core::clock::FixedClock;
use heft_core::db::Database;

pub(crate) use goal::{cmd_goal_clear, cmd_goal_set, cmd_goal_show};
pub(crate) use helpers::parse_timestamp;
pub(crate) use import::{cmd_export, cmd_import};
pub(crate) use meal::{cmd_meal_delete, cmd_meal_list, cmd_meal_log, cmd_meal_show};
pub(crate) use stats::{cmd_dashboard, cmd_stats, cmd_tip};
pub(crate) use weight::{
    cmd_weight_delete, cmd_weight_export, cmd_weight_history, cmd_weight_import, cmd_weight_log,
    cmd_weight_show,
};

/// One CLI invocation sees a single "now", pinned at start-up.
pub(crate) type Tracker = TrackerService<Database, FixedClock>;
