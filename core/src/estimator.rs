use std::sync::Mutex;

use anyhow::Result;
use rand::Rng;

/// Turns a meal photo into a calorie estimate.
///
/// Implementations may call out to an image model; the core only depends on
/// this trait.
pub trait CalorieEstimator: Send + Sync {
    fn estimate(&self, photo_url: &str) -> Result<u32>;
}

pub const STUB_MIN_CALORIES: u32 = 200;
pub const STUB_MAX_CALORIES: u32 = 600;

/// STUB: does not look at the photo. Returns a pseudo-random value in
/// `200..600` so the meal log has something to show.
#[derive(Debug, Default)]
pub struct StubEstimator;

impl CalorieEstimator for StubEstimator {
    fn estimate(&self, _photo_url: &str) -> Result<u32> {
        Ok(rand::rng().random_range(STUB_MIN_CALORIES..STUB_MAX_CALORIES))
    }
}

/// Always returns the same value. Useful when the user already knows the count.
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator(pub u32);

impl CalorieEstimator for FixedEstimator {
    fn estimate(&self, _photo_url: &str) -> Result<u32> {
        Ok(self.0)
    }
}

/// Replays a scripted list of estimates, then fails.
#[derive(Debug, Default)]
pub struct ScriptedEstimator {
    values: Mutex<Vec<u32>>,
}

impl ScriptedEstimator {
    #[must_use]
    pub fn new(mut values: Vec<u32>) -> Self {
        values.reverse();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl CalorieEstimator for ScriptedEstimator {
    fn estimate(&self, photo_url: &str) -> Result<u32> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Estimator state poisoned"))?;
        values
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No estimate left for '{photo_url}'"))
    }
}
