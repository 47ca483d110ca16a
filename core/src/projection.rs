use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Pounds per week considered a safe rate of change.
pub const DEFAULT_WEEKLY_RATE_LBS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPolicy {
    pub weekly_rate_lbs: f64,
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self {
            weekly_rate_lbs: DEFAULT_WEEKLY_RATE_LBS,
        }
    }
}

impl ProjectionPolicy {
    pub fn new(weekly_rate_lbs: f64) -> anyhow::Result<Self> {
        if !weekly_rate_lbs.is_finite() || weekly_rate_lbs <= 0.0 {
            anyhow::bail!("Weekly rate must be a positive number of lbs (got {weekly_rate_lbs})");
        }
        Ok(Self { weekly_rate_lbs })
    }

    /// Whole weeks needed to cover `distance_lbs` at this rate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn weeks_needed(&self, distance_lbs: f64) -> i64 {
        (distance_lbs.abs() / self.weekly_rate_lbs).ceil() as i64
    }
}

/// Estimate when `target` will be reached from `current` at the policy's weekly rate.
///
/// Returns `None` when either weight is missing or not a positive number,
/// when the rate itself is unusable, or when the date falls outside what
/// `DateTime<Utc>` can represent.
#[must_use]
pub fn project_goal_date(
    current_lbs: Option<f64>,
    target_lbs: Option<f64>,
    now: DateTime<Utc>,
    policy: &ProjectionPolicy,
) -> Option<DateTime<Utc>> {
    let current = current_lbs.filter(|w| w.is_finite() && *w > 0.0)?;
    let target = target_lbs.filter(|w| w.is_finite() && *w > 0.0)?;
    if !policy.weekly_rate_lbs.is_finite() || policy.weekly_rate_lbs <= 0.0 {
        return None;
    }
    let days = policy.weeks_needed(current - target).checked_mul(7)?;
    now.checked_add_signed(Duration::try_days(days)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 17, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_equal_weights_project_to_today() {
        let date = project_goal_date(Some(150.0), Some(150.0), now(), &ProjectionPolicy::default());
        assert_eq!(date, Some(now()));
    }

    #[test]
    fn test_ten_pounds_takes_seven_weeks() {
        // 10 / 1.5 = 6.67 -> 7 weeks
        let date = project_goal_date(Some(160.0), Some(150.0), now(), &ProjectionPolicy::default());
        assert_eq!(date, Some(now() + Duration::days(49)));
    }

    #[test]
    fn test_direction_does_not_matter() {
        let policy = ProjectionPolicy::default();
        let down = project_goal_date(Some(160.0), Some(150.0), now(), &policy);
        let up = project_goal_date(Some(150.0), Some(160.0), now(), &policy);
        assert_eq!(down, up);
    }

    #[test]
    fn test_exact_multiple_does_not_round_up() {
        let date = project_goal_date(Some(153.0), Some(150.0), now(), &ProjectionPolicy::default());
        assert_eq!(date, Some(now() + Duration::days(14)));
    }

    #[test]
    fn test_missing_input_is_absent() {
        let policy = ProjectionPolicy::default();
        assert!(project_goal_date(None, Some(150.0), now(), &policy).is_none());
        assert!(project_goal_date(Some(150.0), None, now(), &policy).is_none());
        assert!(project_goal_date(Some(0.0), Some(150.0), now(), &policy).is_none());
    }

    #[test]
    fn test_custom_rate() {
        let policy = ProjectionPolicy::new(2.0).unwrap();
        let date = project_goal_date(Some(160.0), Some(150.0), now(), &policy);
        assert_eq!(date, Some(now() + Duration::days(35)));
    }

    #[test]
    fn test_tiny_rate_out_of_range_is_absent() {
        let policy = ProjectionPolicy::new(1e-5).unwrap();
        assert!(project_goal_date(Some(300.0), Some(150.0), now(), &policy).is_none());

        let policy = ProjectionPolicy::new(f64::MIN_POSITIVE).unwrap();
        assert!(project_goal_date(Some(1000.0), Some(0.1), now(), &policy).is_none());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(ProjectionPolicy::new(0.0).is_err());
        assert!(ProjectionPolicy::new(-1.5).is_err());
        assert!(ProjectionPolicy::new(f64::NAN).is_err());

        let broken = ProjectionPolicy {
            weekly_rate_lbs: 0.0,
        };
        assert!(project_goal_date(Some(160.0), Some(150.0), now(), &broken).is_none());
    }
}
