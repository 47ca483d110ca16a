use tracing::debug;

use crate::models::{Goal, MealEntry, ProgressStats, WeightEntry};

/// Well-formed entries in chronological order. Equal dates keep input order.
pub(crate) fn chronological(entries: &[WeightEntry]) -> Vec<&WeightEntry> {
    let mut sorted: Vec<&WeightEntry> = entries
        .iter()
        .filter(|e| {
            let ok = e.is_well_formed();
            if !ok {
                debug!(id = e.id, weight = e.weight_lbs, "skipping malformed weight entry");
            }
            ok
        })
        .collect();
    sorted.sort_by_key(|e| e.date);
    sorted
}

/// Derive summary statistics from a weight history, meal log, and optional goal.
///
/// Never fails: an empty history yields absent weights and zero counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_progress(
    weights: &[WeightEntry],
    meals: &[MealEntry],
    goal: Option<&Goal>,
) -> ProgressStats {
    let sorted = chronological(weights);
    let first = sorted.first();
    let last = sorted.last();

    let current_weight = last.map(|e| e.weight_lbs);
    let start_weight = first.map(|e| e.weight_lbs);

    let total_change = match (current_weight, start_weight) {
        (Some(current), Some(start)) => Some(current - start),
        _ => None,
    };

    let days_tracking = match (first, last) {
        (Some(first), Some(last)) => (last.date - first.date).num_days().max(0) + 1,
        _ => 0,
    };

    let total_meals = meals.len();
    let total_calories: u64 = meals.iter().map(|m| u64::from(m.estimated_calories)).sum();
    let avg_calories_per_day = if total_meals == 0 {
        0.0
    } else {
        total_calories as f64 / days_tracking.max(1) as f64
    };

    let goal_progress_percent = match (goal, current_weight, start_weight) {
        (Some(goal), Some(current), Some(start)) => {
            Some(goal_progress(start, current, goal.target_weight_lbs))
        }
        _ => None,
    };

    ProgressStats {
        current_weight,
        total_change,
        days_tracking,
        total_meals,
        avg_calories_per_day,
        goal_progress_percent,
    }
}

/// Share of the start-to-target distance covered so far, clamped to 0..=100.
fn goal_progress(start: f64, current: f64, target: f64) -> f64 {
    let target_diff = target - start;
    if target_diff == 0.0 {
        return 0.0;
    }
    ((current - start) / target_diff * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightSource;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    fn weight(id: i64, day: i64, lbs: f64) -> WeightEntry {
        WeightEntry {
            id,
            weight_lbs: lbs,
            date: base() + Duration::days(day),
            source: WeightSource::Manual,
            notes: None,
        }
    }

    fn meal(id: i64, calories: u32) -> MealEntry {
        MealEntry {
            id,
            photo_url: format!("photo-{id}.jpg"),
            estimated_calories: calories,
            date: base(),
        }
    }

    fn goal(target: f64) -> Goal {
        Goal {
            target_weight_lbs: target,
            target_date: None,
            created_date: base(),
        }
    }

    #[test]
    fn test_empty_history_degrades_to_zero() {
        let stats = compute_progress(&[], &[], None);
        assert_eq!(stats, ProgressStats::default());
        assert!(stats.current_weight.is_none());
        assert!(stats.total_change.is_none());
        assert_eq!(stats.days_tracking, 0);
        assert_eq!(stats.total_meals, 0);
        assert!(stats.goal_progress_percent.is_none());
    }

    #[test]
    fn test_current_weight_ignores_input_order() {
        let entries = vec![weight(1, 5, 155.0), weight(2, 9, 152.0), weight(3, 0, 160.0)];
        let stats = compute_progress(&entries, &[], None);
        assert_eq!(stats.current_weight, Some(152.0));
        assert!((stats.total_change.unwrap() - (-8.0)).abs() < f64::EPSILON);
        assert_eq!(stats.days_tracking, 10);
    }

    #[test]
    fn test_single_entry() {
        let stats = compute_progress(&[weight(1, 0, 150.0)], &[], None);
        assert_eq!(stats.current_weight, Some(150.0));
        assert_eq!(stats.total_change, Some(0.0));
        assert_eq!(stats.days_tracking, 1);
    }

    #[test]
    fn test_avg_calories_per_day() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 3, 158.0)];
        let meals = vec![meal(1, 320), meal(2, 485), meal(3, 245), meal(4, 350)];
        let stats = compute_progress(&entries, &meals, None);
        assert_eq!(stats.total_meals, 4);
        // 1400 kcal over 4 tracked days
        assert!((stats.avg_calories_per_day - 350.0).abs() < 0.01);
    }

    #[test]
    fn test_avg_calories_without_weights_divides_by_one() {
        let stats = compute_progress(&[], &[meal(1, 500)], None);
        assert!((stats.avg_calories_per_day - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_goal_progress_halfway() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 14, 155.0)];
        let stats = compute_progress(&entries, &[], Some(&goal(150.0)));
        assert!((stats.goal_progress_percent.unwrap() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_goal_progress_clamped_on_overshoot() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 30, 145.0)];
        let stats = compute_progress(&entries, &[], Some(&goal(150.0)));
        assert_eq!(stats.goal_progress_percent, Some(100.0));
    }

    #[test]
    fn test_goal_progress_clamped_when_moving_away() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 7, 163.0)];
        let stats = compute_progress(&entries, &[], Some(&goal(150.0)));
        assert_eq!(stats.goal_progress_percent, Some(0.0));
    }

    #[test]
    fn test_goal_progress_zero_when_target_equals_start() {
        let entries = vec![weight(1, 0, 150.0), weight(2, 7, 148.0)];
        let stats = compute_progress(&entries, &[], Some(&goal(150.0)));
        assert_eq!(stats.goal_progress_percent, Some(0.0));
    }

    #[test]
    fn test_goal_progress_for_weight_gain() {
        let entries = vec![weight(1, 0, 120.0), weight(2, 21, 127.5)];
        let stats = compute_progress(&entries, &[], Some(&goal(130.0)));
        assert!((stats.goal_progress_percent.unwrap() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_goal_without_entries_is_absent() {
        let stats = compute_progress(&[], &[], Some(&goal(150.0)));
        assert!(stats.goal_progress_percent.is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 20, f64::NAN), weight(3, 5, 158.0)];
        let stats = compute_progress(&entries, &[], None);
        assert_eq!(stats.current_weight, Some(158.0));
        assert_eq!(stats.days_tracking, 6);
    }

    #[test]
    fn test_equal_dates_keep_insertion_order() {
        let entries = vec![weight(1, 0, 160.0), weight(2, 0, 159.0)];
        let stats = compute_progress(&entries, &[], None);
        assert_eq!(stats.current_weight, Some(159.0));
        assert_eq!(stats.days_tracking, 1);
    }
}
