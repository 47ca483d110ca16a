use std::cell::RefCell;

use anyhow::Result;

use crate::models::{Goal, MealEntry, NewMealEntry, NewWeightEntry, WeightEntry};

/// Storage for weight entries, meals, and the single active goal.
///
/// Reads return weight entries oldest first and meals newest first. Ids are
/// assigned by the store and never reused.
pub trait TrackerStore {
    fn insert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry>;
    fn get_weight(&self, id: i64) -> Result<Option<WeightEntry>>;
    fn weight_history(&self) -> Result<Vec<WeightEntry>>;
    fn delete_weight(&self, id: i64) -> Result<bool>;

    fn insert_meal(&self, entry: &NewMealEntry) -> Result<MealEntry>;
    fn get_meal(&self, id: i64) -> Result<Option<MealEntry>>;
    fn meals(&self) -> Result<Vec<MealEntry>>;
    fn delete_meal(&self, id: i64) -> Result<bool>;

    fn goal(&self) -> Result<Option<Goal>>;
    /// Replace the active goal. The previous one is discarded.
    fn set_goal(&self, goal: &Goal) -> Result<Goal>;
    fn clear_goal(&self) -> Result<bool>;
}

#[derive(Debug, Default)]
struct MemoryState {
    weights: Vec<WeightEntry>,
    meals: Vec<MealEntry>,
    goal: Option<Goal>,
    last_weight_id: i64,
    last_meal_id: i64,
}

/// Vec-backed store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackerStore for MemoryStore {
    fn insert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        let mut state = self.state.borrow_mut();
        state.last_weight_id += 1;
        let stored = WeightEntry {
            id: state.last_weight_id,
            weight_lbs: entry.weight_lbs,
            date: entry.date,
            source: entry.source,
            notes: entry.notes.clone(),
        };
        state.weights.push(stored.clone());
        Ok(stored)
    }

    fn get_weight(&self, id: i64) -> Result<Option<WeightEntry>> {
        Ok(self
            .state
            .borrow()
            .weights
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    fn weight_history(&self) -> Result<Vec<WeightEntry>> {
        let mut entries = self.state.borrow().weights.clone();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    fn delete_weight(&self, id: i64) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        let before = state.weights.len();
        state.weights.retain(|e| e.id != id);
        Ok(state.weights.len() < before)
    }

    fn insert_meal(&self, entry: &NewMealEntry) -> Result<MealEntry> {
        let mut state = self.state.borrow_mut();
        state.last_meal_id += 1;
        let stored = MealEntry {
            id: state.last_meal_id,
            photo_url: entry.photo_url.clone(),
            estimated_calories: entry.estimated_calories,
            date: entry.date,
        };
        state.meals.push(stored.clone());
        Ok(stored)
    }

    fn get_meal(&self, id: i64) -> Result<Option<MealEntry>> {
        Ok(self
            .state
            .borrow()
            .meals
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    fn meals(&self) -> Result<Vec<MealEntry>> {
        let mut meals = self.state.borrow().meals.clone();
        meals.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(meals)
    }

    fn delete_meal(&self, id: i64) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        let before = state.meals.len();
        state.meals.retain(|m| m.id != id);
        Ok(state.meals.len() < before)
    }

    fn goal(&self) -> Result<Option<Goal>> {
        Ok(self.state.borrow().goal.clone())
    }

    fn set_goal(&self, goal: &Goal) -> Result<Goal> {
        self.state.borrow_mut().goal = Some(goal.clone());
        Ok(goal.clone())
    }

    fn clear_goal(&self) -> Result<bool> {
        Ok(self.state.borrow_mut().goal.take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightSource;
    use chrono::{Duration, TimeZone, Utc};

    fn new_weight(day: i64, lbs: f64) -> NewWeightEntry {
        NewWeightEntry {
            weight_lbs: lbs,
            date: Utc.with_ymd_and_hms(2024, 1, 10, 7, 0, 0).unwrap() + Duration::days(day),
            source: WeightSource::Manual,
            notes: None,
        }
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let store = MemoryStore::new();
        let a = store.insert_weight(&new_weight(0, 160.0)).unwrap();
        let b = store.insert_weight(&new_weight(1, 159.0)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(store.delete_weight(b.id).unwrap());
        let c = store.insert_weight(&new_weight(2, 158.0)).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_weight_history_sorted_ascending() {
        let store = MemoryStore::new();
        store.insert_weight(&new_weight(5, 155.0)).unwrap();
        store.insert_weight(&new_weight(0, 160.0)).unwrap();
        store.insert_weight(&new_weight(2, 158.0)).unwrap();

        let history = store.weight_history().unwrap();
        let weights: Vec<f64> = history.iter().map(|e| e.weight_lbs).collect();
        assert_eq!(weights, vec![160.0, 158.0, 155.0]);
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_weight(42).unwrap());
        assert!(!store.delete_meal(42).unwrap());
    }

    #[test]
    fn test_meals_newest_first() {
        let store = MemoryStore::new();
        let day = Utc.with_ymd_and_hms(2024, 1, 14, 18, 30, 0).unwrap();
        for (i, cal) in [520, 380, 245].into_iter().enumerate() {
            store
                .insert_meal(&NewMealEntry {
                    photo_url: format!("meal-{i}.jpg"),
                    estimated_calories: cal,
                    date: day + Duration::days(i as i64),
                })
                .unwrap();
        }
        let meals = store.meals().unwrap();
        assert_eq!(meals[0].estimated_calories, 245);
        assert_eq!(meals[2].estimated_calories, 520);
        assert_eq!(store.get_meal(meals[1].id).unwrap().unwrap().estimated_calories, 380);
    }

    #[test]
    fn test_goal_replace_and_clear() {
        let store = MemoryStore::new();
        assert!(store.goal().unwrap().is_none());

        let created = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        store
            .set_goal(&Goal {
                target_weight_lbs: 150.0,
                target_date: None,
                created_date: created,
            })
            .unwrap();
        store
            .set_goal(&Goal {
                target_weight_lbs: 145.0,
                target_date: None,
                created_date: created,
            })
            .unwrap();
        assert_eq!(store.goal().unwrap().unwrap().target_weight_lbs, 145.0);

        assert!(store.clear_goal().unwrap());
        assert!(!store.clear_goal().unwrap());
    }
}
