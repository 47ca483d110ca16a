use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::csv_io::{self, WeightImportSummary};
use crate::db::Database;
use crate::estimator::CalorieEstimator;
use crate::models::{
    Dashboard, ExportData, Goal, ImportSummary, MealEntry, NewMealEntry, NewWeightEntry,
    ProgressStats, Tip, WeightEntry, WeightSource, validate_calories, validate_export_meal_entry,
    validate_export_weight_entry, validate_goal, validate_photo_url, validate_weight,
};
use crate::progress::{chronological, compute_progress};
use crate::projection::{ProjectionPolicy, project_goal_date};
use crate::store::TrackerStore;
use crate::tips::{TipFallback, select_tip};

pub const EXPORT_VERSION: i64 = 1;

/// Entry point for front ends: validates input, persists through a
/// [`TrackerStore`], and derives stats, projections and tips on demand.
pub struct TrackerService<S = Database, C = SystemClock> {
    store: S,
    clock: C,
    policy: ProjectionPolicy,
}

impl TrackerService<Database, SystemClock> {
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::with_parts(db, SystemClock))
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_parts(db, SystemClock))
    }
}

impl<S: TrackerStore, C: Clock> TrackerService<S, C> {
    pub fn with_parts(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            policy: ProjectionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ProjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- Weight ---

    /// Record a weight. `date` defaults to now.
    pub fn log_weight(
        &self,
        weight_lbs: f64,
        date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<WeightEntry> {
        let weight_lbs = validate_weight(weight_lbs)?;
        self.store.insert_weight(&NewWeightEntry {
            weight_lbs,
            date: date.unwrap_or_else(|| self.clock.now()),
            source: WeightSource::Manual,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Weight entries newest first, optionally capped at `limit`.
    pub fn weight_history(&self, limit: Option<usize>) -> Result<Vec<WeightEntry>> {
        let mut entries = self.store.weight_history()?;
        entries.reverse();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    pub fn weight_entry(&self, id: i64) -> Result<Option<WeightEntry>> {
        self.store.get_weight(id)
    }

    pub fn delete_weight(&self, id: i64) -> Result<bool> {
        self.store.delete_weight(id)
    }

    /// Latest well-formed weight, if any.
    pub fn current_weight(&self) -> Result<Option<f64>> {
        let weights = self.store.weight_history()?;
        Ok(chronological(&weights).last().map(|e| e.weight_lbs))
    }

    // --- Meals ---

    /// Log a meal photo, asking `estimator` for the calorie count.
    pub fn log_meal(
        &self,
        photo_url: &str,
        estimator: &dyn CalorieEstimator,
        date: Option<DateTime<Utc>>,
    ) -> Result<MealEntry> {
        validate_photo_url(photo_url)?;
        let calories = estimator.estimate(photo_url)?;
        self.log_meal_with_calories(photo_url, calories, date)
    }

    pub fn log_meal_with_calories(
        &self,
        photo_url: &str,
        calories: u32,
        date: Option<DateTime<Utc>>,
    ) -> Result<MealEntry> {
        validate_photo_url(photo_url)?;
        let estimated_calories = validate_calories(calories)?;
        self.store.insert_meal(&NewMealEntry {
            photo_url: photo_url.trim().to_string(),
            estimated_calories,
            date: date.unwrap_or_else(|| self.clock.now()),
        })
    }

    /// Meals newest first.
    pub fn meals(&self) -> Result<Vec<MealEntry>> {
        self.store.meals()
    }

    pub fn meal(&self, id: i64) -> Result<Option<MealEntry>> {
        self.store.get_meal(id)
    }

    pub fn delete_meal(&self, id: i64) -> Result<bool> {
        self.store.delete_meal(id)
    }

    // --- Goal ---

    /// Replace the active goal. Requires a recorded weight at least 1 lb away
    /// from `target_lbs`; the projected completion date is stored with it.
    pub fn set_goal(&self, target_lbs: f64) -> Result<Goal> {
        let current = self.current_weight()?;
        validate_goal(target_lbs, current)?;
        let now = self.clock.now();
        let goal = Goal {
            target_weight_lbs: target_lbs,
            target_date: project_goal_date(current, Some(target_lbs), now, &self.policy),
            created_date: now,
        };
        self.store.set_goal(&goal)
    }

    pub fn goal(&self) -> Result<Option<Goal>> {
        self.store.goal()
    }

    pub fn clear_goal(&self) -> Result<bool> {
        self.store.clear_goal()
    }

    // --- Derived views ---

    pub fn progress(&self) -> Result<ProgressStats> {
        let weights = self.store.weight_history()?;
        let meals = self.store.meals()?;
        let goal = self.store.goal()?;
        Ok(compute_progress(&weights, &meals, goal.as_ref()))
    }

    /// Projected date for the active goal from the latest weight, as of now.
    pub fn projection(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(goal) = self.store.goal()? else {
            return Ok(None);
        };
        Ok(project_goal_date(
            self.current_weight()?,
            Some(goal.target_weight_lbs),
            self.clock.now(),
            &self.policy,
        ))
    }

    pub fn tip(&self, fallback: &mut dyn TipFallback) -> Result<Option<Tip>> {
        let weights = self.store.weight_history()?;
        let goal = self.store.goal()?;
        Ok(select_tip(&weights, goal.as_ref(), self.clock.now(), fallback))
    }

    pub fn dashboard(&self, fallback: &mut dyn TipFallback) -> Result<Dashboard> {
        let weights = self.store.weight_history()?;
        let meals = self.store.meals()?;
        let goal = self.store.goal()?;
        let now = self.clock.now();

        let progress = compute_progress(&weights, &meals, goal.as_ref());
        let projected_date = goal.as_ref().and_then(|g| {
            project_goal_date(
                progress.current_weight,
                Some(g.target_weight_lbs),
                now,
                &self.policy,
            )
        });
        let tip = select_tip(&weights, goal.as_ref(), now, fallback);

        Ok(Dashboard {
            progress,
            goal,
            projected_date,
            tip,
        })
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: self.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true),
            weight_entries: self.store.weight_history()?,
            meal_entries: self.store.meals()?,
            goal: self.store.goal()?,
        })
    }

    /// Merge a JSON snapshot into the store.
    ///
    /// Every entry is validated before anything is written. Entries already
    /// present (same timestamp and value) are skipped; ids are reassigned. A
    /// goal in the snapshot replaces the active one.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        if data.version > EXPORT_VERSION {
            bail!(
                "Unsupported export version {} (this build reads up to {EXPORT_VERSION})",
                data.version
            );
        }
        for entry in &data.weight_entries {
            validate_export_weight_entry(entry)?;
        }
        for entry in &data.meal_entries {
            validate_export_meal_entry(entry)?;
        }
        if let Some(goal) = &data.goal {
            validate_weight(goal.target_weight_lbs)?;
        }

        let mut summary = ImportSummary::default();

        let mut weights = self.store.weight_history()?;
        for entry in &data.weight_entries {
            let exists = weights.iter().any(|e| {
                e.date == entry.date && (e.weight_lbs - entry.weight_lbs).abs() < 1e-9
            });
            if exists {
                continue;
            }
            let stored = self.store.insert_weight(&NewWeightEntry {
                weight_lbs: entry.weight_lbs,
                date: entry.date,
                source: entry.source,
                notes: entry.notes.clone(),
            })?;
            weights.push(stored);
            summary.weight_entries_imported += 1;
        }

        let mut meals = self.store.meals()?;
        for entry in &data.meal_entries {
            let exists = meals.iter().any(|m| {
                m.date == entry.date
                    && m.photo_url == entry.photo_url
                    && m.estimated_calories == entry.estimated_calories
            });
            if exists {
                continue;
            }
            let stored = self.store.insert_meal(&NewMealEntry {
                photo_url: entry.photo_url.clone(),
                estimated_calories: entry.estimated_calories,
                date: entry.date,
            })?;
            meals.push(stored);
            summary.meal_entries_imported += 1;
        }

        if let Some(goal) = &data.goal {
            self.store.set_goal(goal)?;
            summary.goal_imported = true;
        }

        info!(
            weights = summary.weight_entries_imported,
            meals = summary.meal_entries_imported,
            goal = summary.goal_imported,
            "snapshot imported"
        );
        Ok(summary)
    }

    pub fn import_weights_csv<R: Read>(
        &self,
        reader: R,
        dry_run: bool,
    ) -> Result<WeightImportSummary> {
        let rows = csv_io::parse_weight_csv(reader)?;
        csv_io::import_weight_rows(&self.store, &rows, dry_run)
    }

    /// Write the full weight history, oldest first. Returns the row count.
    pub fn export_weights_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.store.weight_history()?;
        csv_io::write_weight_csv(writer, &entries)?;
        Ok(entries.len())
    }
}
