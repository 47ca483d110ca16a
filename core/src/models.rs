use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Heaviest weight accepted at the data-entry boundary, in pounds.
pub const MAX_WEIGHT_LBS: f64 = 1000.0;

/// Smallest allowed gap between a new goal and the current weight.
pub const MIN_GOAL_DELTA_LBS: f64 = 1.0;

pub const MAX_MEAL_CALORIES: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    #[default]
    Manual,
    Import,
}

impl WeightSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Import => "import",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "import" => Ok(Self::Import),
            _ => anyhow::bail!("Invalid weight source '{s}'. Must be one of: manual, import"),
        }
    }
}

// --- Weight tracking types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub weight_lbs: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub source: WeightSource,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

impl WeightEntry {
    /// Entries that slipped past input validation (NaN, zero, negative) are
    /// skipped by the derived-stats code instead of failing it.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.weight_lbs.is_finite() && self.weight_lbs > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct NewWeightEntry {
    pub weight_lbs: f64,
    pub date: DateTime<Utc>,
    pub source: WeightSource,
    pub notes: Option<String>,
}

// --- Meal types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub photo_url: String,
    pub estimated_calories: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMealEntry {
    pub photo_url: String,
    pub estimated_calories: u32,
    pub date: DateTime<Utc>,
}

// --- Goal ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub target_weight_lbs: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

// --- Derived views ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressStats {
    pub current_weight: Option<f64>,
    pub total_change: Option<f64>,
    pub days_tracking: i64,
    pub total_meals: usize,
    pub avg_calories_per_day: f64,
    pub goal_progress_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    Plateau,
    NoRecentEntries,
    RapidChange,
    GoalProgress,
    Hydration,
}

impl TipKind {
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Self::Plateau => 1,
            Self::NoRecentEntries => 2,
            Self::RapidChange => 3,
            Self::GoalProgress => 4,
            Self::Hydration => 5,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Plateau => {
                "Weight plateaus are normal! Try varying your routine or meal timing."
            }
            Self::NoRecentEntries => {
                "Consistency is key! Try to log your weight daily for better tracking."
            }
            Self::RapidChange => {
                "Significant weight changes can be normal, but consider factors like hydration."
            }
            Self::GoalProgress => "Great progress! You're on track to reach your goal.",
            Self::Hydration => {
                "Daily weight fluctuations are often due to water retention. Stay consistent!"
            }
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Plateau => "TrendingUp",
            Self::NoRecentEntries => "Calendar",
            Self::RapidChange => "Zap",
            Self::GoalProgress => "Target",
            Self::Hydration => "Droplets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tip {
    pub id: u32,
    pub kind: TipKind,
    pub message: &'static str,
    pub icon: &'static str,
}

impl From<TipKind> for Tip {
    fn from(kind: TipKind) -> Self {
        Self {
            id: kind.id(),
            kind,
            message: kind.message(),
            icon: kind.icon(),
        }
    }
}

/// Everything the dashboard shows, computed in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub progress: ProgressStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Tip>,
}

// --- Export / Import types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub weight_entries: Vec<WeightEntry>,
    #[serde(default)]
    pub meal_entries: Vec<MealEntry>,
    #[serde(default)]
    pub goal: Option<Goal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub weight_entries_imported: usize,
    pub meal_entries_imported: usize,
    pub goal_imported: bool,
}

// --- Validation ---

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Weight must be greater than 0 and at most 1000 lbs (got {0})")]
    WeightOutOfRange(f64),
    #[error("Estimated calories must be at most 10000 (got {0})")]
    CaloriesOutOfRange(u32),
    #[error("Target weight should be at least 1 lb different from current weight")]
    GoalTooClose,
    #[error("Record your current weight before setting a goal")]
    NoCurrentWeight,
    #[error("Meal photo reference must not be empty")]
    EmptyPhoto,
}

pub fn validate_weight(weight_lbs: f64) -> Result<f64, ValidationError> {
    if !weight_lbs.is_finite() || weight_lbs <= 0.0 || weight_lbs > MAX_WEIGHT_LBS {
        return Err(ValidationError::WeightOutOfRange(weight_lbs));
    }
    Ok(weight_lbs)
}

pub fn validate_calories(calories: u32) -> Result<u32, ValidationError> {
    if calories > MAX_MEAL_CALORIES {
        return Err(ValidationError::CaloriesOutOfRange(calories));
    }
    Ok(calories)
}

pub fn validate_photo_url(photo_url: &str) -> Result<(), ValidationError> {
    if photo_url.trim().is_empty() {
        return Err(ValidationError::EmptyPhoto);
    }
    Ok(())
}

/// Validate a goal against the latest recorded weight.
pub fn validate_goal(target_lbs: f64, current_lbs: Option<f64>) -> Result<(), ValidationError> {
    validate_weight(target_lbs)?;
    let current = current_lbs.ok_or(ValidationError::NoCurrentWeight)?;
    if (target_lbs - current).abs() < MIN_GOAL_DELTA_LBS {
        return Err(ValidationError::GoalTooClose);
    }
    Ok(())
}

/// Validate an exported weight entry before it is written back.
pub fn validate_export_weight_entry(entry: &WeightEntry) -> anyhow::Result<()> {
    validate_weight(entry.weight_lbs)?;
    Ok(())
}

/// Validate an exported meal entry: non-empty photo, calories within range.
pub fn validate_export_meal_entry(entry: &MealEntry) -> anyhow::Result<()> {
    validate_photo_url(&entry.photo_url)?;
    validate_calories(entry.estimated_calories)?;
    Ok(())
}
