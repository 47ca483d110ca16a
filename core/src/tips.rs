//! Priority-ordered tip heuristics over recent weight history.
//!
//! Rules are checked in a fixed order and the first match wins: plateau,
//! no recent entries, rapid change, goal progress, then a hydration tip chosen
//! by an injected [`TipFallback`].

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::debug;

use crate::models::{Goal, Tip, TipKind, WeightEntry};
use crate::progress::chronological;

pub const PLATEAU_MIN_ENTRIES: usize = 3;
pub const PLATEAU_WINDOW: usize = 7;
pub const PLATEAU_MAX_RANGE_LBS: f64 = 0.5;
pub const REMINDER_AFTER_DAYS: i64 = 3;
pub const RAPID_CHANGE_MIN_DAYS: i64 = 7;
pub const RAPID_CHANGE_LBS: f64 = 3.0;
pub const HYDRATION_TIP_PROBABILITY: f64 = 0.3;

/// Decides whether the hydration tip is shown when no other rule matched.
pub trait TipFallback {
    fn should_emit(&mut self) -> bool;
}

/// Shows the fallback tip with a fixed probability.
pub struct RandomFallback<R = ThreadRng> {
    rng: R,
    probability: f64,
}

impl RandomFallback<ThreadRng> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(rand::rng(), HYDRATION_TIP_PROBABILITY)
    }
}

impl Default for RandomFallback<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomFallback<R> {
    pub fn with_rng(rng: R, probability: f64) -> Self {
        Self {
            rng,
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl<R: Rng> TipFallback for RandomFallback<R> {
    fn should_emit(&mut self) -> bool {
        self.rng.random_bool(self.probability)
    }
}

/// Deterministic fallback: shows the tip on every `every`-th evaluation.
/// `every == 0` never shows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CadenceFallback {
    every: u32,
    evaluations: u32,
}

impl CadenceFallback {
    #[must_use]
    pub fn new(every: u32) -> Self {
        Self {
            every,
            evaluations: 0,
        }
    }
}

impl TipFallback for CadenceFallback {
    fn should_emit(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.evaluations = self.evaluations.wrapping_add(1);
        self.evaluations % self.every == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl TipFallback for NoFallback {
    fn should_emit(&mut self) -> bool {
        false
    }
}

/// Pick at most one tip for the given history and goal.
///
/// Entries may arrive in any order; malformed entries are ignored. An empty
/// history never produces a tip and never consults the fallback.
pub fn select_tip(
    weights: &[WeightEntry],
    goal: Option<&Goal>,
    now: DateTime<Utc>,
    fallback: &mut dyn TipFallback,
) -> Option<Tip> {
    let mut recent = chronological(weights);
    if recent.is_empty() {
        return None;
    }
    recent.reverse();

    let kind = matching_rule(&recent, goal, now)
        .or_else(|| fallback.should_emit().then_some(TipKind::Hydration));
    debug!(entries = recent.len(), tip = ?kind, "tip evaluated");
    kind.map(Tip::from)
}

/// `recent` is non-empty and newest first.
fn matching_rule(
    recent: &[&WeightEntry],
    goal: Option<&Goal>,
    now: DateTime<Utc>,
) -> Option<TipKind> {
    if is_plateau(recent) {
        return Some(TipKind::Plateau);
    }
    if (now - recent[0].date).num_days() > REMINDER_AFTER_DAYS {
        return Some(TipKind::NoRecentEntries);
    }
    if is_rapid_change(recent) {
        return Some(TipKind::RapidChange);
    }
    if is_on_track(recent, goal) {
        return Some(TipKind::GoalProgress);
    }
    None
}

fn is_plateau(recent: &[&WeightEntry]) -> bool {
    if recent.len() < PLATEAU_MIN_ENTRIES {
        return false;
    }
    let window = &recent[..recent.len().min(PLATEAU_WINDOW)];
    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(e.weight_lbs), hi.max(e.weight_lbs))
        });
    max - min < PLATEAU_MAX_RANGE_LBS
}

// Compares against the nearest entry at least a week older than the latest.
fn is_rapid_change(recent: &[&WeightEntry]) -> bool {
    let [latest, older @ ..] = recent else {
        return false;
    };
    older
        .iter()
        .find(|e| (latest.date - e.date).num_days() >= RAPID_CHANGE_MIN_DAYS)
        .is_some_and(|week_ago| (latest.weight_lbs - week_ago.weight_lbs).abs() > RAPID_CHANGE_LBS)
}

fn is_on_track(recent: &[&WeightEntry], goal: Option<&Goal>) -> bool {
    let (Some(goal), [latest, previous, ..]) = (goal, recent) else {
        return false;
    };
    let current = latest.weight_lbs;
    let losing = goal.target_weight_lbs < current;
    let trend = previous.weight_lbs - current;
    (losing && trend > 0.0) || (!losing && trend < 0.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipState {
    NoTipShown,
    TipShown(Tip),
    Dismissed,
}

/// Identity of the data a tip was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    weights: Vec<(i64, u64, i64)>,
    goal: Option<(u64, Option<i64>, i64)>,
}

impl Snapshot {
    fn of(weights: &[WeightEntry], goal: Option<&Goal>) -> Self {
        Self {
            weights: weights
                .iter()
                .map(|e| (e.id, e.weight_lbs.to_bits(), e.date.timestamp_millis()))
                .collect(),
            goal: goal.map(|g| {
                (
                    g.target_weight_lbs.to_bits(),
                    g.target_date.map(|d| d.timestamp_millis()),
                    g.created_date.timestamp_millis(),
                )
            }),
        }
    }
}

/// Per-session tip display state.
///
/// A tip is recomputed only when the weight history or goal changes. Once
/// dismissed, nothing is shown until the data changes again.
#[derive(Debug, Clone)]
pub struct TipSession {
    state: TipState,
    snapshot: Option<Snapshot>,
}

impl Default for TipSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TipSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TipState::NoTipShown,
            snapshot: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &TipState {
        &self.state
    }

    #[must_use]
    pub fn current(&self) -> Option<&Tip> {
        match &self.state {
            TipState::TipShown(tip) => Some(tip),
            TipState::NoTipShown | TipState::Dismissed => None,
        }
    }

    pub fn refresh(
        &mut self,
        weights: &[WeightEntry],
        goal: Option<&Goal>,
        now: DateTime<Utc>,
        fallback: &mut dyn TipFallback,
    ) -> Option<&Tip> {
        let snapshot = Snapshot::of(weights, goal);
        if self.snapshot.as_ref() != Some(&snapshot) {
            self.state = match select_tip(weights, goal, now, fallback) {
                Some(tip) => TipState::TipShown(tip),
                None => TipState::NoTipShown,
            };
            self.snapshot = Some(snapshot);
        }
        self.current()
    }

    pub fn dismiss(&mut self) {
        self.state = TipState::Dismissed;
    }
}
