use anyhow::Result;
use serde::Serialize;

use heft_core::models::Goal;

use super::Tracker;
use super::helpers::{exit_not_found, format_day, format_time};

pub(crate) fn cmd_goal_set(svc: &Tracker, target: f64, json: bool) -> Result<()> {
    let goal = svc.set_goal(target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else {
        println!("Goal set: {:.1} lbs", goal.target_weight_lbs);
        if let Some(ref date) = goal.target_date {
            println!("  Projected: {}", format_day(date));
        }
    }

    Ok(())
}

pub(crate) fn cmd_goal_show(svc: &Tracker, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct GoalView {
        #[serde(flatten)]
        goal: Goal,
        current_weight: Option<f64>,
        progress_percent: Option<f64>,
        projected_date: Option<chrono::DateTime<chrono::Utc>>,
    }

    let Some(goal) = svc.goal()? else {
        exit_not_found("No goal set. Use `heft goal set <lbs>` to set one.", json);
    };
    let stats = svc.progress()?;
    let view = GoalView {
        goal,
        current_weight: stats.current_weight,
        progress_percent: stats.goal_progress_percent,
        projected_date: svc.projection()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "Target:    {:.1} lbs (set {})",
            view.goal.target_weight_lbs,
            format_time(&view.goal.created_date)
        );
        if let Some(current) = view.current_weight {
            let to_go = (current - view.goal.target_weight_lbs).abs();
            println!("Current:   {current:.1} lbs ({to_go:.1} lbs to go)");
        }
        if let Some(pct) = view.progress_percent {
            println!("Progress:  {pct:.0}%");
        }
        if let Some(ref date) = view.projected_date {
            println!("Projected: {}", format_day(date));
        }
    }

    Ok(())
}

pub(crate) fn cmd_goal_clear(svc: &Tracker, json: bool) -> Result<()> {
    let cleared = svc.clear_goal()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": cleared }));
    } else if cleared {
        println!("Goal cleared");
    } else {
        println!("No goal was set");
    }

    Ok(())
}
