use anyhow::Result;

use heft_core::models::{ProgressStats, Tip};
use heft_core::tips::TipFallback;

use super::Tracker;
use super::helpers::{format_change, format_day, no_neg_zero};

fn print_progress(stats: &ProgressStats) {
    match stats.current_weight {
        Some(current) => println!("  Current weight:  {current:.1} lbs"),
        None => println!("  Current weight:  -"),
    }
    if let Some(change) = stats.total_change {
        println!("  Total change:    {} lbs", format_change(change));
    }
    println!("  Days tracking:   {}", stats.days_tracking);
    println!("  Meals logged:    {}", stats.total_meals);
    println!(
        "  Avg kcal/day:    {:.0}",
        no_neg_zero(stats.avg_calories_per_day)
    );
    if let Some(pct) = stats.goal_progress_percent {
        println!("  Goal progress:   {pct:.0}%");
    }
}

fn print_tip(tip: &Tip) {
    println!("  [{}] {}", tip.icon, tip.message);
}

pub(crate) fn cmd_stats(svc: &Tracker, json: bool) -> Result<()> {
    let stats = svc.progress()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if stats.current_weight.is_none() && stats.total_meals == 0 {
        eprintln!("Nothing logged yet. Use `heft weight log <lbs>` to get started.");
        return Ok(());
    }

    println!("=== Progress ===\n");
    print_progress(&stats);

    Ok(())
}

pub(crate) fn cmd_tip(svc: &Tracker, fallback: &mut dyn TipFallback, json: bool) -> Result<()> {
    let tip = svc.tip(fallback)?;

    if json {
        println!("{}", serde_json::json!({ "tip": tip }));
    } else if let Some(tip) = tip {
        print_tip(&tip);
    } else {
        eprintln!("No tip right now.");
    }

    Ok(())
}

pub(crate) fn cmd_dashboard(
    svc: &Tracker,
    fallback: &mut dyn TipFallback,
    json: bool,
) -> Result<()> {
    let dash = svc.dashboard(fallback)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    println!("=== {} ===\n", format_day(&svc.now()));
    print_progress(&dash.progress);

    if let Some(goal) = &dash.goal {
        println!();
        print!("  Goal:            {:.1} lbs", goal.target_weight_lbs);
        if let Some(ref date) = dash.projected_date {
            print!(" (projected {})", format_day(date));
        }
        println!();
    }

    if let Some(tip) = &dash.tip {
        println!();
        print_tip(tip);
    }

    Ok(())
}
