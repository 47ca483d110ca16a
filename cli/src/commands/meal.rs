use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use heft_core::estimator::StubEstimator;

use super::Tracker;
use super::helpers::{exit_not_found, format_time, parse_date, truncate};

/// Log a meal photo. Without `--calories` the placeholder estimator guesses.
pub(crate) fn cmd_meal_log(
    svc: &Tracker,
    photo: &str,
    calories: Option<u32>,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, svc.now())?;
    let entry = match calories {
        Some(cal) => svc.log_meal_with_calories(photo, cal, date)?,
        None => {
            if !json {
                eprintln!("Note: calories are a placeholder estimate. Pass --calories to set them.");
            }
            svc.log_meal(photo, &StubEstimator, date)?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!(
            "Logged meal {} at {}: ~{} kcal",
            entry.id,
            format_time(&entry.date),
            entry.estimated_calories
        );
    }

    Ok(())
}

pub(crate) fn cmd_meal_list(svc: &Tracker, limit: Option<usize>, json: bool) -> Result<()> {
    let mut meals = svc.meals()?;
    if let Some(limit) = limit {
        meals.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
    } else if meals.is_empty() {
        eprintln!("No meals logged. Use `heft meal log <photo>` to add one.");
    } else {
        #[derive(Tabled)]
        struct MealRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Photo")]
            photo: String,
            #[tabled(rename = "Calories")]
            calories: u32,
        }

        let rows: Vec<MealRow> = meals
            .iter()
            .map(|m| MealRow {
                id: m.id,
                date: format_time(&m.date),
                photo: truncate(&m.photo_url, 40),
                calories: m.estimated_calories,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::single(3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_meal_show(svc: &Tracker, id: i64, json: bool) -> Result<()> {
    let Some(meal) = svc.meal(id)? else {
        exit_not_found(&format!("Meal {id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        println!("Meal {}", meal.id);
        println!("  Date:     {}", format_time(&meal.date));
        println!("  Photo:    {}", meal.photo_url);
        println!("  Calories: ~{} kcal", meal.estimated_calories);
    }

    Ok(())
}

pub(crate) fn cmd_meal_delete(svc: &Tracker, id: i64, json: bool) -> Result<()> {
    if !svc.delete_meal(id)? {
        exit_not_found(&format!("Meal {id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted meal {id}");
    }

    Ok(())
}
