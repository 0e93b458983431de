//! Plain-text itinerary rendering for the terminal.

use std::fmt::Write;

use itinera_common::Itinerary;

pub fn itinerary(plan: &Itinerary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ===", plan.title);
    if !plan.destination.is_empty() {
        let _ = writeln!(out, "Destination: {}", plan.destination);
    }
    if !plan.dates.is_empty() {
        let _ = writeln!(out, "Dates: {}", plan.dates);
    }
    let travelers = &plan.travelers;
    let _ = writeln!(
        out,
        "Travelers: {} adult(s), {} child(ren), {} infant(s) — {}",
        travelers.adults, travelers.children, travelers.infants, plan.travel_type
    );

    for day in &plan.days {
        match &day.day_title {
            Some(title) => {
                let _ = writeln!(out, "\n{} — {}", day.date, title);
            }
            None => {
                let _ = writeln!(out, "\n{}", day.date);
            }
        }
        for act in &day.activities {
            let lock = if act.is_locked { " [locked]" } else { "" };
            let cost = act.cost.as_deref().unwrap_or("-");
            let _ = writeln!(
                out,
                "  {} [{}] {} @ {} ({}){}",
                act.time, act.category, act.title, act.location, cost, lock
            );
        }
    }

    if let Some(total) = &plan.total_estimated_cost {
        let _ = writeln!(out, "\nEstimated total: {total}");
    }

    out
}
