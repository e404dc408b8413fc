//! Same-day, same-destination demand merging.
//!
//! Before routing a day, every demand starting on it is grouped by
//! destination factory and each group becomes one synthetic demand, so the
//! routing model gets one node per destination. Weight and area are summed,
//! the window is the union of the group's windows and the transit time is
//! the longest in the group.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::models::{AssignmentOutput, Demand};

/// Identifier of the merged demand for a destination and day.
pub fn consolidated_id(factory_id: usize, date: NaiveDate) -> String {
    format!("agg_{factory_id}_{date}")
}

/// Merges the demands starting on `date`, one per destination, ordered by
/// destination id.
///
/// Fails with [`DispatchError::NoDemandsOnDate`] when nothing starts on
/// `date`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_dispatch::consolidation::consolidate;
/// use u_dispatch::models::{AssignmentOutput, Demand, Factory, OrderAssignment};
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let at = day.and_hms_opt(8, 0, 0).unwrap();
/// let a = Demand::new("a", 2.0, 1.0, Factory::new(3, "C"), at, at);
/// let b = Demand::new("b", 4.0, 1.0, Factory::new(3, "C"), at, at);
/// let mut output = AssignmentOutput::failure();
/// output.is_success = true;
/// output.assignments = vec![
///     OrderAssignment::new(a, day, None),
///     OrderAssignment::new(b, day, None),
/// ];
///
/// let merged = consolidate(&output, day).unwrap();
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].demand_id(), "agg_3_2024-01-01");
/// assert_eq!(merged[0].weight(), 6.0);
/// ```
pub fn consolidate(output: &AssignmentOutput, date: NaiveDate) -> Result<Vec<Demand>> {
    let mut groups: BTreeMap<usize, Vec<&Demand>> = BTreeMap::new();
    for demand in output.demands_on(date) {
        groups
            .entry(demand.destination().id())
            .or_default()
            .push(demand);
    }
    if groups.is_empty() {
        return Err(DispatchError::NoDemandsOnDate { date });
    }

    let merged: Vec<Demand> = groups
        .into_iter()
        .filter_map(|(factory_id, group)| merge(factory_id, date, &group))
        .collect();
    debug!(%date, destinations = merged.len(), "demands consolidated");
    Ok(merged)
}

fn merge(factory_id: usize, date: NaiveDate, group: &[&Demand]) -> Option<Demand> {
    let first = group.first()?;
    let weight = group.iter().map(|d| d.weight()).sum();
    let area = group.iter().map(|d| d.size_area()).sum();
    let available = group.iter().map(|d| d.available_time()).min()?;
    let due = group.iter().map(|d| d.due_time()).max()?;
    let travel_days = group.iter().map(|d| d.travel_days()).max()?;
    Some(
        Demand::new(
            consolidated_id(factory_id, date),
            weight,
            area,
            first.destination().clone(),
            available,
            due,
        )
        .with_travel_days(travel_days),
    )
}
