//! Assignment optimizer input and output records.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Demand, Truck};
use crate::distance::DistanceTable;
use crate::error::{DispatchError, Result};

fn default_w_balance() -> f64 {
    1.0
}

fn default_w_slack() -> f64 {
    1000.0
}

/// Demands, trucks and candidate days for one assignment run.
///
/// `planning_horizon` must be strictly ascending; [`validate`](Self::validate)
/// checks this together with the other structural requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentInput {
    pub demands: Vec<Demand>,
    pub trucks: Vec<Truck>,
    pub planning_horizon: Vec<NaiveDate>,
    /// Weight of the daily balance deviation term.
    #[serde(default = "default_w_balance")]
    pub w_balance: f64,
    /// Weight of the capacity slack term.
    #[serde(default = "default_w_slack")]
    pub w_slack: f64,
}

impl AssignmentInput {
    /// Creates an input with default objective weights (1.0 balance, 1000.0 slack).
    pub fn new(demands: Vec<Demand>, trucks: Vec<Truck>, planning_horizon: Vec<NaiveDate>) -> Self {
        Self {
            demands,
            trucks,
            planning_horizon,
            w_balance: default_w_balance(),
            w_slack: default_w_slack(),
        }
    }

    /// Creates an input whose horizon spans every day from the earliest
    /// availability to the latest due date of `demands`.
    pub fn with_derived_horizon(demands: Vec<Demand>, trucks: Vec<Truck>) -> Self {
        let horizon = Self::horizon_from_demands(&demands);
        Self::new(demands, trucks, horizon)
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, w_balance: f64, w_slack: f64) -> Self {
        self.w_balance = w_balance;
        self.w_slack = w_slack;
        self
    }

    /// Derives every demand's transit days from the depot distance, timed on
    /// the slowest truck. Demands without a known distance keep their value.
    pub fn with_derived_travel_days(mut self, table: &DistanceTable, depot_id: usize) -> Self {
        let slowest = self
            .trucks
            .iter()
            .filter(|t| t.speed() > 0.0)
            .min_by(|a, b| a.speed().total_cmp(&b.speed()))
            .cloned();
        let Some(truck) = slowest else {
            return self;
        };
        self.demands = self
            .demands
            .into_iter()
            .map(|d| match table.get(depot_id, d.destination().id()) {
                Some(km) => d.with_derived_travel_days(km, &truck),
                None => d,
            })
            .collect();
        self
    }

    /// Consecutive days from the earliest available date to the latest due date.
    pub fn horizon_from_demands(demands: &[Demand]) -> Vec<NaiveDate> {
        let first = demands.iter().map(Demand::available_date).min();
        let last = demands.iter().map(Demand::due_date).max();
        match (first, last) {
            (Some(first), Some(last)) => first.iter_days().take_while(|d| *d <= last).collect(),
            _ => Vec::new(),
        }
    }

    /// Position of every horizon day.
    pub fn date_index(&self) -> HashMap<NaiveDate, usize> {
        self.planning_horizon
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect()
    }

    /// Sum of all demand weights.
    pub fn total_weight(&self) -> f64 {
        self.demands.iter().map(Demand::weight).sum()
    }

    /// Total weight spread evenly over the horizon.
    pub fn average_load(&self) -> f64 {
        if self.planning_horizon.is_empty() {
            0.0
        } else {
            self.total_weight() / self.planning_horizon.len() as f64
        }
    }

    /// Sum of truck capacities available on any single day.
    pub fn fleet_capacity(&self) -> f64 {
        self.trucks.iter().map(Truck::capacity).sum()
    }

    /// Checks horizon ordering, truck id uniqueness and demand records.
    pub fn validate(&self) -> Result<()> {
        if self.planning_horizon.is_empty() {
            return Err(DispatchError::EmptyHorizon);
        }
        for pair in self.planning_horizon.windows(2) {
            if pair[0] >= pair[1] {
                return Err(DispatchError::UnorderedHorizon {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        let mut seen = HashSet::new();
        for truck in &self.trucks {
            if !seen.insert(truck.id()) {
                return Err(DispatchError::DuplicateTruck {
                    truck_id: truck.id(),
                });
            }
        }
        self.demands.iter().try_for_each(Demand::validate)
    }
}

/// One demand bound to a start day and, optionally, a truck.
///
/// Equality and hashing use the demand and the assigned day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub demand: Demand,
    pub assigned_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck: Option<Truck>,
}

impl OrderAssignment {
    /// Creates an assignment.
    pub fn new(demand: Demand, assigned_date: NaiveDate, truck: Option<Truck>) -> Self {
        Self {
            demand,
            assigned_date,
            truck,
        }
    }

    /// Calendar days on which the demand occupies capacity.
    pub fn active_dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.assigned_date
            .iter_days()
            .take(self.demand.travel_days() as usize)
    }
}

impl PartialEq for OrderAssignment {
    fn eq(&self, other: &Self) -> bool {
        self.demand == other.demand && self.assigned_date == other.assigned_date
    }
}

impl Eq for OrderAssignment {}

impl Hash for OrderAssignment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.demand.hash(state);
        self.assigned_date.hash(state);
    }
}

/// Result of an assignment run.
///
/// A failed run (`is_success == false`) carries no assignments and empty
/// per-day maps. A successful run reached by a time limit is best-effort,
/// not proven optimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutput {
    pub assignments: Vec<OrderAssignment>,
    pub daily_loads: BTreeMap<NaiveDate, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_areas: Option<BTreeMap<NaiveDate, f64>>,
    #[serde(default)]
    pub daily_slack: BTreeMap<NaiveDate, f64>,
    #[serde(default)]
    pub daily_balance: BTreeMap<NaiveDate, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    #[serde(default = "default_success")]
    pub is_success: bool,
}

fn default_success() -> bool {
    true
}

impl AssignmentOutput {
    /// The result of a run without a usable solution.
    pub fn failure() -> Self {
        Self {
            assignments: Vec::new(),
            daily_loads: BTreeMap::new(),
            daily_areas: None,
            daily_slack: BTreeMap::new(),
            daily_balance: BTreeMap::new(),
            objective_value: None,
            is_success: false,
        }
    }

    /// Distinct start days, ascending.
    pub fn assigned_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<_> = self.assignments.iter().map(|a| a.assigned_date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Demands starting on `date`.
    pub fn demands_on(&self, date: NaiveDate) -> Vec<&Demand> {
        self.assignments
            .iter()
            .filter(|a| a.assigned_date == date)
            .map(|a| &a.demand)
            .collect()
    }

    /// Trucks carrying a demand that starts on `date`, ordered by id.
    pub fn trucks_on(&self, date: NaiveDate) -> Vec<Truck> {
        let mut trucks: Vec<Truck> = self
            .assignments
            .iter()
            .filter(|a| a.assigned_date == date)
            .filter_map(|a| a.truck.clone())
            .collect();
        trucks.sort_by_key(Truck::id);
        trucks.dedup();
        trucks
    }

    /// Total assigned weight per truck id.
    pub fn truck_loads(&self) -> BTreeMap<usize, f64> {
        let mut loads = BTreeMap::new();
        for a in &self.assignments {
            if let Some(truck) = &a.truck {
                *loads.entry(truck.id()).or_insert(0.0) += a.demand.weight();
            }
        }
        loads
    }

    /// The assignment of a given demand, if any.
    pub fn assignment_of(&self, demand_id: &str) -> Option<&OrderAssignment> {
        self.assignments
            .iter()
            .find(|a| a.demand.demand_id() == demand_id)
    }
}
