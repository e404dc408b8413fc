//! Delivery demands and their derived date windows.

use std::hash::{Hash, Hasher};

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{Factory, TimeWindow, Truck};
use crate::error::{DispatchError, Result};

/// A unit of cargo bound for one factory within a delivery window.
///
/// `travel_days` is the minimum number of calendar days the transit takes;
/// a demand started on day `d` occupies its truck on `d .. d + travel_days`.
/// Date and minute accessors are derived from the stored timestamps.
///
/// Equality and hashing use `demand_id` only.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_dispatch::models::{Demand, Factory};
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let demand = Demand::new(
///     "1",
///     5.0,
///     10.0,
///     Factory::new(1, "A"),
///     day(1).and_hms_opt(8, 0, 0).unwrap(),
///     day(3).and_hms_opt(17, 0, 0).unwrap(),
/// )
/// .with_travel_days(2);
///
/// let horizon: Vec<_> = (1..=5).map(day).collect();
/// assert_eq!(demand.feasible_dates(&horizon), vec![day(1), day(2)]);
/// assert_eq!(demand.available_minutes(), 480);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    demand_id: String,
    weight: f64,
    size_area: f64,
    destination: Factory,
    available_time: NaiveDateTime,
    due_time: NaiveDateTime,
    #[serde(default = "default_travel_days")]
    travel_days: u32,
}

fn default_travel_days() -> u32 {
    1
}

/// Hours spent loading at the depot.
pub const LOAD_HOURS: f64 = 0.5;
/// Hours spent unloading at the destination.
pub const UNLOAD_HOURS: f64 = 0.5;
/// Working hours in one calendar day.
pub const WORK_HOURS_PER_DAY: f64 = 24.0;

impl Demand {
    /// Creates a one-day demand.
    pub fn new(
        demand_id: impl Into<String>,
        weight: f64,
        size_area: f64,
        destination: Factory,
        available_time: NaiveDateTime,
        due_time: NaiveDateTime,
    ) -> Self {
        Self {
            demand_id: demand_id.into(),
            weight,
            size_area,
            destination,
            available_time,
            due_time,
            travel_days: default_travel_days(),
        }
    }

    /// Sets the number of transit days.
    pub fn with_travel_days(mut self, travel_days: u32) -> Self {
        self.travel_days = travel_days;
        self
    }

    /// Transit days for a trip of `distance_km` at `speed_kmh`, counting
    /// `load_hours` and `unload_hours` of handling and `work_hours_per_day`
    /// of working time per calendar day. Never less than one.
    ///
    /// A non-positive speed or working day yields one day; a missing or
    /// negative distance counts as zero.
    pub fn travel_days_for(
        distance_km: f64,
        speed_kmh: f64,
        load_hours: f64,
        unload_hours: f64,
        work_hours_per_day: f64,
    ) -> u32 {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(speed_kmh) || !positive(work_hours_per_day) {
            return 1;
        }
        let driving = if positive(distance_km) { distance_km / speed_kmh } else { 0.0 };
        let handling = load_hours.max(0.0) + unload_hours.max(0.0);
        let days = ((driving + handling) / work_hours_per_day).ceil();
        if days.is_finite() {
            (days as u32).max(1)
        } else {
            1
        }
    }

    /// Sets `travel_days` for a trip of `distance_km` on `truck`, with the
    /// default handling times and round-the-clock driving.
    pub fn with_derived_travel_days(self, distance_km: f64, truck: &Truck) -> Self {
        let days = Self::travel_days_for(
            distance_km,
            truck.speed(),
            LOAD_HOURS,
            UNLOAD_HOURS,
            WORK_HOURS_PER_DAY,
        );
        self.with_travel_days(days)
    }

    /// Demand ID.
    pub fn demand_id(&self) -> &str {
        &self.demand_id
    }

    /// Cargo weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Cargo floor area.
    pub fn size_area(&self) -> f64 {
        self.size_area
    }

    /// Delivery destination.
    pub fn destination(&self) -> &Factory {
        &self.destination
    }

    /// Timestamp from which the cargo can leave.
    pub fn available_time(&self) -> NaiveDateTime {
        self.available_time
    }

    /// Timestamp by which the cargo must be delivered.
    pub fn due_time(&self) -> NaiveDateTime {
        self.due_time
    }

    /// Transit days.
    pub fn travel_days(&self) -> u32 {
        self.travel_days
    }

    /// Calendar day of `available_time`.
    pub fn available_date(&self) -> NaiveDate {
        self.available_time.date()
    }

    /// Calendar day of `due_time`.
    pub fn due_date(&self) -> NaiveDate {
        self.due_time.date()
    }

    /// Minutes past midnight of `available_time`.
    pub fn available_minutes(&self) -> u32 {
        self.available_time.hour() * 60 + self.available_time.minute()
    }

    /// Minutes past midnight of `due_time`.
    pub fn due_minutes(&self) -> u32 {
        self.due_time.hour() * 60 + self.due_time.minute()
    }

    /// Latest start day that still completes the transit by the due date.
    pub fn last_start_date(&self) -> Option<NaiveDate> {
        let extra = u64::from(self.travel_days.saturating_sub(1));
        self.due_date().checked_sub_days(Days::new(extra))
    }

    /// Days of `horizon` on which this demand may start.
    pub fn feasible_dates(&self, horizon: &[NaiveDate]) -> Vec<NaiveDate> {
        let Some(last_start) = self.last_start_date() else {
            return Vec::new();
        };
        let first = self.available_date();
        horizon
            .iter()
            .copied()
            .filter(|d| first <= *d && *d <= last_start)
            .collect()
    }

    /// Arrival window in minutes relative to midnight of `day`.
    ///
    /// An availability before `day` opens the window at 0; times on later
    /// days lie past 1440. Returns `None` when the window closes before `day`
    /// starts.
    pub fn window_on(&self, day: NaiveDate) -> Option<TimeWindow> {
        let midnight = day.and_time(chrono::NaiveTime::MIN);
        let ready = (self.available_time - midnight).num_minutes() as f64;
        let due = (self.due_time - midnight).num_minutes() as f64;
        if due < 0.0 {
            return None;
        }
        TimeWindow::new(ready.max(0.0), due)
    }

    /// Checks the record for values no model can use.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| DispatchError::InvalidDemand {
            demand_id: self.demand_id.clone(),
            reason: reason.to_string(),
        };
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(invalid("weight must be a non-negative number"));
        }
        if !self.size_area.is_finite() || self.size_area < 0.0 {
            return Err(invalid("size_area must be a non-negative number"));
        }
        if self.travel_days == 0 {
            return Err(invalid("travel_days must be at least 1"));
        }
        if self.due_time < self.available_time {
            return Err(invalid("due_time precedes available_time"));
        }
        Ok(())
    }
}

impl PartialEq for Demand {
    fn eq(&self, other: &Self) -> bool {
        self.demand_id == other.demand_id
    }
}

impl Eq for Demand {}

impl Hash for Demand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.demand_id.hash(state);
    }
}
