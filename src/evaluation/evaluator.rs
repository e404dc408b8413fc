//! Route evaluator that computes timing, load, and cost.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::RoutingConfig;
use crate::models::{CvrpInput, Factory, TimeWindow, Truck, TruckRoute, Violation, ViolationType};

/// Clock format of [`TruckRoute::arrival_times`].
const ARRIVAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Evaluates node sequences of one routing day.
///
/// Node 0 is the depot and node `i + 1` the destination of `demands[i]`, as
/// in [`CvrpInput`]. The clock starts at the configured depot departure.
/// With time windows enabled, a truck arriving early waits for the window
/// to open.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_dispatch::config::RoutingConfig;
/// use u_dispatch::distance::DistanceMatrix;
/// use u_dispatch::evaluation::RouteEvaluator;
/// use u_dispatch::models::{CvrpInput, Demand, Factory, Truck};
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let demands = vec![Demand::new("a", 5.0, 1.0, Factory::new(1, "A"), at, at)];
/// let matrix = DistanceMatrix::from_rows(vec![vec![0.0, 30.0], vec![30.0, 0.0]]).unwrap();
/// let input = CvrpInput::new(demands, vec![], matrix);
/// let config = RoutingConfig::default();
/// let truck = Truck::new(1, 10.0, 10.0);
///
/// let evaluator = RouteEvaluator::new(&input, &config);
/// let (route, violations) = evaluator.build_route(&truck, &[1]);
/// assert_eq!(route.stops(), 1);
/// assert!((route.total_distance() - 60.0).abs() < 1e-10);
/// assert!(violations.is_empty());
/// ```
pub struct RouteEvaluator<'a> {
    input: &'a CvrpInput,
    config: &'a RoutingConfig,
    nodes: Vec<Factory>,
    loads: Vec<f64>,
    windows: Vec<Option<TimeWindow>>,
    day: Option<NaiveDate>,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates an evaluator for one routing input.
    pub fn new(input: &'a CvrpInput, config: &'a RoutingConfig) -> Self {
        Self {
            input,
            config,
            nodes: input.nodes(config.depot_id),
            loads: input.node_loads(),
            windows: input.node_windows(),
            day: input.routing_day(),
        }
    }

    /// Routing nodes in matrix order.
    pub fn nodes(&self) -> &[Factory] {
        &self.nodes
    }

    /// Builds the depot-to-depot route serving `stops` (node indices, depot
    /// excluded) in order.
    ///
    /// Returns the route with its KPIs and any violations found. Arrival
    /// strings are present only when `input.date` is set.
    pub fn build_route(&self, truck: &Truck, stops: &[usize]) -> (TruckRoute, Vec<Violation>) {
        let mut violations = Vec::new();
        let matrix = &self.input.distance_matrix;
        let departure = self.config.departure_minutes;

        let mut route = vec![self.nodes[0].clone()];
        let mut cumulative_load = vec![0.0];
        let mut travel_minutes = vec![0.0];
        let mut arrivals = vec![departure];

        let mut clock = departure;
        let mut load = 0.0;
        let mut distance = 0.0;
        let mut prev = 0;
        for &node in stops.iter().chain(std::iter::once(&0)) {
            let km = matrix.get(prev, node);
            let minutes = truck.travel_minutes(km);
            distance += km;
            let arrival = clock + minutes;

            let mut start = arrival;
            if node != 0 {
                if let Some(window) = self.windows[node].filter(|_| self.config.time_windows) {
                    if window.is_violated(arrival) {
                        violations.push(Violation::new(ViolationType::TimeWindowViolated {
                            factory_id: self.nodes[node].id(),
                            arrival,
                            due: window.due(),
                        }));
                    }
                    start += window.waiting_time(arrival);
                }
                load += self.loads[node];
            }

            route.push(self.nodes[node].clone());
            cumulative_load.push(load);
            travel_minutes.push(minutes);
            arrivals.push(arrival);

            clock = if node == 0 {
                arrival
            } else {
                start + self.config.service_time_minutes
            };
            prev = node;
        }

        if load > truck.capacity() + 1e-9 {
            violations.push(Violation::new(ViolationType::CapacityExceeded {
                truck_id: truck.id(),
                load,
                capacity: truck.capacity(),
            }));
        }
        if stops.len() > self.config.max_stops {
            violations.push(Violation::new(ViolationType::MaxStopsExceeded {
                truck_id: truck.id(),
                stops: stops.len(),
                max_stops: self.config.max_stops,
            }));
        }

        let arrival_times = self.input.date.map(|day| {
            arrivals
                .iter()
                .map(|&m| clock_time(day, m).format(ARRIVAL_FORMAT).to_string())
                .collect()
        });

        let travel_cost = truck.cost() * distance;
        let handling_cost = self.config.service_cost * stops.len() as f64;
        let route = TruckRoute {
            truck: truck.clone(),
            route,
            cumulative_load,
            arrival_times,
            travel_minutes,
            total_distance: distance,
            total_time: clock - departure,
            stops: stops.len(),
            travel_cost,
            handling_cost,
            total_cost: travel_cost + handling_cost,
        };
        (route, violations)
    }

    /// Day the arrival windows refer to.
    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}

fn clock_time(day: NaiveDate, minutes: f64) -> NaiveDateTime {
    day.and_time(chrono::NaiveTime::MIN) + Duration::seconds((minutes * 60.0).round() as i64)
}
