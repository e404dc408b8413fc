//! Truck type with capacity, cost and speed parameters.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A truck that carries demands between the depot and factories.
///
/// Identity is the `id`: two records with the same id are the same truck.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::Truck;
///
/// let t = Truck::new(1, 3000.0, 15.0).with_cost(2.0).with_speed(40.0);
/// assert_eq!(t.id(), 1);
/// assert_eq!(t.capacity(), 3000.0);
/// assert!((t.travel_minutes(20.0) - 30.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    id: usize,
    #[serde(rename = "type", default)]
    kind: f64,
    capacity: f64,
    inner_size: f64,
    #[serde(default = "default_cost")]
    cost: f64,
    #[serde(default = "default_speed")]
    speed: f64,
}

fn default_cost() -> f64 {
    1.0
}

fn default_speed() -> f64 {
    60.0
}

impl Truck {
    /// Creates a truck with the given weight capacity and loading area.
    ///
    /// Default: type 0, cost 1.0 per km, speed 60 km/h.
    pub fn new(id: usize, capacity: f64, inner_size: f64) -> Self {
        Self {
            id,
            kind: 0.0,
            capacity,
            inner_size,
            cost: default_cost(),
            speed: default_speed(),
        }
    }

    /// Sets the truck classification.
    pub fn with_kind(mut self, kind: f64) -> Self {
        self.kind = kind;
        self
    }

    /// Sets cost per km traveled.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Sets speed in km/h.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Truck ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Truck classification.
    pub fn kind(&self) -> f64 {
        self.kind
    }

    /// Weight limit.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Loading area limit.
    pub fn inner_size(&self) -> f64 {
        self.inner_size
    }

    /// Cost per km traveled.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Speed in km/h.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Minutes needed to drive `distance_km`.
    pub fn travel_minutes(&self, distance_km: f64) -> f64 {
        if self.speed > 0.0 {
            distance_km / self.speed * 60.0
        } else {
            0.0
        }
    }
}

impl PartialEq for Truck {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Truck {}

impl Hash for Truck {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Truck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Truck(id={}, type={}, inner_size={}, capacity={}, cost={}, speed={})",
            self.id, self.kind, self.inner_size, self.capacity, self.cost, self.speed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truck_new() {
        let t = Truck::new(1, 5.0, 10.0);
        assert_eq!(t.id(), 1);
        assert_eq!(t.capacity(), 5.0);
        assert_eq!(t.inner_size(), 10.0);
        assert_eq!(t.cost(), 1.0);
        assert_eq!(t.speed(), 60.0);
        assert_eq!(t.kind(), 0.0);
    }

    #[test]
    fn test_truck_builder_and_display() {
        let t = Truck::new(1, 5.0, 10.0)
            .with_kind(2.0)
            .with_cost(100.0)
            .with_speed(60.0);
        assert_eq!(
            t.to_string(),
            "Truck(id=1, type=2, inner_size=10, capacity=5, cost=100, speed=60)"
        );
    }

    #[test]
    fn test_identity_by_id() {
        let a = Truck::new(1, 5.0, 10.0);
        let b = Truck::new(1, 9.0, 1.0);
        assert_eq!(a, b);
        assert_ne!(a, Truck::new(2, 5.0, 10.0));
    }

    #[test]
    fn test_travel_minutes() {
        let t = Truck::new(1, 5.0, 10.0).with_speed(40.0);
        assert!((t.travel_minutes(10.0) - 15.0).abs() < 1e-10);
        let parked = Truck::new(2, 5.0, 10.0).with_speed(0.0);
        assert_eq!(parked.travel_minutes(10.0), 0.0);
    }

    #[test]
    fn test_serde_type_field() {
        let json = r#"{"id":2,"type":50.0,"capacity":4000.0,"inner_size":15.0,"cost":2.0,"speed":40.0}"#;
        let t: Truck = serde_json::from_str(json).expect("valid");
        assert_eq!(t.kind(), 50.0);
        let back = serde_json::to_string(&t).expect("serializable");
        assert!(back.contains("\"type\":50.0"));
    }
}
