//! Factory (delivery location) and depot types.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A delivery location, or the depot every route starts and ends at.
///
/// Equality and hashing use `id`, `name` and `is_depot`; the optional
/// geocoordinate is informational only.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::Factory;
///
/// let depot = Factory::depot(0);
/// assert!(depot.is_depot());
/// assert_eq!(depot.name(), "City_0");
///
/// let plant = Factory::new(3, "Plant C");
/// assert_ne!(plant, depot);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factory {
    id: usize,
    name: String,
    #[serde(default)]
    is_depot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<(f64, f64)>,
}

impl Factory {
    /// Creates a non-depot factory.
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_depot: false,
            location: None,
        }
    }

    /// Synthesizes the depot factory for the reserved id.
    pub fn depot(id: usize) -> Self {
        Self {
            id,
            name: format!("City_{id}"),
            is_depot: true,
            location: None,
        }
    }

    /// Attaches a `(latitude, longitude)` pair.
    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some((lat, lon));
        self
    }

    /// Factory id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the depot.
    pub fn is_depot(&self) -> bool {
        self.is_depot
    }

    /// Geocoordinate, if known.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.location
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.is_depot == other.is_depot
    }
}

impl Eq for Factory {}

impl Hash for Factory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.is_depot.hash(state);
    }
}

impl fmt::Display for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory(id={}, name={})", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_factory_new() {
        let f = Factory::new(1, "A");
        assert_eq!(f.id(), 1);
        assert_eq!(f.name(), "A");
        assert!(!f.is_depot());
        assert!(f.location().is_none());
    }

    #[test]
    fn test_depot() {
        let d = Factory::depot(0);
        assert_eq!(d.id(), 0);
        assert!(d.is_depot());
        assert_eq!(d.to_string(), "Factory(id=0, name=City_0)");
    }

    #[test]
    fn test_equality_ignores_location() {
        let a = Factory::new(1, "A").with_location(1.0, 2.0);
        let b = Factory::new(1, "A");
        assert_eq!(a, b);
        assert_ne!(a, Factory::new(1, "B"));

        let set: HashSet<Factory> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_depot_flag_distinguishes() {
        let mut plain = Factory::new(0, "City_0");
        assert_ne!(plain, Factory::depot(0));
        plain.is_depot = true;
        assert_eq!(plain, Factory::depot(0));
    }

    #[test]
    fn test_serde_defaults() {
        let f: Factory = serde_json::from_str(r#"{"id": 4, "name": "D"}"#).expect("valid");
        assert_eq!(f, Factory::new(4, "D"));
    }
}
