use serde::{Deserialize, Serialize};

/// a fixed reference point used for Manhattan-style distance features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Landmark {
    pub fn new(name: &str, longitude: f64, latitude: f64) -> Self {
        Self {
            name: name.to_string(),
            longitude,
            latitude,
        }
    }

    /// sum of absolute coordinate differences between this landmark and a point
    pub fn manhattan_distance(&self, longitude: f64, latitude: f64) -> f64 {
        (longitude - self.longitude).abs() + (latitude - self.latitude).abs()
    }

    /// the three airports and lower Manhattan
    pub fn nyc_defaults() -> Vec<Landmark> {
        vec![
            Landmark::new("jfk", -73.7822222222, 40.6441666667),
            Landmark::new("ewr", -74.175, 40.69),
            Landmark::new("laguardia", -73.87, 40.77),
            Landmark::new("downtown", -74.0063889, 40.7141667),
        ]
    }
}
