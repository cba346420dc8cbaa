use serde::{Deserialize, Serialize};

use super::FeatureError;

/// acceptance region for trip records. coordinate and passenger bounds are
/// inclusive, fare bounds are exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TripBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_passengers: f64,
    pub max_passengers: f64,
    pub min_fare: f64,
    pub max_fare: f64,
}

/// pickup and dropoff coordinates of a single trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripEndpoints {
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
}

impl Default for TripBounds {
    /// a box around greater New York, 1 to 6 passengers and fares in (0, 250)
    fn default() -> Self {
        Self {
            min_longitude: -76.0,
            max_longitude: -72.0,
            min_latitude: 38.0,
            max_latitude: 42.0,
            min_passengers: 1.0,
            max_passengers: 6.0,
            min_fare: 0.0,
            max_fare: 250.0,
        }
    }
}

impl TripBounds {
    pub fn validate(&self) -> Result<(), FeatureError> {
        let ranges = [
            ("longitude", self.min_longitude, self.max_longitude),
            ("latitude", self.min_latitude, self.max_latitude),
            ("passengers", self.min_passengers, self.max_passengers),
            ("fare", self.min_fare, self.max_fare),
        ];
        for (name, min, max) in ranges {
            if min.is_nan() || max.is_nan() || max < min {
                return Err(FeatureError::InvalidConfig(format!(
                    "{name} bounds [{min}, {max}] are invalid: {self:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn contains_longitude(&self, longitude: f64) -> bool {
        self.min_longitude <= longitude && longitude <= self.max_longitude
    }

    pub fn contains_latitude(&self, latitude: f64) -> bool {
        self.min_latitude <= latitude && latitude <= self.max_latitude
    }

    /// true when every predicate of the clean-up stage holds for this trip.
    pub fn accepts(&self, trip: &TripEndpoints, passengers: f64, fare: f64) -> bool {
        let endpoints_in_region = self.contains_longitude(trip.pickup_longitude)
            && self.contains_longitude(trip.dropoff_longitude)
            && self.contains_latitude(trip.pickup_latitude)
            && self.contains_latitude(trip.dropoff_latitude);
        let passengers_ok = self.min_passengers <= passengers && passengers <= self.max_passengers;
        let fare_ok = self.min_fare < fare && fare < self.max_fare;
        let moved = !(trip.pickup_longitude == trip.dropoff_longitude
            && trip.pickup_latitude == trip.dropoff_latitude);
        endpoints_in_region && passengers_ok && fare_ok && moved
    }
}
