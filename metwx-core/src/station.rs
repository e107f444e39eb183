//! Station location lookup and bounding-box overlap.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub const WORLD: BoundingBox = BoundingBox {
        lat_min: -90.0,
        lat_max: 90.0,
        lon_min: -180.0,
        lon_max: 180.0,
    };

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.latitude)
            && (self.lon_min..=self.lon_max).contains(&point.longitude)
    }

    /// Smallest box covering every point, or `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Coordinates>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => BoundingBox {
                    lat_min: p.latitude,
                    lat_max: p.latitude,
                    lon_min: p.longitude,
                    lon_max: p.longitude,
                },
                Some(b) => BoundingBox {
                    lat_min: b.lat_min.min(p.latitude),
                    lat_max: b.lat_max.max(p.latitude),
                    lon_min: b.lon_min.min(p.longitude),
                    lon_max: b.lon_max.max(p.longitude),
                },
            })
        })
    }
}

/// Resolves a station identifier to a position.
pub trait StationLocator {
    fn locate(&self, station: &str) -> Option<Coordinates>;
}

/// In-memory station table.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    stations: HashMap<String, Coordinates>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of major airports.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (id, latitude, longitude) in [
            ("KJFK", 40.6413, -73.7781),
            ("KLAX", 33.9416, -118.4085),
            ("KORD", 41.9742, -87.9073),
            ("KATL", 33.6407, -84.4277),
            ("KDFW", 32.8998, -97.0403),
            ("KDEN", 39.8561, -104.6737),
            ("KSFO", 37.6213, -122.3790),
            ("KSEA", 47.4502, -122.3088),
            ("KBOS", 42.3656, -71.0096),
            ("KMIA", 25.7959, -80.2870),
            ("EGLL", 51.4700, -0.4543),
            ("RJTT", 35.5494, 139.7798),
        ] {
            table.insert(id, Coordinates { latitude, longitude });
        }
        table
    }

    pub fn insert(&mut self, station: &str, coordinates: Coordinates) {
        self.stations.insert(station.to_uppercase(), coordinates);
    }
}

impl StationLocator for StationTable {
    fn locate(&self, station: &str) -> Option<Coordinates> {
        self.stations.get(&station.to_uppercase()).copied()
    }
}
