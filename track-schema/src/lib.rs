//! Shared data model used by the `track-annotate` core and the
//! `track-annotator` CLI.
//!
//! Everything here is plain data. Validation is limited to what the core
//! needs to reject a sample outright; tolerant parsing of external files
//! lives in the CLI.

use serde::{Deserialize, Serialize};

// ── Coordinate ───────────────────────────────────────────────────────────────

/// WGS84 position in decimal degrees. No datum conversion is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and non-zero on both axes. Loggers write `0,0` for "no fix",
    /// so an exact zero is treated as missing rather than as null island.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat != 0.0 && self.lon != 0.0
    }
}

// ── TrackSample ──────────────────────────────────────────────────────────────

/// One row of a flight log. Ordering comes from the file, not a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_speed_kts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_agl_ft: Option<f64>,
}

impl TrackSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, ground_speed_kts: None, altitude_agl_ft: None }
    }

    pub fn with_ground_speed(mut self, kts: f64) -> Self {
        self.ground_speed_kts = Some(kts);
        self
    }

    pub fn with_altitude_agl(mut self, ft: f64) -> Self {
        self.altitude_agl_ft = Some(ft);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.coordinate().is_valid()
    }
}

// ── AirportType ──────────────────────────────────────────────────────────────

/// OurAirports facility type. Unrecognised strings (e.g. `balloonport`)
/// deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirportType {
    Closed,
    Heliport,
    SeaplaneBase,
    SmallAirport,
    MediumAirport,
    LargeAirport,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AirportType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "closed"         => Self::Closed,
            "heliport"       => Self::Heliport,
            "seaplane_base"  => Self::SeaplaneBase,
            "small_airport"  => Self::SmallAirport,
            "medium_airport" => Self::MediumAirport,
            "large_airport"  => Self::LargeAirport,
            _                => Self::Unknown,
        }
    }

    /// Tie-break weight; higher wins. Medium and large airports rank equal.
    pub fn priority(self) -> u8 {
        match self {
            Self::Unknown       => 0,
            Self::Closed        => 1,
            Self::Heliport      => 2,
            Self::SeaplaneBase  => 3,
            Self::SmallAirport  => 4,
            Self::MediumAirport => 5,
            Self::LargeAirport  => 5,
        }
    }
}

// ── Airport ──────────────────────────────────────────────────────────────────

/// Catalog entry. `code` is the unique catalog key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub airport_type: AirportType,
}

impl Airport {
    pub fn new(code: impl Into<String>, lat: f64, lon: f64, name: impl Into<String>, airport_type: AirportType) -> Self {
        Self { code: code.into(), lat, lon, name: name.into(), airport_type }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn priority(&self) -> u8 {
        self.airport_type.priority()
    }
}

// ── IntermediateStop ─────────────────────────────────────────────────────────

/// A landing between departure and arrival, resolved to a catalog airport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateStop {
    pub airport_code: String,
    /// Track sample halfway through the low-and-slow zone.
    pub sample_midpoint: Coordinate,
    pub airport_coordinate: Coordinate,
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_matches_operational_significance() {
        let order = [
            AirportType::Closed,
            AirportType::Heliport,
            AirportType::SeaplaneBase,
            AirportType::SmallAirport,
            AirportType::MediumAirport,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].priority() < pair[1].priority(), "{:?} !< {:?}", pair[0], pair[1]);
        }
        assert_eq!(AirportType::MediumAirport.priority(), AirportType::LargeAirport.priority());
        assert!(AirportType::Unknown.priority() < AirportType::Closed.priority());
    }

    #[test]
    fn airport_type_parses_ourairports_strings() {
        assert_eq!(AirportType::parse("small_airport"), AirportType::SmallAirport);
        assert_eq!(AirportType::parse(" Seaplane_Base "), AirportType::SeaplaneBase);
        assert_eq!(AirportType::parse("balloonport"), AirportType::Unknown);
        assert_eq!(AirportType::parse(""), AirportType::Unknown);
    }

    #[test]
    fn airport_type_serde_falls_back_to_unknown() {
        let t: AirportType = serde_json::from_str("\"large_airport\"").unwrap();
        assert_eq!(t, AirportType::LargeAirport);
        let t: AirportType = serde_json::from_str("\"balloonport\"").unwrap();
        assert_eq!(t, AirportType::Unknown);
    }

    #[test]
    fn zero_or_nan_coordinates_are_invalid() {
        assert!(TrackSample::new(37.46, -122.11).is_valid());
        assert!(!TrackSample::new(0.0, -122.11).is_valid());
        assert!(!TrackSample::new(37.46, 0.0).is_valid());
        assert!(!TrackSample::new(f64::NAN, 1.0).is_valid());
        assert!(!Coordinate::new(1.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn sample_builders_set_optional_fields() {
        let s = TrackSample::new(1.0, 2.0).with_ground_speed(12.0).with_altitude_agl(5.0);
        assert_eq!(s.ground_speed_kts, Some(12.0));
        assert_eq!(s.altitude_agl_ft, Some(5.0));
        assert_eq!(s.coordinate(), Coordinate::new(1.0, 2.0));
    }
}
