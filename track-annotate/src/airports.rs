//! Nearest-airport resolution over an externally supplied catalog.
//!
//! Resolution prefers operationally meaningful facilities: within the
//! 1 km close pool the highest-priority type wins even if a heliport pad is
//! a few metres nearer, and the close pool always beats anything farther
//! away regardless of type.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use track_schema::{Airport, Coordinate};

use crate::geo::distance_km;

/// Airports within this radius of the query form the close pool.
pub const CLOSE_POOL_KM: f64 = 1.0;

/// A catalog airport together with its distance from the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestAirport<'a> {
    pub airport: &'a Airport,
    pub distance_km: f64,
}

impl NearestAirport<'_> {
    pub fn code(&self) -> &str {
        &self.airport.code
    }

    /// Priority first, then distance. Equal on both means "not better".
    fn beats(&self, other: &NearestAirport<'_>) -> bool {
        let (a, b) = (self.airport.priority(), other.airport.priority());
        a > b || (a == b && self.distance_km < other.distance_km)
    }
}

/// Read-only airport catalog. Built once, shared by reference (or `Arc`)
/// across every track in a run.
#[derive(Debug, Default)]
pub struct AirportIndex {
    /// Catalog order; on an exact tie the earlier entry wins.
    airports: Vec<Airport>,
    by_code: HashMap<String, usize>,
    max_radius_km: Option<f64>,
}

impl AirportIndex {
    /// Build an index. When a code appears more than once the first entry
    /// is kept.
    pub fn new(airports: impl IntoIterator<Item = Airport>) -> Self {
        let mut list: Vec<Airport> = Vec::new();
        let mut by_code: HashMap<String, usize> = HashMap::new();
        for airport in airports {
            if by_code.contains_key(&airport.code) {
                tracing::debug!(code = %airport.code, "Duplicate airport code; keeping first entry");
                continue;
            }
            by_code.insert(airport.code.clone(), list.len());
            list.push(airport);
        }

        tracing::info!(count = list.len(), "Built airport index");

        Self { airports: list, by_code, max_radius_km: None }
    }

    /// Ignore airports farther than `radius_km` from the query point.
    /// `None` (the default) searches the whole catalog.
    pub fn with_max_radius_km(mut self, radius_km: Option<f64>) -> Self {
        self.max_radius_km = radius_km;
        self
    }

    pub fn get(&self, code: &str) -> Option<&Airport> {
        self.by_code.get(code).map(|&i| &self.airports[i])
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Resolve the airport a track position belongs to.
    ///
    /// Returns `None` only when the catalog is empty or, with a radius cap,
    /// nothing lies inside it.
    pub fn find_nearest(&self, lat: f64, lon: f64) -> Option<NearestAirport<'_>> {
        let query = Coordinate::new(lat, lon);
        let mut best: Option<NearestAirport<'_>> = None;
        let mut best_close: Option<NearestAirport<'_>> = None;

        for airport in &self.airports {
            let distance_km = distance_km(query, airport.coordinate());
            if self.max_radius_km.is_some_and(|r| distance_km > r) {
                continue;
            }
            let candidate = NearestAirport { airport, distance_km };

            if distance_km <= CLOSE_POOL_KM && best_close.as_ref().map_or(true, |b| candidate.beats(b)) {
                best_close = Some(candidate.clone());
            }
            if best.as_ref().map_or(true, |b| candidate.beats(b)) {
                best = Some(candidate);
            }
        }

        match (best_close, best) {
            (Some(close), Some(general)) => {
                if close.airport.code != general.airport.code {
                    tracing::debug!(
                        close = %close.airport.code,
                        general = %general.airport.code,
                        "Close-pool airport overrides priority scan"
                    );
                }
                Some(close)
            }
            (close, general) => close.or(general),
        }
    }

    /// Check a filename hint against the position it should describe.
    ///
    /// The hint is confirmed when it matches the resolved airport and
    /// overridden otherwise; the resolved code is returned either way.
    pub fn verify_code(&self, suggested_code: Option<&str>, lat: f64, lon: f64) -> Option<String> {
        let nearest = self.find_nearest(lat, lon)?;
        match suggested_code {
            Some(hint) if hint == nearest.code() => {
                tracing::debug!(code = hint, "Filename airport code confirmed");
            }
            Some(hint) => {
                tracing::debug!(
                    hint,
                    resolved = nearest.code(),
                    distance_km = nearest.distance_km,
                    "Filename airport code overridden"
                );
            }
            None => {}
        }
        Some(nearest.code().to_string())
    }
}

/// Pull the airport code out of a `log_YYYYMMDD_HHMMSS_CODE.csv` filename.
///
/// Only the bare filename is matched; strip directories first.
pub fn extract_code_from_filename(name: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"^log_\d{8}_\d{6}_([A-Z0-9]{3,4})\.csv$").expect("valid filename regex")
    });
    re.captures(name).map(|c| c[1].to_string())
}
