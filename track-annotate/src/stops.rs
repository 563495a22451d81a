//! Intermediate-stop detection.
//!
//! # State machine
//!
//! ```text
//! Airborne --[sample low-and-slow]--> LowSlow      (remember entry index)
//! LowSlow  --[sample not low-and-slow]--> Airborne (resolve midpoint sample)
//! ```
//!
//! A zone still open when the track ends is discarded. Each closed zone is
//! resolved to an airport and merged with earlier stops whose airports sit
//! within the proximity threshold, so a touch-and-go that resolves to a
//! heliport on one pass and the adjoining field on the next stays one stop.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use track_schema::{Coordinate, IntermediateStop, TrackSample};

use crate::airports::AirportIndex;
use crate::geo::distance_km;

pub const DEFAULT_AGL_THRESHOLD_FT: f64 = 20.0;
pub const DEFAULT_SPEED_THRESHOLD_KTS: f64 = 20.0;
pub const DEFAULT_PROXIMITY_THRESHOLD_KM: f64 = 2.0;

/// Thresholds for [`StopDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopDetectorConfig {
    pub agl_threshold_ft: f64,
    pub speed_threshold_kts: f64,
    /// Stops whose airports are closer than this are the same landing.
    pub proximity_km: f64,
}

impl Default for StopDetectorConfig {
    fn default() -> Self {
        Self {
            agl_threshold_ft: DEFAULT_AGL_THRESHOLD_FT,
            speed_threshold_kts: DEFAULT_SPEED_THRESHOLD_KTS,
            proximity_km: DEFAULT_PROXIMITY_THRESHOLD_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneState {
    Airborne,
    LowSlow { entry: usize },
}

/// Scans a track for low-and-slow zones and turns them into stops.
#[derive(Debug, Clone, Copy)]
pub struct StopDetector<'a> {
    index: &'a AirportIndex,
    config: StopDetectorConfig,
}

impl<'a> StopDetector<'a> {
    pub fn new(index: &'a AirportIndex, config: StopDetectorConfig) -> Self {
        Self { index, config }
    }

    /// Missing fields never trigger on their own.
    pub fn is_low_and_slow(&self, sample: &TrackSample) -> bool {
        let agl = sample.altitude_agl_ft.unwrap_or(f64::INFINITY);
        let speed = sample.ground_speed_kts.unwrap_or(f64::INFINITY);
        agl <= self.config.agl_threshold_ft || speed <= self.config.speed_threshold_kts
    }

    /// Stops in the order their zones closed.
    pub fn detect(&self, samples: &[TrackSample]) -> Vec<IntermediateStop> {
        let mut stops: Vec<IntermediateStop> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut state = ZoneState::Airborne;

        for (i, sample) in samples.iter().enumerate() {
            let low = self.is_low_and_slow(sample);
            state = match (state, low) {
                (ZoneState::Airborne, true) => ZoneState::LowSlow { entry: i },
                (ZoneState::LowSlow { entry }, false) => {
                    let midpoint = samples[(entry + i) / 2].coordinate();
                    self.record_zone(midpoint, &mut stops, &mut seen);
                    ZoneState::Airborne
                }
                (unchanged, _) => unchanged,
            };
        }

        if let ZoneState::LowSlow { entry } = state {
            tracing::debug!(entry, "Track ended inside a low-and-slow zone; no stop recorded");
        }

        stops
    }

    fn record_zone(&self, midpoint: Coordinate, stops: &mut Vec<IntermediateStop>, seen: &mut HashSet<String>) {
        let Some(nearest) = self.index.find_nearest(midpoint.lat, midpoint.lon) else {
            return;
        };
        let candidate = nearest.airport;
        if seen.contains(&candidate.code) {
            return;
        }

        let conflicts: Vec<usize> = stops
            .iter()
            .enumerate()
            .filter(|(_, s)| distance_km(s.airport_coordinate, candidate.coordinate()) < self.config.proximity_km)
            .map(|(i, _)| i)
            .collect();

        let new_stop = IntermediateStop {
            airport_code: candidate.code.clone(),
            sample_midpoint: midpoint,
            airport_coordinate: candidate.coordinate(),
        };

        let Some(&slot) = conflicts.first() else {
            seen.insert(new_stop.airport_code.clone());
            stops.push(new_stop);
            return;
        };

        // The newcomer must win against every stop it overlaps.
        let new_priority = candidate.priority();
        let new_distance = nearest.distance_km;
        for &i in &conflicts {
            let existing = &stops[i];
            let existing_priority = self
                .index
                .get(&existing.airport_code)
                .map_or(0, |a| a.priority());
            let existing_distance = distance_km(existing.airport_coordinate, midpoint);

            let wins = new_priority > existing_priority
                || (new_priority == existing_priority && new_distance < existing_distance);
            if !wins {
                tracing::debug!(
                    kept = %existing.airport_code,
                    dropped = %new_stop.airport_code,
                    "Nearby stop already recorded"
                );
                return;
            }
        }

        for &i in conflicts.iter().rev() {
            let old = if i == slot {
                std::mem::replace(&mut stops[i], new_stop.clone())
            } else {
                stops.remove(i)
            };
            seen.remove(&old.airport_code);
            tracing::debug!(old = %old.airport_code, new = %new_stop.airport_code, "Replaced nearby stop");
        }
        seen.insert(new_stop.airport_code);
    }
}
