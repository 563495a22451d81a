//! Per-track pipeline tying the four algorithms together.
//!
//! For each track: drop invalid samples, resolve departure (checking the
//! filename hint) and arrival, detect intermediate stops, simplify the path.
//! Label placement for a whole batch happens afterwards in one sequential
//! pass so every track shares the same [`LabelSet`].

use serde::{Deserialize, Serialize};
use track_schema::{Coordinate, IntermediateStop, TrackSample};

use crate::airports::{extract_code_from_filename, AirportIndex};
use crate::error::AnnotateError;
use crate::labels::{LabelPlacement, LabelPlacer, LabelSet, Projection};
use crate::simplify::{simplify, DEFAULT_EPSILON_KM};
use crate::stops::{StopDetector, StopDetectorConfig};

/// Tunables for [`TrackAnnotator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorSettings {
    pub stops: StopDetectorConfig,
    pub epsilon_km: f64,
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        Self { stops: StopDetectorConfig::default(), epsilon_km: DEFAULT_EPSILON_KM }
    }
}

/// Departure or arrival airport as resolved from a track end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAirport {
    pub code: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Distance from the track end that resolved to this airport.
    pub distance_km: f64,
}

/// Display-ready summary of one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackAnnotation {
    pub name: String,
    /// Valid samples only.
    pub sample_count: usize,
    pub path: Vec<Coordinate>,
    pub departure: Option<ResolvedAirport>,
    pub arrival: Option<ResolvedAirport>,
    pub stops: Vec<IntermediateStop>,
}

/// A track that could not be annotated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of [`TrackAnnotator::annotate_batch`].
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub annotations: Vec<TrackAnnotation>,
    pub failures: Vec<TrackFailure>,
}

impl BatchReport {
    pub fn record<E: std::fmt::Display>(&mut self, name: &str, result: Result<TrackAnnotation, E>) {
        match result {
            Ok(annotation) => self.annotations.push(annotation),
            Err(e) => self.fail(name, &e),
        }
    }

    /// Record a track that failed before or during annotation.
    pub fn fail(&mut self, name: &str, error: &dyn std::fmt::Display) {
        tracing::warn!(track = name, error = %error, "Skipping track");
        self.failures.push(TrackFailure { name: name.to_string(), error: error.to_string() });
    }

    /// Append another report, keeping its order after this one's.
    pub fn merge(&mut self, other: BatchReport) {
        self.annotations.extend(other.annotations);
        self.failures.extend(other.failures);
    }
}

pub struct TrackAnnotator<'a> {
    index: &'a AirportIndex,
    settings: AnnotatorSettings,
}

impl<'a> TrackAnnotator<'a> {
    pub fn new(index: &'a AirportIndex, settings: AnnotatorSettings) -> Self {
        Self { index, settings }
    }

    /// Annotate one track. `name` is the source filename; when it follows
    /// the `log_YYYYMMDD_HHMMSS_CODE.csv` convention the code is used as a
    /// departure hint.
    pub fn annotate(&self, name: &str, samples: &[TrackSample]) -> Result<TrackAnnotation, AnnotateError> {
        let valid: Vec<TrackSample> = samples.iter().copied().filter(TrackSample::is_valid).collect();
        let (Some(first), Some(last)) = (valid.first(), valid.last()) else {
            return Err(AnnotateError::EmptyTrack { name: name.to_string() });
        };
        if valid.len() < samples.len() {
            tracing::debug!(track = name, dropped = samples.len() - valid.len(), "Dropped invalid samples");
        }

        let hint = extract_code_from_filename(name);
        let departure = self
            .index
            .verify_code(hint.as_deref(), first.latitude, first.longitude)
            .and_then(|code| self.resolved(&code, first.coordinate()));
        let arrival = self
            .index
            .find_nearest(last.latitude, last.longitude)
            .and_then(|n| self.resolved(n.code(), last.coordinate()));

        let endpoint_codes: Vec<&str> = departure.iter().chain(arrival.iter()).map(|a| a.code.as_str()).collect();
        let stops: Vec<IntermediateStop> = StopDetector::new(self.index, self.settings.stops)
            .detect(&valid)
            .into_iter()
            .filter(|s| !endpoint_codes.contains(&s.airport_code.as_str()))
            .collect();

        let coords: Vec<Coordinate> = valid.iter().map(TrackSample::coordinate).collect();
        let path = simplify(&coords, self.settings.epsilon_km);

        tracing::debug!(
            track = name,
            samples = valid.len(),
            path_points = path.len(),
            departure = departure.as_ref().map(|a| a.code.as_str()),
            arrival = arrival.as_ref().map(|a| a.code.as_str()),
            stops = stops.len(),
            "Annotated track"
        );

        Ok(TrackAnnotation {
            name: name.to_string(),
            sample_count: valid.len(),
            path,
            departure,
            arrival,
            stops,
        })
    }

    /// Annotate every `(name, samples)` pair. A failing track is recorded
    /// and the rest carry on.
    pub fn annotate_batch<'s, I>(&self, tracks: I) -> BatchReport
    where
        I: IntoIterator<Item = (&'s str, &'s [TrackSample])>,
    {
        let mut report = BatchReport::default();
        for (name, samples) in tracks {
            report.record(name, self.annotate(name, samples));
        }
        tracing::info!(
            annotated = report.annotations.len(),
            failed = report.failures.len(),
            "Batch annotated"
        );
        report
    }

    fn resolved(&self, code: &str, from: Coordinate) -> Option<ResolvedAirport> {
        let airport = self.index.get(code)?;
        Some(ResolvedAirport {
            code: airport.code.clone(),
            name: airport.name.clone(),
            coordinate: airport.coordinate(),
            distance_km: crate::geo::distance_km(from, airport.coordinate()),
        })
    }
}

/// Label every airport the annotations mention: per track the departure,
/// the arrival, then each stop. Airports shared between tracks are labelled
/// once.
pub fn place_labels<P: Projection>(
    annotations: &[TrackAnnotation],
    placer: &LabelPlacer<P>,
    labels: &mut LabelSet,
) -> Vec<LabelPlacement> {
    let mut placed = Vec::new();
    for annotation in annotations {
        let endpoints = annotation
            .departure
            .iter()
            .chain(annotation.arrival.iter())
            .map(|a| (a.code.as_str(), a.coordinate));
        let stops = annotation
            .stops
            .iter()
            .map(|s| (s.airport_code.as_str(), s.airport_coordinate));

        for (code, coordinate) in endpoints.chain(stops) {
            if labels.contains(code) {
                continue;
            }
            placed.push(placer.place(code, coordinate, labels));
        }
    }
    placed
}
