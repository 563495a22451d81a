//! Geospatial annotation of flight tracks.
//!
//! Given a track (ordered position samples) and an airport catalog this
//! crate resolves the departure and arrival airports, finds intermediate
//! landings, simplifies the path for display and places non-overlapping
//! airport labels. Everything is synchronous and side-effect free apart
//! from the caller-owned [`labels::LabelSet`].
//!
//! ```text
//! samples ──► AirportIndex (departure / arrival)
//!        ├──► StopDetector ──► AirportIndex
//!        ├──► simplify
//!        └──► LabelPlacer (one shared LabelSet per map session)
//! ```

pub mod airports;
pub mod annotate;
pub mod error;
pub mod geo;
pub mod labels;
pub mod simplify;
pub mod stops;

pub use airports::{extract_code_from_filename, AirportIndex, NearestAirport};
pub use annotate::{place_labels, AnnotatorSettings, BatchReport, ResolvedAirport, TrackAnnotation, TrackAnnotator, TrackFailure};
pub use error::AnnotateError;
pub use labels::{LabelPlacement, LabelPlacer, LabelSet, LabelSpacing, PlacementStrategy, Projection, ScreenPoint, WebMercator};
pub use stops::{StopDetector, StopDetectorConfig};
pub use track_schema::{Airport, AirportType, Coordinate, IntermediateStop, TrackSample};
