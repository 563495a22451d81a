// track-annotator/src/main.rs
// Annotates flight-track CSV logs: departure/arrival airports, intermediate
// stops, simplified paths and label placements, written out as JSON.

mod catalog;
mod config;
mod tracklog;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use track_annotate::{
    place_labels, AirportIndex, BatchReport, LabelPlacement, LabelPlacer, LabelSet, TrackAnnotation,
    TrackAnnotator, TrackFailure, WebMercator,
};
use track_schema::TrackSample;
use tracing_subscriber::EnvFilter;

use crate::config::AnnotatorConfig;

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "track-annotator", about = "Annotate flight-track logs with airports, stops and labels")]
struct Args {
    /// OurAirports airports.csv
    #[arg(long)]
    airports_csv: PathBuf,

    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop detection altitude threshold (ft AGL)
    #[arg(long)]
    agl_threshold: Option<f64>,

    /// Stop detection ground speed threshold (kts)
    #[arg(long)]
    speed_threshold: Option<f64>,

    /// Path simplification tolerance (km)
    #[arg(long)]
    epsilon_km: Option<f64>,

    /// Ignore airports farther than this from a track position (km)
    #[arg(long)]
    max_radius_km: Option<f64>,

    /// Map zoom level used for label spacing
    #[arg(long)]
    zoom: Option<f64>,

    /// Log per-track decisions
    #[arg(short, long)]
    verbose: bool,

    /// Track logs, e.g. log_20240512_093015_KPAO.csv
    #[arg(required = true)]
    logs: Vec<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<AnnotatorConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnnotatorConfig::load(path)?,
            None => AnnotatorConfig::default(),
        };
        if let Some(v) = self.agl_threshold   { cfg.stops.agl_threshold_ft = v; }
        if let Some(v) = self.speed_threshold { cfg.stops.speed_threshold_kts = v; }
        if let Some(v) = self.epsilon_km      { cfg.simplify.epsilon_km = v; }
        if let Some(v) = self.max_radius_km   { cfg.airports.max_radius_km = Some(v); }
        if let Some(v) = self.zoom            { cfg.labels.zoom = v; }
        cfg.validate()?;
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Output<'a> {
    tracks: &'a [TrackAnnotation],
    labels: &'a [LabelPlacement],
    failures: &'a [TrackFailure],
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let cfg = args.resolve_config()?;

    let airports = catalog::load_airports(&args.airports_csv, cfg.airports.skip_duplicates)?;
    let index = AirportIndex::new(airports).with_max_radius_km(cfg.airports.max_radius_km);
    let annotator = TrackAnnotator::new(&index, cfg.settings());

    let report = annotate_logs(&annotator, &args.logs);

    let placer = LabelPlacer::new(WebMercator::new(cfg.labels.zoom)).with_seed(cfg.labels.seed);
    let mut labels = LabelSet::new();
    let placed = place_labels(&report.annotations, &placer, &mut labels);
    tracing::info!(labels = placed.len(), "Placed airport labels");

    let json = serde_json::to_string_pretty(&Output {
        tracks: &report.annotations,
        labels: &placed,
        failures: &report.failures,
    })?;

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Cannot write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Batch processing
// ---------------------------------------------------------------------------

/// Parse and annotate every log on a small pool of scoped threads. The
/// catalog is only read, so workers share it freely; results keep the
/// command-line order.
fn annotate_logs(annotator: &TrackAnnotator<'_>, logs: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport::default();
    if logs.is_empty() {
        return report;
    }

    let workers = std::thread::available_parallelism().map_or(1, |n| n.get()).min(logs.len());
    let chunk = logs.len().div_ceil(workers);

    let chunks: Vec<BatchReport> = std::thread::scope(|s| {
        let handles: Vec<_> = logs
            .chunks(chunk)
            .map(|paths| s.spawn(move || annotate_chunk(annotator, paths)))
            .collect();
        handles
            .into_iter()
            .zip(logs.chunks(chunk))
            .map(|(h, paths)| {
                h.join().unwrap_or_else(|_| {
                    let mut failed = BatchReport::default();
                    for path in paths {
                        failed.fail(&display_name(path), &"worker panicked");
                    }
                    failed
                })
            })
            .collect()
    });

    for part in chunks {
        report.merge(part);
    }
    tracing::info!(
        annotated = report.annotations.len(),
        failed = report.failures.len(),
        "Annotated track logs"
    );
    report
}

/// Load one worker's logs, then hand the parsed tracks to the annotator.
fn annotate_chunk(annotator: &TrackAnnotator<'_>, paths: &[PathBuf]) -> BatchReport {
    let mut tracks: Vec<(String, Vec<TrackSample>)> = Vec::with_capacity(paths.len());
    let mut unreadable: Vec<(String, anyhow::Error)> = Vec::new();
    for path in paths {
        let name = display_name(path);
        match tracklog::load_track(path) {
            Ok(samples) => tracks.push((name, samples)),
            Err(e) => unreadable.push((name, e)),
        }
    }

    let mut report = annotator
        .annotate_batch(tracks.iter().map(|(name, samples)| (name.as_str(), samples.as_slice())));
    for (name, e) in unreadable {
        report.fail(&name, &format!("{e:#}"));
    }
    report
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_config_defaults() {
        let args = Args::parse_from([
            "track-annotator",
            "--airports-csv", "airports.csv",
            "--speed-threshold", "40",
            "--max-radius-km", "50",
            "--zoom", "12",
            "log_20240512_093015_KPAO.csv",
        ]);
        let cfg = args.resolve_config().unwrap();
        assert_eq!(cfg.stops.speed_threshold_kts, 40.0);
        assert_eq!(cfg.stops.agl_threshold_ft, 20.0);
        assert_eq!(cfg.airports.max_radius_km, Some(50.0));
        assert_eq!(cfg.labels.zoom, 12.0);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args::parse_from([
            "track-annotator",
            "--airports-csv", "airports.csv",
            "--epsilon-km=-1",
            "a.csv",
        ]);
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn missing_log_file_is_reported_not_fatal() {
        let index = AirportIndex::new([]);
        let annotator = TrackAnnotator::new(&index, Default::default());
        let logs = vec![PathBuf::from("/nonexistent/dir/log_20240512_093015_KPAO.csv")];
        let report = annotate_logs(&annotator, &logs);
        assert!(report.annotations.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "log_20240512_093015_KPAO.csv");
        assert!(report.failures[0].error.contains("Cannot open"));
    }

    #[test]
    fn display_name_strips_directories() {
        assert_eq!(display_name(Path::new("/tmp/logs/flight.csv")), "flight.csv");
    }
}
