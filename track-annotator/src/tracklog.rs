// track-annotator/src/tracklog.rs
// Normalises flight-log CSVs into strict TrackSamples.
//
// Loggers disagree on column names (`Latitude`, `lat`, `GndSpd`, `AltAGL`,
// ...). Header names are lower-cased with non-alphanumerics stripped and
// matched against alias lists; the core never sees the raw rows.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use track_schema::TrackSample;

const LATITUDE_ALIASES:  &[&str] = &["latitude", "lat", "latitudedeg"];
const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon", "lng", "long", "longitudedeg"];
const SPEED_ALIASES:     &[&str] = &["groundspeed", "gndspd", "speed", "gs", "groundspeedkts"];
const AGL_ALIASES:       &[&str] = &["altitudeagl", "altagl", "agl", "altitudeaglft", "heightagl"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub latitude: usize,
    pub longitude: usize,
    pub ground_speed: Option<usize>,
    pub altitude_agl: Option<usize>,
}

impl Columns {
    pub fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let normalised: Vec<String> = headers.iter().map(normalise_header).collect();
        let find = |aliases: &[&str]| normalised.iter().position(|h| aliases.contains(&h.as_str()));

        Ok(Self {
            latitude: find(LATITUDE_ALIASES).context("no latitude column")?,
            longitude: find(LONGITUDE_ALIASES).context("no longitude column")?,
            ground_speed: find(SPEED_ALIASES),
            altitude_agl: find(AGL_ALIASES),
        })
    }
}

fn normalise_header(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn number(record: &csv::StringRecord, col: Option<usize>) -> Option<f64> {
    let v: f64 = record.get(col?)?.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

pub fn load_track(path: &Path) -> Result<Vec<TrackSample>> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    read_track(rdr).with_context(|| format!("Cannot parse {}", path.display()))
}

/// Rows without a usable position are dropped; the rest keep file order.
pub fn read_track<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<TrackSample>> {
    let columns = Columns::resolve(rdr.headers()?)?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;

    for rec in rdr.records() {
        let r = rec?;
        let (Some(lat), Some(lon)) = (number(&r, Some(columns.latitude)), number(&r, Some(columns.longitude))) else {
            dropped += 1;
            continue;
        };
        let sample = TrackSample {
            latitude: lat,
            longitude: lon,
            ground_speed_kts: number(&r, columns.ground_speed),
            altitude_agl_ft: number(&r, columns.altitude_agl),
        };
        if !sample.is_valid() { dropped += 1; continue; }
        samples.push(sample);
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = samples.len(), "Dropped track rows without a valid position");
    }
    Ok(samples)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes())
    }

    #[test]
    fn header_aliases_resolve() {
        let headers = csv::StringRecord::from(vec!["Time", "Latitude", "Longitude", "GndSpd", "AltAGL"]);
        let cols = Columns::resolve(&headers).unwrap();
        assert_eq!(cols, Columns { latitude: 1, longitude: 2, ground_speed: Some(3), altitude_agl: Some(4) });

        let headers = csv::StringRecord::from(vec!["lat", "lng"]);
        let cols = Columns::resolve(&headers).unwrap();
        assert_eq!((cols.latitude, cols.longitude), (0, 1));
        assert_eq!((cols.ground_speed, cols.altitude_agl), (None, None));

        let headers = csv::StringRecord::from(vec!["ground_speed", "Altitude AGL", "LAT", "Lon"]);
        let cols = Columns::resolve(&headers).unwrap();
        assert_eq!(cols.ground_speed, Some(0));
        assert_eq!(cols.altitude_agl, Some(1));
    }

    #[test]
    fn missing_position_columns_fail() {
        let headers = csv::StringRecord::from(vec!["Time", "Latitude", "GndSpd"]);
        let err = Columns::resolve(&headers).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn parses_rows_and_drops_bad_positions() {
        let csv = "\
Time,Latitude,Longitude,GndSpd,AltAGL
09:30:00, 37.4605 ,-122.1145,0,0
09:30:01,,-122.1145,0,0
09:30:02,0,0,3,0
09:30:03,37.4700,-122.1300,85.5,
09:30:04,37.4800,-122.1500,n/a,1200
09:30:05,37.4900
";
        let samples = read_track(reader(csv)).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].latitude, 37.4605);
        assert_eq!(samples[0].ground_speed_kts, Some(0.0));
        assert_eq!(samples[1].ground_speed_kts, Some(85.5));
        assert_eq!(samples[1].altitude_agl_ft, None);
        assert_eq!(samples[2].ground_speed_kts, None);
        assert_eq!(samples[2].altitude_agl_ft, Some(1200.0));
    }

    #[test]
    fn header_only_file_is_empty_not_an_error() {
        let samples = read_track(reader("lat,lon\n")).unwrap();
        assert!(samples.is_empty());
    }
}
