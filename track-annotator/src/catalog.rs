// track-annotator/src/catalog.rs
// Loads the OurAirports airports.csv into catalog entries.
//
// airports.csv: id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,
//   continent,iso_country,iso_region,municipality,...
// Columns are located by header name so trimmed or reordered exports work.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use track_schema::{Airport, AirportType, Coordinate};

const DUPLICATE_MARKER: &str = "(Duplicate)";

pub fn load_airports(path: &Path, skip_duplicates: bool) -> Result<Vec<Airport>> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    read_airports(rdr, skip_duplicates).with_context(|| format!("Cannot parse {}", path.display()))
}

pub fn read_airports<R: Read>(mut rdr: csv::Reader<R>, skip_duplicates: bool) -> Result<Vec<Airport>> {
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("airports.csv has no `{name}` column"))
    };
    let ident_col = column("ident")?;
    let type_col  = column("type")?;
    let name_col  = column("name")?;
    let lat_col   = column("latitude_deg")?;
    let lon_col   = column("longitude_deg")?;

    let mut airports = Vec::new();
    let mut skipped = 0usize;

    for rec in rdr.records() {
        let r = rec?;
        let ident = r.get(ident_col).unwrap_or("").trim().to_string();
        if ident.is_empty() { skipped += 1; continue; }

        let name = r.get(name_col).unwrap_or("").trim().to_string();
        if skip_duplicates && name.contains(DUPLICATE_MARKER) { skipped += 1; continue; }

        let lat: Option<f64> = r.get(lat_col).and_then(|v| v.trim().parse().ok());
        let lon: Option<f64> = r.get(lon_col).and_then(|v| v.trim().parse().ok());
        let (Some(lat), Some(lon)) = (lat, lon) else { skipped += 1; continue; };
        if !Coordinate::new(lat, lon).is_valid() { skipped += 1; continue; }

        let atype = AirportType::parse(r.get(type_col).unwrap_or(""));
        airports.push(Airport::new(ident, lat, lon, name, atype));
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped unusable airport rows");
    }
    tracing::info!(count = airports.len(), "Loaded airport catalog");
    Ok(airports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
