//! Overlap-free placement of airport labels in screen space.
//!
//! Placement runs in projected pixels. A caller-supplied [`Projection`]
//! maps the airport to an anchor pixel; the placer searches for a label
//! position at least `min_label_distance_px` from every label already in
//! the [`LabelSet`]:
//!
//! 1. preferred ring: 8 fixed offsets at [`BASE_RADIUS_PX`], cardinals
//!    first then diagonals;
//! 2. spiral: 45° steps starting at the base radius, widening by
//!    `label_margin_px` every revolution, at most [`MAX_SPIRAL_STEPS`]
//!    steps and never beyond [`MAX_PIXEL_DISTANCE`];
//! 3. forced: a random angle at [`MAX_PIXEL_DISTANCE`], accepted
//!    unconditionally. The angle comes from an RNG seeded with the placer
//!    seed and the label key, so runs are reproducible.
//!
//! The label set is owned by the caller and must be driven from a single
//! placement loop; concurrent placement against one set would break the
//! non-overlap guarantee.

use std::collections::HashMap;
use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use track_schema::Coordinate;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Radius of the preferred ring and the first spiral revolution.
pub const BASE_RADIUS_PX: f64 = 20.0;
/// No label is ever placed farther than this from its anchor.
pub const MAX_PIXEL_DISTANCE: f64 = 100.0;
pub const MAX_SPIRAL_STEPS: usize = 32;

const SPIRAL_STEP_RAD: f64 = PI / 4.0;
const STEPS_PER_REVOLUTION: usize = 8;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Unit offsets of the preferred ring: N, E, S, W, then NE, SE, SW, NW.
/// Screen y grows downwards.
const PREFERRED_DIRECTIONS: [(f64, f64); 8] = [
    (0.0, -1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

// ── ScreenPoint ───────────────────────────────────────────────────────────────

/// Projected position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn polar(&self, radius: f64, angle: f64) -> Self {
        self.offset(radius * angle.cos(), radius * angle.sin())
    }
}

// ── Projection ────────────────────────────────────────────────────────────────

/// Geographic ↔ screen mapping supplied by whatever draws the map.
pub trait Projection {
    fn project(&self, coordinate: Coordinate) -> ScreenPoint;
    fn unproject(&self, point: ScreenPoint) -> Coordinate;
    /// Zoom level the projection was built for; drives [`LabelSpacing::for_zoom`].
    fn zoom(&self) -> f64;
}

/// Spherical Web Mercator with 256 px tiles, as used by slippy maps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
}

impl WebMercator {
    const TILE_SIZE: f64 = 256.0;

    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    fn world_size(&self) -> f64 {
        Self::TILE_SIZE * 2f64.powf(self.zoom)
    }
}

impl Projection for WebMercator {
    fn project(&self, c: Coordinate) -> ScreenPoint {
        let world = self.world_size();
        let lat = c.lat.to_radians();
        let x = (c.lon + 180.0) / 360.0 * world;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
        ScreenPoint::new(x, y)
    }

    fn unproject(&self, p: ScreenPoint) -> Coordinate {
        let world = self.world_size();
        let lon = p.x / world * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * p.y / world)).sinh().atan().to_degrees();
        Coordinate::new(lat, lon)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

// ── LabelSpacing ──────────────────────────────────────────────────────────────

/// Zoom-dependent separation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelSpacing {
    /// Minimum distance between any two label positions.
    pub min_label_distance_px: f64,
    /// Radius growth per spiral revolution.
    pub label_margin_px: f64,
}

impl LabelSpacing {
    /// Default spacing curve. Both values shrink as zoom increases, since
    /// features are already farther apart on screen.
    pub fn for_zoom(zoom: f64) -> Self {
        Self {
            min_label_distance_px: (60.0 - 3.0 * zoom).max(20.0),
            label_margin_px: (15.0 - 0.5 * zoom).max(5.0),
        }
    }
}

// ── LabelPlacement ────────────────────────────────────────────────────────────

/// Which search stage produced a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    Preferred,
    Spiral,
    /// Accepted without checking; may overlap under dense clustering.
    Forced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub key: String,
    pub anchor: Coordinate,
    /// Label position unprojected back to geographic coordinates.
    pub position: Coordinate,
    pub screen_anchor: ScreenPoint,
    pub screen_position: ScreenPoint,
    /// Draw a connector line from anchor to label when set.
    pub was_moved: bool,
    pub strategy: PlacementStrategy,
}

// ── LabelSet ──────────────────────────────────────────────────────────────────

/// Labels placed so far in one map session, keyed by airport code.
#[derive(Debug, Default)]
pub struct LabelSet {
    labels: HashMap<String, LabelPlacement>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&LabelPlacement> {
        self.labels.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when `candidate` keeps `min_distance` from every label except
    /// the one stored under `key`.
    fn is_free(&self, key: &str, candidate: ScreenPoint, min_distance: f64) -> bool {
        self.labels
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .all(|(_, l)| l.screen_position.distance_to(candidate) >= min_distance)
    }

    fn insert(&mut self, placement: LabelPlacement) {
        self.labels.insert(placement.key.clone(), placement);
    }
}

// ── LabelPlacer ───────────────────────────────────────────────────────────────

/// Chooses label positions against a [`LabelSet`].
pub struct LabelPlacer<P: Projection> {
    projection: P,
    spacing: LabelSpacing,
    seed: u64,
}

impl<P: Projection> LabelPlacer<P> {
    /// Placer using the default spacing curve for the projection's zoom.
    pub fn new(projection: P) -> Self {
        let spacing = LabelSpacing::for_zoom(projection.zoom());
        Self { projection, spacing, seed: 0 }
    }

    pub fn with_spacing(mut self, spacing: LabelSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Place the label for `key` anchored at `anchor` and record it in
    /// `labels`. A key that is already placed keeps its earlier position.
    pub fn place(&self, key: &str, anchor: Coordinate, labels: &mut LabelSet) -> LabelPlacement {
        if let Some(existing) = labels.get(key) {
            return existing.clone();
        }

        let screen_anchor = self.projection.project(anchor);
        let (screen_position, strategy) = self.search(key, screen_anchor, labels);
        if strategy == PlacementStrategy::Forced {
            tracing::warn!(key, "No free label position; placing at maximum distance");
        }

        let placement = LabelPlacement {
            key: key.to_string(),
            anchor,
            position: self.projection.unproject(screen_position),
            screen_anchor,
            screen_position,
            was_moved: screen_position != screen_anchor,
            strategy,
        };
        labels.insert(placement.clone());
        placement
    }

    fn search(&self, key: &str, anchor: ScreenPoint, labels: &LabelSet) -> (ScreenPoint, PlacementStrategy) {
        let min = self.spacing.min_label_distance_px;

        for (dx, dy) in PREFERRED_DIRECTIONS {
            let candidate = anchor.offset(dx * BASE_RADIUS_PX, dy * BASE_RADIUS_PX);
            if labels.is_free(key, candidate, min) {
                return (candidate, PlacementStrategy::Preferred);
            }
        }

        let mut angle = 0.0;
        let mut radius = BASE_RADIUS_PX;
        for step in 0..MAX_SPIRAL_STEPS {
            if radius > MAX_PIXEL_DISTANCE {
                break;
            }
            let candidate = anchor.polar(radius, angle);
            if labels.is_free(key, candidate, min) {
                tracing::debug!(key, step, radius, "Label placed on spiral");
                return (candidate, PlacementStrategy::Spiral);
            }
            angle += SPIRAL_STEP_RAD;
            if (step + 1) % STEPS_PER_REVOLUTION == 0 {
                radius += self.spacing.label_margin_px;
            }
        }

        let angle = self.fallback_rng(key).random_range(0.0..TAU);
        (anchor.polar(MAX_PIXEL_DISTANCE, angle), PlacementStrategy::Forced)
    }

    fn fallback_rng(&self, key: &str) -> StdRng {
        StdRng::seed_from_u64(fallback_seed(self.seed, key))
    }
}

/// FNV-1a over the little-endian seed bytes followed by the key bytes.
/// Fixed so the same `(seed, key)` gives the same angle on every build.
fn fallback_seed(seed: u64, key: &str) -> u64 {
    seed.to_le_bytes()
        .iter()
        .chain(key.as_bytes())
        .fold(FNV_OFFSET_BASIS, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}
