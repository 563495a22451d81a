//! Great-circle helpers shared by every other module.

use track_schema::Coordinate;

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres. NaN in, NaN out.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from `point` to the closest point of the segment
/// `line_start`..`line_end`.
///
/// The projection parameter is computed in plain degree space and clamped
/// to `[0, 1]`; the returned distance is the Haversine distance to the
/// projected point. A zero-length segment degrades to point distance.
pub fn perpendicular_distance_km(point: Coordinate, line_start: Coordinate, line_end: Coordinate) -> f64 {
    let d_lat = line_end.lat - line_start.lat;
    let d_lon = line_end.lon - line_start.lon;
    let len_sq = d_lat * d_lat + d_lon * d_lon;

    if len_sq == 0.0 {
        return distance_km(point, line_start);
    }

    let t = (((point.lat - line_start.lat) * d_lat + (point.lon - line_start.lon) * d_lon) / len_sq)
        .clamp(0.0, 1.0);

    let closest = Coordinate::new(line_start.lat + t * d_lat, line_start.lon + t * d_lon);
    distance_km(point, closest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(Coordinate::new(45.0, 7.0), Coordinate::new(46.0, 7.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let sfo = Coordinate::new(37.6189, -122.3750);
        let lax = Coordinate::new(33.9425, -118.4081);
        assert!((distance_km(sfo, lax) - distance_km(lax, sfo)).abs() < 1e-9);
        assert_eq!(distance_km(sfo, sfo), 0.0);
        // SFO-LAX great circle is ~543 km
        assert!((distance_km(sfo, lax) - 543.0).abs() < 5.0);
    }

    #[test]
    fn nan_propagates() {
        assert!(distance_km(Coordinate::new(f64::NAN, 0.0), Coordinate::new(1.0, 1.0)).is_nan());
    }

    #[test]
    fn perpendicular_distance_to_meridian_segment() {
        let start = Coordinate::new(45.0, 7.0);
        let end = Coordinate::new(46.0, 7.0);
        let p = Coordinate::new(45.5, 7.01);
        let expected = distance_km(p, Coordinate::new(45.5, 7.0));
        assert!((perpendicular_distance_km(p, start, end) - expected).abs() < 1e-9);
    }

    #[test]
    fn projection_is_clamped_to_segment_ends() {
        let start = Coordinate::new(45.0, 7.0);
        let end = Coordinate::new(46.0, 7.0);
        let beyond = Coordinate::new(47.0, 7.0);
        let expected = distance_km(beyond, end);
        assert!((perpendicular_distance_km(beyond, start, end) - expected).abs() < 1e-9);

        let before = Coordinate::new(44.0, 7.0);
        let expected = distance_km(before, start);
        assert!((perpendicular_distance_km(before, start, end) - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_segment_is_point_distance() {
        let a = Coordinate::new(45.0, 7.0);
        let p = Coordinate::new(45.1, 7.1);
        assert_eq!(perpendicular_distance_km(p, a, a), distance_km(p, a));
    }

    #[test]
    fn point_on_segment_has_zero_distance() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(12.0, 20.0);
        assert_eq!(perpendicular_distance_km(Coordinate::new(11.0, 20.0), a, b), 0.0);
    }
}
