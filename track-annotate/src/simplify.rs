//! Ramer–Douglas–Peucker reduction of a track's coordinate sequence.
//!
//! Spans are processed from an explicit work stack instead of recursing, so
//! tracks with hundreds of thousands of samples cannot exhaust the call
//! stack. The kept set is identical to the recursive formulation.

use track_schema::Coordinate;

use crate::geo::perpendicular_distance_km;

/// About half a metre: keeps every visible bend of a GA track while dropping
/// the bulk of straight-and-level samples.
pub const DEFAULT_EPSILON_KM: f64 = 0.0005;

/// Simplify `points` so that no dropped point lies more than `epsilon_km`
/// from the simplified path. Endpoints are always kept.
pub fn simplify(points: &[Coordinate], epsilon_km: f64) -> Vec<Coordinate> {
    simplify_indices(points, epsilon_km).into_iter().map(|i| points[i]).collect()
}

/// Same as [`simplify`] but returns the indices of the kept points, in order.
pub fn simplify_indices(points: &[Coordinate], epsilon_km: f64) -> Vec<usize> {
    if points.len() <= 2 {
        return (0..points.len()).collect();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut spans = vec![(0usize, last)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance_km(points[i], points[start], points[end]);
            // strict `>`: the first index to reach the maximum wins
            if d > max_distance {
                max_distance = d;
                max_index = i;
            }
        }

        if max_distance > epsilon_km {
            keep[max_index] = true;
            // right half pushed first so the left half is processed first
            spans.push((max_index, end));
            spans.push((start, max_index));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn short_inputs_are_returned_unchanged() {
        assert!(simplify(&[], 1.0).is_empty());
        assert_eq!(simplify(&[c(1.0, 1.0)], 1.0), vec![c(1.0, 1.0)]);
        let two = [c(1.0, 1.0), c(2.0, 2.0)];
        assert_eq!(simplify(&two, 1.0), two.to_vec());
    }

    #[test]
    fn straight_line_collapses_to_endpoints() {
        let line: Vec<_> = (1..=10).map(|i| c(40.0 + i as f64 * 0.01, -100.0)).collect();
        let out = simplify(&line, DEFAULT_EPSILON_KM);
        assert_eq!(out, vec![line[0], line[9]]);
    }

    #[test]
    fn zero_epsilon_drops_only_exactly_collinear_points() {
        // an L shape: points 1 and 3 sit exactly on the legs either side of the corner
        let pts = [c(40.0, -100.0), c(40.5, -100.0), c(41.0, -100.0), c(41.0, -99.5), c(41.0, -99.0)];
        let out = simplify(&pts, 0.0);
        assert_eq!(out, vec![pts[0], pts[2], pts[4]]);
    }

    #[test]
    fn corner_survives_large_tolerance_only_if_significant() {
        let pts = [c(45.0, 7.0), c(45.0, 8.0), c(46.0, 8.0)];
        assert_eq!(simplify(&pts, 1.0).len(), 3);
        assert_eq!(simplify(&pts, 1000.0).len(), 2);
    }

    #[test]
    fn endpoints_and_length_hold_for_a_wiggly_track() {
        let pts: Vec<_> = (0..500)
            .map(|i| {
                let t = i as f64 * 0.01;
                c(47.0 + t * 0.01, 8.0 + (t * 3.0).sin() * 0.001)
            })
            .collect();
        for eps in [0.0, 0.0005, 0.01, 0.1, 10.0] {
            let out = simplify(&pts, eps);
            assert_eq!(out.first(), pts.first());
            assert_eq!(out.last(), pts.last());
            assert!(out.len() <= pts.len());
        }
        // coarser epsilon never keeps more points
        assert!(simplify(&pts, 0.1).len() <= simplify(&pts, 0.0005).len());
    }

    #[test]
    fn indices_are_sorted_and_deterministic() {
        let pts: Vec<_> = (0..200).map(|i| c(50.0 + (i % 7) as f64 * 0.001, 1.0 + i as f64 * 0.001)).collect();
        let a = simplify_indices(&pts, 0.01);
        let b = simplify_indices(&pts, 0.01);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn long_track_does_not_overflow() {
        let pts: Vec<_> = (0..50_000)
            .map(|i| {
                let theta = i as f64 / 50_000.0 * std::f64::consts::FRAC_PI_2;
                c(10.0 + theta.sin(), 20.0 + theta.cos())
            })
            .collect();
        let out = simplify(&pts, 0.0);
        assert_eq!(out.first(), pts.first());
        assert_eq!(out.last(), pts.last());
    }
}
