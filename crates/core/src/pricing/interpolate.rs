//! Linear price interpolation between known daily points.
//!
//! These are pure functions: the resolver feeds them bracketing points
//! from the store, and the confidence score is advisory only - it never
//! rejects a result.

use crate::constants::SECONDS_PER_DAY;

/// Estimate a price at `query_time` from two known points, weighting by
/// elapsed-time ratio so the nearer point has more influence.
///
/// Boundary behavior is exact, not approximate:
/// - equal timestamps return `before_price` (guards divide-by-zero)
/// - a query at or before the bracket returns `before_price`
/// - a query at or after the bracket returns `after_price`
///
/// There is no extrapolation beyond the bracket.
pub fn interpolate(
    query_time: i64,
    before_time: i64,
    before_price: f64,
    after_time: i64,
    after_price: f64,
) -> f64 {
    if before_time == after_time {
        return before_price;
    }
    if query_time <= before_time {
        return before_price;
    }
    if query_time >= after_time {
        return after_price;
    }

    let total = (after_time - before_time) as f64;
    let from_before = (query_time - before_time) as f64;
    let from_after = (after_time - query_time) as f64;

    let before_weight = from_after / total;
    let after_weight = from_before / total;

    before_price * before_weight + after_price * after_weight
}

/// Estimate a price at `query_time` from an arbitrary set of
/// `(time, price)` points.
///
/// Returns `None` for an empty set and the single price for a
/// one-element set. Input order does not matter; an exact timestamp
/// match returns that point's price directly. Queries outside the known
/// range return the nearest extreme point's price - never an
/// extrapolation.
pub fn interpolate_multi_point(query_time: i64, points: &[(i64, f64)]) -> Option<f64> {
    match points {
        [] => return None,
        [(_, price)] => return Some(*price),
        _ => {}
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|(time, _)| *time);

    let mut before: Option<(i64, f64)> = None;
    let mut after: Option<(i64, f64)> = None;

    for &(time, price) in &sorted {
        if time == query_time {
            return Some(price);
        }
        if time < query_time {
            before = Some((time, price));
        } else {
            after = Some((time, price));
            break;
        }
    }

    match (before, after) {
        (None, _) => sorted.first().map(|(_, price)| *price),
        (_, None) => sorted.last().map(|(_, price)| *price),
        (Some((bt, bp)), Some((at, ap))) => Some(interpolate(query_time, bt, bp, at, ap)),
    }
}

/// Advisory confidence score in `(0, 1]` for an interpolation.
///
/// Averages two signals: how small the bracket span is relative to
/// `max_gap_days`, and how close the query sits to the bracket midpoint.
/// A degenerate zero-span bracket is an exact hit and scores 1.
pub fn confidence(query_time: i64, before_time: i64, after_time: i64, max_gap_days: f64) -> f64 {
    let span = (after_time - before_time) as f64;
    if span <= 0.0 {
        return 1.0;
    }

    let gap_days = span / SECONDS_PER_DAY as f64;
    let gap_confidence = (1.0 - gap_days / max_gap_days).max(0.0);

    let midpoint = before_time as f64 + span / 2.0;
    let from_midpoint = (query_time as f64 - midpoint).abs();
    let midpoint_confidence = (1.0 - from_midpoint / span).max(0.0);

    (gap_confidence + midpoint_confidence) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_INTERPOLATION_GAP_DAYS;

    #[test]
    fn test_equal_timestamps_return_before_price() {
        assert_eq!(interpolate(1000, 1000, 10.0, 1000, 20.0), 10.0);
    }

    #[test]
    fn test_no_extrapolation_before_bracket() {
        assert_eq!(interpolate(500, 1000, 10.0, 2000, 20.0), 10.0);
        assert_eq!(interpolate(1000, 1000, 10.0, 2000, 20.0), 10.0);
    }

    #[test]
    fn test_no_extrapolation_after_bracket() {
        assert_eq!(interpolate(2500, 1000, 10.0, 2000, 20.0), 20.0);
        assert_eq!(interpolate(2000, 1000, 10.0, 2000, 20.0), 20.0);
    }

    #[test]
    fn test_exact_midpoint() {
        assert_eq!(interpolate(1500, 1000, 10.0, 2000, 20.0), 15.0);
    }

    #[test]
    fn test_weighting_favors_nearer_point() {
        let late = interpolate(1750, 1000, 10.0, 2000, 20.0);
        assert!((late - 17.5).abs() < 1e-9);

        let early = interpolate(1250, 1000, 10.0, 2000, 20.0);
        assert!((early - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_multi_point_empty_and_single() {
        assert_eq!(interpolate_multi_point(1500, &[]), None);
        assert_eq!(interpolate_multi_point(1500, &[(9000, 4.2)]), Some(4.2));
        assert_eq!(interpolate_multi_point(0, &[(9000, 4.2)]), Some(4.2));
    }

    #[test]
    fn test_multi_point_tolerates_unsorted_input() {
        let sorted = [(1000, 10.0), (2000, 20.0), (3000, 40.0)];
        let shuffled = [(3000, 40.0), (1000, 10.0), (2000, 20.0)];

        for query in [500, 1500, 2500, 3500] {
            assert_eq!(
                interpolate_multi_point(query, &sorted),
                interpolate_multi_point(query, &shuffled)
            );
        }
    }

    #[test]
    fn test_multi_point_exact_match_short_circuits() {
        let points = [(1000, 10.0), (2000, 20.0), (3000, 40.0)];
        assert_eq!(interpolate_multi_point(2000, &points), Some(20.0));
    }

    #[test]
    fn test_multi_point_clamps_to_extremes() {
        let points = [(1000, 10.0), (2000, 20.0)];
        assert_eq!(interpolate_multi_point(100, &points), Some(10.0));
        assert_eq!(interpolate_multi_point(9000, &points), Some(20.0));
    }

    #[test]
    fn test_multi_point_picks_tightest_bracket() {
        let points = [(1000, 10.0), (2000, 20.0), (4000, 60.0)];
        // Query between 2000 and 4000 must ignore the 1000 point
        assert_eq!(interpolate_multi_point(3000, &points), Some(40.0));
    }

    #[test]
    fn test_confidence_higher_near_midpoint() {
        let mid = confidence(1500, 1000, 2000, MAX_INTERPOLATION_GAP_DAYS);
        let edge = confidence(1050, 1000, 2000, MAX_INTERPOLATION_GAP_DAYS);
        assert!(mid > edge);
    }

    #[test]
    fn test_confidence_higher_for_smaller_span() {
        // Same relative query position, different spans
        let tight = confidence(1500, 1000, 2000, MAX_INTERPOLATION_GAP_DAYS);
        let wide = confidence(
            43_200_500,
            1000,
            86_400_000,
            MAX_INTERPOLATION_GAP_DAYS,
        );
        assert!(tight > wide);
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let score = confidence(1500, 1000, 2000, MAX_INTERPOLATION_GAP_DAYS);
        assert!(score > 0.0 && score <= 1.0);

        let degenerate = confidence(1000, 1000, 1000, MAX_INTERPOLATION_GAP_DAYS);
        assert_eq!(degenerate, 1.0);
    }
}
