//! Angle helpers for the scan sweep. All angles are in degrees.

/// Arcs narrower than this do not scan; the head stares along the heading.
pub const MIN_ACTIVE_ARC_DEG: f64 = 10.0;
/// Arcs wider than this spin continuously without reversing.
pub const MAX_REVERSING_ARC_DEG: f64 = 180.0;

/// Clamp an arc width to the range the reversal check works with.
///
/// Non-finite input is treated as the narrowest arc.
#[inline]
pub fn clamp_arc(arc_width_deg: f64) -> f64 {
    if arc_width_deg.is_nan() || arc_width_deg < MIN_ACTIVE_ARC_DEG {
        MIN_ACTIVE_ARC_DEG
    } else if arc_width_deg > MAX_REVERSING_ARC_DEG {
        MAX_REVERSING_ARC_DEG
    } else {
        arc_width_deg
    }
}

/// Shift `head_bearing` by a full turn when it lies more than
/// `arc_width/2 + 90` away from `walk_heading`, so the boundary comparison
/// never straddles the 0/360 seam.
#[inline]
pub fn normalize_arc(head_bearing: f64, walk_heading: f64, arc_width: f64) -> f64 {
    let margin = arc_width / 2.0 + 90.0;
    if head_bearing < walk_heading - margin {
        head_bearing + 360.0
    } else if head_bearing > walk_heading + margin {
        head_bearing - 360.0
    } else {
        head_bearing
    }
}

/// Wrap any angle into `[0, 360)`.
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let w = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if w >= 360.0 { 0.0 } else { w }
}

/// Heading (in `[0, 360)`) of an inclination difference vector.
///
/// Forward (x) is 0 and angles grow counter-clockwise, matching the body's
/// walking frame.
#[inline]
pub fn heading_from_inclination(dx: f64, dy: f64) -> f64 {
    let mut deg = dy.atan2(dx).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }
    wrap_degrees(deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(5.0, 10.0)]
    #[case(10.0, 10.0)]
    #[case(30.0, 30.0)]
    #[case(180.0, 180.0)]
    #[case(270.0, 180.0)]
    #[case(-1.0, 10.0)]
    #[case(f64::NAN, 10.0)]
    fn clamp_arc_cases(#[case] arc: f64, #[case] expected: f64) {
        assert_eq!(clamp_arc(arc), expected);
    }

    #[test]
    fn normalize_shifts_across_seam() {
        // heading 0, arc 30 => margin 105
        assert_eq!(normalize_arc(350.0, 0.0, 30.0), -10.0);
        assert_eq!(normalize_arc(10.0, 350.0, 30.0), 370.0);
        assert_eq!(normalize_arc(100.0, 0.0, 30.0), 100.0);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(2.0, 0.0, 0.0)]
    #[case(0.0, 1.0, 90.0)]
    #[case(-1.0, 0.0, 180.0)]
    #[case(0.0, -2.0, 270.0)]
    fn inclination_heading_quadrants(#[case] dx: f64, #[case] dy: f64, #[case] deg: f64) {
        assert!((heading_from_inclination(dx, dy) - deg).abs() < 1e-9);
    }

    #[test]
    fn wrap_handles_negative_and_full_turns() {
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
        assert!(wrap_degrees(-1e-18) < 360.0);
    }

    proptest! {
        #[test]
        fn normalize_is_identity_inside_margin(
            heading in 0.0f64..360.0,
            arc in 10.0f64..=180.0,
            frac in -1.0f64..=1.0,
        ) {
            let margin = arc / 2.0 + 90.0;
            let bearing = heading + frac * margin;
            prop_assert_eq!(normalize_arc(bearing, heading, arc), bearing);
        }

        #[test]
        fn wrapped_angles_stay_in_range(a in -1e6f64..1e6) {
            let w = wrap_degrees(a);
            prop_assert!((0.0..360.0).contains(&w));
        }

        #[test]
        fn inclination_heading_in_range(dx in -10.0f64..10.0, dy in -10.0f64..10.0) {
            let h = heading_from_inclination(dx, dy);
            prop_assert!((0.0..360.0).contains(&h));
        }
    }
}
