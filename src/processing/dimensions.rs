//! Target-size math for the preparatory downsample.

use crate::core::Dimensions;

/// Anchor (px) the shorter side is scaled to
pub const SMART_ANCHOR_PX: u32 = 200;

/// Aspect ratios within this distance of 1.0 count as square
const SQUARE_TOLERANCE: f64 = 0.1;

/// Compute the downsample target for a source of `width` x `height`.
///
/// Near-square sources collapse to a fixed 200x200 target. Everything else
/// scales so the shorter side becomes exactly 200 px and the longer side
/// keeps the aspect ratio, rounded to nearest. Pure function; the target is
/// independent of any configured limits.
pub fn calculate_smart_dimensions(width: u32, height: u32) -> Dimensions {
    if width == 0 || height == 0 {
        return Dimensions::new(SMART_ANCHOR_PX, SMART_ANCHOR_PX);
    }

    let ratio = width as f64 / height as f64;
    // Boundary ratios like 1.1 must still count as square
    if (ratio - 1.0).abs() <= SQUARE_TOLERANCE + f64::EPSILON {
        return Dimensions::new(SMART_ANCHOR_PX, SMART_ANCHOR_PX);
    }

    if width < height {
        let scaled = (height as f64 / width as f64 * SMART_ANCHOR_PX as f64).round() as u32;
        Dimensions::new(SMART_ANCHOR_PX, scaled)
    } else {
        let scaled = (ratio * SMART_ANCHOR_PX as f64).round() as u32;
        Dimensions::new(scaled, SMART_ANCHOR_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_square_collapses_to_anchor() {
        assert_eq!(calculate_smart_dimensions(1000, 1000), Dimensions::new(200, 200));
        assert_eq!(calculate_smart_dimensions(3, 3), Dimensions::new(200, 200));
    }

    #[test]
    fn near_square_ratios_are_square_inclusive_of_bounds() {
        // 1.1 and ~0.909 sit exactly on the tolerance edge
        assert_eq!(calculate_smart_dimensions(1100, 1000), Dimensions::new(200, 200));
        assert_eq!(calculate_smart_dimensions(1000, 1100), Dimensions::new(200, 200));
        assert_eq!(calculate_smart_dimensions(909, 1000), Dimensions::new(200, 200));
    }

    #[test]
    fn just_outside_tolerance_scales_normally() {
        assert_eq!(calculate_smart_dimensions(1110, 1000), Dimensions::new(222, 200));
        // Portrait needs a wider margin: 1000/1110 is ~0.901, still square
        assert_eq!(calculate_smart_dimensions(1000, 1120), Dimensions::new(200, 224));
    }

    #[test]
    fn landscape_anchors_the_height() {
        assert_eq!(calculate_smart_dimensions(800, 400), Dimensions::new(400, 200));
        assert_eq!(calculate_smart_dimensions(4000, 2000), Dimensions::new(400, 200));
    }

    #[test]
    fn portrait_anchors_the_width() {
        assert_eq!(calculate_smart_dimensions(400, 800), Dimensions::new(200, 400));
    }

    #[test]
    fn long_side_rounds_to_nearest() {
        // 1000/300 * 200 = 666.67
        assert_eq!(calculate_smart_dimensions(1000, 300), Dimensions::new(667, 200));
    }

    #[test]
    fn degenerate_input_falls_back_to_anchor() {
        assert_eq!(calculate_smart_dimensions(0, 500), Dimensions::new(200, 200));
        assert_eq!(calculate_smart_dimensions(500, 0), Dimensions::new(200, 200));
    }

    #[test]
    fn computation_is_pure() {
        let first = calculate_smart_dimensions(1234, 567);
        let second = calculate_smart_dimensions(1234, 567);
        assert_eq!(first, second);
    }
}
