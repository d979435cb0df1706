//! # Pixel scanning primitives
//!
//! Free functions operating on a binary mask, a pixel is lit when its value is non-zero.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::GrayImage;

use super::LaneParams;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Return true if the pixel at the given column and row is lit.
///
/// Out of bounds pixels are never lit.
pub fn is_lit(mask: &GrayImage, col: i32, row: u32) -> bool {
    if col < 0 || col as u32 >= mask.width() || row >= mask.height() {
        return false;
    }

    mask.get_pixel(col as u32, row)[0] > 0
}

/// Find the first lit column at or to the right of `from` on the given row.
pub fn scan_right(mask: &GrayImage, row: u32, from: i32) -> Option<i32> {
    if row >= mask.height() {
        return None;
    }

    (from.max(0)..mask.width() as i32).find(|&col| is_lit(mask, col, row))
}

/// Find the first lit column at or to the left of `from` on the given row.
pub fn scan_left(mask: &GrayImage, row: u32, from: i32) -> Option<i32> {
    if row >= mask.height() {
        return None;
    }

    let start = from.min(mask.width() as i32 - 1);

    (0..=start).rev().find(|&col| is_lit(mask, col, row))
}

/// Correct an implausible gap between the left and right edges.
///
/// Once a pair has been corrected applying this function again returns the same pair.
pub fn correct_gap(left_x: i32, right_x: i32, params: &LaneParams) -> (i32, i32) {
    let gap = right_x - left_x;

    if gap < params.min_gap_px as i32 {
        (
            params.collapsed_pair.0 as i32,
            params.collapsed_pair.1 as i32,
        )
    } else if gap < params.narrow_gap_px as i32 {
        (left_x, left_x + params.lane_width_px as i32)
    } else if gap > params.max_gap_px as i32 {
        (params.wide_pair.0 as i32, params.wide_pair.1 as i32)
    } else {
        (left_x, right_x)
    }
}

/// Clamp a pair of edges into the mask, keeping the right edge strictly right of the left one.
pub fn clamp_edges(left_x: i32, right_x: i32, width: u32) -> (i32, i32) {
    let max_col = width as i32 - 1;

    let left_x = left_x.max(0).min(max_col - 1);
    let right_x = right_x.max(left_x + 1).min(max_col);

    (left_x, right_x)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Luma;

    fn mask_with(width: u32, height: u32, lit: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y) in lit {
            mask.put_pixel(x, y, Luma([255]));
        }
        mask
    }

    #[test]
    fn test_scan_finds_first_lit_column() {
        let mask = mask_with(640, 480, &[(100, 445), (180, 445), (420, 445), (500, 445)]);

        assert_eq!(scan_right(&mask, 445, 300), Some(420));
        assert_eq!(scan_left(&mask, 445, 300), Some(180));

        // Inclusive of the start column
        assert_eq!(scan_right(&mask, 445, 420), Some(420));
        assert_eq!(scan_left(&mask, 445, 180), Some(180));

        // Other rows see nothing
        assert_eq!(scan_right(&mask, 444, 300), None);
        assert_eq!(scan_left(&mask, 446, 300), None);
    }

    #[test]
    fn test_scan_every_start_column() {
        let lit = [37u32, 211, 398, 602];
        let mask = mask_with(640, 480, &lit.iter().map(|&x| (x, 445)).collect::<Vec<_>>());

        for from in 0..640i32 {
            let expected_right = lit.iter().map(|&x| x as i32).find(|&x| x >= from);
            let expected_left = lit.iter().rev().map(|&x| x as i32).find(|&x| x <= from);

            assert_eq!(scan_right(&mask, 445, from), expected_right, "from {}", from);
            assert_eq!(scan_left(&mask, 445, from), expected_left, "from {}", from);
        }
    }

    #[test]
    fn test_scan_out_of_bounds() {
        let mask = mask_with(64, 48, &[(0, 10), (63, 10)]);

        assert_eq!(scan_right(&mask, 10, -20), Some(0));
        assert_eq!(scan_right(&mask, 10, 64), None);
        assert_eq!(scan_left(&mask, 10, 200), Some(63));
        assert_eq!(scan_left(&mask, 10, -1), None);
        assert_eq!(scan_right(&mask, 48, 0), None);
    }

    #[test]
    fn test_correct_gap() {
        let params = LaneParams::default();

        assert_eq!(correct_gap(300, 305, &params), (220, 380));
        assert_eq!(correct_gap(300, 300, &params), (220, 380));
        assert_eq!(correct_gap(200, 260, &params), (200, 330));
        assert_eq!(correct_gap(10, 630, &params), (350, 520));
        assert_eq!(correct_gap(200, 400, &params), (200, 400));
        assert_eq!(correct_gap(100, 200, &params), (100, 200));
        assert_eq!(correct_gap(0, 600, &params), (0, 600));
    }

    #[test]
    fn test_correct_gap_idempotent() {
        let params = LaneParams::default();

        for left in (-200..700).step_by(7) {
            for right in (-200..900).step_by(11) {
                let once = correct_gap(left, right, &params);
                let gap = once.1 - once.0;

                assert!(gap >= 100 && gap <= 600, "{:?} -> {:?}", (left, right), once);
                assert_eq!(correct_gap(once.0, once.1, &params), once);
            }
        }
    }

    #[test]
    fn test_clamp_edges() {
        assert_eq!(clamp_edges(-80, 50, 640), (0, 50));
        assert_eq!(clamp_edges(600, 730, 640), (600, 639));
        assert_eq!(clamp_edges(639, 769, 640), (638, 639));
        assert_eq!(clamp_edges(220, 380, 640), (220, 380));
    }
}
