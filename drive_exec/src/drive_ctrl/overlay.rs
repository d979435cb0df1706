//! # Overlay rendering
//!
//! Draws the lane mask with the ranging samples and the lane markers on top of it. The overlay
//! is for display only.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;

use image::{GrayImage, Rgb, RgbImage};
use log::warn;

use crate::{
    lane::LanePosition,
    sensor_hub::{fusion, FusedSensors},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pixels per meter of ranging distance.
const RANGE_SCALE_PX_PER_M: f64 = 350.0;

const RANGE_DOT_HALF_PX: i32 = 10;
const MARKER_HALF_PX: i32 = 15;

const RANGE_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);
const EDGE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOUR: Rgb<u8> = Rgb([0, 255, 255]);
const SCAN_ROW_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Receives the overlay of each cycle.
pub trait OverlaySink: Send {
    /// Called once per cycle before rendering, the overlay is only rendered if this returns
    /// `true`.
    fn wants_overlay(&mut self) -> bool {
        true
    }

    fn overlay(&mut self, image: &RgbImage);
}

impl<F> OverlaySink for F
where
    F: FnMut(&RgbImage) + Send,
{
    fn overlay(&mut self, image: &RgbImage) {
        self(image)
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Saves one overlay in every `every_n` as a PNG file in a directory.
pub struct PngSaver {
    dir: PathBuf,
    every_n: u64,
    num_cycles: u64,
    num_saved: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PngSaver {
    /// Create a saver writing into `dir`, which must exist. An `every_n` of zero is treated as
    /// one.
    pub fn new<P: Into<PathBuf>>(dir: P, every_n: u64) -> Self {
        Self {
            dir: dir.into(),
            every_n: every_n.max(1),
            num_cycles: 0,
            num_saved: 0,
        }
    }

    pub fn num_saved(&self) -> u64 {
        self.num_saved
    }
}

impl OverlaySink for PngSaver {
    fn wants_overlay(&mut self) -> bool {
        let wanted = self.num_cycles % self.every_n == 0;
        self.num_cycles += 1;
        wanted
    }

    fn overlay(&mut self, image: &RgbImage) {
        let path = self.dir.join(format!("overlay_{:06}.png", self.num_saved));
        match image.save(&path) {
            Ok(()) => self.num_saved += 1,
            Err(e) => warn!("Could not save overlay {:?}: {}", path, e),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Render the overlay.
///
/// Ranging samples are drawn right sector first, sample `i` at an angle of `i / sector_ratio`
/// degrees about the bottom center of the image.
pub fn render(
    mask: &GrayImage,
    lane: &LanePosition,
    fused: &FusedSensors,
    scan_row: u32,
    sector_ratio: f64,
) -> RgbImage {
    let (width, height) = mask.dimensions();

    let mut img = RgbImage::from_fn(width, height, |x, y| {
        let v = mask.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    for x in 0..width {
        for y in scan_row.saturating_sub(1)..(scan_row + 1).min(height) {
            img.put_pixel(x, y, SCAN_ROW_COLOUR);
        }
    }

    // Anything further than this from the origin cannot touch the image
    let max_r = f64::from(width).hypot(f64::from(height)) + f64::from(RANGE_DOT_HALF_PX);

    let samples = fused
        .right_sector_m
        .iter()
        .chain(fused.left_sector_m.iter());

    for (i, range_m) in samples.enumerate() {
        if !fusion::is_valid(*range_m) {
            continue;
        }

        let angle = (i as f64 / sector_ratio).to_radians();
        let r = range_m * RANGE_SCALE_PX_PER_M;
        if r > max_r {
            continue;
        }

        let x = (width / 2) as i32 + (r * angle.cos()) as i32;
        let y = height as i32 - (r * angle.sin()) as i32;

        fill_square(&mut img, x, y, RANGE_DOT_HALF_PX, RANGE_COLOUR);
    }

    let row = scan_row as i32;
    fill_square(&mut img, lane.last_center, row, MARKER_HALF_PX, CENTER_COLOUR);
    fill_square(&mut img, lane.left_x, row, MARKER_HALF_PX, EDGE_COLOUR);
    fill_square(&mut img, lane.right_x, row, MARKER_HALF_PX, EDGE_COLOUR);

    img
}

/// Fill a square centered on a point, clipped to the image.
fn fill_square(img: &mut RgbImage, cx: i32, cy: i32, half: i32, colour: Rgb<u8>) {
    let (width, height) = (img.width() as i32, img.height() as i32);

    for y in cy.saturating_sub(half).max(0)..cy.saturating_add(half).min(height) {
        for x in cx.saturating_sub(half).max(0)..cx.saturating_add(half).min(width) {
            img.put_pixel(x as u32, y as u32, colour);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Luma;

    #[test]
    fn test_render_markers() {
        let mut mask = GrayImage::new(640, 480);
        mask.put_pixel(5, 5, Luma([255]));

        let lane = LanePosition::from_edges(250, 380);
        let img = render(&mask, &lane, &FusedSensors::default(), 445, 1.4027);

        assert_eq!(img.dimensions(), (640, 480));
        assert_eq!(*img.get_pixel(5, 5), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(6, 5), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(250, 445), EDGE_COLOUR);
        assert_eq!(*img.get_pixel(380, 440), EDGE_COLOUR);
        assert_eq!(*img.get_pixel(315, 445), CENTER_COLOUR);
        assert_eq!(*img.get_pixel(100, 445), SCAN_ROW_COLOUR);
    }

    #[test]
    fn test_render_ranging() {
        let mask = GrayImage::new(640, 480);
        let lane = LanePosition::from_edges(250, 380);

        // One sample straight along the x axis, 0.5 m away
        let fused = FusedSensors {
            right_sector_m: vec![0.5],
            left_sector_m: vec![-1.0; 10],
            ..Default::default()
        };
        let img = render(&mask, &lane, &fused, 445, 1.4027);

        assert_eq!(*img.get_pixel(320 + 175, 475), RANGE_COLOUR);
        assert_eq!(*img.get_pixel(320, 470), Rgb([0, 0, 0]));

        // Markers partly outside the image are clipped
        let lane = LanePosition::from_edges(0, 639);
        render(&mask, &lane, &fused, 479, 1.4027);
    }

    #[test]
    fn test_render_far_ranging() {
        let mask = GrayImage::new(640, 480);
        let lane = LanePosition::from_edges(250, 380);

        let fused = FusedSensors {
            right_sector_m: vec![1.0e7, f64::MAX, 1.0e12],
            left_sector_m: vec![f64::MAX; 4],
            ..Default::default()
        };
        let img = render(&mask, &lane, &fused, 445, 1.4027);

        assert!(img.pixels().all(|p| *p != RANGE_COLOUR));

        // Markers far outside the image draw nothing
        let lane = LanePosition {
            left_x: i32::MIN,
            right_x: i32::MAX,
            center: 0,
            last_center: i32::MAX,
        };
        render(&mask, &lane, &fused, 445, 1.4027);
    }

    #[test]
    fn test_png_saver() {
        let dir = tempfile::tempdir().unwrap();
        let mut saver = PngSaver::new(dir.path(), 3);
        let img = RgbImage::new(8, 8);

        let mut num_rendered = 0;
        for _ in 0..7 {
            if saver.wants_overlay() {
                saver.overlay(&img);
                num_rendered += 1;
            }
        }

        assert_eq!(num_rendered, 3);
        assert_eq!(saver.num_saved(), 3);
        for i in 0..3 {
            assert!(dir.path().join(format!("overlay_{:06}.png", i)).exists());
        }
        assert!(!dir.path().join("overlay_000003.png").exists());
    }
}
