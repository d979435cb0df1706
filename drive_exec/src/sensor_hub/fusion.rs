//! # Fusion of ranging data
//!
//! The ranging scan is split into a left and a right sector. The sensor is mounted with an offset
//! so the sector boundaries are the nominal angles scaled by a calibration ratio, which is the
//! number of samples per degree.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::range::{LandmarkDetection, NUM_ULTRASONIC};
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Ranging scan split into sectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangingSectors {
    /// Samples covering the left sector, in meters.
    pub left_m: Vec<f64>,

    /// Samples covering the right sector, in meters.
    pub right_m: Vec<f64>,

    /// Minimum valid sample over both sectors, `None` if no sample was valid.
    pub front_clearance_m: Option<f64>,
}

/// Fused view of all non-camera sensors.
///
/// Built from the latest value ever received of each sensor, so values persist while a sensor is
/// silent. Sensors which have never reported are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FusedSensors {
    pub front_clearance_m: Option<f64>,
    pub left_sector_m: Vec<f64>,
    pub right_sector_m: Vec<f64>,
    pub ultrasonic: Option<[i32; NUM_ULTRASONIC]>,
    pub landmark: Option<LandmarkDetection>,

    /// Which sensors updated since the previous snapshot.
    pub fresh: Freshness,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Freshness {
    pub ranging: bool,
    pub ultrasonic: bool,
    pub landmark: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split a ranging scan into sectors.
///
/// The left sector is `[0, 90 * ratio)` and the right sector `[270 * ratio, 360 * ratio)`, both
/// truncated to whole samples and clamped to the length of the scan.
pub fn split_sectors(ranges_m: &[f64], ratio: f64) -> RangingSectors {
    let bound = |deg: f64| ((deg * ratio).floor().max(0.0) as usize).min(ranges_m.len());

    let left_m = ranges_m[..bound(90.0)].to_vec();
    let right_start = bound(270.0);
    let right_end = bound(360.0).max(right_start);
    let right_m = ranges_m[right_start..right_end].to_vec();

    let front_clearance_m = min_valid(left_m.iter().chain(right_m.iter()).copied());

    RangingSectors {
        left_m,
        right_m,
        front_clearance_m,
    }
}

/// Return true if this is a usable ranging sample.
pub fn is_valid(range_m: f64) -> bool {
    range_m.is_finite() && range_m > 0.0
}

/// Minimum of the valid samples.
pub fn min_valid<I: IntoIterator<Item = f64>>(ranges_m: I) -> Option<f64> {
    ranges_m
        .into_iter()
        .filter(|r| is_valid(*r))
        .fold(None, |min, r| match min {
            Some(m) if m <= r => Some(m),
            _ => Some(r),
        })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const RATIO: f64 = 1.4027;

    #[test]
    fn test_split_full_scan() {
        let ranges: Vec<f64> = (0..505).map(|i| i as f64).collect();
        let sectors = split_sectors(&ranges, RATIO);

        // 90 * 1.4027 = 126.24, 270 * 1.4027 = 378.73, 360 * 1.4027 = 504.97
        assert_eq!(sectors.left_m.len(), 126);
        assert_eq!(sectors.left_m[0], 0.0);
        assert_eq!(sectors.left_m[125], 125.0);
        assert_eq!(sectors.right_m.len(), 126);
        assert_eq!(sectors.right_m[0], 378.0);
        assert_eq!(sectors.right_m[125], 503.0);

        // Sample 0 is not valid, so the minimum is 1
        assert_eq!(sectors.front_clearance_m, Some(1.0));
    }

    #[test]
    fn test_split_short_scan() {
        let ranges = vec![2.0; 360];
        let sectors = split_sectors(&ranges, RATIO);

        assert_eq!(sectors.left_m.len(), 126);
        assert!(sectors.right_m.is_empty());

        let sectors = split_sectors(&[], RATIO);
        assert!(sectors.left_m.is_empty());
        assert!(sectors.right_m.is_empty());
        assert_eq!(sectors.front_clearance_m, None);
    }

    #[test]
    fn test_front_clearance_ignores_invalid() {
        let mut ranges = vec![-1.0; 505];
        ranges[10] = 3.5;
        ranges[400] = 1.25;
        ranges[401] = f64::INFINITY;
        ranges[402] = 0.0;
        ranges[403] = f64::NAN;

        // Outside both sectors
        ranges[200] = 0.1;

        let sectors = split_sectors(&ranges, RATIO);
        assert_eq!(sectors.front_clearance_m, Some(1.25));

        let sectors = split_sectors(&vec![-1.0; 505], RATIO);
        assert_eq!(sectors.front_clearance_m, None);
    }
}
