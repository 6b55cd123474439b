// This is free and unencumbered software released into the public domain.

use derive_more::Display;

/// Ranges starting below this are too slow for preview.
pub const MIN_FPS_LOWER: i32 = 10;

/// Ranges starting at or below this allow long exposures in low light.
pub const LOW_LIGHT_FPS_LOWER: i32 = 15;

/// An auto-exposure target frame-rate range, inclusive on both ends.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[display("[{lower}, {upper}]")]
pub struct FpsRange {
    pub lower: i32,
    pub upper: i32,
}

impl FpsRange {
    pub const fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    pub const fn span(&self) -> i32 {
        self.upper - self.lower
    }
}

impl From<(i32, i32)> for FpsRange {
    fn from((lower, upper): (i32, i32)) -> Self {
        Self::new(lower, upper)
    }
}

pub fn select_fps_range(ranges: &[FpsRange]) -> Option<FpsRange> {
    select_fps_range_with(ranges, MIN_FPS_LOWER, LOW_LIGHT_FPS_LOWER)
}

/// Picks the AE target range for preview.
///
/// The first range whose lower bound reaches `min_lower` is the baseline; a
/// later one replaces it only if its lower bound is at most `low_light_lower`
/// and it spans strictly more frames per second.
pub fn select_fps_range_with(
    ranges: &[FpsRange],
    min_lower: i32,
    low_light_lower: i32,
) -> Option<FpsRange> {
    let mut result: Option<FpsRange> = None;
    for range in ranges.iter().filter(|r| r.lower >= min_lower) {
        match result {
            None => result = Some(*range),
            Some(best) if range.lower <= low_light_lower && range.span() > best.span() => {
                result = Some(*range)
            },
            Some(_) => {},
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(pairs: &[(i32, i32)]) -> Vec<FpsRange> {
        pairs.iter().copied().map(FpsRange::from).collect()
    }

    #[test]
    fn skips_slow_ranges() {
        assert_eq!(select_fps_range(&ranges(&[(5, 30), (7, 15)])), None);
        assert_eq!(select_fps_range(&[]), None);
    }

    #[test]
    fn prefers_widest_low_light_range() {
        let candidates = ranges(&[(15, 15), (30, 30), (10, 30), (15, 30), (7, 30)]);
        assert_eq!(select_fps_range(&candidates), Some(FpsRange::new(10, 30)));
    }

    #[test]
    fn first_range_wins_ties() {
        let candidates = ranges(&[(12, 24), (10, 22), (30, 60)]);
        // (30, 60) is wider but starts above the low-light bound.
        assert_eq!(select_fps_range(&candidates), Some(FpsRange::new(12, 24)));
    }

    #[test]
    fn first_range_is_kept_even_above_low_light_bound() {
        let candidates = ranges(&[(30, 30), (24, 30)]);
        assert_eq!(select_fps_range(&candidates), Some(FpsRange::new(30, 30)));
    }

    #[test]
    fn custom_bounds() {
        let candidates = ranges(&[(5, 30), (20, 30)]);
        assert_eq!(select_fps_range_with(&candidates, 5, 5), Some(FpsRange::new(5, 30)));
        assert_eq!(FpsRange::new(5, 30).to_string(), "[5, 30]");
    }
}
