// This is free and unencumbered software released into the public domain.

use derive_more::Display;

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
#[display("{width}x{height}")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    fn has_aspect_of(&self, other: Size) -> bool {
        self.height as u64 * other.width as u64 == self.width as u64 * other.height as u64
    }
}

/// Chooses the preview resolution among the sizes a camera can output.
///
/// Only sizes within `max` sharing the aspect ratio of `desired` qualify.
/// The smallest qualifying size covering `desired` wins; failing that the
/// largest one below it; failing that `default`.
pub fn choose_optimal_size(choices: &[Size], desired: Size, max: Size, default: Size) -> Size {
    let mut big_enough: Option<Size> = None;
    let mut not_big_enough: Option<Size> = None;

    for option in choices {
        if option.width > max.width || option.height > max.height || !option.has_aspect_of(desired)
        {
            continue;
        }
        if option.width >= desired.width && option.height >= desired.height {
            if big_enough.is_none_or(|b| option.area() < b.area()) {
                big_enough = Some(*option);
            }
        } else if not_big_enough.is_none_or(|b| option.area() > b.area()) {
            not_big_enough = Some(*option);
        }
    }

    big_enough.or(not_big_enough).unwrap_or(default)
}
