//! Captured images and the template matching contract.

use std::ops::Range;

use thiserror::Error;

use crate::Position;

/// RGB image captured from the game window or its minimap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

/// Error returned when pixel data does not match the declared dimensions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("expected {expected} pixels for the declared dimensions, got {actual}")]
pub struct ImageSizeError {
    expected: usize,
    actual: usize,
}

impl Image {
    /// Wraps row-major RGB pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self, ImageSizeError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImageSizeError {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates an image where every pixel has the same colour.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at the provided coordinate, if it lies within the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Copies the region spanned by `columns` and `rows`, clamped to the image.
    #[must_use]
    pub fn crop(&self, columns: Range<u32>, rows: Range<u32>) -> Image {
        let left = columns.start.min(self.width);
        let right = columns.end.clamp(left, self.width);
        let top = rows.start.min(self.height);
        let bottom = rows.end.clamp(top, self.height);

        let mut pixels = Vec::with_capacity(((right - left) * (bottom - top)) as usize);
        for row in top..bottom {
            let start = row as usize * self.width as usize;
            pixels.extend_from_slice(&self.pixels[start + left as usize..start + right as usize]);
        }

        Image {
            width: right - left,
            height: bottom - top,
            pixels,
        }
    }

    /// Fraction of pixels whose luma falls strictly below `max_luma`.
    ///
    /// An empty image reports `0.0`.
    #[must_use]
    pub fn dark_fraction(&self, max_luma: u8) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let dark = self
            .pixels
            .iter()
            .filter(|&&rgb| luma(rgb) < max_luma)
            .count();
        dark as f64 / self.pixels.len() as f64
    }

    /// Keeps pixels whose HSV value lies inside any of `ranges`, blacking out the rest.
    #[must_use]
    pub fn filter_color(&self, ranges: &[ColorRange]) -> Image {
        let pixels = self
            .pixels
            .iter()
            .map(|&rgb| {
                let hsv = to_hsv(rgb);
                if ranges.iter().any(|range| range.contains(hsv)) {
                    rgb
                } else {
                    [0, 0, 0]
                }
            })
            .collect();
        Image {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Converts a pixel coordinate into a normalised position within this image.
    #[must_use]
    pub fn relative(&self, x: u32, y: u32) -> Position {
        let width = f64::from(self.width.max(1));
        let height = f64::from(self.height.max(1));
        Position::new(f64::from(x) / width, f64::from(y) / height)
    }
}

/// Inclusive HSV bounds using the 8-bit convention (hue in `0..=180`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    lower: [u8; 3],
    upper: [u8; 3],
}

impl ColorRange {
    /// Creates a range from its lower and upper HSV corners.
    #[must_use]
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Reports whether the HSV triple lies inside the range.
    #[must_use]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        hsv.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (low, high))| low <= value && value <= high)
    }
}

/// Templates the monitor searches for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    /// Rune symbol on the minimap.
    Rune,
    /// Stranger marker on the minimap.
    OtherPlayer,
    /// Guild member marker on the minimap.
    GuildMember,
    /// NPC dialog prompt in the game frame.
    Dialog,
}

/// Single template match reported by a [`Matcher`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Column of the match centre.
    pub x: u32,
    /// Row of the match centre.
    pub y: u32,
    /// Normalised correlation score in `0.0..=1.0`.
    pub score: f32,
}

/// Template matching backend.
pub trait Matcher: Send + Sync {
    /// All non-overlapping matches of `template` scoring at least `threshold`.
    fn multi_match(&self, image: &Image, template: Template, threshold: f32) -> Vec<Match>;
}

fn luma([red, green, blue]: [u8; 3]) -> u8 {
    let weighted = 299 * u32::from(red) + 587 * u32::from(green) + 114 * u32::from(blue);
    ((weighted + 500) / 1000) as u8
}

fn to_hsv([red, green, blue]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (f32::from(red), f32::from(green), f32::from(blue));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    [(hue / 2.0).round() as u8, saturation.round() as u8, max as u8]
}
