//! Region-of-interest selection.
//!
//! Prompt rectangles are authored as fractions of a 16:9 frame. Other aspect
//! ratios keep the horizontal field of view centred: the extra (or missing)
//! width is split evenly between both sides, and vertical bounds are only
//! rescaled when the target height ratio differs from 9.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in absolute frame pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "21:9")]
    UltraWide,
    #[serde(rename = "4:3")]
    Classic,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [AspectRatio::Wide, AspectRatio::UltraWide, AspectRatio::Classic];

    pub const fn x(self) -> u32 {
        match self {
            AspectRatio::Wide => 16,
            AspectRatio::UltraWide => 21,
            AspectRatio::Classic => 4,
        }
    }

    pub const fn y(self) -> u32 {
        match self {
            AspectRatio::Wide => 9,
            AspectRatio::UltraWide => 9,
            AspectRatio::Classic => 3,
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.x(), self.y())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.to_string() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("unknown aspect ratio: {s}"))
    }
}

/// Rectangle in fractions of the frame size, `(x1, y1)` top-left to `(x2, y2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FracRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FracRect {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Remap a rectangle authored for 16:9 to `ratio`.
    pub fn from_16_9(self, ratio: AspectRatio) -> Self {
        let (w_from, h_from) = (16.0f32, 9.0f32);
        let (w_to, h_to) = (ratio.x() as f32, ratio.y() as f32);

        let offset = (w_to - w_from) / 2.0;
        let x1 = (self.x1 * w_from + offset) / w_to;
        let x2 = (self.x2 * w_from + offset) / w_to;

        let (y1, y2) = if ratio.y() == 9 {
            (self.y1, self.y2)
        } else {
            (self.y1 * h_from / h_to, self.y2 * h_from / h_to)
        };

        Self { x1, y1, x2, y2 }
    }

    /// Absolute pixel bounds for a `width`×`height` frame (truncated, clamped to the frame).
    pub fn to_pixels(self, width: u32, height: u32) -> Rect {
        let px = |frac: f32, size: u32| ((size as f32 * frac).max(0.0) as u32).min(size);
        let x1 = px(self.x1, width);
        let y1 = px(self.y1, height);
        let x2 = px(self.x2, width).max(x1);
        let y2 = px(self.y2, height).max(y1);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// How the prompt region is derived from the current frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSelector {
    /// Whole frame.
    Full,
    /// Right-hand `fraction` of the frame, full height.
    RightFraction { fraction: f32 },
    /// A 16:9-authored rectangle remapped to `ratio`.
    Fraction { rect: FracRect, ratio: AspectRatio },
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::RightFraction { fraction: 0.5 }
    }
}

impl RegionSelector {
    pub fn select(&self, width: u32, height: u32) -> Rect {
        match *self {
            RegionSelector::Full => Rect::new(0, 0, width, height),
            RegionSelector::RightFraction { fraction } => {
                let fraction = fraction.clamp(0.0, 1.0);
                FracRect::new(1.0 - fraction, 0.0, 1.0, 1.0).to_pixels(width, height)
            }
            RegionSelector::Fraction { rect, ratio } => rect.from_16_9(ratio).to_pixels(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn wide_is_identity() {
        let r = FracRect::new(0.65, 0.49, 0.86, 0.62);
        let c = r.from_16_9(AspectRatio::Wide);
        assert!(close(c.x1, r.x1) && close(c.x2, r.x2));
        assert!(close(c.y1, r.y1) && close(c.y2, r.y2));
    }

    #[test]
    fn ultrawide_centres_horizontal_margin() {
        // (0.5 * 16 + 2.5) / 21
        let c = FracRect::new(0.5, 0.2, 0.75, 0.4).from_16_9(AspectRatio::UltraWide);
        assert!(close(c.x1, 10.5 / 21.0));
        assert!(close(c.x2, 14.5 / 21.0));
        assert!(close(c.y1, 0.2) && close(c.y2, 0.4));
    }

    #[test]
    fn classic_rescales_vertical() {
        let c = FracRect::new(0.5, 0.1, 0.6, 0.2).from_16_9(AspectRatio::Classic);
        // offset = (4 - 16) / 2 = -6
        assert!(close(c.x1, (8.0 - 6.0) / 4.0));
        assert!(close(c.y1, 0.1 * 9.0 / 3.0));
        assert!(close(c.y2, 0.2 * 9.0 / 3.0));
    }

    #[test]
    fn to_pixels_clamps_to_frame() {
        let r = FracRect::new(-0.2, 0.5, 1.5, 2.0).to_pixels(200, 100);
        assert_eq!(r, Rect::new(0, 50, 200, 50));
    }

    #[test]
    fn right_fraction_selects_right_half() {
        let r = RegionSelector::RightFraction { fraction: 0.5 }.select(1920, 1080);
        assert_eq!(r, Rect::new(960, 0, 960, 1080));
    }

    #[test]
    fn aspect_ratio_parses_display() {
        for r in AspectRatio::ALL {
            assert_eq!(r.to_string().parse::<AspectRatio>().unwrap(), r);
        }
        assert!("5:4".parse::<AspectRatio>().is_err());
    }
}
