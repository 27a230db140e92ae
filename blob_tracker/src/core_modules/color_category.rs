// THEORY:
// A `ColorCategory` is a named threshold rule. Three `RangeTest`s, one per channel
// of the working color space, decide membership; a display color is carried
// along so renderers can paint the category's blobs.
//
// The category list is ordered and the order is part of the contract:
// - Index 0 is always the background. It has no range and nothing is ever
//   classified into it by a test; it only receives pixels no rule claimed.
// - Categories 1..N are tried in list order and the first match wins. There is
//   no distance metric, so overlapping rules are resolved purely by position.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::core_modules::range_test::RangeTest;

/// Index of the background entry in every category list.
pub const BACKGROUND: u8 = 0;

/// Three per-channel bound tests applied to a pixel in the working color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorRange {
    pub channels: [RangeTest; 3],
}

impl ColorRange {
    pub fn new(first: RangeTest, second: RangeTest, third: RangeTest) -> Self {
        Self {
            channels: [first, second, third],
        }
    }

    /// Shorthand for three linear ranges given as `(low, high)` pairs.
    pub fn from_bounds(first: (u8, u8), second: (u8, u8), third: (u8, u8)) -> Self {
        Self::new(
            RangeTest::new(first.0, first.1),
            RangeTest::new(second.0, second.1),
            RangeTest::new(third.0, third.1),
        )
    }

    #[inline]
    pub fn apply(&self, pixel: [u8; 3]) -> bool {
        self.channels[0].apply(pixel[0])
            && self.channels[1].apply(pixel[1])
            && self.channels[2].apply(pixel[2])
    }

    /// The first channel, which holds hue in the HSV and HSL spaces.
    pub fn first_channel_mut(&mut self) -> &mut RangeTest {
        &mut self.channels[0]
    }
}

/// A serde-friendly RGB triple used to paint a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DisplayColor(pub [u8; 3]);

impl DisplayColor {
    pub const BLACK: DisplayColor = DisplayColor([0, 0, 0]);
    pub const WHITE: DisplayColor = DisplayColor([255, 255, 255]);

    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self([red, green, blue])
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

impl From<DisplayColor> for Rgb<u8> {
    fn from(color: DisplayColor) -> Self {
        color.to_rgb()
    }
}

impl From<Rgb<u8>> for DisplayColor {
    fn from(color: Rgb<u8>) -> Self {
        DisplayColor(color.0)
    }
}

/// A named color rule plus the color used to display its blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCategory {
    pub name: String,
    /// `None` for the background entry. A category without a range never matches.
    #[serde(default)]
    pub range: Option<ColorRange>,
    pub display_color: DisplayColor,
}

impl ColorCategory {
    pub fn new(name: impl Into<String>, range: ColorRange, display_color: DisplayColor) -> Self {
        Self {
            name: name.into(),
            range: Some(range),
            display_color,
        }
    }

    /// The entry that belongs at index 0 of every category list.
    pub fn background(name: impl Into<String>, display_color: DisplayColor) -> Self {
        Self {
            name: name.into(),
            range: None,
            display_color,
        }
    }

    /// Is the (already converted) pixel a member of this category?
    #[inline]
    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        self.range.as_ref().is_some_and(|range| range.apply(pixel))
    }

    /// Forces the first channel (hue) to be tested as a ring.
    pub fn wrap_first_channel(&mut self) {
        if let Some(range) = self.range.as_mut() {
            range.first_channel_mut().set_circular(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> ColorCategory {
        ColorCategory::new(
            "red",
            ColorRange::from_bounds((200, 255), (0, 50), (0, 50)),
            DisplayColor::new(255, 0, 0),
        )
    }

    #[test]
    fn all_three_channels_must_pass() {
        let category = red();
        assert!(category.matches([255, 0, 0]));
        assert!(category.matches([200, 50, 50]));
        assert!(!category.matches([199, 0, 0]));
        assert!(!category.matches([255, 51, 0]));
        assert!(!category.matches([255, 0, 51]));
    }

    #[test]
    fn background_never_matches() {
        let background = ColorCategory::background("background", DisplayColor::BLACK);
        assert!(!background.matches([0, 0, 0]));
        assert!(!background.matches([255, 255, 255]));
    }

    #[test]
    fn wrap_first_channel_only_touches_hue() {
        let mut category = ColorCategory::new(
            "magenta",
            ColorRange::from_bounds((240, 15), (100, 255), (100, 255)),
            DisplayColor::new(255, 0, 255),
        );
        assert!(!category.matches([250, 200, 200]));
        category.wrap_first_channel();
        let range = category.range.unwrap();
        assert!(range.channels[0].circular);
        assert!(!range.channels[1].circular);
        assert!(!range.channels[2].circular);
        assert!(category.matches([250, 200, 200]));
        assert!(category.matches([5, 200, 200]));
    }

    #[test]
    fn display_color_converts_to_image_pixel() {
        let rgb: Rgb<u8> = DisplayColor::new(1, 2, 3).into();
        assert_eq!(rgb, Rgb([1, 2, 3]));
    }

    #[test]
    fn category_deserializes_without_range() {
        let json = r#"{"name": "background", "display_color": [0, 0, 0]}"#;
        let category: ColorCategory = serde_json::from_str(json).unwrap();
        assert_eq!(category.range, None);
        assert_eq!(category.display_color, DisplayColor::BLACK);
    }
}
