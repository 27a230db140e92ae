// THEORY:
// Classification is one algorithm parameterized by a pixel conversion strategy.
// The RGB, HSV and HSL variants only differ in how a captured RGB pixel is turned
// into the three working channels, and in whether the first channel (hue) is a
// ring. A plain enum carries that strategy; the engine never needs to know which
// one it holds beyond calling `convert` and `prepare`.

use serde::{Deserialize, Serialize};

use crate::core_modules::color_category::ColorCategory;
use crate::core_modules::pixel::pixel::Pixel;

/// The color space thresholds are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Channels tested exactly as captured.
    Rgb,
    /// Hue, saturation, value, each rescaled to 0..255.
    #[default]
    Hsv,
    /// Hue, saturation, lightness, each rescaled to 0..255.
    Hsl,
}

impl ColorSpace {
    /// Converts a captured RGB pixel into the working channels.
    #[inline]
    pub fn convert(self, rgb: [u8; 3]) -> [u8; 3] {
        match self {
            ColorSpace::Rgb => rgb,
            ColorSpace::Hsv => Pixel::from(rgb).to_hsv_bytes(),
            ColorSpace::Hsl => Pixel::from(rgb).to_hsl_bytes(),
        }
    }

    /// Hue wraps around, so its range test must be circular.
    pub fn has_circular_hue(self) -> bool {
        matches!(self, ColorSpace::Hsv | ColorSpace::Hsl)
    }

    pub fn channel_names(self) -> [&'static str; 3] {
        match self {
            ColorSpace::Rgb => ["Red", "Green", "Blue"],
            ColorSpace::Hsv => ["Hue", "Saturation", "Value"],
            ColorSpace::Hsl => ["Hue", "Saturation", "Lightness"],
        }
    }

    /// Applies the strategy's precondition to a category list before a scan.
    /// Hue spaces force the first channel of every category to be circular.
    pub fn prepare(self, categories: &mut [ColorCategory]) {
        if self.has_circular_hue() {
            for category in categories.iter_mut() {
                category.wrap_first_channel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_category::{ColorRange, DisplayColor};

    #[test]
    fn rgb_is_identity() {
        assert_eq!(ColorSpace::Rgb.convert([12, 34, 56]), [12, 34, 56]);
    }

    #[test]
    fn hsv_and_hsl_share_hue() {
        let rgb = [30, 160, 90];
        assert_eq!(
            ColorSpace::Hsv.convert(rgb)[0],
            ColorSpace::Hsl.convert(rgb)[0]
        );
    }

    #[test]
    fn prepare_wraps_hue_only_for_hue_spaces() {
        let make = || {
            vec![
                ColorCategory::background("background", DisplayColor::BLACK),
                ColorCategory::new(
                    "red",
                    ColorRange::from_bounds((250, 10), (100, 255), (100, 255)),
                    DisplayColor::new(255, 0, 0),
                ),
            ]
        };

        let mut rgb = make();
        ColorSpace::Rgb.prepare(&mut rgb);
        assert!(!rgb[1].range.unwrap().channels[0].circular);

        let mut hsv = make();
        ColorSpace::Hsv.prepare(&mut hsv);
        assert!(hsv[1].range.unwrap().channels[0].circular);
        assert_eq!(hsv[0].range, None);
    }

    #[test]
    fn names_deserialize_lowercase() {
        let space: ColorSpace = serde_json::from_str("\"hsl\"").unwrap();
        assert_eq!(space, ColorSpace::Hsl);
        assert_eq!(space.channel_names()[2], "Lightness");
    }
}
