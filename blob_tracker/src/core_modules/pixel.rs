// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the tracker. It is a "dumb"
// data container for one RGB pixel plus the single-pixel transforms the color
// space strategies need: hue, HSV saturation/value and HSL saturation/lightness.
// Nothing here looks at neighbors; spatial logic lives in the blob engine.
//
// Channels are kept in two forms:
//   • raw (0..255 bytes) exactly as captured
//   • normalized (0..1 sRGB), still gamma-encoded
// All heuristics work on the normalized form. Classification thresholds are
// expressed in bytes, so every heuristic has a `*_byte` rescaling:
//   • hue degrees [0, 360) -> round(h * 255 / 360)
//   • unit values [0, 1]   -> round(x * 255)

pub mod pixel {
    pub type Channel = u8;
    pub type NormalizedChannel = f32;
    pub type Hue = f32;
    pub type SaturationHSV = f32;
    pub type SaturationHSL = f32;
    pub type ValueHSV = f32;
    pub type LightnessHSL = f32;
    pub type Chroma = f32;

    const CHROMA_EPSILON: f32 = 1e-6;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The red channel value (0.0-1.0).
        pub red_normalized: NormalizedChannel,
        /// The green channel value (0.0-1.0).
        pub green_normalized: NormalizedChannel,
        /// The blue channel value (0.0-1.0).
        pub blue_normalized: NormalizedChannel,
    }

    impl From<[u8; 3]> for Pixel {
        fn from(rgb: [u8; 3]) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2])
        }
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                red_normalized: red as NormalizedChannel / 255.0,
                green_normalized: green as NormalizedChannel / 255.0,
                blue_normalized: blue as NormalizedChannel / 255.0,
            }
        }

        #[inline]
        fn maximum_channel(&self) -> NormalizedChannel {
            self.red_normalized
                .max(self.green_normalized.max(self.blue_normalized))
        }

        #[inline]
        fn minimum_channel(&self) -> NormalizedChannel {
            self.red_normalized
                .min(self.green_normalized.min(self.blue_normalized))
        }

        /// Hue angle in degrees [0, 360).
        ///
        /// - Gray pixels (no chroma) report 0.
        /// - Sector chosen by the dominant channel, red first on ties.
        pub fn hue(&self) -> Hue {
            let maximum_channel = self.maximum_channel();
            let chroma = maximum_channel - self.minimum_channel();

            if chroma <= CHROMA_EPSILON {
                return 0.0;
            }

            let inverse_chroma = 1.0 / chroma;

            let (base_difference, sector_offset) = if maximum_channel == self.red_normalized {
                (self.green_normalized - self.blue_normalized, 0.0)
            } else if maximum_channel == self.green_normalized {
                (self.blue_normalized - self.red_normalized, 2.0)
            } else {
                (self.red_normalized - self.green_normalized, 4.0)
            };

            let mut hue_degrees = (base_difference * inverse_chroma + sector_offset) * 60.0;
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }
            if hue_degrees >= 360.0 {
                hue_degrees -= 360.0;
            }
            hue_degrees
        }

        /// Chroma (C): max(R,G,B) - min(R,G,B).
        pub fn chroma(&self) -> Chroma {
            self.maximum_channel() - self.minimum_channel()
        }

        /// HSV Value (V): brightness defined as max(R, G, B).
        pub fn value_hsv(&self) -> ValueHSV {
            self.maximum_channel()
        }

        /// Saturation (HSV): S = chroma / value.
        pub fn saturation_hsv(&self) -> SaturationHSV {
            let maximum_channel = self.maximum_channel();
            if maximum_channel <= CHROMA_EPSILON {
                return 0.0;
            }
            self.chroma() / maximum_channel
        }

        /// HSL Lightness (L): midpoint of max and min channels.
        pub fn lightness_hsl(&self) -> LightnessHSL {
            (self.maximum_channel() + self.minimum_channel()) * 0.5
        }

        /// Saturation (HSL): S = chroma / (1 - |2L - 1|).
        pub fn saturation_hsl(&self) -> SaturationHSL {
            let denominator = 1.0 - (2.0 * self.lightness_hsl() - 1.0).abs();
            if denominator <= CHROMA_EPSILON {
                return 0.0;
            }
            (self.chroma() / denominator).min(1.0)
        }

        /// Hue rescaled to a byte so it can be tested like any other channel.
        pub fn hue_byte(&self) -> Channel {
            (self.hue() * 255.0 / 360.0).round().clamp(0.0, 255.0) as Channel
        }

        /// `[hue, saturation, value]`, each rescaled to 0..255.
        pub fn to_hsv_bytes(&self) -> [Channel; 3] {
            [
                self.hue_byte(),
                unit_to_byte(self.saturation_hsv()),
                unit_to_byte(self.value_hsv()),
            ]
        }

        /// `[hue, saturation, lightness]`, each rescaled to 0..255.
        pub fn to_hsl_bytes(&self) -> [Channel; 3] {
            [
                self.hue_byte(),
                unit_to_byte(self.saturation_hsl()),
                unit_to_byte(self.lightness_hsl()),
            ]
        }
    }

    #[inline]
    fn unit_to_byte(value: f32) -> Channel {
        (value * 255.0).round().clamp(0.0, 255.0) as Channel
    }
}
