//! Preset color handling.
//!
//! The hub only understands 48 preset colors laid out as a grid of twelve
//! hues (30° apart) by four saturation steps (100, 75, 50, 25 %), all at full
//! value. Arbitrary RGB input is snapped to the nearest grid entry.

use crate::constants::{
    COLOR_PRESET_COUNT, MAX_BRIGHTNESS, MAX_MAPPED_COLOR_INDEX, PAYLOAD_SIZE, WHITE_COLOR_INDEX,
};
use crate::error::{HubError, Result};
use std::str::FromStr;
use strum_macros::Display;

/// Weight of the saturation term relative to hue degrees
const SATURATION_WEIGHT: f64 = 0.8;

/// Static color mode byte
const MODE_STATIC: u8 = 0x00;

/// Nominal hue (degrees) and saturation (percent) of preset `index`
pub fn preset_hue_saturation(index: u8) -> (f64, f64) {
    let hue = f64::from(index / 4) * 30.0;
    let saturation = f64::from(4 - index % 4) / 4.0 * 100.0;
    (hue, saturation)
}

/// RGB (0-255 per channel) to HSV with each component in `0.0..=1.0`
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    if max == min {
        return (0.0, 0.0, v);
    }

    let range = max - min;
    let s = range / max;
    let rc = (max - r) / range;
    let gc = (max - g) / range;
    let bc = (max - b) / range;
    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), s, v)
}

/// Index (0-47) of the preset closest to an RGB color.
///
/// Distance is the circular hue difference in degrees plus 0.8 times the
/// saturation difference in percent. Value is ignored. On a tie the lower
/// index wins.
pub fn color_index_for(r: u8, g: u8, b: u8) -> u8 {
    let (h, s, _) = rgb_to_hsv(r, g, b);
    let hue = h * 360.0;
    let saturation = s * 100.0;

    let mut best_index = 0;
    let mut best_distance = f64::INFINITY;
    for index in 0..COLOR_PRESET_COUNT {
        let (preset_hue, preset_saturation) = preset_hue_saturation(index);
        let hue_diff = (hue - preset_hue).abs();
        let hue_diff = hue_diff.min(360.0 - hue_diff);
        let distance = hue_diff + (saturation - preset_saturation).abs() * SATURATION_WEIGHT;
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}

/// Payload of a "set static color" command:
/// `[mode, brightness, speed, color index, length, 0...]`.
///
/// Accepts the 48 grid indices plus the named white slot (48).
pub fn color_command_payload(index: u8, brightness: u8) -> Result<[u8; PAYLOAD_SIZE]> {
    if index > WHITE_COLOR_INDEX {
        return Err(HubError::InvalidColorIndex(index));
    }
    if brightness > MAX_BRIGHTNESS {
        return Err(HubError::InvalidBrightness(brightness));
    }
    let mut payload = [0u8; PAYLOAD_SIZE];
    payload[0] = MODE_STATIC;
    payload[1] = brightness;
    payload[2] = 0; // speed
    payload[3] = index;
    payload[4] = 0; // length
    Ok(payload)
}

/// Named colors offered by the vendor app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ColorPreset {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Cyan,
    Blue,
    Purple,
    Magenta,
    Pink,
    White,
    Off,
}

impl ColorPreset {
    pub const ALL: [ColorPreset; 12] = [
        ColorPreset::Red,
        ColorPreset::Orange,
        ColorPreset::Yellow,
        ColorPreset::Green,
        ColorPreset::Teal,
        ColorPreset::Cyan,
        ColorPreset::Blue,
        ColorPreset::Purple,
        ColorPreset::Magenta,
        ColorPreset::Pink,
        ColorPreset::White,
        ColorPreset::Off,
    ];

    /// Wire color index of the preset
    pub fn index(&self) -> u8 {
        match self {
            ColorPreset::Red => 0,
            ColorPreset::Orange => 4,
            ColorPreset::Yellow => 8,
            ColorPreset::Green => 16,
            ColorPreset::Teal => 20,
            ColorPreset::Cyan => 24,
            ColorPreset::Blue => 32,
            ColorPreset::Purple => 36,
            ColorPreset::Magenta => 40,
            ColorPreset::Pink => 44,
            ColorPreset::White => WHITE_COLOR_INDEX,
            ColorPreset::Off => 0,
        }
    }

    /// Brightness to send for a requested brightness; `off` is always dark.
    pub fn effective_brightness(&self, requested: u8) -> u8 {
        match self {
            ColorPreset::Off => 0,
            _ => requested,
        }
    }
}

impl FromStr for ColorPreset {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ColorPreset::ALL
            .into_iter()
            .find(|preset| preset.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HubError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(color_index_for(255, 0, 0), 0);
        assert_eq!(color_index_for(0, 255, 0), 16);
        assert_eq!(color_index_for(0, 0, 255), 32);
        assert_eq!(color_index_for(255, 165, 0), 4);
        assert_eq!(color_index_for(255, 255, 0), 8);
    }

    #[test]
    fn test_greys_map_to_palest_red() {
        // zero saturation: hue 0, nearest saturation step is 25 %
        for v in [0u8, 1, 128, 255] {
            assert_eq!(color_index_for(v, v, v), 3, "grey {}", v);
        }
    }

    #[test]
    fn test_hue_wraps_around() {
        // hue ~350° is closer to 0° than to 330°
        assert_eq!(color_index_for(255, 0, 43), 0);
        // hue exactly 330°
        assert_eq!(color_index_for(255, 0, 128), 44);
    }

    #[test]
    fn test_preset_grid() {
        assert_eq!(preset_hue_saturation(0), (0.0, 100.0));
        assert_eq!(preset_hue_saturation(3), (0.0, 25.0));
        assert_eq!(preset_hue_saturation(32), (240.0, 100.0));
        assert_eq!(preset_hue_saturation(47), (330.0, 25.0));
    }

    #[test]
    fn test_every_grid_color_maps_to_itself() {
        for index in 0..COLOR_PRESET_COUNT {
            let (hue, saturation) = preset_hue_saturation(index);
            let (r, g, b) = hsv_to_rgb(hue, saturation / 100.0);
            assert_eq!(color_index_for(r, g, b), index, "preset {} via rgb {:?}", index, (r, g, b));
        }
    }

    #[test]
    fn test_white_is_outside_mapped_range() {
        assert!(WHITE_COLOR_INDEX > MAX_MAPPED_COLOR_INDEX);
        assert_eq!(color_index_for(255, 255, 255), 3);
    }

    #[test]
    fn test_total_and_deterministic() {
        for r in (0..=255u8).step_by(5) {
            for g in (0..=255u8).step_by(5) {
                for b in (0..=255u8).step_by(5) {
                    let index = color_index_for(r, g, b);
                    assert!(index <= MAX_MAPPED_COLOR_INDEX);
                    assert_eq!(index, color_index_for(r, g, b));
                }
            }
        }
    }

    #[test]
    fn test_payload_layout() {
        let payload = color_command_payload(32, 75).unwrap();
        assert_eq!(&payload[..5], &[0, 75, 0, 32, 0]);
        assert!(payload[5..].iter().all(|&b| b == 0));
        assert!(color_command_payload(WHITE_COLOR_INDEX, 100).is_ok());
        assert!(matches!(color_command_payload(49, 100), Err(HubError::InvalidColorIndex(49))));
        assert!(matches!(color_command_payload(0, 101), Err(HubError::InvalidBrightness(101))));
    }

    #[test]
    fn test_named_presets() {
        assert_eq!("red".parse::<ColorPreset>().unwrap(), ColorPreset::Red);
        assert_eq!(" Magenta ".parse::<ColorPreset>().unwrap(), ColorPreset::Magenta);
        assert_eq!("WHITE".parse::<ColorPreset>().unwrap().index(), 48);
        assert!(matches!("mauve".parse::<ColorPreset>(), Err(HubError::UnknownPreset(_))));
        assert_eq!(ColorPreset::Off.to_string(), "off");
        assert_eq!(ColorPreset::Off.effective_brightness(80), 0);
        assert_eq!(ColorPreset::Blue.effective_brightness(80), 80);
        for preset in ColorPreset::ALL {
            assert_eq!(preset.to_string().parse::<ColorPreset>().unwrap(), preset);
        }
    }

    /// Integer RGB for a full-value HSV color
    fn hsv_to_rgb(hue: f64, saturation: f64) -> (u8, u8, u8) {
        let c = saturation;
        let h = hue / 60.0;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = 1.0 - c;
        let to_u8 = |v: f64| ((v + m) * 255.0).round() as u8;
        (to_u8(r), to_u8(g), to_u8(b))
    }
}
