//! Color palette and custom color validation.
//!
//! # Invariants
//! - Custom colors match `^(#|0x)[0-9a-f]{6}$`, case-insensitive.
//! - Stored colors always use the `#` prefix.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:#|0x)[0-9a-f]{6}$").expect("valid hex color regex"));

/// Named color offered in the color picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSwatch {
    pub name: &'static str,
    pub value: &'static str,
}

/// Picker entry that asks for a hex color.
pub const CUSTOM_CHOICE: &str = "Custom";
/// Picker entry that removes the color.
pub const NONE_CHOICE: &str = "None";

pub const DEFAULT_SWATCHES: &[ColorSwatch] = &[
    ColorSwatch { name: "Navy", value: "#001f3f" },
    ColorSwatch { name: "Blue", value: "#0074D9" },
    ColorSwatch { name: "Aqua", value: "#7FDBFF" },
    ColorSwatch { name: "Teal", value: "#39CCCC" },
    ColorSwatch { name: "Purple", value: "#B10DC9" },
    ColorSwatch { name: "Fuchsia", value: "#F012BE" },
    ColorSwatch { name: "Maroon", value: "#85144b" },
    ColorSwatch { name: "Red", value: "#FF4136" },
    ColorSwatch { name: "Orange", value: "#FF851B" },
    ColorSwatch { name: "Yellow", value: "#FFDC00" },
    ColorSwatch { name: "Olive", value: "#3D9970" },
    ColorSwatch { name: "Green", value: "#2ECC40" },
    ColorSwatch { name: "Lime", value: "#01FF70" },
    ColorSwatch { name: "Black", value: "#111111" },
    ColorSwatch { name: "Gray", value: "#AAAAAA" },
    ColorSwatch { name: "Silver", value: "#DDDDDD" },
    ColorSwatch { name: "White", value: "#FFFFFF" },
];

/// Parsed picker selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Swatch(ColorSwatch),
    Custom,
    None,
}

/// Picker entries in display order: swatches, then `Custom`, then `None`.
pub fn color_choices() -> Vec<&'static str> {
    DEFAULT_SWATCHES
        .iter()
        .map(|swatch| swatch.name)
        .chain([CUSTOM_CHOICE, NONE_CHOICE])
        .collect()
}

/// Maps a picker entry back to its meaning.
pub fn parse_color_choice(choice: &str) -> Option<ColorChoice> {
    match choice {
        CUSTOM_CHOICE => Some(ColorChoice::Custom),
        NONE_CHOICE => Some(ColorChoice::None),
        name => DEFAULT_SWATCHES
            .iter()
            .find(|swatch| swatch.name == name)
            .map(|swatch| ColorChoice::Swatch(*swatch)),
    }
}

pub fn is_valid_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value.trim())
}

/// Validates a custom color and rewrites a `0x` prefix to `#`.
pub fn normalize_custom_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if !is_valid_color(trimmed) {
        return None;
    }
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Some(format!("#{digits}"))
}
