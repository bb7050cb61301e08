// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color parsing and the WCAG contrast algorithm.
//!
//! Pure functions only: callers hand in already-extracted style strings.
//! - Normal text needs 4.5:1
//! - Large text (h1-h3, >=24px, or >=18.67px bold) needs 3:1

use regex::Regex;
use std::sync::LazyLock;

/// An sRGB triple
pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);
pub const WHITE: Rgb = (255, 255, 255);

/// Minimum ratio for normal text
pub const NORMAL_TEXT_RATIO: f64 = 4.5;
/// Minimum ratio for large text
pub const LARGE_TEXT_RATIO: f64 = 3.0;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*([^;]+)").expect("valid regex"));
static BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*background(?:-color)?\s*:\s*([^;]+)").expect("valid regex")
});
static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").expect("valid regex")
});
static FONT_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*font-size\s*:\s*([\d.]+)\s*(px|pt|em|rem)?").expect("valid regex")
});
static FONT_WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*font-weight\s*:\s*(bold|bolder|[7-9]00)\b").expect("valid regex")
});

/// Parse a CSS hex color (#rgb, #rrggbb) into (r, g, b) components
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color into (r, g, b)
pub fn parse_rgb_color(value: &str) -> Option<Rgb> {
    let caps = RGB_RE.captures(value)?;
    let r: u8 = caps[1].parse().ok()?;
    let g: u8 = caps[2].parse().ok()?;
    let b: u8 = caps[3].parse().ok()?;
    Some((r, g, b))
}

/// Parse a named CSS color
pub fn parse_named_color(name: &str) -> Option<Rgb> {
    match name {
        "white" => Some(WHITE),
        "black" => Some(BLACK),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "silver" => Some((192, 192, 192)),
        "maroon" => Some((128, 0, 0)),
        "olive" => Some((128, 128, 0)),
        "lime" => Some((0, 255, 0)),
        "aqua" | "cyan" => Some((0, 255, 255)),
        "teal" => Some((0, 128, 128)),
        "navy" => Some((0, 0, 128)),
        "fuchsia" | "magenta" => Some((255, 0, 255)),
        "purple" => Some((128, 0, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

/// Parse any CSS color value into (r, g, b)
pub fn parse_color(value: &str) -> Option<Rgb> {
    let lowered = value.trim().to_lowercase();
    let trimmed = lowered.trim_end_matches("!important").trim();
    if trimmed.starts_with('#') {
        parse_hex_color(trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(trimmed)
    } else {
        parse_named_color(trimmed)
    }
}

/// Render a color as uppercase `#RRGGBB`
pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.0, rgb.1, rgb.2)
}

/// Normalize any parsable color to uppercase 6-digit hex
pub fn normalize_color(value: &str) -> Option<String> {
    parse_color(value).map(to_hex)
}

/// Raw value of the inline `color` declaration
pub fn inline_color(style: &str) -> Option<&str> {
    COLOR_RE
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Raw value of the inline `background-color` (or `background`) declaration
pub fn inline_background(style: &str) -> Option<&str> {
    BACKGROUND_RE
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse a background declaration, accepting a color anywhere in a shorthand
pub fn parse_background(value: &str) -> Option<Rgb> {
    parse_color(value).or_else(|| value.split_whitespace().find_map(parse_color))
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(rgb: Rgb) -> f64 {
    let srgb = [rgb.0, rgb.1, rgb.2].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * srgb[0] + 0.7152 * srgb[1] + 0.0722 * srgb[2]
}

/// Calculate contrast ratio between two colors
/// Returns a ratio >= 1.0 (e.g., 4.5, 7.0, 21.0)
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Declared font size in px (pt and em/rem converted), if any
pub fn font_size_px(style: &str) -> Option<f64> {
    let caps = FONT_SIZE_RE.captures(style)?;
    let size: f64 = caps[1].parse().ok()?;
    let unit = caps.get(2).map(|u| u.as_str().to_lowercase());
    Some(match unit.as_deref() {
        Some("pt") => size * 1.333,
        Some("em") | Some("rem") => size * 16.0,
        _ => size,
    })
}

/// Bold by declaration or by being a `b`/`strong` element
pub fn is_bold(tag: &str, style: &str) -> bool {
    matches!(tag, "b" | "strong") || FONT_WEIGHT_RE.is_match(style)
}

/// Whether text qualifies for the relaxed large-text ratio
pub fn is_large_text(tag: &str, style: &str) -> bool {
    if matches!(tag, "h1" | "h2" | "h3") {
        return true;
    }
    match font_size_px(style) {
        Some(px) if px >= 24.0 => true,
        Some(px) if px >= 18.67 => is_bold(tag, style),
        _ => false,
    }
}

/// Minimum contrast ratio for the text size
pub fn required_ratio(large_text: bool) -> f64 {
    if large_text {
        LARGE_TEXT_RATIO
    } else {
        NORMAL_TEXT_RATIO
    }
}

/// Perceived brightness on a 0..255 scale (0.299R + 0.587G + 0.114B)
pub fn perceived_brightness(rgb: Rgb) -> f64 {
    0.299 * rgb.0 as f64 + 0.587 * rgb.1 as f64 + 0.114 * rgb.2 as f64
}

/// Dark colors get light text and vice versa
pub fn is_dark(rgb: Rgb) -> bool {
    perceived_brightness(rgb) < 128.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some(WHITE));
        assert_eq!(parse_hex_color("#000"), Some(BLACK));
        assert_eq!(parse_hex_color("#ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color("#zzz"), None);
        assert_eq!(parse_hex_color("#é1"), None);
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_rgb_color("rgb(255, 0, 0)"), Some((255, 0, 0)));
        assert_eq!(parse_rgb_color("rgba(0, 128, 0, 0.5)"), Some((0, 128, 0)));
        assert_eq!(parse_rgb_color("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_important_suffix_any_case() {
        assert_eq!(parse_color("#000 !important"), Some((0, 0, 0)));
        assert_eq!(parse_color("#000 !IMPORTANT"), Some((0, 0, 0)));
        assert_eq!(parse_color("Navy !Important"), Some((0, 0, 128)));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_color("#abc").as_deref(), Some("#AABBCC"));
        assert_eq!(normalize_color("rgb(17, 34, 51)").as_deref(), Some("#112233"));
        assert_eq!(normalize_color("navy").as_deref(), Some("#000080"));
        assert_eq!(normalize_color("inherit"), None);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio(BLACK, WHITE);
        assert!((ratio - 21.0).abs() < 0.01, "Black on white should be 21:1, got {:.2}", ratio);
        assert!((contrast_ratio(BLACK, BLACK) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_contrast_ratio_is_symmetric() {
        let pairs = [((119, 119, 119), WHITE), ((255, 0, 0), (0, 0, 128)), (BLACK, (18, 52, 86))];
        for (a, b) in pairs {
            assert!((contrast_ratio(a, b) - contrast_ratio(b, a)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inline_extraction_does_not_confuse_background() {
        let style = "background-color: #000; color: #fff";
        assert_eq!(inline_color(style), Some("#fff"));
        assert_eq!(inline_background(style), Some("#000"));
        assert_eq!(inline_color("background-color: #000"), None);
    }

    #[test]
    fn test_background_shorthand() {
        assert_eq!(parse_background("url(x.png) #333 no-repeat"), Some((51, 51, 51)));
    }

    #[test]
    fn test_large_text() {
        assert!(is_large_text("h2", ""));
        assert!(!is_large_text("h4", ""));
        assert!(is_large_text("p", "font-size: 24px"));
        assert!(is_large_text("p", "font-size: 19pt"));
        assert!(!is_large_text("p", "font-size: 19px"));
        assert!(is_large_text("p", "font-size: 19px; font-weight: bold"));
        assert!(is_large_text("strong", "font-size: 1.2em"));
        assert_eq!(required_ratio(true), 3.0);
        assert_eq!(required_ratio(false), 4.5);
    }

    #[test]
    fn test_brightness() {
        assert!(is_dark((0, 0, 128)));
        assert!(!is_dark((255, 255, 0)));
    }
}
