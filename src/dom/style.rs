// SPDX-License-Identifier: PMPL-1.0-or-later
//! Inline style cascade for the static document.
//!
//! Computes the subset of CSS the audit needs from `style` attributes, a small
//! user-agent sheet, and inheritance from the parent's computed style. Author
//! colors are normalized to the `rgb()`/`rgba()` form a browser reports from
//! `getComputedStyle` before they reach [`Color::parse`].

use super::{ComputedStyle, Display, Visibility};
use crate::color::Color;

/// Tags the user-agent sheet never renders
pub(super) const UA_HIDDEN_TAGS: &[&str] = &[
    "head", "meta", "link", "style", "script", "noscript", "template", "title", "base",
];

const UA_BLOCK_TAGS: &[&str] = &[
    "html", "body", "div", "p", "section", "article", "aside", "header", "footer", "main",
    "nav", "form", "fieldset", "ul", "ol", "li", "dl", "dt", "dd", "h1", "h2", "h3", "h4",
    "h5", "h6", "blockquote", "pre", "figure", "figcaption", "address", "details", "summary",
    "hr", "table", "dialog",
];

const UA_BOLD_TAGS: &[&str] = &["b", "strong", "th", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Split a `style` attribute into lowercase property / raw value pairs
pub(super) fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_string();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value))
            }
        })
        .collect()
}

/// Last declared value for a property
pub(super) fn declared<'a>(decls: &'a [(String, String)], prop: &str) -> Option<&'a str> {
    decls
        .iter()
        .rev()
        .find(|(p, _)| p == prop)
        .map(|(_, v)| v.as_str())
}

/// Normalize an author color value to computed `rgb()`/`rgba()` notation.
///
/// Returns `None` for values a browser would drop as invalid, so the property
/// falls back to its inherited or initial value. `currentcolor` is resolved by
/// the caller.
pub fn normalize_color(value: &str) -> Option<String> {
    let v = value.trim().to_ascii_lowercase();
    if v == "transparent" {
        return Some(Color::TRANSPARENT.to_string());
    }
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex).map(|c| c.to_string());
    }
    if v.starts_with("rgb") {
        return Color::try_parse(&v).map(|c| c.to_string());
    }
    named_color(&v).map(|c| c.to_string())
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::clamped(
            nibble(0)? as i64,
            nibble(1)? as i64,
            nibble(2)? as i64,
            nibble(3)? as f64 / 255.0,
        )),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::clamped(
            byte(0)? as i64,
            byte(2)? as i64,
            byte(4)? as i64,
            byte(6)? as f64 / 255.0,
        )),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "dimgray" | "dimgrey" => (105, 105, 105),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        "pink" => (255, 192, 203),
        "whitesmoke" => (245, 245, 245),
        "gainsboro" => (220, 220, 220),
        _ => return None,
    };
    Some(Color::rgb(r, g, b))
}

/// Resolve a color declaration against the current text color
fn resolve_color(value: &str, current: Color) -> Option<Color> {
    if value.trim().eq_ignore_ascii_case("currentcolor") {
        return Some(current);
    }
    normalize_color(value).map(|computed| Color::parse(&computed))
}

/// Parse a length in px relative to a reference font size. Percentages and
/// `em` resolve against `reference`, `rem` against 16px.
pub(super) fn parse_length(value: &str, reference: f64) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let number = |s: &str| s.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    if let Some(n) = v.strip_suffix("px") {
        number(n)
    } else if let Some(n) = v.strip_suffix("rem") {
        number(n).map(|n| n * 16.0)
    } else if let Some(n) = v.strip_suffix("em") {
        number(n).map(|n| n * reference)
    } else if let Some(n) = v.strip_suffix("pt") {
        number(n).map(|n| n * 4.0 / 3.0)
    } else if let Some(n) = v.strip_suffix('%') {
        number(n).map(|n| n / 100.0 * reference)
    } else {
        number(&v).filter(|n| *n == 0.0)
    }
}

fn font_size(value: &str, parent: f64) -> Option<f64> {
    let keyword = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(parent / 1.2),
        "larger" => Some(parent * 1.2),
        _ => None,
    };
    keyword.or_else(|| parse_length(value, parent)).filter(|px| *px >= 0.0)
}

fn font_weight(value: &str, parent: u16) -> Option<u16> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(if parent < 600 { 700 } else { 900 }),
        "lighter" => Some(if parent > 500 { 400 } else { 100 }),
        v => v.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}

fn opacity(value: &str) -> Option<f64> {
    let v = value.trim();
    let n = match v.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => v.parse::<f64>().ok()?,
    };
    n.is_finite().then(|| n.clamp(0.0, 1.0))
}

fn default_font_size(tag: &str, parent: f64) -> f64 {
    match tag {
        "h1" => 32.0,
        "h2" => 24.0,
        "h3" => 18.72,
        "h5" => 13.28,
        "h6" => 10.72,
        "small" => parent / 1.2,
        _ => parent,
    }
}

fn default_display(tag: &str, hidden_attr: bool) -> Display {
    if hidden_attr || UA_HIDDEN_TAGS.contains(&tag) {
        Display::None
    } else if UA_BLOCK_TAGS.contains(&tag) {
        Display::Block
    } else if matches!(tag, "button" | "input" | "select" | "textarea" | "img") {
        Display::InlineBlock
    } else {
        Display::Inline
    }
}

/// Element facts the cascade needs, independent of the arena layout
pub(super) struct StyleInput<'a> {
    pub tag: &'a str,
    pub style_attr: Option<&'a str>,
    pub hidden_attr: bool,
    pub aria_hidden_attr: bool,
}

/// Compute an element's style given its parent's computed style
pub(super) fn compute(input: &StyleInput<'_>, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let inherited = parent.cloned().unwrap_or_default();
    let decls = input.style_attr.map(parse_declarations).unwrap_or_default();
    let tag = input.tag;

    let font_size_px = declared(&decls, "font-size")
        .and_then(|v| font_size(v, inherited.font_size_px))
        .unwrap_or_else(|| default_font_size(tag, inherited.font_size_px));

    let ua_weight = if UA_BOLD_TAGS.contains(&tag) {
        700
    } else {
        inherited.font_weight
    };
    let font_weight = declared(&decls, "font-weight")
        .and_then(|v| font_weight(v, inherited.font_weight))
        .unwrap_or(ua_weight);

    let text_color = declared(&decls, "color")
        .and_then(|v| resolve_color(v, inherited.text_color))
        .unwrap_or(inherited.text_color);

    let (background_color, painted) = background(&decls, text_color);

    let visibility = match declared(&decls, "visibility").map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "hidden" => Visibility::Hidden,
        Some(v) if v == "collapse" => Visibility::Collapse,
        Some(v) if v == "visible" => Visibility::Visible,
        _ => inherited.visibility,
    };

    let display = declared(&decls, "display")
        .and_then(Display::parse)
        .unwrap_or_else(|| default_display(tag, input.hidden_attr));

    ComputedStyle {
        text_color,
        background_color,
        background_is_image_or_gradient: painted,
        opacity: declared(&decls, "opacity").and_then(opacity).unwrap_or(1.0),
        visibility,
        display,
        font_size_px,
        font_weight,
        aria_hidden: inherited.aria_hidden || input.aria_hidden_attr,
    }
}

/// Background color plus whether the background paints an image, a gradient
/// or is clipped to text. Declarations apply in order, and the `background`
/// shorthand resets the longhands declared before it.
fn background(decls: &[(String, String)], text_color: Color) -> (Color, bool) {
    let mut color = Color::TRANSPARENT;
    let mut image = false;
    let mut clip_text = false;
    for (prop, value) in decls {
        let lower = value.trim().to_ascii_lowercase();
        match prop.as_str() {
            "background-color" => {
                if let Some(c) = resolve_color(value, text_color) {
                    color = c;
                }
            }
            "background-image" => image = lower != "none",
            "background-clip" | "-webkit-background-clip" => clip_text = lower == "text",
            "background" => {
                image = lower.contains("url(") || lower.contains("gradient(");
                clip_text = lower.split_whitespace().any(|t| t == "text");
                color = background_shorthand_color(&lower, text_color).unwrap_or(Color::TRANSPARENT);
            }
            _ => {}
        }
    }
    (color, image || clip_text)
}

fn background_shorthand_color(value: &str, text_color: Color) -> Option<Color> {
    // rgb() contains spaces after commas, so try the functional form first.
    if let Some(start) = value.find("rgb") {
        let end = value[start..].find(')')? + start + 1;
        return resolve_color(&value[start..end], text_color);
    }
    value
        .split_whitespace()
        .find_map(|token| resolve_color(token, text_color))
}
