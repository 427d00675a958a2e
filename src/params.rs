//! Conversion of raw control strings into typed backend parameters.
//!
//! Controls always report their value as a string. Setters on the backend
//! take a single primitive, so the string is converted according to the
//! setter's [`ParamKind`]. Numbers are read with JS `Number` syntax
//! (decimal, `Infinity`, `0x`/`0o`/`0b` literals). Malformed or empty input
//! is never rejected: float setters receive `NaN`, integer setters receive
//! the JS `ToInt32` result (`NaN` and infinities become `0`, fractions
//! truncate toward zero, everything else wraps modulo 2^32).

use std::fmt;

use serde::{Deserialize, Serialize};

/// RGBA colour tuple passed to colour-aware draw entries.
pub type Color = [f32; 4];

/// Alpha component appended to every assembled colour.
pub const COLOR_ALPHA: f32 = 1.0;

/// Type expected by a backend setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Color,
}

/// Typed value forwarded to a backend setter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Color(Color),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::Bool(_) => ParamKind::Bool,
            Self::Color(_) => ParamKind::Color,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Color(color) => write_color(f, color),
        }
    }
}

pub(crate) fn write_color(f: &mut fmt::Formatter<'_>, color: &Color) -> fmt::Result {
    write!(
        f,
        "[{}, {}, {}, {}]",
        color[0], color[1], color[2], color[3]
    )
}

/// Converts the raw string value of a control into the requested kind.
pub fn parse_param(kind: ParamKind, raw: &str) -> ParamValue {
    match kind {
        ParamKind::Int => ParamValue::Int(to_int32(parse_number(raw))),
        ParamKind::Float => ParamValue::Float(parse_number(raw) as f32),
        ParamKind::Bool => ParamValue::Bool(parse_bool(raw)),
        ParamKind::Color => ParamValue::Color(parse_color_list(raw)),
    }
}

fn parse_number(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return f64::NAN;
    }
    if let Some(value) = parse_radix_literal(text) {
        return value;
    }
    let (sign, body) = match text.strip_prefix('-') {
        Some(body) => (-1.0, body),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    // `inf`, `nan` and `infinity` are not JS numbers.
    let starts_like_number = body
        .bytes()
        .next()
        .map_or(false, |b| b.is_ascii_digit() || b == b'.');
    let decimal_only = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !starts_like_number || !decimal_only {
        return f64::NAN;
    }
    body.parse::<f64>().map_or(f64::NAN, |value| sign * value)
}

// Unsigned `0x`, `0o` and `0b` literals.
fn parse_radix_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(f64::NAN);
    }
    Some(
        digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit)),
    )
}

// JS `ToInt32`.
fn to_int32(value: f64) -> i32 {
    const TWO_POW_32: f64 = 4_294_967_296.0;
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(TWO_POW_32) as u32 as i32
}

/// Checkbox reading: `true`, `on` (any case) or `1`.
pub fn parse_bool(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("on") || raw == "1"
}

fn parse_color_list(raw: &str) -> Color {
    let mut channels = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let value = parse_number(part) as f32;
            if value.is_nan() {
                0.0
            } else {
                value
            }
        });
    let mut color = [0.0, 0.0, 0.0, COLOR_ALPHA];
    for slot in color.iter_mut() {
        match channels.next() {
            Some(value) => *slot = value,
            None => break,
        }
    }
    color
}

/// Normalizes a 0-255 channel string to `[0, 1]`, rounded to two decimals.
///
/// Unparseable input becomes `0.0`.
pub fn color_channel(raw: &str) -> f32 {
    let scaled = parse_number(raw) as f32 / 255.0;
    if scaled.is_nan() {
        return 0.0;
    }
    ((scaled * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Builds `[r, g, b, 1.0]` from three raw channel strings.
pub fn assemble_color(channels: [&str; 3]) -> Color {
    [
        color_channel(channels[0]),
        color_channel(channels[1]),
        color_channel(channels[2]),
        COLOR_ALPHA,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round2(value: f32) -> f32 {
        (value * 100.0).round() / 100.0
    }

    #[test]
    fn integer_params_follow_js_coercion() {
        assert_eq!(parse_param(ParamKind::Int, "25"), ParamValue::Int(25));
        assert_eq!(parse_param(ParamKind::Int, " 7 "), ParamValue::Int(7));
        assert_eq!(parse_param(ParamKind::Int, "10.7"), ParamValue::Int(10));
        assert_eq!(parse_param(ParamKind::Int, "-3.9"), ParamValue::Int(-3));
        assert_eq!(parse_param(ParamKind::Int, ""), ParamValue::Int(0));
        assert_eq!(parse_param(ParamKind::Int, "abc"), ParamValue::Int(0));
    }

    #[test]
    fn integers_wrap_like_to_int32() {
        let int = |raw| parse_param(ParamKind::Int, raw);
        assert_eq!(int("4294967306"), ParamValue::Int(10));
        assert_eq!(int("2147483648"), ParamValue::Int(i32::MIN));
        assert_eq!(int("-2147483649"), ParamValue::Int(i32::MAX));
        assert_eq!(int("-1"), ParamValue::Int(-1));
        assert_eq!(int("1e3"), ParamValue::Int(1000));
        assert_eq!(int("Infinity"), ParamValue::Int(0));
    }

    #[test]
    fn numbers_use_js_literal_syntax() {
        let int = |raw| parse_param(ParamKind::Int, raw);
        assert_eq!(int("0x10"), ParamValue::Int(16));
        assert_eq!(int("0o17"), ParamValue::Int(15));
        assert_eq!(int("0b101"), ParamValue::Int(5));
        assert_eq!(int("-0x10"), ParamValue::Int(0));
        assert_eq!(int("0xg"), ParamValue::Int(0));
        assert_eq!(int(".5"), ParamValue::Int(0));
        assert_eq!(int("+7"), ParamValue::Int(7));
        assert_eq!(int("+-7"), ParamValue::Int(0));

        for raw in ["inf", "infinity", "nan", "NaN", "e5", "."] {
            match parse_param(ParamKind::Float, raw) {
                ParamValue::Float(value) => assert!(value.is_nan(), "{raw} -> {value}"),
                other => panic!("expected float, got {other:?}"),
            }
        }
        assert_eq!(
            parse_param(ParamKind::Float, "-Infinity"),
            ParamValue::Float(f32::NEG_INFINITY)
        );
        assert_eq!(parse_param(ParamKind::Float, "5."), ParamValue::Float(5.0));
    }

    #[test]
    fn malformed_float_passes_nan_through() {
        match parse_param(ParamKind::Float, "") {
            ParamValue::Float(value) => assert!(value.is_nan()),
            other => panic!("expected float, got {other:?}"),
        }
        assert_eq!(parse_param(ParamKind::Float, "2.5"), ParamValue::Float(2.5));
    }

    #[test]
    fn booleans_accept_checkbox_spellings() {
        assert_eq!(parse_param(ParamKind::Bool, "true"), ParamValue::Bool(true));
        assert_eq!(parse_param(ParamKind::Bool, "ON"), ParamValue::Bool(true));
        assert_eq!(parse_param(ParamKind::Bool, "1"), ParamValue::Bool(true));
        assert_eq!(parse_param(ParamKind::Bool, "false"), ParamValue::Bool(false));
        assert_eq!(parse_param(ParamKind::Bool, ""), ParamValue::Bool(false));
    }

    #[test]
    fn color_list_defaults_alpha() {
        assert_eq!(
            parse_param(ParamKind::Color, "0.0 0.5 0.9"),
            ParamValue::Color([0.0, 0.5, 0.9, 1.0])
        );
        assert_eq!(
            parse_param(ParamKind::Color, "1, 0, 0, 0.5"),
            ParamValue::Color([1.0, 0.0, 0.0, 0.5])
        );
    }

    #[test]
    fn channels_are_scaled_and_rounded() {
        for channel in 0..=255 {
            let raw = channel.to_string();
            assert_eq!(color_channel(&raw), round2(channel as f32 / 255.0));
        }
        assert_eq!(color_channel("128"), 0.5);
        assert_eq!(color_channel(""), 0.0);
        assert_eq!(color_channel("red"), 0.0);
        assert_eq!(color_channel("400"), 1.0);
    }

    #[test]
    fn assembled_color_always_has_unit_alpha() {
        let color = assemble_color(["255", "128", "0"]);
        assert_eq!(color, [1.0, 0.5, 0.0, 1.0]);
        let color = assemble_color(["", "x", "51"]);
        assert_eq!(color, [0.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn display_matches_js_number_formatting() {
        assert_eq!(ParamValue::Int(25).to_string(), "25");
        assert_eq!(ParamValue::Float(10.0).to_string(), "10");
        assert_eq!(ParamValue::Float(f32::NAN).to_string(), "NaN");
        assert_eq!(
            ParamValue::Color([0.0, 0.5, 0.9, 1.0]).to_string(),
            "[0, 0.5, 0.9, 1]"
        );
    }
}
