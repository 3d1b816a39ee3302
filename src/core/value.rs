//! Engineering values - physical quantities in SI-prefixed form
//!
//! A value is kept as `significand × 10^order_of_magnitude` where the order
//! of magnitude is a multiple of three between femto (-15) and tera (12).
//! Significands are normalized into `[1, 1000)` and rounded to
//! [`SIGNIFICAND_DECIMALS`] decimal places, which makes the prefixed string
//! rendering an exact round trip.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::rating::RatingKind;

/// Decimal places kept in a significand
pub const SIGNIFICAND_DECIMALS: i32 = 6;

/// SI prefixes supported for rating values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiPrefix {
    Femto,
    Pico,
    Nano,
    Micro,
    Milli,
    Unit,
    Kilo,
    Mega,
    Giga,
    Tera,
}

impl SiPrefix {
    /// All prefixes, smallest first
    pub fn all() -> &'static [SiPrefix] {
        &[
            SiPrefix::Femto,
            SiPrefix::Pico,
            SiPrefix::Nano,
            SiPrefix::Micro,
            SiPrefix::Milli,
            SiPrefix::Unit,
            SiPrefix::Kilo,
            SiPrefix::Mega,
            SiPrefix::Giga,
            SiPrefix::Tera,
        ]
    }

    /// Power of ten denoted by this prefix
    pub fn exponent(&self) -> i32 {
        match self {
            SiPrefix::Femto => -15,
            SiPrefix::Pico => -12,
            SiPrefix::Nano => -9,
            SiPrefix::Micro => -6,
            SiPrefix::Milli => -3,
            SiPrefix::Unit => 0,
            SiPrefix::Kilo => 3,
            SiPrefix::Mega => 6,
            SiPrefix::Giga => 9,
            SiPrefix::Tera => 12,
        }
    }

    /// Prefix letter, empty for the unprefixed unit
    pub fn symbol(&self) -> &'static str {
        match self {
            SiPrefix::Femto => "f",
            SiPrefix::Pico => "p",
            SiPrefix::Nano => "n",
            SiPrefix::Micro => "µ",
            SiPrefix::Milli => "m",
            SiPrefix::Unit => "",
            SiPrefix::Kilo => "k",
            SiPrefix::Mega => "M",
            SiPrefix::Giga => "G",
            SiPrefix::Tera => "T",
        }
    }

    pub fn from_exponent(exponent: i32) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.exponent() == exponent)
    }

    /// Resolve a prefix letter. `u` is accepted as an ASCII stand-in for `µ`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "u" | "μ" => Some(SiPrefix::Micro),
            _ => Self::all().iter().copied().find(|p| p.symbol() == symbol),
        }
    }
}

/// Engineering value encoding failures
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ValueError {
    #[error("{value} is outside the supported range (femto to tera)")]
    #[diagnostic(code(warehouse::value::magnitude_out_of_range))]
    MagnitudeOutOfRange { value: f64 },

    #[error("cannot parse '{input}': {reason}")]
    #[diagnostic(code(warehouse::value::parse))]
    Parse { input: String, reason: String },

    #[error("'{input}' does not end in unit {expected}")]
    #[diagnostic(
        code(warehouse::value::unit_mismatch),
        help("write the value as <number><prefix>{expected}, e.g. 4.7k{expected}")
    )]
    UnitMismatch {
        input: String,
        expected: &'static str,
    },
}

impl ValueError {
    fn parse(input: &str, reason: impl Into<String>) -> Self {
        ValueError::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A physical quantity tagged with the rating kind it measures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeringValue {
    significand: f64,
    order_of_magnitude: i32,
    kind: RatingKind,
}

impl EngineeringValue {
    /// Build a value from a raw quantity expressed in the kind's base unit
    pub fn from_value(raw: f64, kind: RatingKind) -> Result<Self, ValueError> {
        if !raw.is_finite() {
            return Err(ValueError::MagnitudeOutOfRange { value: raw });
        }
        if raw == 0.0 {
            return Ok(Self::zero(kind));
        }
        if !kind.is_prefixable() {
            return Ok(Self {
                significand: finite_significand(raw, raw)?,
                order_of_magnitude: 0,
                kind,
            });
        }

        let order = (raw.abs().log10() / 3.0).floor() as i32 * 3;
        Self::normalized(scale(raw, -order), order, raw, kind)
    }

    /// Parse `<number><prefix><unit>`, e.g. `4.7nF` or `-5%`
    pub fn from_prefixed_str(input: &str, kind: RatingKind) -> Result<Self, ValueError> {
        let unit = kind.unit_symbol();
        let body = input
            .trim()
            .strip_suffix(unit)
            .ok_or_else(|| ValueError::UnitMismatch {
                input: input.to_string(),
                expected: unit,
            })?
            .trim_end();

        let (number, prefix) = match body.chars().last() {
            None => return Err(ValueError::parse(input, "missing number")),
            Some(c) if c.is_ascii_digit() || c == '.' => (body, SiPrefix::Unit),
            Some(c) => {
                let symbol = c.to_string();
                let prefix = SiPrefix::from_symbol(&symbol).ok_or_else(|| {
                    ValueError::parse(input, format!("unrecognized prefix '{}'", symbol))
                })?;
                (body[..body.len() - c.len_utf8()].trim_end(), prefix)
            }
        };

        if prefix != SiPrefix::Unit && !kind.is_prefixable() {
            return Err(ValueError::parse(
                input,
                format!("{} does not take an SI prefix", kind.name()),
            ));
        }

        let significand = parse_decimal(number).ok_or_else(|| {
            ValueError::parse(input, format!("'{}' is not a decimal number", number))
        })?;

        if significand == 0.0 {
            return Ok(Self::zero(kind));
        }
        if !kind.is_prefixable() {
            return Ok(Self {
                significand: finite_significand(significand, significand)?,
                order_of_magnitude: 0,
                kind,
            });
        }

        let raw = scale(significand, prefix.exponent());
        Self::normalized(significand, prefix.exponent(), raw, kind)
    }

    /// Like [`from_prefixed_str`](Self::from_prefixed_str), but a missing
    /// unit symbol is implied: `4.7k` reads as `4.7kΩ` for a resistance
    pub fn from_input(input: &str, kind: RatingKind) -> Result<Self, ValueError> {
        match Self::from_prefixed_str(input, kind) {
            Err(ValueError::UnitMismatch { .. }) => {
                Self::from_prefixed_str(&format!("{}{}", input.trim(), kind.unit_symbol()), kind)
            }
            other => other,
        }
    }

    fn zero(kind: RatingKind) -> Self {
        Self {
            significand: 0.0,
            order_of_magnitude: 0,
            kind,
        }
    }

    /// Move the significand into `[1, 1000)` and check the prefix range
    fn normalized(
        significand: f64,
        order: i32,
        raw: f64,
        kind: RatingKind,
    ) -> Result<Self, ValueError> {
        let out_of_range = || ValueError::MagnitudeOutOfRange { value: raw };
        if !significand.is_finite() {
            return Err(out_of_range());
        }
        let mut significand = significand;
        let mut order = order;

        // Every step must land on a known prefix, so both loops are bounded
        while significand.abs() >= 1000.0 {
            order += 3;
            SiPrefix::from_exponent(order).ok_or_else(out_of_range)?;
            significand /= 1000.0;
        }
        while significand.abs() < 1.0 {
            order -= 3;
            SiPrefix::from_exponent(order).ok_or_else(out_of_range)?;
            significand *= 1000.0;
        }
        SiPrefix::from_exponent(order).ok_or_else(out_of_range)?;

        // Rounding can carry into the next prefix
        let mut significand = finite_significand(significand, raw)?;
        if significand.abs() >= 1000.0 {
            order += 3;
            SiPrefix::from_exponent(order).ok_or_else(out_of_range)?;
            significand = round_significand(significand / 1000.0);
        }

        Ok(Self {
            significand,
            order_of_magnitude: order,
            kind,
        })
    }

    pub fn significand(&self) -> f64 {
        self.significand
    }

    pub fn order_of_magnitude(&self) -> i32 {
        self.order_of_magnitude
    }

    pub fn kind(&self) -> RatingKind {
        self.kind
    }

    pub fn unit_symbol(&self) -> &'static str {
        self.kind.unit_symbol()
    }

    /// `significand × 10^order_of_magnitude` in the kind's base unit
    pub fn to_value(&self) -> f64 {
        scale(self.significand, self.order_of_magnitude)
    }

    /// The value expressed in units of `10^exponent` (e.g. -6 for micro)
    pub fn value_in(&self, exponent: i32) -> f64 {
        scale(self.significand, self.order_of_magnitude - exponent)
    }

    pub fn prefix(&self) -> SiPrefix {
        SiPrefix::from_exponent(self.order_of_magnitude).unwrap_or(SiPrefix::Unit)
    }

    /// Prefix letter plus unit symbol, e.g. `nF`
    pub fn prefixed_unit_symbol(&self) -> String {
        format!("{}{}", self.prefix().symbol(), self.unit_symbol())
    }

    /// Canonical rendering, e.g. `4.7nF`
    pub fn to_prefixed_string(&self) -> String {
        format!(
            "{}{}",
            format_significand(self.significand),
            self.prefixed_unit_symbol()
        )
    }

    /// Approximate equality for values reconstructed through the store
    pub fn approx_eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let (a, b) = (self.to_value(), other.to_value());
        (a - b).abs() <= f64::EPSILON * 8.0 * a.abs().max(b.abs())
    }
}

impl fmt::Display for EngineeringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prefixed_string())
    }
}

/// Multiply by `10^exponent` using only exact powers of ten
fn scale(value: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value * 10f64.powi(exponent)
    } else {
        value / 10f64.powi(-exponent)
    }
}

fn round_significand(value: f64) -> f64 {
    let factor = 10f64.powi(SIGNIFICAND_DECIMALS);
    let rounded = (value * factor).round() / factor;
    // -0.0 would render with a sign
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounded significand, or `MagnitudeOutOfRange` when scaling overflowed
fn finite_significand(value: f64, raw: f64) -> Result<f64, ValueError> {
    let rounded = round_significand(value);
    if rounded.is_finite() {
        Ok(rounded)
    } else {
        Err(ValueError::MagnitudeOutOfRange { value: raw })
    }
}

fn format_significand(significand: f64) -> String {
    let text = format!("{:.*}", SIGNIFICAND_DECIMALS as usize, significand);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Plain decimal: optional sign, digits, at most one point
fn parse_decimal(text: &str) -> Option<f64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_value_normalizes_to_prefix_boundary() {
        let v = EngineeringValue::from_value(4700.0, RatingKind::Resistance).unwrap();
        assert_eq!(v.significand(), 4.7);
        assert_eq!(v.order_of_magnitude(), 3);
        assert_eq!(v.to_prefixed_string(), "4.7kΩ");
    }

    #[test]
    fn test_nano_farad_rendering() {
        let v = EngineeringValue::from_value(4.7e-9, RatingKind::Capacitance).unwrap();
        assert_eq!(v.to_prefixed_string(), "4.7nF");

        let parsed = EngineeringValue::from_prefixed_str("4.7nF", RatingKind::Capacitance).unwrap();
        assert_eq!(parsed.significand(), 4.7);
        assert_eq!(parsed.order_of_magnitude(), -9);
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_zero_has_no_prefix() {
        let v = EngineeringValue::from_value(0.0, RatingKind::Voltage).unwrap();
        assert_eq!(v.order_of_magnitude(), 0);
        assert_eq!(v.to_prefixed_string(), "0V");

        let v = EngineeringValue::from_value(-0.0, RatingKind::Voltage).unwrap();
        assert_eq!(v.to_prefixed_string(), "0V");
    }

    #[test]
    fn test_negative_values_keep_sign() {
        let v = EngineeringValue::from_value(-0.012, RatingKind::Current).unwrap();
        assert_eq!(v.to_prefixed_string(), "-12mA");

        let tol = EngineeringValue::from_prefixed_str("-5%", RatingKind::Tolerance).unwrap();
        assert_eq!(tol.significand(), -5.0);
        assert_eq!(tol.to_prefixed_string(), "-5%");
    }

    #[test]
    fn test_tolerance_is_never_prefixed() {
        let v = EngineeringValue::from_value(0.1, RatingKind::Tolerance).unwrap();
        assert_eq!(v.order_of_magnitude(), 0);
        assert_eq!(v.to_prefixed_string(), "0.1%");

        let err = EngineeringValue::from_prefixed_str("5m%", RatingKind::Tolerance).unwrap_err();
        assert!(matches!(err, ValueError::Parse { .. }));
    }

    #[test]
    fn test_rounding_carries_into_next_prefix() {
        let v = EngineeringValue::from_value(999.99999999, RatingKind::Voltage).unwrap();
        assert_eq!(v.significand(), 1.0);
        assert_eq!(v.order_of_magnitude(), 3);
        assert_eq!(v.to_prefixed_string(), "1kV");
    }

    #[test]
    fn test_small_significand_moves_to_smaller_prefix() {
        let v = EngineeringValue::from_prefixed_str("0.0000001V", RatingKind::Voltage).unwrap();
        assert_eq!(v.to_prefixed_string(), "100nV");

        let tiny = format!("0.{}1V", "0".repeat(320));
        let err = EngineeringValue::from_prefixed_str(&tiny, RatingKind::Voltage).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));
    }

    #[test]
    fn test_parse_renormalizes_oversized_significand() {
        let v = EngineeringValue::from_prefixed_str("4700nF", RatingKind::Capacitance).unwrap();
        assert_eq!(v.significand(), 4.7);
        assert_eq!(v.order_of_magnitude(), -6);
        assert_eq!(v.to_prefixed_string(), "4.7µF");
    }

    #[test]
    fn test_micro_ascii_alias() {
        let a = EngineeringValue::from_prefixed_str("10uH", RatingKind::Inductance).unwrap();
        let b = EngineeringValue::from_prefixed_str("10µH", RatingKind::Inductance).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_letter_units() {
        let v = EngineeringValue::from_prefixed_str("16 MHz", RatingKind::Frequency).unwrap();
        assert_eq!(v.order_of_magnitude(), 6);
        assert_eq!(v.to_prefixed_string(), "16MHz");
    }

    #[test]
    fn test_out_of_range_magnitudes_fail() {
        let err = EngineeringValue::from_value(1e-18, RatingKind::Capacitance).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));

        let err = EngineeringValue::from_value(5e15, RatingKind::Frequency).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));

        let err = EngineeringValue::from_value(f64::NAN, RatingKind::Power).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));

        let err = EngineeringValue::from_prefixed_str("2000TΩ", RatingKind::Resistance).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));
    }

    #[test]
    fn test_extreme_finite_inputs_fail_instead_of_looping() {
        for raw in [1e-307, f64::MIN_POSITIVE, 5e-324, -1e-310, f64::MAX, -f64::MAX] {
            let err = EngineeringValue::from_value(raw, RatingKind::Capacitance).unwrap_err();
            assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }), "{raw}");
        }

        let huge = format!("{:.0}V", f64::MAX);
        let err = EngineeringValue::from_prefixed_str(&huge, RatingKind::Voltage).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));

        let huge = format!("{:.0}%", f64::MAX);
        let err = EngineeringValue::from_prefixed_str(&huge, RatingKind::Tolerance).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));

        let err = RatingKind::Capacitance.value_from_column(1e-310).unwrap_err();
        assert!(matches!(err, ValueError::MagnitudeOutOfRange { .. }));
    }

    #[test]
    fn test_parse_failures() {
        let err = EngineeringValue::from_prefixed_str("4.7xF", RatingKind::Capacitance).unwrap_err();
        assert!(matches!(err, ValueError::Parse { .. }));

        let err = EngineeringValue::from_prefixed_str("4..7nF", RatingKind::Capacitance).unwrap_err();
        assert!(matches!(err, ValueError::Parse { .. }));

        let err = EngineeringValue::from_prefixed_str("nF", RatingKind::Capacitance).unwrap_err();
        assert!(matches!(err, ValueError::Parse { .. }));

        let err = EngineeringValue::from_prefixed_str("infF", RatingKind::Capacitance).unwrap_err();
        assert!(matches!(err, ValueError::Parse { .. }));
    }

    #[test]
    fn test_unit_mismatch() {
        let err = EngineeringValue::from_prefixed_str("4.7nF", RatingKind::Inductance).unwrap_err();
        assert_eq!(
            err,
            ValueError::UnitMismatch {
                input: "4.7nF".to_string(),
                expected: "H",
            }
        );

        let err = EngineeringValue::from_prefixed_str("4.7k", RatingKind::Resistance).unwrap_err();
        assert!(matches!(err, ValueError::UnitMismatch { .. }));
    }

    #[test]
    fn test_input_with_implied_unit() {
        let r = EngineeringValue::from_input("4.7k", RatingKind::Resistance).unwrap();
        assert_eq!(r.to_prefixed_string(), "4.7kΩ");
        let f = EngineeringValue::from_input("10MHz", RatingKind::Frequency).unwrap();
        assert_eq!(f.to_prefixed_string(), "10MHz");
        assert!(matches!(
            EngineeringValue::from_input("4.7nF", RatingKind::Inductance),
            Err(ValueError::Parse { .. })
        ));
    }

    #[test]
    fn test_prefix_lookup() {
        assert_eq!(SiPrefix::from_exponent(-15), Some(SiPrefix::Femto));
        assert_eq!(SiPrefix::from_exponent(4), None);
        assert_eq!(SiPrefix::from_symbol("M"), Some(SiPrefix::Mega));
        assert_eq!(SiPrefix::from_symbol("m"), Some(SiPrefix::Milli));
        assert_eq!(SiPrefix::from_symbol("x"), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: rendering then parsing yields the identical value.
        #[test]
        fn prefixed_string_round_trips(
            significand in 1.0f64..999.0,
            step in -5i32..=4,
            negative in any::<bool>(),
            kind_index in 0usize..7,
        ) {
            let kind = RatingKind::all()[kind_index];
            let raw = scale(if negative { -significand } else { significand }, step * 3);
            let value = EngineeringValue::from_value(raw, kind).unwrap();
            let text = value.to_prefixed_string();
            let parsed = EngineeringValue::from_prefixed_str(&text, kind).unwrap();
            prop_assert_eq!(parsed, value);
            prop_assert!((parsed.to_value() - raw).abs() <= raw.abs() * 1e-6);
        }

        /// Property: tolerance values round trip without prefixes.
        #[test]
        fn tolerance_round_trips(raw in -100.0f64..100.0) {
            let value = EngineeringValue::from_value(raw, RatingKind::Tolerance).unwrap();
            let parsed = EngineeringValue::from_prefixed_str(&value.to_prefixed_string(), RatingKind::Tolerance).unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}
