use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A numeric form field exactly as the user entered it.
///
/// Quantities, prices and discounts arrive from editable forms as numbers,
/// numeric strings, empty strings or `null`. The raw text is preserved so a
/// resumed quotation shows what was typed; parsing happens leniently at
/// pricing time and never fails.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FormNumber(String);

impl FormNumber {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Leading integer of the field, ignoring anything after it (`"2.7"` is 2,
    /// `"3 pcs"` is 3). `None` when the field does not start with a digit.
    pub fn leading_integer(&self) -> Option<i64> {
        let (negative, digits) = split_sign(self.0.trim_start());
        let end = digits.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(digits.len());
        if end == 0 {
            return None;
        }

        // Saturate absurdly long inputs instead of rejecting them.
        let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        Some(if negative { -magnitude } else { magnitude })
    }

    /// Leading decimal number of the field (`"1500.50/-"` is 1500.50,
    /// `"1,000"` is 1). `None` when the field does not start with a number.
    pub fn leading_decimal(&self) -> Option<Decimal> {
        let (negative, rest) = split_sign(self.0.trim_start());

        let mut end = 0;
        let mut seen_digit = false;
        let mut seen_point = false;
        for (index, ch) in rest.char_indices() {
            match ch {
                '0'..='9' => {
                    seen_digit = true;
                    end = index + 1;
                }
                '.' if !seen_point => {
                    seen_point = true;
                    if seen_digit {
                        end = index + 1;
                    }
                }
                _ => break,
            }
        }
        if !seen_digit {
            return None;
        }

        let literal = rest[..end].trim_end_matches('.');
        let literal = if literal.starts_with('.') { format!("0{literal}") } else { literal.to_string() };
        let value = Decimal::from_str(&literal).ok()?;
        Some(if negative { -value } else { value })
    }
}

fn split_sign(input: &str) -> (bool, &str) {
    match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    }
}

impl fmt::Display for FormNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FormNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for FormNumber {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<Decimal> for FormNumber {
    fn from(value: Decimal) -> Self {
        Self(value.normalize().to_string())
    }
}

impl Serialize for FormNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let trimmed = self.0.trim();
        if let Ok(integer) = trimmed.parse::<i64>() {
            return serializer.serialize_i64(integer);
        }
        match trimmed.parse::<f64>() {
            Ok(float) if float.is_finite() && !trimmed.is_empty() => serializer.serialize_f64(float),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for FormNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FormNumberVisitor)
    }
}

struct FormNumberVisitor;

impl<'de> Visitor<'de> for FormNumberVisitor {
    type Value = FormNumber;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number, a string or null")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(FormNumber(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(FormNumber(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(FormNumber(value.to_string()))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(FormNumber(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(FormNumber(value))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
        Ok(FormNumber::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FormNumber::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FormNumber::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}
