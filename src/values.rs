//! Runtime values
//!
//! Simple values are a single tagged enum keyed by [`TypeKind`] instead of a
//! type per kind. Every kind supports the same small operation set: value
//! equality and hashing, ordering (for ordered kinds), parsing from a literal
//! and formatting back to one.
//!
//! Equality is value based and independent of where a value sits in an object
//! tree: list values compare element-wise, binary values byte-wise,
//! `IgnoreCaseString` values case-insensitively, and floating point values by
//! bit pattern with `0.0 == -0.0` and `NaN == NaN`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use base64::Engine as _;
use chrono::{DateTime, Duration, FixedOffset};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::schema::TypeKind;

// =============================================================================
// Atomic Values
// =============================================================================

/// A value of an atomic kind
#[derive(Debug, Clone)]
pub enum AtomicValue {
    /// String value
    String(String),
    /// Case-insensitive string value
    IgnoreCaseString(String),
    /// Decimal value
    Decimal(Decimal),
    /// Int64 value
    Int64(i64),
    /// Int32 value
    Int32(i32),
    /// Int16 value
    Int16(i16),
    /// SByte value
    SByte(i8),
    /// UInt64 value
    UInt64(u64),
    /// UInt32 value
    UInt32(u32),
    /// UInt16 value
    UInt16(u16),
    /// Byte value
    Byte(u8),
    /// Double value
    Double(f64),
    /// Single value
    Single(f32),
    /// Boolean value
    Boolean(bool),
    /// Binary value
    Binary(Vec<u8>),
    /// Guid value
    Guid(Uuid),
    /// Duration value
    Duration(Duration),
    /// DateTime value
    DateTime(DateTime<FixedOffset>),
}

impl AtomicValue {
    /// The kind of this value
    pub fn kind(&self) -> TypeKind {
        match self {
            AtomicValue::String(_) => TypeKind::String,
            AtomicValue::IgnoreCaseString(_) => TypeKind::IgnoreCaseString,
            AtomicValue::Decimal(_) => TypeKind::Decimal,
            AtomicValue::Int64(_) => TypeKind::Int64,
            AtomicValue::Int32(_) => TypeKind::Int32,
            AtomicValue::Int16(_) => TypeKind::Int16,
            AtomicValue::SByte(_) => TypeKind::SByte,
            AtomicValue::UInt64(_) => TypeKind::UInt64,
            AtomicValue::UInt32(_) => TypeKind::UInt32,
            AtomicValue::UInt16(_) => TypeKind::UInt16,
            AtomicValue::Byte(_) => TypeKind::Byte,
            AtomicValue::Double(_) => TypeKind::Double,
            AtomicValue::Single(_) => TypeKind::Single,
            AtomicValue::Boolean(_) => TypeKind::Boolean,
            AtomicValue::Binary(_) => TypeKind::Binary,
            AtomicValue::Guid(_) => TypeKind::Guid,
            AtomicValue::Duration(_) => TypeKind::Duration,
            AtomicValue::DateTime(_) => TypeKind::DateTime,
        }
    }

    /// Parse a literal as a value of `kind`
    ///
    /// Returns `None` when the literal is not in the lexical space of the kind
    /// or when `kind` is not an atomic kind.
    pub fn parse(kind: TypeKind, text: &str) -> Option<AtomicValue> {
        let value = match kind {
            TypeKind::String => AtomicValue::String(text.to_string()),
            TypeKind::IgnoreCaseString => AtomicValue::IgnoreCaseString(text.to_string()),
            TypeKind::Decimal => AtomicValue::Decimal(Decimal::from_str(text.trim()).ok()?),
            TypeKind::Int64 => AtomicValue::Int64(text.trim().parse().ok()?),
            TypeKind::Int32 => AtomicValue::Int32(text.trim().parse().ok()?),
            TypeKind::Int16 => AtomicValue::Int16(text.trim().parse().ok()?),
            TypeKind::SByte => AtomicValue::SByte(text.trim().parse().ok()?),
            TypeKind::UInt64 => AtomicValue::UInt64(text.trim().parse().ok()?),
            TypeKind::UInt32 => AtomicValue::UInt32(text.trim().parse().ok()?),
            TypeKind::UInt16 => AtomicValue::UInt16(text.trim().parse().ok()?),
            TypeKind::Byte => AtomicValue::Byte(text.trim().parse().ok()?),
            TypeKind::Double => AtomicValue::Double(parse_float(text.trim())?),
            TypeKind::Single => AtomicValue::Single(parse_float(text.trim())? as f32),
            TypeKind::Boolean => match text.trim() {
                "true" => AtomicValue::Boolean(true),
                "false" => AtomicValue::Boolean(false),
                _ => return None,
            },
            TypeKind::Binary => AtomicValue::Binary(
                base64::engine::general_purpose::STANDARD
                    .decode(text.trim())
                    .ok()?,
            ),
            TypeKind::Guid => AtomicValue::Guid(Uuid::parse_str(text.trim()).ok()?),
            TypeKind::Duration => AtomicValue::Duration(parse_duration(text.trim())?),
            TypeKind::DateTime => {
                AtomicValue::DateTime(DateTime::parse_from_rfc3339(text.trim()).ok()?)
            }
            TypeKind::ComplexType
            | TypeKind::SimpleType
            | TypeKind::AtomicType
            | TypeKind::ListType => return None,
        };
        Some(value)
    }

    /// Compare two values of the same ordered family
    ///
    /// Integers and decimals compare numerically across kinds, as do doubles
    /// and singles. Returns `None` for unordered kinds or mismatched families.
    pub fn compare(&self, other: &AtomicValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (AtomicValue::String(a), AtomicValue::String(b)) => Some(a.cmp(b)),
            (AtomicValue::IgnoreCaseString(a), AtomicValue::IgnoreCaseString(b)) => {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            }
            (AtomicValue::Duration(a), AtomicValue::Duration(b)) => Some(a.cmp(b)),
            (AtomicValue::DateTime(a), AtomicValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Numeric value of a decimal-family value
    pub fn as_decimal(&self) -> Option<Decimal> {
        match *self {
            AtomicValue::Decimal(v) => Some(v),
            AtomicValue::Int64(v) => Some(Decimal::from(v)),
            AtomicValue::Int32(v) => Some(Decimal::from(v)),
            AtomicValue::Int16(v) => Some(Decimal::from(v)),
            AtomicValue::SByte(v) => Some(Decimal::from(v)),
            AtomicValue::UInt64(v) => Some(Decimal::from(v)),
            AtomicValue::UInt32(v) => Some(Decimal::from(v)),
            AtomicValue::UInt16(v) => Some(Decimal::from(v)),
            AtomicValue::Byte(v) => Some(Decimal::from(v)),
            _ => None,
        }
    }

    /// Numeric value of a double-family value
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AtomicValue::Double(v) => Some(v),
            AtomicValue::Single(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Length used by the length range facet: characters for strings, bytes
    /// for binary values
    pub fn length(&self) -> Option<u64> {
        match self {
            AtomicValue::String(s) | AtomicValue::IgnoreCaseString(s) => {
                Some(s.chars().count() as u64)
            }
            AtomicValue::Binary(b) => Some(b.len() as u64),
            _ => None,
        }
    }

    /// Total significant digits and fractional digits of a decimal-family value
    pub fn digits(&self) -> Option<(u32, u32)> {
        let value = self.as_decimal()?.normalize();
        let scale = value.scale();
        let mantissa = value.mantissa().unsigned_abs();
        let precision = if mantissa == 0 {
            1
        } else {
            mantissa.to_string().len() as u32
        };
        Some((precision.max(scale), scale))
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

/// Parse a duration in the form `[-][d.]hh:mm:ss[.fffffff]`
fn parse_duration(text: &str) -> Option<Duration> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut parts = rest.split(':');
    let (days, hours) = {
        let first = parts.next()?;
        match first.split_once('.') {
            Some((d, h)) => (d.parse::<i64>().ok()?, h.parse::<i64>().ok()?),
            None => (0, first.parse::<i64>().ok()?),
        }
    };
    let minutes = parts.next()?.parse::<i64>().ok()?;
    let seconds_text = parts.next()?;
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return None;
    }
    let (seconds, nanos) = match seconds_text.split_once('.') {
        Some((s, frac)) => {
            if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let padded = format!("{:0<9}", frac);
            (s.parse::<i64>().ok()?, padded.parse::<i64>().ok()?)
        }
        None => (seconds_text.parse::<i64>().ok()?, 0),
    };
    if seconds > 59 {
        return None;
    }
    let total = Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::nanoseconds(nanos);
    Some(if negative { -total } else { total })
}

fn format_duration(f: &mut fmt::Formatter<'_>, value: &Duration) -> fmt::Result {
    let negative = *value < Duration::zero();
    let abs = if negative { -*value } else { *value };
    let days = abs.num_days();
    let hours = abs.num_hours() % 24;
    let minutes = abs.num_minutes() % 60;
    let seconds = abs.num_seconds() % 60;
    let nanos = (abs - Duration::seconds(abs.num_seconds()))
        .num_nanoseconds()
        .unwrap_or(0);
    if negative {
        write!(f, "-")?;
    }
    if days != 0 {
        write!(f, "{}.", days)?;
    }
    write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)?;
    if nanos != 0 {
        let frac = format!("{:09}", nanos);
        write!(f, ".{}", frac.trim_end_matches('0'))?;
    }
    Ok(())
}

fn normalized_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for AtomicValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AtomicValue::String(a), AtomicValue::String(b)) => a == b,
            (AtomicValue::IgnoreCaseString(a), AtomicValue::IgnoreCaseString(b)) => {
                a.to_lowercase() == b.to_lowercase()
            }
            (AtomicValue::Decimal(a), AtomicValue::Decimal(b)) => a == b,
            (AtomicValue::Int64(a), AtomicValue::Int64(b)) => a == b,
            (AtomicValue::Int32(a), AtomicValue::Int32(b)) => a == b,
            (AtomicValue::Int16(a), AtomicValue::Int16(b)) => a == b,
            (AtomicValue::SByte(a), AtomicValue::SByte(b)) => a == b,
            (AtomicValue::UInt64(a), AtomicValue::UInt64(b)) => a == b,
            (AtomicValue::UInt32(a), AtomicValue::UInt32(b)) => a == b,
            (AtomicValue::UInt16(a), AtomicValue::UInt16(b)) => a == b,
            (AtomicValue::Byte(a), AtomicValue::Byte(b)) => a == b,
            (AtomicValue::Double(a), AtomicValue::Double(b)) => {
                normalized_bits(*a) == normalized_bits(*b)
            }
            (AtomicValue::Single(a), AtomicValue::Single(b)) => {
                normalized_bits(*a as f64) == normalized_bits(*b as f64)
            }
            (AtomicValue::Boolean(a), AtomicValue::Boolean(b)) => a == b,
            (AtomicValue::Binary(a), AtomicValue::Binary(b)) => a == b,
            (AtomicValue::Guid(a), AtomicValue::Guid(b)) => a == b,
            (AtomicValue::Duration(a), AtomicValue::Duration(b)) => a == b,
            (AtomicValue::DateTime(a), AtomicValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AtomicValue {}

impl Hash for AtomicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            AtomicValue::String(v) => v.hash(state),
            AtomicValue::IgnoreCaseString(v) => v.to_lowercase().hash(state),
            AtomicValue::Decimal(v) => v.hash(state),
            AtomicValue::Int64(v) => v.hash(state),
            AtomicValue::Int32(v) => v.hash(state),
            AtomicValue::Int16(v) => v.hash(state),
            AtomicValue::SByte(v) => v.hash(state),
            AtomicValue::UInt64(v) => v.hash(state),
            AtomicValue::UInt32(v) => v.hash(state),
            AtomicValue::UInt16(v) => v.hash(state),
            AtomicValue::Byte(v) => v.hash(state),
            AtomicValue::Double(v) => normalized_bits(*v).hash(state),
            AtomicValue::Single(v) => normalized_bits(*v as f64).hash(state),
            AtomicValue::Boolean(v) => v.hash(state),
            AtomicValue::Binary(v) => v.hash(state),
            AtomicValue::Guid(v) => v.hash(state),
            AtomicValue::Duration(v) => v.hash(state),
            AtomicValue::DateTime(v) => v.hash(state),
        }
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicValue::String(v) | AtomicValue::IgnoreCaseString(v) => write!(f, "{}", v),
            AtomicValue::Decimal(v) => write!(f, "{}", v),
            AtomicValue::Int64(v) => write!(f, "{}", v),
            AtomicValue::Int32(v) => write!(f, "{}", v),
            AtomicValue::Int16(v) => write!(f, "{}", v),
            AtomicValue::SByte(v) => write!(f, "{}", v),
            AtomicValue::UInt64(v) => write!(f, "{}", v),
            AtomicValue::UInt32(v) => write!(f, "{}", v),
            AtomicValue::UInt16(v) => write!(f, "{}", v),
            AtomicValue::Byte(v) => write!(f, "{}", v),
            AtomicValue::Double(v) => format_float(f, *v),
            AtomicValue::Single(v) => format_float(f, *v as f64),
            AtomicValue::Boolean(v) => write!(f, "{}", v),
            AtomicValue::Binary(v) => write!(
                f,
                "{}",
                base64::engine::general_purpose::STANDARD.encode(v)
            ),
            AtomicValue::Guid(v) => write!(f, "{}", v),
            AtomicValue::Duration(v) => format_duration(f, v),
            AtomicValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

fn format_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        write!(f, "NaN")
    } else if v == f64::INFINITY {
        write!(f, "INF")
    } else if v == f64::NEG_INFINITY {
        write!(f, "-INF")
    } else {
        write!(f, "{}", v)
    }
}

// =============================================================================
// Simple Values
// =============================================================================

/// The value held by a simple type instance: an atomic value or a list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleValue {
    /// Atomic value
    Atomic(AtomicValue),
    /// List value
    List(Vec<SimpleValue>),
}

impl SimpleValue {
    /// Get as atomic value
    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            SimpleValue::Atomic(v) => Some(v),
            SimpleValue::List(_) => None,
        }
    }

    /// Get as list items
    pub fn as_list(&self) -> Option<&[SimpleValue]> {
        match self {
            SimpleValue::Atomic(_) => None,
            SimpleValue::List(items) => Some(items),
        }
    }

    /// Length used by the length range facet: item count for lists
    pub fn length(&self) -> Option<u64> {
        match self {
            SimpleValue::Atomic(v) => v.length(),
            SimpleValue::List(items) => Some(items.len() as u64),
        }
    }
}

impl From<AtomicValue> for SimpleValue {
    fn from(value: AtomicValue) -> Self {
        SimpleValue::Atomic(value)
    }
}

impl fmt::Display for SimpleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleValue::Atomic(v) => write!(f, "{}", v),
            SimpleValue::List(items) => {
                write!(f, "#[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(
            AtomicValue::parse(TypeKind::Int32, "42"),
            Some(AtomicValue::Int32(42))
        );
        assert_eq!(AtomicValue::parse(TypeKind::Byte, "256"), None);
        assert_eq!(AtomicValue::parse(TypeKind::SByte, "-128"), Some(AtomicValue::SByte(-128)));
        assert_eq!(AtomicValue::parse(TypeKind::UInt16, "-1"), None);
    }

    #[test]
    fn test_parse_decimal_and_compare() {
        let a = AtomicValue::parse(TypeKind::Decimal, "999.99").unwrap();
        let b = AtomicValue::parse(TypeKind::Int32, "1000").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.digits(), Some((5, 2)));
        assert_eq!(AtomicValue::Int32(-120).digits(), Some((3, 0)));
    }

    #[test]
    fn test_parse_rejects_roots() {
        assert_eq!(AtomicValue::parse(TypeKind::ListType, "x"), None);
        assert_eq!(AtomicValue::parse(TypeKind::ComplexType, "x"), None);
    }

    #[test]
    fn test_boolean_guid_binary() {
        assert_eq!(
            AtomicValue::parse(TypeKind::Boolean, "true"),
            Some(AtomicValue::Boolean(true))
        );
        assert_eq!(AtomicValue::parse(TypeKind::Boolean, "True"), None);

        let guid = AtomicValue::parse(TypeKind::Guid, "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(guid.is_some());

        let bin = AtomicValue::parse(TypeKind::Binary, "AQID").unwrap();
        assert_eq!(bin, AtomicValue::Binary(vec![1, 2, 3]));
        assert_eq!(bin.to_string(), "AQID");
        assert_eq!(bin.length(), Some(3));
    }

    #[test]
    fn test_duration_format() {
        let d = AtomicValue::parse(TypeKind::Duration, "1.02:03:04.5").unwrap();
        assert_eq!(d.to_string(), "1.02:03:04.5");
        let neg = AtomicValue::parse(TypeKind::Duration, "-00:00:30").unwrap();
        assert_eq!(neg.to_string(), "-00:00:30");
        assert_eq!(neg.compare(&d), Some(Ordering::Less));
        assert_eq!(AtomicValue::parse(TypeKind::Duration, "00:61:00"), None);
    }

    #[test]
    fn test_datetime_equality_is_by_instant() {
        let a = AtomicValue::parse(TypeKind::DateTime, "2024-01-01T12:00:00+02:00").unwrap();
        let b = AtomicValue::parse(TypeKind::DateTime, "2024-01-01T10:00:00+00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_ignore_case_equality() {
        let a = AtomicValue::IgnoreCaseString("Hello".to_string());
        let b = AtomicValue::IgnoreCaseString("hELLO".to_string());
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(
            AtomicValue::String("Hello".to_string()),
            AtomicValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_float_equality() {
        assert_eq!(AtomicValue::Double(0.0), AtomicValue::Double(-0.0));
        assert_eq!(AtomicValue::Double(f64::NAN), AtomicValue::Double(f64::NAN));
        assert_eq!(
            hash_of(&AtomicValue::Double(0.0)),
            hash_of(&AtomicValue::Double(-0.0))
        );
        assert_eq!(AtomicValue::Double(f64::INFINITY).to_string(), "INF");
    }

    #[test]
    fn test_different_kinds_are_not_equal() {
        assert_ne!(AtomicValue::Int32(1), AtomicValue::Int64(1));
    }

    #[test]
    fn test_list_values() {
        let a = SimpleValue::List(vec![
            AtomicValue::Int32(1).into(),
            AtomicValue::Int32(2).into(),
        ]);
        let b = SimpleValue::List(vec![
            AtomicValue::Int32(1).into(),
            AtomicValue::Int32(2).into(),
        ]);
        let c = SimpleValue::List(vec![
            AtomicValue::Int32(2).into(),
            AtomicValue::Int32(1).into(),
        ]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert_eq!(a.length(), Some(2));
        assert_eq!(a.to_string(), "#[1 2]");
    }
}
