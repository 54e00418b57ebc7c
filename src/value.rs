//! Attribute values accumulated during an elicitation session.
//!
//! Values are a closed tagged union so that the condition matcher and the
//! production-rule engine branch on a tag instead of sniffing strings.
//! Range markers carry both a direction and a numeric threshold.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Direction of a range marker or range condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeDirection {
    /// The value constrains from below ("at least").
    AtLeast,
    /// The value constrains from above ("at most").
    AtMost,
}

impl fmt::Display for RangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast => write!(f, "at_least"),
            Self::AtMost => write!(f, "at_most"),
        }
    }
}

/// A single attribute value.
///
/// Attribute slots hold literals, booleans, numbers, or range markers.
/// In configuration JSON the first three read naturally (`true`, `42`,
/// `"mechanical"`); range markers are written either as an object
/// (`{"direction": "at_most", "threshold": 500}`) or as a range token
/// string that is parsed once at load time (see [`AttrValue::normalized`]).
///
/// # Examples
///
/// ```
/// use elicit::{AttrValue, RangeDirection};
///
/// let literal = AttrValue::from("mechanical");
/// let flag = AttrValue::from(true);
/// let bound = AttrValue::at_most(500.0);
///
/// assert!(literal.is_text());
/// assert!(flag.is_bool());
/// assert_eq!(bound.threshold(), Some(500.0));
/// assert_eq!(bound.direction(), Some(RangeDirection::AtMost));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean presence/absence answer.
    Bool(bool),
    /// Plain numeric value (catalog objects mostly carry these).
    Number(f64),
    /// Literal string or symbol.
    Text(String),
    /// Range marker: a direction paired with a numeric threshold.
    Range {
        /// Which side of the threshold the marker constrains.
        direction: RangeDirection,
        /// The numeric cutoff.
        threshold: f64,
    },
}

/// Grammar of the external range-token encoding: an optional leading
/// `cond` tag, a numeric literal, and a trailing `+`/`-` direction marker.
fn range_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"^(?:cond\s+)?(-?(?:\d+\.?\d*|\.\d+))\s*([+-])$")
            .expect("range token grammar is a valid literal")
    })
}

impl AttrValue {
    /// Creates an "at least" range marker.
    #[must_use]
    pub const fn at_least(threshold: f64) -> Self {
        Self::Range {
            direction: RangeDirection::AtLeast,
            threshold,
        }
    }

    /// Creates an "at most" range marker.
    #[must_use]
    pub const fn at_most(threshold: f64) -> Self {
        Self::Range {
            direction: RangeDirection::AtMost,
            threshold,
        }
    }

    /// Parses a range token (`"500-"`, `"1.5+"`, `"cond 500-"`).
    ///
    /// Returns `None` when the string is not a range token; callers keep it
    /// as a [`AttrValue::Text`] literal in that case.
    #[must_use]
    pub fn parse_range_token(token: &str) -> Option<Self> {
        let caps = range_token().captures(token.trim())?;
        let threshold: f64 = caps[1].parse().ok()?;
        let direction = match &caps[2] {
            "+" => RangeDirection::AtLeast,
            _ => RangeDirection::AtMost,
        };
        Some(Self::Range {
            direction,
            threshold,
        })
    }

    /// Folds range-token text into the tagged [`AttrValue::Range`] form.
    ///
    /// Applied once over freshly loaded configuration so the token encoding
    /// is never re-parsed downstream.
    #[must_use]
    pub fn normalized(self) -> Self {
        match &self {
            Self::Text(s) => Self::parse_range_token(s).unwrap_or(self),
            _ => self,
        }
    }

    /// Returns true for [`AttrValue::Bool`].
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Returns true for [`AttrValue::Number`].
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns true for [`AttrValue::Text`].
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true for [`AttrValue::Range`].
    pub const fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// Boolean reading of the value, if it has one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric reading of the value, if it has one.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text reading of the value, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Threshold carried by a range marker.
    pub const fn threshold(&self) -> Option<f64> {
        match self {
            Self::Range { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }

    /// Direction carried by a range marker.
    pub const fn direction(&self) -> Option<RangeDirection> {
        match self {
            Self::Range { direction, .. } => Some(*direction),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Range { .. } => "range",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Range {
                direction,
                threshold,
            } => write!(f, "{direction} {threshold}"),
        }
    }
}

// Convenient From implementations
impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}
