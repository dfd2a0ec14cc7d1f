//! Numeric intervals
//!
//! An [`Interval`] is an immutable range with independently open or closed
//! bounds. Its canonical text form, e.g. `[0, 10)`, round-trips exactly.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::parameters::validator::Membership;
use crate::parameters::value::Value;

/// Errors that can occur when building an interval
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntervalError {
    #[error("Invalid interval: max ({max}) must be greater than min ({min})")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid interval text: '{0}'")]
    InvalidFormat(String),
}

/// Style of one interval bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    /// The bound value belongs to the interval (`[` or `]`)
    Closed,

    /// The bound value is excluded (`(` or `)`)
    Open,
}

/// A continuous numeric interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    min: f64,
    max: f64,
    lower: Bound,
    upper: Bound,
}

impl Interval {
    /// Create a closed interval `[min, max]`
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::interval::Interval;
    ///
    /// let interval = Interval::new(0.0, 10.0).unwrap();
    /// assert!(interval.contains_f64(0.0));
    /// assert!(interval.contains_f64(10.0));
    /// assert!(Interval::new(1.0, 1.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, IntervalError> {
        Self::with_bounds(min, max, Bound::Closed, Bound::Closed)
    }

    /// Create an interval with explicit bound styles
    pub fn with_bounds(
        min: f64,
        max: f64,
        lower: Bound,
        upper: Bound,
    ) -> Result<Self, IntervalError> {
        // also rejects NaN bounds
        if !(max > min) {
            return Err(IntervalError::InvalidRange { min, max });
        }
        Ok(Self {
            min,
            max,
            lower,
            upper,
        })
    }

    /// The interval containing every finite number
    pub fn unbounded() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
            lower: Bound::Open,
            upper: Bound::Open,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn lower(&self) -> Bound {
        self.lower
    }

    pub fn upper(&self) -> Bound {
        self.upper
    }

    /// Membership test on a plain number
    pub fn contains_f64(&self, value: f64) -> bool {
        let above = match self.lower {
            Bound::Closed => value >= self.min,
            Bound::Open => value > self.min,
        };
        let below = match self.upper {
            Bound::Closed => value <= self.max,
            Bound::Open => value < self.max,
        };
        above && below
    }
}

impl Membership for Interval {
    fn contains(&self, value: &Value) -> bool {
        value.as_f64().is_some_and(|x| self.contains_f64(x))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = match self.lower {
            Bound::Closed => '[',
            Bound::Open => '(',
        };
        let close = match self.upper {
            Bound::Closed => ']',
            Bound::Open => ')',
        };
        write!(f, "{}{}, {}{}", open, self.min, self.max, close)
    }
}

fn lower_bound(input: &str) -> IResult<&str, Bound> {
    alt((
        char('[').map(|_| Bound::Closed),
        char('(').map(|_| Bound::Open),
    ))
    .parse(input)
}

fn upper_bound(input: &str) -> IResult<&str, Bound> {
    alt((
        char(']').map(|_| Bound::Closed),
        char(')').map(|_| Bound::Open),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    alt((
        double,
        preceded(char('-'), tag_no_case("inf")).map(|_| NEG_INFINITY),
    ))
    .parse(input)
}

fn padded_number(input: &str) -> IResult<&str, f64> {
    delimited(multispace0, number, multispace0).parse(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    char(',').parse(input)
}

fn interval_text(input: &str) -> IResult<&str, (Bound, f64, f64, Bound)> {
    let (input, lower) = lower_bound(input)?;
    let (input, min) = padded_number(input)?;
    let (input, _) = comma(input)?;
    let (input, max) = padded_number(input)?;
    let (input, upper) = upper_bound(input)?;
    Ok((input, (lower, min, max, upper)))
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        match interval_text(text) {
            Ok(("", (lower, min, max, upper))) => Self::with_bounds(min, max, lower, upper),
            _ => Err(IntervalError::InvalidFormat(s.to_string())),
        }
    }
}

impl Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
