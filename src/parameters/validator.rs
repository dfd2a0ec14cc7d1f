//! Validators
//!
//! A validator is anything with a membership test. The closed [`Validator`]
//! enum covers the supported kinds; leaves only rely on [`Membership`].

use std::fmt;
use std::rc::Rc;

use crate::parameters::interval::Interval;
use crate::parameters::value::Value;

/// Membership test used to constrain assignable values.
pub trait Membership {
    /// Returns true if `value` is an accepted value.
    fn contains(&self, value: &Value) -> bool;
}

/// An explicit, ordered set of accepted values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChoiceSet(Vec<Value>);

impl ChoiceSet {
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(choices.into_iter().map(Into::into).collect())
    }

    pub fn choices(&self) -> &[Value] {
        &self.0
    }
}

impl Membership for ChoiceSet {
    fn contains(&self, value: &Value) -> bool {
        self.0.iter().any(|choice| choice.loose_eq(value))
    }
}

/// A custom membership predicate.
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn(&Value) -> bool>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self(Rc::new(f))
    }
}

impl Membership for Predicate {
    fn contains(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// The validator kinds a parameter can carry.
#[derive(Debug, Clone)]
pub enum Validator {
    Interval(Interval),
    Choices(ChoiceSet),
    Custom(Predicate),
}

impl Validator {
    /// Shorthand for a custom predicate validator.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Validator::Custom(Predicate::new(f))
    }
}

impl Membership for Validator {
    fn contains(&self, value: &Value) -> bool {
        match self {
            Validator::Interval(interval) => interval.contains(value),
            Validator::Choices(choices) => choices.contains(value),
            Validator::Custom(predicate) => predicate.contains(value),
        }
    }
}

impl From<Interval> for Validator {
    fn from(interval: Interval) -> Self {
        Validator::Interval(interval)
    }
}

impl From<ChoiceSet> for Validator {
    fn from(choices: ChoiceSet) -> Self {
        Validator::Choices(choices)
    }
}

impl From<Predicate> for Validator {
    fn from(predicate: Predicate) -> Self {
        Validator::Custom(predicate)
    }
}
