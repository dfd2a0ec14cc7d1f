//! Getter/setter binding
//!
//! A [`Binding`] lets a parameter leaf read and write a value that lives in
//! caller-owned state instead of in the leaf itself. Values read through the
//! getter are coerced and validated on every read, since the owner may change
//! them behind the leaf's back.

use std::fmt;
use std::rc::Rc;

use crate::parameters::value::Value;

type Getter = Rc<dyn Fn() -> Value>;
type Setter = Rc<dyn Fn(Value)>;

/// Accessors backing a bound parameter.
#[derive(Clone)]
pub struct Binding {
    getter: Getter,
    setter: Option<Setter>,
}

impl Binding {
    /// A read-only binding.
    ///
    /// ```
    /// use paramtree::parameters::binding::Binding;
    /// use paramtree::Value;
    ///
    /// let binding = Binding::new(|| Value::Int(3));
    /// assert_eq!(binding.get(), Value::Int(3));
    /// assert!(!binding.is_writable());
    /// ```
    pub fn new<G>(getter: G) -> Self
    where
        G: Fn() -> Value + 'static,
    {
        Self {
            getter: Rc::new(getter),
            setter: None,
        }
    }

    /// Adds a setter, making the binding writable.
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(Value) + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    pub fn get(&self) -> Value {
        (self.getter)()
    }

    /// Writes through the setter. Returns false for read-only bindings.
    pub fn set(&self, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(value);
                true
            }
            None => false,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("writable", &self.is_writable())
            .finish()
    }
}
