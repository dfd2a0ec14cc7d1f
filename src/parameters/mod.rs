//! # Parameter System
//!
//! A tree of named, typed parameters with validation and values computed by
//! formulas referencing sibling parameters.
//!
//! ## Key Features
//!
//! - **Path-addressable hierarchy**: Groups and leaves addressed by dotted names such as `ingredients.milk`
//! - **Typed values**: Values coerced to a registered type tag on assignment
//! - **Validation**: Intervals, choice sets and custom predicates constrain assignable values
//! - **Formulas**: Values written as `=expression` are re-evaluated from their siblings on every read
//! - **Tables**: Groups with a column schema replayed onto every row
//! - **Change notification**: Listeners observe structural and identity changes
//!
//! ## Core Components
//!
//! - [`Node`]: Handle to a group or leaf of a parameter tree
//! - [`ChildDef`]: Declarative description used to build groups and leaves
//! - [`TypeRegistry`]: Mapping from type tags to coercion rules and codecs
//! - [`Interval`] and [`Validator`]: Membership tests for values
//! - [`Expression`]: Parse and evaluate formulas
//!
//! ## Example Usage
//!
//! ```rust
//! use paramtree::parameters::{ChildDef, Node};
//! use paramtree::Value;
//! use std::collections::HashMap;
//!
//! let params = Node::new_group("params").unwrap();
//! params
//!     .add_children([
//!         ChildDef::new("m").value(5.0),
//!         ChildDef::new("a").value(2.0),
//!         ChildDef::new("F").value("= m*a"),
//!         ChildDef::new("A").value(4.0),
//!         ChildDef::new("extern").value("= A*F + x"),
//!     ])
//!     .unwrap();
//!
//! // sibling values take precedence over the context
//! let context: HashMap<String, Value> =
//!     [("x".to_string(), Value::Int(2)), ("F".to_string(), Value::Int(34))].into();
//! let value = params.child("extern").unwrap().value_with(&context).unwrap();
//! assert_eq!(value, Value::Float(42.0));
//! ```

pub mod binding;
pub mod events;
pub mod expression;
pub mod group;
pub mod interval;
pub mod leaf;
pub mod name;
pub mod node;
pub mod types;
pub mod validator;
pub mod value;

// Re-export key types
pub use binding::Binding;
pub use events::{ListenerId, NodeEvent};
pub use expression::{extract_variables, EvaluationContext, Expression, ExpressionError, SimpleContext};
pub use group::{ChildDef, MappingEntry};
pub use interval::{Bound, Interval, IntervalError};
pub use node::{Children, Node, Selector};
pub use types::{
    default_registry, register_type, resolve_type, shared_registry, LiteralCodec, NativeType,
    ParamType, TypeRef, TypeRegistry, ValueCodec,
};
pub use validator::{ChoiceSet, Membership, Predicate, Validator};
pub use value::Value;
