//! # paramtree
//!
//! `paramtree` manages hierarchical sets of named, typed parameters: simulation
//! inputs, configuration panels and similar editable, self-describing data.
//!
//! The library provides:
//! - A tree of parameter groups and leaves addressed by dotted paths
//! - Type coercion through an extensible registry of type tags
//! - Validation with intervals, choice sets and custom predicates
//! - Formula parameters (`"=m*a"`) computed from their siblings on every read
//! - JSON and binary snapshots that round-trip the whole tree
//!
//! ## Basic Usage
//!
//! ```
//! use paramtree::{ChildDef, Node, Value};
//!
//! let mechanics = Node::new_group("mechanics").unwrap();
//! mechanics
//!     .add_children([
//!         ChildDef::new("m").value(2.0).param_type("float"),
//!         ChildDef::new("a").value(5.0).param_type("float"),
//!         ChildDef::new("F").value("=m*a").param_type("float"),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(mechanics.child("F").unwrap().value().unwrap(), Value::Float(10.0));
//!
//! let json = paramtree::io::to_json(&mechanics).unwrap();
//! let copy = paramtree::io::from_json(&json).unwrap();
//! assert_eq!(copy.child("F").unwrap().value().unwrap(), Value::Float(10.0));
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod io;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use config::{EvalConfig, JsonConfig};
pub use error::{ParamError, Result};
pub use parameters::{
    Binding, ChildDef, ChoiceSet, Interval, Membership, Node, NodeEvent, ParamType, TypeRegistry,
    Validator, Value,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
