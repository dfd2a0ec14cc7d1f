//! Type registry
//!
//! Maps string tags such as `"float"` to a native type (a coercion rule into
//! the [`Value`] universe) and a codec used by the JSON snapshot format.
//!
//! A registry is an explicit value passed to the operations that need one.
//! [`default_registry`] exposes one shared instance with process lifetime for
//! the convenience entry points.

use crate::error::{ParamError, Result};
use crate::parameters::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Coercion closure of a custom native type.
pub type CoerceFn = dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync;

/// The native representation a type tag stands for.
#[derive(Clone)]
pub enum NativeType {
    Int,
    Float,
    Bool,
    Str,
    List,
    /// User supplied coercion into the value universe
    Custom(Arc<CoerceFn>),
}

impl NativeType {
    /// Wrap a coercion closure as a native type.
    pub fn custom<F>(coerce: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        NativeType::Custom(Arc::new(coerce))
    }

    /// Converts `value` to this type.
    pub fn coerce(&self, value: &Value) -> std::result::Result<Value, String> {
        let fail = || format!("cannot convert {} '{}' to {}", value.kind(), value, self.name());
        match self {
            NativeType::Int => match value {
                Value::Bool(_) | Value::Int(_) => value.as_i64().map(Value::Int).ok_or_else(fail),
                Value::Float(f) => {
                    let whole = f.trunc();
                    // the upper bound is 2^63, one past i64::MAX
                    if whole >= i64::MIN as f64 && whole < i64::MAX as f64 {
                        Ok(Value::Int(whole as i64))
                    } else {
                        Err(fail())
                    }
                }
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
                _ => Err(fail()),
            },
            NativeType::Float => match value {
                Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                    value.as_f64().map(Value::Float).ok_or_else(fail)
                }
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
                _ => Err(fail()),
            },
            NativeType::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(_) | Value::Float(_) => Ok(Value::Bool(value.truthy())),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            NativeType::Str => match value {
                Value::None | Value::List(_) => Err(fail()),
                Value::Str(s) => Ok(Value::Str(s.clone())),
                other => Ok(Value::Str(other.to_string())),
            },
            NativeType::List => match value {
                Value::List(items) => Ok(Value::List(items.clone())),
                _ => Err(fail()),
            },
            NativeType::Custom(coerce) => coerce(value),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            NativeType::Int => "int",
            NativeType::Float => "float",
            NativeType::Bool => "bool",
            NativeType::Str => "str",
            NativeType::List => "list",
            NativeType::Custom(_) => "custom type",
        }
    }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeType({})", self.name())
    }
}

/// Converts values of one type to and from the JSON snapshot form.
pub trait ValueCodec: Send + Sync {
    fn encode(&self, value: &Value) -> serde_json::Value;

    fn decode(&self, json: &serde_json::Value) -> std::result::Result<Value, String>;
}

/// The generic literal codec, used when a type registers no codec of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralCodec;

impl ValueCodec for LiteralCodec {
    fn encode(&self, value: &Value) -> serde_json::Value {
        value.to_json()
    }

    fn decode(&self, json: &serde_json::Value) -> std::result::Result<Value, String> {
        Value::from_json(json)
    }
}

struct TypeEntry {
    tag: String,
    native: NativeType,
    codec: Arc<dyn ValueCodec>,
}

/// A resolved parameter type. Cheap to clone; identity is shared by clones.
#[derive(Clone)]
pub struct ParamType(Arc<TypeEntry>);

impl ParamType {
    /// Creates a type that is not (yet) known to any registry.
    pub fn new(tag: &str, native: NativeType, codec: Option<Arc<dyn ValueCodec>>) -> Self {
        Self(Arc::new(TypeEntry {
            tag: tag.to_string(),
            native,
            codec: codec.unwrap_or_else(|| Arc::new(LiteralCodec)),
        }))
    }

    /// The tag this type was created with.
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn native(&self) -> &NativeType {
        &self.0.native
    }

    pub fn codec(&self) -> &dyn ValueCodec {
        self.0.codec.as_ref()
    }

    /// Converts `value` to this type.
    pub fn coerce(&self, value: &Value) -> std::result::Result<Value, String> {
        self.0.native.coerce(value)
    }

    /// Whether both handles refer to the same registered type.
    pub fn same_as(&self, other: &ParamType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamType")
            .field("tag", &self.0.tag)
            .field("native", &self.0.native)
            .finish()
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Either a type tag or an already resolved type.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Tag(String),
    Type(ParamType),
}

impl From<&str> for TypeRef {
    fn from(tag: &str) -> Self {
        TypeRef::Tag(tag.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(tag: String) -> Self {
        TypeRef::Tag(tag)
    }
}

impl From<ParamType> for TypeRef {
    fn from(ty: ParamType) -> Self {
        TypeRef::Type(ty)
    }
}

impl From<&ParamType> for TypeRef {
    fn from(ty: &ParamType) -> Self {
        TypeRef::Type(ty.clone())
    }
}

/// Mapping from type tags to parameter types.
///
/// Clones share the registered types, so a type resolved through a clone is
/// still named by the original.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, ParamType>,
}

impl TypeRegistry {
    /// Creates a registry holding the built-in tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::types::TypeRegistry;
    ///
    /// let registry = TypeRegistry::new();
    /// assert!(registry.contains("float"));
    /// assert!(registry.contains("date"));
    /// ```
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let builtins = [
            ("int", NativeType::Int),
            ("float", NativeType::Float),
            ("bool", NativeType::Bool),
            ("str", NativeType::Str),
            ("list", NativeType::List),
            ("tuple", NativeType::List),
            ("color", NativeType::Str),
            ("time", NativeType::Str),
            ("date", NativeType::Str),
        ];
        for (tag, native) in builtins {
            registry
                .types
                .insert(tag.to_string(), ParamType::new(tag, native, None));
        }
        registry
    }

    /// Creates a registry without any tags.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registers a new type under `tag`.
    ///
    /// Uses [`LiteralCodec`] when no codec is given. Fails with
    /// [`ParamError::DuplicateTag`] if the tag is taken.
    pub fn register_type(
        &mut self,
        tag: &str,
        native: NativeType,
        codec: Option<Arc<dyn ValueCodec>>,
    ) -> Result<ParamType> {
        if self.types.contains_key(tag) {
            return Err(ParamError::DuplicateTag(tag.to_string()));
        }
        let ty = ParamType::new(tag, native, codec);
        self.types.insert(tag.to_string(), ty.clone());
        debug!(tag, "registered parameter type");
        Ok(ty)
    }

    /// Resolves a tag, or returns an already resolved type unchanged.
    pub fn resolve_type(&self, ty: impl Into<TypeRef>) -> Result<ParamType> {
        match ty.into() {
            TypeRef::Tag(tag) => self
                .types
                .get(&tag)
                .cloned()
                .ok_or(ParamError::UnknownType(tag)),
            TypeRef::Type(ty) => Ok(ty),
        }
    }

    /// Returns the tag under which `ty` was registered here.
    pub fn name_of(&self, ty: &ParamType) -> Result<&str> {
        match self.types.get(ty.tag()) {
            Some(registered) if registered.same_as(ty) => Ok(registered.tag()),
            _ => Err(ParamError::UnknownType(ty.tag().to_string())),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.types.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// The shared registry used by the convenience entry points.
pub fn default_registry() -> &'static RwLock<TypeRegistry> {
    DEFAULT_REGISTRY.get_or_init(|| RwLock::new(TypeRegistry::new()))
}

/// A copy of the shared registry taken under a short read lock.
///
/// The convenience entry points work on this copy, so listeners that fire
/// during a mutation may register types without blocking.
pub fn shared_registry() -> TypeRegistry {
    default_registry().read().clone()
}

/// Registers a type in the shared registry.
pub fn register_type(
    tag: &str,
    native: NativeType,
    codec: Option<Arc<dyn ValueCodec>>,
) -> Result<ParamType> {
    default_registry().write().register_type(tag, native, codec)
}

/// Resolves a type through the shared registry.
pub fn resolve_type(ty: impl Into<TypeRef>) -> Result<ParamType> {
    default_registry().read().resolve_type(ty)
}
