//! Parameter leaves
//!
//! A leaf holds one value slot: a literal, or a formula string starting with
//! `=` whose value is computed from sibling parameters each time it is read.
//! Literals are coerced to the declared type and validated when they are set;
//! formula results and bound values are checked when they are read.

use std::collections::HashMap;

use tracing::trace;

use crate::config::EvalConfig;
use crate::error::{ParamError, Result};
use crate::parameters::binding::Binding;
use crate::parameters::expression::{extract_variables, EvaluationContext, Expression};
use crate::parameters::name::{split_name, SEPARATOR};
use crate::parameters::node::{Node, NodeKind};
use crate::parameters::types::ParamType;
use crate::parameters::validator::{Membership, Validator};
use crate::parameters::value::Value;

/// Where a leaf keeps its value.
#[derive(Debug, Clone)]
pub(crate) enum Backing {
    Raw(Value),
    Bound(Binding),
}

impl Backing {
    fn read(&self) -> Value {
        match self {
            Backing::Raw(value) => value.clone(),
            Backing::Bound(binding) => binding.get(),
        }
    }
}

/// State of a parameter leaf.
#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub(crate) backing: Backing,
    pub(crate) param_type: Option<ParamType>,
    pub(crate) editable: bool,
    pub(crate) validator: Option<Validator>,
}

/// Coerces `value` to `param_type` and checks it against `validator`.
///
/// Unset values pass unchanged.
fn check_value(
    path: &str,
    value: Value,
    param_type: Option<&ParamType>,
    validator: Option<&Validator>,
) -> Result<Value> {
    if value.is_none() {
        return Ok(value);
    }
    let value = match param_type {
        Some(ty) => ty
            .coerce(&value)
            .map_err(|message| ParamError::TypeMismatch {
                name: path.to_string(),
                message,
            })?,
        None => value,
    };
    if let Some(validator) = validator {
        if !validator.contains(&value) {
            return Err(ParamError::ValidationError {
                name: path.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(value)
}

impl Leaf {
    /// Creates a leaf holding `value`.
    ///
    /// The initial value is installed before `editable` takes effect, so
    /// read-only leaves can be initialized.
    pub(crate) fn new(
        path: &str,
        value: Value,
        param_type: Option<ParamType>,
        editable: bool,
        validator: Option<Validator>,
    ) -> Result<Self> {
        let mut leaf = Self {
            backing: Backing::Raw(Value::None),
            param_type,
            editable: true,
            validator,
        };
        leaf.assign(path, value)?;
        leaf.editable = editable;
        Ok(leaf)
    }

    /// Creates a leaf reading and writing through `binding`.
    ///
    /// The leaf is editable exactly when the binding has a setter.
    pub(crate) fn bound(
        path: &str,
        binding: Binding,
        initial: Value,
        param_type: Option<ParamType>,
        validator: Option<Validator>,
    ) -> Result<Self> {
        let mut leaf = Self {
            editable: binding.is_writable(),
            backing: Backing::Bound(binding),
            param_type,
            validator,
        };
        if !initial.is_none() {
            if !leaf.editable {
                return Err(ParamError::NotEditable(path.to_string()));
            }
            leaf.assign(path, initial)?;
        }
        Ok(leaf)
    }

    /// Checks `value` as a candidate for this leaf and returns its stored form.
    fn checked(&self, path: &str, value: Value) -> Result<Value> {
        if let Some(text) = value.formula() {
            if matches!(self.backing, Backing::Bound(_)) {
                return Err(ParamError::TypeMismatch {
                    name: path.to_string(),
                    message: "bound parameters cannot hold formulas".to_string(),
                });
            }
            let (_, own_name) = split_name(path);
            if extract_variables(text).iter().any(|v| v == own_name) {
                return Err(ParamError::SelfReference(path.to_string()));
            }
            return Ok(value);
        }
        check_value(path, value, self.param_type.as_ref(), self.validator.as_ref())
    }

    /// Stores `value` without looking at the editable flag.
    fn assign(&mut self, path: &str, value: Value) -> Result<()> {
        let value = self.checked(path, value)?;
        match &self.backing {
            Backing::Raw(_) => self.backing = Backing::Raw(value),
            Backing::Bound(binding) => {
                if !binding.set(value) {
                    return Err(ParamError::NotEditable(path.to_string()));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn raw_value(&self) -> Value {
        self.backing.read()
    }
}

impl Node {
    /// Creates a detached, untyped and editable parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::{Node, Value};
    ///
    /// let speed = Node::new_parameter("speed", 3.5).unwrap();
    /// assert_eq!(speed.value().unwrap(), Value::Float(3.5));
    /// ```
    pub fn new_parameter(name: &str, value: impl Into<Value>) -> Result<Node> {
        let name = crate::parameters::name::validate_name(name)?;
        let leaf = Leaf::new(&name, value.into(), None, true, None)?;
        Ok(Node::with_kind(name, NodeKind::Leaf(leaf)))
    }

    /// A copy of the leaf state, or NotALeaf for groups.
    fn leaf(&self) -> Result<Leaf> {
        match &self.data().kind {
            NodeKind::Leaf(leaf) => Ok(leaf.clone()),
            NodeKind::Group { .. } => Err(ParamError::NotALeaf(self.absolute_name())),
        }
    }

    fn store_leaf(&self, leaf: Leaf) {
        self.data_mut().kind = NodeKind::Leaf(leaf);
    }

    /// The stored value: the literal, the formula text, or what the binding
    /// currently reads.
    pub fn raw_value(&self) -> Result<Value> {
        Ok(self.leaf()?.raw_value())
    }

    /// Declared type of a leaf; `None` for untyped leaves and groups.
    pub fn param_type(&self) -> Option<ParamType> {
        self.leaf().ok().and_then(|leaf| leaf.param_type)
    }

    pub fn validator(&self) -> Option<Validator> {
        self.leaf().ok().and_then(|leaf| leaf.validator)
    }

    /// Whether `set_value` is allowed. Always false for groups.
    pub fn is_editable(&self) -> bool {
        self.leaf().is_ok_and(|leaf| leaf.editable)
    }

    /// Changes the editable flag of a leaf.
    ///
    /// A leaf bound without a setter cannot be made editable.
    pub fn set_editable(&self, editable: bool) -> Result<()> {
        let mut leaf = self.leaf()?;
        if let Backing::Bound(binding) = &leaf.backing {
            if editable && !binding.is_writable() {
                return Err(ParamError::NotEditable(self.absolute_name()));
            }
        }
        leaf.editable = editable;
        self.store_leaf(leaf);
        Ok(())
    }

    /// Whether the stored value is a formula.
    pub fn is_formula(&self) -> bool {
        self.raw_value().is_ok_and(|raw| raw.is_formula())
    }

    /// Whether the leaf reads and writes through a [`Binding`].
    pub fn is_bound(&self) -> bool {
        self.leaf()
            .is_ok_and(|leaf| matches!(leaf.backing, Backing::Bound(_)))
    }

    /// Free variable names of the formula, in order of appearance.
    pub fn variables(&self) -> Vec<String> {
        match self.raw_value() {
            Ok(raw) => raw.formula().map(extract_variables).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Sets the value of a leaf.
    ///
    /// # Arguments
    ///
    /// * `value` - A literal, or a formula string starting with `=`
    ///
    /// # Errors
    ///
    /// [`ParamError::NotEditable`] for read-only leaves,
    /// [`ParamError::TypeMismatch`] and [`ParamError::ValidationError`] for
    /// rejected literals, [`ParamError::SelfReference`] for formulas naming the
    /// leaf itself. The leaf is unchanged on failure.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        let path = self.absolute_name();
        let mut leaf = self.leaf()?;
        if !leaf.editable {
            return Err(ParamError::NotEditable(path));
        }
        leaf.assign(&path, value.into())?;
        if let Backing::Raw(_) = leaf.backing {
            self.store_leaf(leaf);
        }
        Ok(())
    }

    /// The current value, evaluating formulas without external context.
    pub fn value(&self) -> Result<Value> {
        self.value_with(&HashMap::<String, Value>::new())
    }

    /// The current value, with `context` supplying formula variables that no
    /// sibling provides.
    pub fn value_with<C: EvaluationContext + ?Sized>(&self, context: &C) -> Result<Value> {
        self.evaluate(context, &EvalConfig::default())
    }

    /// Evaluates the leaf with explicit evaluation settings.
    ///
    /// Formula variables resolve against sibling parameters first, then
    /// against `context`. A dotted variable names a sibling group by its first
    /// segment and descends from there. The result is coerced to the declared
    /// type and checked against the validator.
    pub fn evaluate<C: EvaluationContext + ?Sized>(
        &self,
        context: &C,
        config: &EvalConfig,
    ) -> Result<Value> {
        self.evaluate_at(context, config, 0)
    }

    fn evaluate_at<C: EvaluationContext + ?Sized>(
        &self,
        context: &C,
        config: &EvalConfig,
        depth: usize,
    ) -> Result<Value> {
        let leaf = self.leaf()?;
        let raw = leaf.raw_value();
        let value = match raw.formula() {
            None if matches!(leaf.backing, Backing::Raw(_)) => return Ok(raw),
            None => raw,
            Some(text) => {
                if depth > config.max_depth {
                    return Err(ParamError::RecursionLimit(
                        self.absolute_name(),
                        config.max_depth,
                    ));
                }
                self.evaluate_formula(text, context, config, depth)?
            }
        };
        check_value(
            &self.absolute_name(),
            value,
            leaf.param_type.as_ref(),
            leaf.validator.as_ref(),
        )
    }

    fn evaluate_formula<C: EvaluationContext + ?Sized>(
        &self,
        text: &str,
        context: &C,
        config: &EvalConfig,
        depth: usize,
    ) -> Result<Value> {
        let path = self.absolute_name();
        let own_name = self.name();
        let expr = Expression::parse(text).map_err(|e| ParamError::from_expression(&path, e))?;

        let mut bindings: HashMap<String, Value> = HashMap::new();
        for var in expr.variables() {
            if var == own_name {
                return Err(ParamError::SelfReference(path));
            }
            if let Some(node) = self.resolve_reference(&var) {
                let value = node.evaluate_at(context, config, depth + 1)?;
                bindings.insert(var, value);
            } else if context.has_variable(&var) {
                let value = context
                    .get_variable(&var)
                    .map_err(|e| ParamError::from_expression(&path, e))?;
                bindings.insert(var, value);
            }
        }

        trace!(param = %path, formula = text, depth, "evaluating formula");
        expr.evaluate(&bindings)
            .map_err(|e| ParamError::from_expression(&path, e))
    }

    /// The sibling leaf a formula variable refers to, if any.
    fn resolve_reference(&self, var: &str) -> Option<Node> {
        let (first, rest) = match var.split_once(SEPARATOR) {
            Some((first, rest)) => (first, Some(rest)),
            None => (var, None),
        };
        let sibling = self.sibling(first)?;
        let target = match rest {
            Some(path) => sibling.child(path).ok()?,
            None => sibling,
        };
        target.is_leaf().then_some(target)
    }

    /// Whether the current value can be read without error.
    pub fn is_valid(&self) -> bool {
        self.value().is_ok()
    }

    /// Whether `set_value(value)` would be accepted, ignoring the editable flag.
    pub fn is_valid_value(&self, value: impl Into<Value>) -> bool {
        match self.leaf() {
            Ok(leaf) => leaf.checked(&self.absolute_name(), value.into()).is_ok(),
            Err(_) => false,
        }
    }
}
