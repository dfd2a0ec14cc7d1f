//! Parameter groups
//!
//! Groups are built from an ordered sequence of declarative [`ChildDef`]s. A
//! definition with a bare name creates a group; any value, type, editable flag,
//! validator or binding makes it a leaf. A dotted definition name adds the node
//! to an existing descendant group.
//!
//! A group may also act as a table: its column schema is a list of child
//! definitions replayed onto every row, each row being a group child.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ParamError, Result};
use crate::parameters::binding::Binding;
use crate::parameters::leaf::Leaf;
use crate::parameters::name::{split_name, validate_name};
use crate::parameters::node::{Node, NodeKind};
use crate::parameters::types::{shared_registry, TypeRef, TypeRegistry};
use crate::parameters::validator::Validator;
use crate::parameters::value::Value;

/// Declarative description of a child node.
///
/// # Examples
///
/// ```
/// use paramtree::{ChildDef, Interval, Node, Value};
///
/// let recipe = Node::new_group("quiche_loraine").unwrap();
/// recipe.add_children([
///     ChildDef::new("ingredients"),
///     ChildDef::new("ingredients.servings")
///         .value(4)
///         .param_type("int")
///         .validator(Interval::new(0.0, 10.0).unwrap()),
///     ChildDef::new("ingredients.milk").value("=0.1 * servings"),
/// ])
/// .unwrap();
///
/// let milk = recipe.child("ingredients.milk").unwrap();
/// assert!((milk.value().unwrap().as_f64().unwrap() - 0.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChildDef {
    pub(crate) name: String,
    pub(crate) value: Option<Value>,
    pub(crate) param_type: Option<TypeRef>,
    pub(crate) editable: Option<bool>,
    pub(crate) validator: Option<Validator>,
    pub(crate) binding: Option<Binding>,
}

impl ChildDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Initial value (literal or formula)
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Type tag or resolved type
    pub fn param_type(mut self, ty: impl Into<TypeRef>) -> Self {
        self.param_type = Some(ty.into());
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn validator(mut self, validator: impl Into<Validator>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    /// Backs the leaf by caller-owned state instead of a stored value.
    pub fn binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// The (possibly dotted) name of the definition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the definition describes a group.
    pub fn is_group(&self) -> bool {
        self.value.is_none()
            && self.param_type.is_none()
            && self.editable.is_none()
            && self.validator.is_none()
            && self.binding.is_none()
    }

    /// Builds a detached node named after the last segment of the definition
    /// name.
    pub fn build(&self, registry: &TypeRegistry) -> Result<Node> {
        let (_, leaf_name) = split_name(&self.name);
        let name = validate_name(leaf_name)?;
        if self.is_group() {
            return Node::new_group(&name);
        }

        let param_type = match &self.param_type {
            Some(ty) => Some(registry.resolve_type(ty.clone())?),
            None => None,
        };
        let value = self.value.clone().unwrap_or_default();
        let leaf = match &self.binding {
            Some(binding) => {
                let leaf = Leaf::bound(
                    &name,
                    binding.clone(),
                    value,
                    param_type,
                    self.validator.clone(),
                )?;
                match self.editable {
                    Some(true) if !leaf.editable => {
                        return Err(ParamError::NotEditable(name));
                    }
                    Some(editable) => Leaf { editable, ..leaf },
                    None => leaf,
                }
            }
            None => Leaf::new(
                &name,
                value,
                param_type,
                self.editable.unwrap_or(true),
                self.validator.clone(),
            )?,
        };
        Ok(Node::with_kind(name, NodeKind::Leaf(leaf)))
    }
}

/// Nested snapshot produced by [`Node::to_mapping`].
#[derive(Debug, Clone, PartialEq)]
pub enum MappingEntry {
    Value(Value),
    Group(BTreeMap<String, MappingEntry>),
}

impl MappingEntry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            MappingEntry::Value(value) => Some(value),
            MappingEntry::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, MappingEntry>> {
        match self {
            MappingEntry::Group(entries) => Some(entries),
            MappingEntry::Value(_) => None,
        }
    }
}

impl Node {
    /// Adds a child described by `def`, resolving types through the shared
    /// registry.
    pub fn add_child_def(&self, def: ChildDef) -> Result<Node> {
        self.add_child_def_with(def, &shared_registry())
    }

    /// Adds a child described by `def`.
    ///
    /// A dotted name adds the child below an existing descendant group and
    /// fails with [`ParamError::NotFound`] if that group does not exist.
    pub fn add_child_def_with(&self, def: ChildDef, registry: &TypeRegistry) -> Result<Node> {
        let (parent_path, _) = split_name(def.name());
        let target = if parent_path.is_empty() {
            self.clone()
        } else {
            self.child(parent_path)?
        };
        let node = def.build(registry)?;
        target.add_child(node)
    }

    /// Adds children in order, stopping at the first failure.
    ///
    /// Children added before the failure stay in place.
    pub fn add_children<I>(&self, defs: I) -> Result<Vec<Node>>
    where
        I: IntoIterator<Item = ChildDef>,
    {
        let registry = shared_registry();
        self.add_children_with(defs, &registry)
    }

    pub fn add_children_with<I>(&self, defs: I, registry: &TypeRegistry) -> Result<Vec<Node>>
    where
        I: IntoIterator<Item = ChildDef>,
    {
        defs.into_iter()
            .map(|def| self.add_child_def_with(def, registry))
            .collect()
    }

    /// Sets the values of descendants by dotted name, in order.
    ///
    /// Stops at and returns the first failure; earlier updates stay applied.
    pub fn update_values<I, K, V>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.child(name.as_ref())?.set_value(value)?;
        }
        Ok(())
    }

    /// Nested snapshot of the evaluated values below this group.
    pub fn to_mapping(&self) -> Result<BTreeMap<String, MappingEntry>> {
        if !self.is_group() {
            return Err(ParamError::NotAGroup(self.absolute_name()));
        }
        let mut mapping = BTreeMap::new();
        for child in self.children() {
            let entry = if child.is_group() {
                MappingEntry::Group(child.to_mapping()?)
            } else {
                MappingEntry::Value(child.value()?)
            };
            mapping.insert(child.name(), entry);
        }
        Ok(mapping)
    }

    /// Evaluates every leaf below this node, in pre-order.
    pub fn iter_child_values(
        &self,
        recursive: bool,
    ) -> impl Iterator<Item = (Node, Result<Value>)> {
        self.iter_children(recursive)
            .filter(Node::is_leaf)
            .map(|node| {
                let value = node.value();
                (node, value)
            })
    }

    // --- table groups ---

    /// The column schema of a table group.
    pub fn columns(&self) -> Vec<ChildDef> {
        match &self.data().kind {
            NodeKind::Group { columns } => columns.clone(),
            NodeKind::Leaf(_) => Vec::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        match &self.data().kind {
            NodeKind::Group { columns } => columns.len(),
            NodeKind::Leaf(_) => 0,
        }
    }

    /// Appends a column, adding it to every existing row.
    pub fn add_column(&self, def: ChildDef) -> Result<()> {
        self.add_column_with(def, &shared_registry())
    }

    /// Appends a column, adding it to every existing row.
    ///
    /// Nothing changes on failure.
    pub fn add_column_with(&self, def: ChildDef, registry: &TypeRegistry) -> Result<()> {
        if !self.is_group() {
            return Err(ParamError::NotAGroup(self.absolute_name()));
        }
        let name = validate_name(def.name())?;
        if self.columns().iter().any(|c| c.name() == name) {
            return Err(ParamError::NameConflict {
                parent: self.absolute_name(),
                name,
            });
        }

        let rows: Vec<Node> = self.iter_children(false).filter(Node::is_group).collect();
        let mut cells = Vec::with_capacity(rows.len());
        for row in &rows {
            if row.contains(&name) {
                return Err(ParamError::NameConflict {
                    parent: row.absolute_name(),
                    name,
                });
            }
            cells.push(def.build(registry)?);
        }
        for (row, cell) in rows.iter().zip(cells) {
            row.add_child(cell)?;
        }

        if let NodeKind::Group { columns } = &mut self.data_mut().kind {
            columns.push(def);
        }
        debug!(table = %self.absolute_name(), column = %name, "added column");
        Ok(())
    }

    /// Adds a row holding every column, then applies `values` to it.
    pub fn add_row<I, K, V>(&self, name: &str, values: I) -> Result<Node>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.add_row_with(name, values, &shared_registry())
    }

    pub fn add_row_with<I, K, V>(
        &self,
        name: &str,
        values: I,
        registry: &TypeRegistry,
    ) -> Result<Node>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        if !self.is_group() {
            return Err(ParamError::NotAGroup(self.absolute_name()));
        }
        let row = Node::new_group(name)?;
        for column in self.columns() {
            row.add_child_def_with(column, registry)?;
        }
        row.update_values(values)?;
        self.add_child(row)
    }

    /// The row at `index`.
    pub fn row(&self, index: usize) -> Result<Node> {
        self.child(index)
    }

    /// The cells of column `name`, one per row that has it.
    pub fn column(&self, name: &str) -> Vec<Node> {
        self.iter_children(false)
            .filter_map(|row| row.child(name).ok())
            .collect()
    }
}
