//! Persistence of parameter trees
//!
//! The text form is a JSON array of records in pre-order, one per node. Leaves
//! are written as `{name, value, type, editable, validator}` and groups as
//! `{name}`, where `name` is the dotted path from the saved node (included).
//! Formulas are stored verbatim; other values go through the codec of their
//! type.
//!
//! The binary form is an opaque snapshot: a magic header and format version
//! followed by a `postcard` encoding of the nested tree, including the column
//! schemas of table groups.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JsonConfig;
use crate::error::{ParamError, Result};
use crate::parameters::group::ChildDef;
use crate::parameters::interval::Interval;
use crate::parameters::leaf::Leaf;
use crate::parameters::name::{split_name, validate_name};
use crate::parameters::node::{Node, NodeKind};
use crate::parameters::types::{shared_registry, LiteralCodec, ParamType, TypeRef, TypeRegistry, ValueCodec};
use crate::parameters::validator::{ChoiceSet, Validator};
use crate::parameters::value::Value;

/// Leading bytes of a binary snapshot.
pub const MAGIC: [u8; 4] = *b"PTRE";

/// Version of the binary snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LeafRecord {
    name: String,
    value: serde_json::Value,
    #[serde(rename = "type")]
    param_type: Option<String>,
    #[serde(default = "default_editable")]
    editable: bool,
    #[serde(default)]
    validator: Option<serde_json::Value>,
}

fn default_editable() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupRecord {
    name: String,
}

fn type_tag(registry: &TypeRegistry, ty: Option<&ParamType>) -> Result<Option<String>> {
    match ty {
        Some(ty) => Ok(Some(registry.name_of(ty)?.to_string())),
        None => Ok(None),
    }
}

fn resolve_tag(registry: &TypeRegistry, tag: Option<String>) -> Result<Option<ParamType>> {
    tag.map(|tag| registry.resolve_type(tag)).transpose()
}

fn validator_to_json(path: &str, validator: &Validator) -> Result<serde_json::Value> {
    match validator {
        Validator::Interval(interval) => Ok(serde_json::Value::String(interval.to_string())),
        Validator::Choices(choices) => Ok(serde_json::Value::Array(
            choices.choices().iter().map(Value::to_json).collect(),
        )),
        Validator::Custom(_) => Err(ParamError::UnsupportedValidator(path.to_string())),
    }
}

fn validator_from_json(json: &serde_json::Value) -> Result<Validator> {
    match json {
        serde_json::Value::String(text) => Ok(Validator::Interval(text.parse::<Interval>()?)),
        serde_json::Value::Array(items) => {
            let choices = items
                .iter()
                .map(Value::from_json)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(ParamError::Format)?;
            Ok(Validator::Choices(ChoiceSet::new(choices)))
        }
        other => Err(ParamError::Format(format!("unsupported validator {}", other))),
    }
}

fn leaf_record(node: &Node, path: String, registry: &TypeRegistry) -> Result<LeafRecord> {
    let raw = node.raw_value()?;
    let param_type = node.param_type();
    let value = if raw.is_formula() {
        raw.to_json()
    } else {
        match &param_type {
            Some(ty) => ty.codec().encode(&raw),
            None => LiteralCodec.encode(&raw),
        }
    };
    let validator = node
        .validator()
        .map(|v| validator_to_json(&path, &v))
        .transpose()?;
    Ok(LeafRecord {
        param_type: type_tag(registry, param_type.as_ref())?,
        name: path,
        value,
        editable: node.is_editable(),
        validator,
    })
}

fn records(node: &Node, registry: &TypeRegistry) -> Result<Vec<serde_json::Value>> {
    let root_name = node.name();
    let mut records = Vec::new();
    for current in std::iter::once(node.clone()).chain(node.iter_children(true)) {
        let path = if current.ptr_eq(node) {
            root_name.clone()
        } else {
            format!("{}.{}", root_name, current.relative_name(node)?)
        };
        let record = if current.is_leaf() {
            serde_json::to_value(leaf_record(&current, path, registry)?)?
        } else {
            serde_json::to_value(GroupRecord { name: path })?
        };
        records.push(record);
    }
    Ok(records)
}

/// Serializes `node` and its descendants to compact JSON, resolving type tags
/// through the shared registry.
pub fn to_json(node: &Node) -> Result<String> {
    to_json_with(node, &JsonConfig::default(), &shared_registry())
}

/// Like [`to_json`], with indentation.
pub fn to_json_pretty(node: &Node) -> Result<String> {
    to_json_with(node, &JsonConfig::pretty(), &shared_registry())
}

/// Serializes `node` and its descendants to JSON.
///
/// Fails with [`ParamError::UnsupportedValidator`] for custom predicate
/// validators and [`ParamError::UnknownType`] for types missing from
/// `registry`.
pub fn to_json_with(node: &Node, config: &JsonConfig, registry: &TypeRegistry) -> Result<String> {
    let records = records(node, registry)?;
    debug!(root = %node.name(), records = records.len(), "serializing to JSON");
    let json = if config.pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    Ok(json)
}

/// Rebuilds a tree from its JSON form, using the shared registry.
pub fn from_json(json: &str) -> Result<Node> {
    from_json_with(json, &shared_registry())
}

/// Rebuilds a tree from its JSON form.
///
/// Records are replayed in order; a record whose parent path has not been
/// seen before fails with [`ParamError::MissingParent`]. Any failure aborts
/// the whole load.
pub fn from_json_with(json: &str, registry: &TypeRegistry) -> Result<Node> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;
    let mut nodes: HashMap<String, Node> = HashMap::new();
    let mut root: Option<Node> = None;

    for record in records {
        let is_leaf = record.contains_key("value");
        let record = serde_json::Value::Object(record);
        let (path, node) = if is_leaf {
            let record: LeafRecord = serde_json::from_value(record)?;
            let (_, name) = split_name(&record.name);
            let name = validate_name(name)?;
            let param_type = resolve_tag(registry, record.param_type)?;
            let value = decode_value(&record.value, param_type.as_ref())?;
            let validator = record.validator.as_ref().map(validator_from_json).transpose()?;
            let leaf = Leaf::new(&record.name, value, param_type, record.editable, validator)?;
            (record.name, Node::with_kind(name, NodeKind::Leaf(leaf)))
        } else {
            let record: GroupRecord = serde_json::from_value(record)?;
            let (_, name) = split_name(&record.name);
            let node = Node::new_group(name)?;
            (record.name, node)
        };

        let (parent_path, name) = split_name(&path);
        if parent_path.is_empty() {
            if root.is_some() {
                return Err(ParamError::Format(format!("second root node '{}'", path)));
            }
            root = Some(node.clone());
        } else {
            let parent = nodes.get(parent_path).ok_or_else(|| ParamError::MissingParent {
                parent: parent_path.to_string(),
                name: name.to_string(),
            })?;
            parent.add_child(node.clone())?;
        }
        nodes.insert(path, node);
    }

    let root = root.ok_or_else(|| ParamError::Format("empty snapshot".to_string()))?;
    debug!(root = %root.name(), nodes = nodes.len(), "loaded from JSON");
    Ok(root)
}

fn decode_value(json: &serde_json::Value, param_type: Option<&ParamType>) -> Result<Value> {
    if let serde_json::Value::String(text) = json {
        if text.starts_with(crate::parameters::value::FORMULA_SENTINEL) {
            return Ok(Value::Str(text.clone()));
        }
    }
    let decoded = match param_type {
        Some(ty) => ty.codec().decode(json),
        None => LiteralCodec.decode(json),
    };
    decoded.map_err(ParamError::Format)
}

/// Writes the indented JSON form of `node` to `path`.
pub fn save_json<P: AsRef<Path>>(node: &Node, path: P) -> Result<()> {
    let json = to_json_pretty(node)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads a tree from a JSON file.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Node> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}

// --- binary snapshots ---

#[derive(Debug, Serialize, Deserialize)]
enum ValidatorSnapshot {
    Interval(Interval),
    Choices(Vec<Value>),
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnSnapshot {
    name: String,
    value: Option<Value>,
    param_type: Option<String>,
    editable: Option<bool>,
    validator: Option<ValidatorSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LeafSnapshot {
    value: Value,
    param_type: Option<String>,
    editable: bool,
    validator: Option<ValidatorSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
enum KindSnapshot {
    Group { columns: Vec<ColumnSnapshot> },
    Leaf(LeafSnapshot),
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeSnapshot {
    name: String,
    kind: KindSnapshot,
    children: Vec<NodeSnapshot>,
}

fn validator_snapshot(path: &str, validator: &Validator) -> Result<ValidatorSnapshot> {
    match validator {
        Validator::Interval(interval) => Ok(ValidatorSnapshot::Interval(*interval)),
        Validator::Choices(choices) => Ok(ValidatorSnapshot::Choices(choices.choices().to_vec())),
        Validator::Custom(_) => Err(ParamError::UnsupportedValidator(path.to_string())),
    }
}

impl From<ValidatorSnapshot> for Validator {
    fn from(snapshot: ValidatorSnapshot) -> Self {
        match snapshot {
            ValidatorSnapshot::Interval(interval) => Validator::Interval(interval),
            ValidatorSnapshot::Choices(choices) => Validator::Choices(ChoiceSet::new(choices)),
        }
    }
}

fn column_snapshot(table: &str, def: &ChildDef, registry: &TypeRegistry) -> Result<ColumnSnapshot> {
    let path = format!("{}.{}", table, def.name);
    if def.binding.is_some() {
        return Err(ParamError::Format(format!(
            "bound column '{}' cannot be persisted",
            path
        )));
    }
    let param_type = match &def.param_type {
        Some(TypeRef::Tag(tag)) => Some(tag.clone()),
        Some(TypeRef::Type(ty)) => Some(registry.name_of(ty)?.to_string()),
        None => None,
    };
    Ok(ColumnSnapshot {
        name: def.name.clone(),
        value: def.value.clone(),
        param_type,
        editable: def.editable,
        validator: def
            .validator
            .as_ref()
            .map(|v| validator_snapshot(&path, v))
            .transpose()?,
    })
}

fn snapshot(node: &Node, registry: &TypeRegistry) -> Result<NodeSnapshot> {
    let path = node.absolute_name();
    let kind = if node.is_group() {
        let columns = node
            .columns()
            .iter()
            .map(|def| column_snapshot(&path, def, registry))
            .collect::<Result<Vec<_>>>()?;
        KindSnapshot::Group { columns }
    } else {
        let param_type = node.param_type();
        KindSnapshot::Leaf(LeafSnapshot {
            value: node.raw_value()?,
            param_type: type_tag(registry, param_type.as_ref())?,
            editable: node.is_editable(),
            validator: node
                .validator()
                .map(|v| validator_snapshot(&path, &v))
                .transpose()?,
        })
    };
    let children = node
        .children()
        .iter()
        .map(|child| snapshot(child, registry))
        .collect::<Result<Vec<_>>>()?;
    Ok(NodeSnapshot {
        name: node.name(),
        kind,
        children,
    })
}

fn restore(snapshot: NodeSnapshot, registry: &TypeRegistry) -> Result<Node> {
    let name = validate_name(&snapshot.name)?;
    let node = match snapshot.kind {
        KindSnapshot::Group { columns } => {
            let columns = columns
                .into_iter()
                .map(|column| ChildDef {
                    name: column.name,
                    value: column.value,
                    param_type: column.param_type.map(TypeRef::Tag),
                    editable: column.editable,
                    validator: column.validator.map(Validator::from),
                    binding: None,
                })
                .collect();
            Node::with_kind(name, NodeKind::Group { columns })
        }
        KindSnapshot::Leaf(leaf) => {
            let param_type = resolve_tag(registry, leaf.param_type)?;
            let leaf = Leaf::new(
                &name,
                leaf.value,
                param_type,
                leaf.editable,
                leaf.validator.map(Validator::from),
            )?;
            Node::with_kind(name, NodeKind::Leaf(leaf))
        }
    };
    for child in snapshot.children {
        node.add_child(restore(child, registry)?)?;
    }
    Ok(node)
}

/// Encodes `node` and its descendants as a binary snapshot, using the shared
/// registry.
pub fn to_bytes(node: &Node) -> Result<Vec<u8>> {
    to_bytes_with(node, &shared_registry())
}

/// Encodes `node` and its descendants as a binary snapshot.
pub fn to_bytes_with(node: &Node, registry: &TypeRegistry) -> Result<Vec<u8>> {
    let snapshot = snapshot(node, registry)?;
    let mut bytes = MAGIC.to_vec();
    bytes.push(FORMAT_VERSION);
    bytes.extend(postcard::to_allocvec(&snapshot)?);
    debug!(root = %node.name(), bytes = bytes.len(), "encoded binary snapshot");
    Ok(bytes)
}

/// Decodes a binary snapshot, using the shared registry.
pub fn from_bytes(bytes: &[u8]) -> Result<Node> {
    from_bytes_with(bytes, &shared_registry())
}

/// Decodes a binary snapshot.
///
/// Type tags are resolved through `registry`.
pub fn from_bytes_with(bytes: &[u8], registry: &TypeRegistry) -> Result<Node> {
    let header = MAGIC.len() + 1;
    if bytes.len() < header || bytes[..MAGIC.len()] != MAGIC {
        return Err(ParamError::Format("not a parameter snapshot".to_string()));
    }
    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(ParamError::Format(format!(
            "unsupported snapshot version {}",
            version
        )));
    }
    let snapshot: NodeSnapshot = postcard::from_bytes(&bytes[header..])?;
    restore(snapshot, registry)
}
