//! Tree nodes
//!
//! A [`Node`] is a cheap, clonable handle to one node of a parameter tree.
//! Parents own their children; children keep a weak link back to their parent,
//! so dropping the root releases the whole tree.
//!
//! A node is either a group, which holds children but no value, or a leaf
//! ([`Leaf`]), which holds a value but no children.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::{ParamError, Result};
use crate::parameters::events::{Listener, ListenerId, NodeEvent};
use crate::parameters::group::ChildDef;
use crate::parameters::leaf::Leaf;
use crate::parameters::name::{self, validate_name};

/// Payload of a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// A group with an optional column schema replayed onto new rows
    Group { columns: Vec<ChildDef> },
    Leaf(Leaf),
}

pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) parent: Weak<RefCell<NodeData>>,
    pub(crate) children: Vec<Node>,
    pub(crate) kind: NodeKind,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

/// Handle to a node of a parameter tree.
///
/// Clones share the same node; use [`Node::deep_copy`] for an independent tree.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

/// Selects a child by position or by dotted path.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    Index(usize),
    Path(&'a str),
}

impl From<usize> for Selector<'_> {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(path: &'a str) -> Self {
        Selector::Path(path)
    }
}

impl<'a> From<&'a String> for Selector<'a> {
    fn from(path: &'a String) -> Self {
        Selector::Path(path)
    }
}

impl fmt::Display for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(index) => write!(f, "#{}", index),
            Selector::Path(path) => write!(f, "{}", path),
        }
    }
}

impl Node {
    pub(crate) fn with_kind(name: String, kind: NodeKind) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            name,
            parent: Weak::new(),
            children: Vec::new(),
            kind,
            listeners: Vec::new(),
            next_listener: 0,
        })))
    }

    /// Creates a detached, empty group.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::Node;
    ///
    /// let group = Node::new_group("foo bar").unwrap();
    /// assert_eq!(group.name(), "foo_bar");
    /// assert_eq!(group.display_name(), "foo bar");
    /// ```
    pub fn new_group(name: &str) -> Result<Self> {
        let name = validate_name(name)?;
        Ok(Self::with_kind(
            name,
            NodeKind::Group {
                columns: Vec::new(),
            },
        ))
    }

    pub(crate) fn data(&self) -> Ref<'_, NodeData> {
        self.0.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, NodeData> {
        self.0.borrow_mut()
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.data().kind, NodeKind::Group { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.data().kind, NodeKind::Leaf(_))
    }

    // --- names ---

    pub fn name(&self) -> String {
        self.data().name.clone()
    }

    /// The name with underscores shown as spaces.
    pub fn display_name(&self) -> String {
        name::display_name(&self.data().name)
    }

    /// Renames the node.
    ///
    /// Fails with [`ParamError::NameConflict`] if a sibling already uses the
    /// new name.
    pub fn set_name(&self, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        if let Some(parent) = self.parent() {
            let taken = parent
                .data()
                .children
                .iter()
                .any(|c| !c.ptr_eq(self) && c.data().name == new_name);
            if taken {
                return Err(ParamError::NameConflict {
                    parent: parent.absolute_name(),
                    name: new_name,
                });
            }
        }
        let old = std::mem::replace(&mut self.data_mut().name, new_name.clone());
        if old != new_name {
            debug!(old = %old, new = %new_name, "renamed node");
            self.emit(NodeEvent::NameChanged { old, new: new_name });
        }
        Ok(())
    }

    /// The dotted path from the root of the tree to this node, root included.
    pub fn absolute_name(&self) -> String {
        let mut names = vec![self.name()];
        let mut current = self.parent();
        while let Some(node) = current {
            names.push(node.name());
            current = node.parent();
        }
        names.reverse();
        name::join(names)
    }

    /// The dotted path from `ancestor` (excluded) to this node.
    pub fn relative_name(&self, ancestor: &Node) -> Result<String> {
        let mut names = vec![self.name()];
        let mut current = self.parent();
        while let Some(node) = current {
            if node.ptr_eq(ancestor) {
                names.reverse();
                return Ok(name::join(names));
            }
            names.push(node.name());
            current = node.parent();
        }
        Err(ParamError::NotAncestor {
            node: self.absolute_name(),
            ancestor: ancestor.absolute_name(),
        })
    }

    // --- hierarchy ---

    pub fn parent(&self) -> Option<Node> {
        self.data().parent.upgrade().map(Node)
    }

    /// The topmost node of the tree, or `self` if the node has no parent.
    pub fn root(&self) -> Node {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    /// Position of this node among its siblings.
    pub fn index(&self) -> Option<usize> {
        self.parent().and_then(|parent| parent.index_of_child(self))
    }

    pub fn index_of_child(&self, child: &Node) -> Option<usize> {
        self.data().children.iter().position(|c| c.ptr_eq(child))
    }

    /// The other children of this node's parent.
    pub fn siblings(&self) -> Vec<Node> {
        let Some(parent) = self.parent() else {
            return Vec::new();
        };
        let siblings = parent
            .data()
            .children
            .iter()
            .filter(|c| !c.ptr_eq(self))
            .cloned()
            .collect();
        siblings
    }

    /// The sibling called `name`, if any.
    pub fn sibling(&self, name: &str) -> Option<Node> {
        let parent = self.parent()?;
        let sibling = parent
            .data()
            .children
            .iter()
            .find(|c| !c.ptr_eq(self) && c.data().name == name)
            .cloned();
        sibling
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    pub fn child_count(&self, recursive: bool) -> usize {
        if recursive {
            self.iter_children(true).count()
        } else {
            self.data().children.len()
        }
    }

    /// Whether `path` resolves to a descendant.
    pub fn contains(&self, path: &str) -> bool {
        self.child(path).is_ok()
    }

    /// The direct children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.data().children.clone()
    }

    /// Depth-first, pre-order iteration over the descendants.
    ///
    /// Only direct children are visited unless `recursive` is set.
    pub fn iter_children(&self, recursive: bool) -> Children {
        let mut stack = self.children();
        stack.reverse();
        Children { stack, recursive }
    }

    fn direct_child(&self, name: &str) -> Option<Node> {
        self.data()
            .children
            .iter()
            .find(|c| c.data().name == name)
            .cloned()
    }

    /// Returns the selected child.
    ///
    /// A path selects through the levels of the tree, one direct child per
    /// segment.
    ///
    /// ```
    /// use paramtree::Node;
    ///
    /// let params = Node::new_group("params").unwrap();
    /// let child = params.add_child(Node::new_group("child").unwrap()).unwrap();
    /// let grand_child = child.add_child(Node::new_group("grand_child").unwrap()).unwrap();
    ///
    /// assert!(params.child("child.grand_child").unwrap().ptr_eq(&grand_child));
    /// assert!(params.child(0).unwrap().ptr_eq(&child));
    /// ```
    pub fn child<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Node> {
        let selector = selector.into();
        let not_found = || ParamError::NotFound(format!("{}.{}", self.absolute_name(), selector));
        match selector {
            Selector::Index(index) => self.data().children.get(index).cloned().ok_or_else(not_found),
            Selector::Path(path) => {
                let mut current = self.clone();
                for segment in name::segments(path) {
                    current = current.direct_child(segment).ok_or_else(not_found)?;
                }
                Ok(current)
            }
        }
    }

    /// Adopts `child`, detaching it from its previous parent first.
    ///
    /// Nothing changes on failure. Returns the adopted handle. Adding a node to
    /// its current parent keeps its position and emits no events.
    pub fn add_child(&self, child: Node) -> Result<Node> {
        if !self.is_group() {
            return Err(ParamError::NotAGroup(self.absolute_name()));
        }
        if child.parent().is_some_and(|parent| parent.ptr_eq(self)) {
            return Ok(child);
        }
        let mut ancestor = Some(self.clone());
        while let Some(node) = ancestor {
            if node.ptr_eq(&child) {
                return Err(ParamError::Cycle {
                    parent: self.absolute_name(),
                    child: child.absolute_name(),
                });
            }
            ancestor = node.parent();
        }
        let child_name = child.name();
        if self.direct_child(&child_name).is_some() {
            return Err(ParamError::NameConflict {
                parent: self.absolute_name(),
                name: child_name,
            });
        }

        let old_parent = child.parent();
        if let Some(old) = &old_parent {
            old.detach(&child);
        }
        child.data_mut().parent = Rc::downgrade(&self.0);
        self.data_mut().children.push(child.clone());
        debug!(parent = %self.absolute_name(), child = %child_name, "added child");

        if let Some(old) = &old_parent {
            old.emit(NodeEvent::ChildRemoved);
        }
        self.emit(NodeEvent::ChildAdded(child.clone()));
        child.emit(NodeEvent::ParentChanged {
            old: old_parent,
            new: Some(self.clone()),
        });
        Ok(child)
    }

    fn detach(&self, child: &Node) {
        let index = self.index_of_child(child);
        if let Some(index) = index {
            self.data_mut().children.remove(index);
        }
        child.data_mut().parent = Weak::new();
    }

    /// Detaches the selected subtree and hands it back.
    pub fn pop_child<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Node> {
        let child = self.child(selector)?;
        // a path may select below an intermediate group
        let Some(parent) = child.parent() else {
            return Err(ParamError::NotFound(child.name()));
        };
        parent.detach(&child);
        debug!(parent = %parent.absolute_name(), child = %child.name(), "removed child");
        parent.emit(NodeEvent::ChildRemoved);
        child.emit(NodeEvent::ParentChanged {
            old: Some(parent),
            new: None,
        });
        Ok(child)
    }

    /// Detaches and discards the selected subtree.
    pub fn remove_child<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<()> {
        self.pop_child(selector).map(drop)
    }

    /// A detached, recursive copy of this subtree.
    ///
    /// Listeners are not copied.
    pub fn deep_copy(&self) -> Node {
        let data = self.data();
        let copy = Node::with_kind(data.name.clone(), data.kind.clone());
        for child in &data.children {
            let child_copy = child.deep_copy();
            child_copy.data_mut().parent = Rc::downgrade(&copy.0);
            copy.data_mut().children.push(child_copy);
        }
        copy
    }

    // --- notification ---

    /// Registers a listener for the events of this node.
    ///
    /// ```
    /// use paramtree::{Node, NodeEvent};
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let group = Node::new_group("group").unwrap();
    /// let added = Rc::new(Cell::new(0));
    /// let counter = added.clone();
    /// group.subscribe(move |event| {
    ///     if let NodeEvent::ChildAdded(_) = event {
    ///         counter.set(counter.get() + 1);
    ///     }
    /// });
    /// group.add_child(Node::new_group("child").unwrap()).unwrap();
    /// assert_eq!(added.get(), 1);
    /// ```
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&NodeEvent) + 'static,
    {
        let mut data = self.data_mut();
        let id = ListenerId(data.next_listener);
        data.next_listener += 1;
        data.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut data = self.data_mut();
        let before = data.listeners.len();
        data.listeners.retain(|(listener_id, _)| *listener_id != id);
        data.listeners.len() != before
    }

    fn emit(&self, event: NodeEvent) {
        let listeners: Vec<Listener> = self
            .data()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        let mut s = f.debug_struct("Node");
        s.field("name", &data.name);
        match &data.kind {
            NodeKind::Group { .. } => s.field("children", &data.children.len()),
            NodeKind::Leaf(leaf) => s.field("leaf", leaf),
        };
        s.finish()
    }
}

/// Iterator returned by [`Node::iter_children`].
pub struct Children {
    stack: Vec<Node>,
    recursive: bool,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.stack.pop()?;
        if self.recursive {
            self.stack.extend(node.data().children.iter().rev().cloned());
        }
        Some(node)
    }
}
