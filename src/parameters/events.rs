//! Change notification
//!
//! Structural and identity mutations of a node raise a [`NodeEvent`] on the
//! nodes involved. Listeners are a side channel for external observers and
//! fire synchronously once the mutation has completed.

use std::rc::Rc;

use crate::parameters::node::Node;

/// An observable change of a node.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A child was adopted by the node
    ChildAdded(Node),

    /// A child was detached from the node
    ChildRemoved,

    /// The node was renamed
    NameChanged { old: String, new: String },

    /// The node moved to another parent, or was attached or detached
    ParentChanged {
        old: Option<Node>,
        new: Option<Node>,
    },
}

/// Handle returned by [`Node::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) type Listener = Rc<dyn Fn(&NodeEvent)>;
