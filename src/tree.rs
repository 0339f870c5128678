//! Side-effect-free queries and validity checks over a [`Session`] tree.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{NodeId, Session};

/// A violated tree invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("session {session} has no root node {root}")]
    MissingRoot { session: String, root: String },

    #[error("root node {node} must have depth 0 and no parent")]
    MalformedRoot { node: String },

    #[error("node {node} is stored under key {key}")]
    KeyMismatch { key: String, node: String },

    #[error("node {node} has no parent link but is not the root")]
    OrphanNode { node: String },

    #[error("node {node} points at missing parent {parent}")]
    DanglingParent { node: String, parent: String },

    #[error("node {node} points at missing message {message} in parent {parent}")]
    DanglingParentMessage {
        node: String,
        parent: String,
        message: String,
    },

    #[error("node {node} has depth {found}; expected {expected}")]
    DepthMismatch {
        node: String,
        found: u32,
        expected: u32,
    },

    #[error("child list of node {node} does not match the parent links of its children")]
    ChildListMismatch { node: String },

    #[error("highlight in node {node} targets missing child {child}")]
    DanglingHighlight { node: String, child: String },

    #[error("highlight in node {node} has invalid range [{start}, {end}) for a {len}-char message")]
    HighlightOutOfBounds {
        node: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("node {node} is not reachable from the root")]
    Unreachable { node: String },
}

/// Ordered node ids from the session root down to `node_id`.
///
/// Returns an empty path when `node_id` is unknown or its parent chain is
/// broken (dangling parent, cycle, or a chain that does not end at the root).
#[must_use]
pub fn path_to_root(session: &Session, node_id: &NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut cursor = Some(node_id);

    while let Some(current) = cursor {
        let Some(node) = session.node(current) else {
            return Vec::new();
        };
        if path.len() > session.nodes.len() {
            return Vec::new();
        }

        path.push(node.id.clone());
        cursor = node.parent.as_ref().map(|link| &link.parent_node_id);
    }

    if path.last() != Some(&session.root_node_id) {
        return Vec::new();
    }

    path.reverse();
    path
}

/// True when `ancestor` lies on the parent chain of `node_id` (inclusive).
#[must_use]
pub fn is_ancestor(session: &Session, ancestor: &NodeId, node_id: &NodeId) -> bool {
    path_to_root(session, node_id).contains(ancestor)
}

/// Child ids of `node_id` in creation order; empty for unknown nodes.
#[must_use]
pub fn children_of<'a>(session: &'a Session, node_id: &NodeId) -> &'a [NodeId] {
    session
        .node(node_id)
        .map(|node| node.children.as_slice())
        .unwrap_or(&[])
}

/// Checks every structural invariant of `session`.
pub fn validate_session(session: &Session) -> Result<(), TreeError> {
    let root = session
        .root()
        .ok_or_else(|| TreeError::MissingRoot {
            session: session.id.to_string(),
            root: session.root_node_id.to_string(),
        })?;
    if root.depth != 0 || root.parent.is_some() {
        return Err(TreeError::MalformedRoot {
            node: root.id.to_string(),
        });
    }

    for (key, node) in &session.nodes {
        if key != &node.id {
            return Err(TreeError::KeyMismatch {
                key: key.to_string(),
                node: node.id.to_string(),
            });
        }

        if let Some(link) = &node.parent {
            let parent = session
                .node(&link.parent_node_id)
                .ok_or_else(|| TreeError::DanglingParent {
                    node: node.id.to_string(),
                    parent: link.parent_node_id.to_string(),
                })?;
            if parent.message(&link.parent_message_id).is_none() {
                return Err(TreeError::DanglingParentMessage {
                    node: node.id.to_string(),
                    parent: parent.id.to_string(),
                    message: link.parent_message_id.to_string(),
                });
            }
            if node.depth != parent.depth + 1 {
                return Err(TreeError::DepthMismatch {
                    node: node.id.to_string(),
                    found: node.depth,
                    expected: parent.depth + 1,
                });
            }
        } else if node.id != session.root_node_id {
            return Err(TreeError::OrphanNode {
                node: node.id.to_string(),
            });
        }
    }

    for node in session.nodes.values() {
        let listed: BTreeSet<&NodeId> = node.children.iter().collect();
        let linked: BTreeSet<&NodeId> = session
            .nodes
            .values()
            .filter(|child| {
                child
                    .parent
                    .as_ref()
                    .is_some_and(|link| link.parent_node_id == node.id)
            })
            .map(|child| &child.id)
            .collect();
        if listed != linked || listed.len() != node.children.len() {
            return Err(TreeError::ChildListMismatch {
                node: node.id.to_string(),
            });
        }

        for message in &node.messages {
            let len = message.text_len();
            for highlight in &message.highlights {
                if !listed.contains(&highlight.child_node_id) {
                    return Err(TreeError::DanglingHighlight {
                        node: node.id.to_string(),
                        child: highlight.child_node_id.to_string(),
                    });
                }
                if highlight.start_offset >= highlight.end_offset || highlight.end_offset > len {
                    return Err(TreeError::HighlightOutOfBounds {
                        node: node.id.to_string(),
                        start: highlight.start_offset,
                        end: highlight.end_offset,
                        len,
                    });
                }
            }
        }
    }

    for node_id in session.nodes.keys() {
        if path_to_root(session, node_id).is_empty() {
            return Err(TreeError::Unreachable {
                node: node_id.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::model::{Message, MessageId, Node, ParentLink, Selection};

    use super::*;

    fn session_with_chain() -> (Session, Vec<NodeId>) {
        let mut session = Session::new();
        let root_id = session.root_node_id.clone();
        let mut message = Message::assistant("Hi there");
        message.id = MessageId::from("m-root");

        let child = Node {
            id: NodeId::from("n-child"),
            depth: 1,
            header: None,
            parent: Some(ParentLink {
                parent_node_id: root_id.clone(),
                parent_message_id: message.id.clone(),
                selection: Selection::new("Hi", 0, 2),
            }),
            messages: vec![Arc::new(Message::user("Tell me more"))],
            children: Vec::new(),
        };

        let mut root = (**session.root().expect("root")).clone();
        root.messages.push(Arc::new(message));
        root.children.push(child.id.clone());
        session.nodes.insert(root_id.clone(), Arc::new(root));
        session.nodes.insert(child.id.clone(), Arc::new(child.clone()));

        (session, vec![root_id, child.id])
    }

    #[test]
    fn path_to_root_walks_parent_links() {
        let (session, chain) = session_with_chain();
        assert_eq!(path_to_root(&session, &chain[1]), chain);
        assert_eq!(path_to_root(&session, &chain[0]), vec![chain[0].clone()]);
        assert!(is_ancestor(&session, &chain[0], &chain[1]));
        assert!(!is_ancestor(&session, &chain[1], &chain[0]));
        assert_eq!(children_of(&session, &chain[0]), &chain[1..]);
    }

    #[test]
    fn path_to_root_is_empty_for_unknown_node() {
        let (session, _) = session_with_chain();
        assert!(path_to_root(&session, &NodeId::from("missing")).is_empty());
        assert!(children_of(&session, &NodeId::from("missing")).is_empty());
    }

    #[test]
    fn path_to_root_is_empty_for_cycles() {
        let (mut session, chain) = session_with_chain();
        let mut root = (**session.node(&chain[0]).expect("root")).clone();
        root.parent = Some(ParentLink {
            parent_node_id: chain[1].clone(),
            parent_message_id: MessageId::from("m"),
            selection: Selection::new("x", 0, 1),
        });
        session.nodes.insert(chain[0].clone(), Arc::new(root));

        assert!(path_to_root(&session, &chain[1]).is_empty());
    }

    #[test]
    fn valid_tree_passes_validation() {
        let (session, _) = session_with_chain();
        assert_eq!(validate_session(&session), Ok(()));
    }

    #[test]
    fn validation_rejects_depth_mismatch() {
        let (mut session, chain) = session_with_chain();
        let mut child = (**session.node(&chain[1]).expect("child")).clone();
        child.depth = 3;
        session.nodes.insert(chain[1].clone(), Arc::new(child));

        assert!(matches!(
            validate_session(&session),
            Err(TreeError::DepthMismatch { found: 3, expected: 1, .. })
        ));
    }

    #[test]
    fn validation_rejects_unlisted_child() {
        let (mut session, chain) = session_with_chain();
        let mut root = (**session.node(&chain[0]).expect("root")).clone();
        root.children.clear();
        session.nodes.insert(chain[0].clone(), Arc::new(root));

        assert!(matches!(
            validate_session(&session),
            Err(TreeError::ChildListMismatch { .. })
        ));
    }

    #[test]
    fn validation_rejects_dangling_parent() {
        let (mut session, chain) = session_with_chain();
        let mut child = (**session.node(&chain[1]).expect("child")).clone();
        if let Some(link) = child.parent.as_mut() {
            link.parent_node_id = NodeId::from("gone");
        }
        session.nodes.insert(chain[1].clone(), Arc::new(child));

        assert!(matches!(
            validate_session(&session),
            Err(TreeError::DanglingParent { .. })
        ));
    }
}
