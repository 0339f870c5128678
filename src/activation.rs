//! Derivation of every highlight's `is_active` flag from the active branch.
//!
//! A highlight is active iff the branch continues from its owning node
//! directly into the highlight's target child. The flag is never set by hand;
//! it is recomputed here after every mutation that can move the branch.

use std::sync::Arc;

use crate::model::{Highlight, Message, Node, NodeId, Session};

/// True when `branch` steps from `owner` straight into `highlight`'s child.
#[must_use]
pub fn highlight_is_active(highlight: &Highlight, branch: &[NodeId], owner: &NodeId) -> bool {
    branch
        .iter()
        .position(|node_id| node_id == owner)
        .and_then(|index| branch.get(index + 1))
        .is_some_and(|next| next == &highlight.child_node_id)
}

/// Recomputes highlight activation for every node of `session`.
///
/// Only nodes and messages whose flags actually change are replaced; when
/// nothing changes the input `Arc` itself is returned.
#[must_use]
pub fn resolve_activation(session: &Arc<Session>, branch: &[NodeId]) -> Arc<Session> {
    let mut replaced: Vec<(NodeId, Arc<Node>)> = Vec::new();

    for node in session.nodes.values() {
        if let Some(next_node) = resolve_node(node, branch) {
            replaced.push((node.id.clone(), next_node));
        }
    }

    if replaced.is_empty() {
        return Arc::clone(session);
    }

    let mut next = (**session).clone();
    next.nodes.extend(replaced);
    Arc::new(next)
}

fn resolve_node(node: &Arc<Node>, branch: &[NodeId]) -> Option<Arc<Node>> {
    let mut changed = false;
    let messages: Vec<Arc<Message>> = node
        .messages
        .iter()
        .map(|message| match resolve_message(message, branch, &node.id) {
            Some(next) => {
                changed = true;
                next
            }
            None => Arc::clone(message),
        })
        .collect();

    changed.then(|| {
        Arc::new(Node {
            messages,
            ..(**node).clone()
        })
    })
}

fn resolve_message(message: &Arc<Message>, branch: &[NodeId], owner: &NodeId) -> Option<Arc<Message>> {
    let stale = message
        .highlights
        .iter()
        .any(|highlight| highlight.is_active != highlight_is_active(highlight, branch, owner));
    if !stale {
        return None;
    }

    let mut next = (**message).clone();
    for highlight in &mut next.highlights {
        highlight.is_active = highlight_is_active(highlight, branch, owner);
    }
    Some(Arc::new(next))
}

#[cfg(test)]
mod tests {
    use crate::model::{HighlightId, MessageId, ParentLink, Selection};

    use super::*;

    struct Fixture {
        session: Arc<Session>,
        root: NodeId,
        left: NodeId,
        right: NodeId,
    }

    fn child(id: &str, parent: &NodeId, message: &MessageId) -> Node {
        Node {
            id: NodeId::from(id),
            depth: 1,
            header: None,
            parent: Some(ParentLink {
                parent_node_id: parent.clone(),
                parent_message_id: message.clone(),
                selection: Selection::new("x", 0, 1),
            }),
            messages: Vec::new(),
            children: Vec::new(),
        }
    }

    fn highlight(child: &NodeId, start: usize, active: bool) -> Highlight {
        Highlight {
            id: HighlightId::generate(),
            child_node_id: child.clone(),
            text: "x".to_string(),
            start_offset: start,
            end_offset: start + 1,
            is_active: active,
        }
    }

    fn fixture(left_active: bool) -> Fixture {
        let mut session = Session::new();
        let root = session.root_node_id.clone();
        let mut message = Message::assistant("xyz");
        let left = child("n-left", &root, &message.id);
        let right = child("n-right", &root, &message.id);
        message.highlights = vec![
            highlight(&left.id, 0, left_active),
            highlight(&right.id, 2, false),
        ];

        let mut root_node = (**session.root().expect("root")).clone();
        root_node.messages.push(Arc::new(message));
        root_node.children = vec![left.id.clone(), right.id.clone()];
        session.nodes.insert(root.clone(), Arc::new(root_node));
        let (left_id, right_id) = (left.id.clone(), right.id.clone());
        session.nodes.insert(left.id.clone(), Arc::new(left));
        session.nodes.insert(right.id.clone(), Arc::new(right));

        Fixture {
            session: Arc::new(session),
            root,
            left: left_id,
            right: right_id,
        }
    }

    fn flags(session: &Session, root: &NodeId) -> Vec<bool> {
        session.nodes[root].messages[0]
            .highlights
            .iter()
            .map(|highlight| highlight.is_active)
            .collect()
    }

    #[test]
    fn activation_follows_the_next_branch_node() {
        let f = fixture(false);
        let resolved = resolve_activation(&f.session, &[f.root.clone(), f.right.clone()]);
        assert_eq!(flags(&resolved, &f.root), vec![false, true]);

        let resolved = resolve_activation(&resolved, &[f.root.clone(), f.left.clone()]);
        assert_eq!(flags(&resolved, &f.root), vec![true, false]);
    }

    #[test]
    fn branch_ending_at_owner_deactivates_everything() {
        let f = fixture(true);
        let resolved = resolve_activation(&f.session, &[f.root.clone()]);
        assert_eq!(flags(&resolved, &f.root), vec![false, false]);
    }

    #[test]
    fn owner_missing_from_branch_is_inactive() {
        let f = fixture(true);
        let resolved = resolve_activation(&f.session, &[f.left.clone()]);
        assert_eq!(flags(&resolved, &f.root), vec![false, false]);
    }

    #[test]
    fn unchanged_session_is_returned_as_is() {
        let f = fixture(true);
        let resolved = resolve_activation(&f.session, &[f.root.clone(), f.left.clone()]);
        assert!(Arc::ptr_eq(&resolved, &f.session));
    }

    #[test]
    fn only_changed_nodes_are_replaced() {
        let f = fixture(true);
        let resolved = resolve_activation(&f.session, &[f.root.clone(), f.right.clone()]);

        assert!(!Arc::ptr_eq(&resolved.nodes[&f.root], &f.session.nodes[&f.root]));
        assert!(Arc::ptr_eq(&resolved.nodes[&f.left], &f.session.nodes[&f.left]));
        assert!(Arc::ptr_eq(&resolved.nodes[&f.right], &f.session.nodes[&f.right]));
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let f = fixture(false);
        let branch = [f.root.clone(), f.left.clone()];
        let once = resolve_activation(&f.session, &branch);
        let twice = resolve_activation(&once, &branch);

        assert_eq!(once, twice);
        assert!(Arc::ptr_eq(&once, &twice));
    }
}
