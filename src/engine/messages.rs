use std::sync::Arc;

use tracing::debug;

use crate::model::{
    BranchingState, Highlight, HighlightId, Message, MessageId, Node, NodeId, ParentLink,
    Selection, SessionId,
};
use crate::offset::overlaps;
use crate::tree::path_to_root;

/// Arguments for [`BranchingState::create_child_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNodeRequest {
    pub parent_node_id: NodeId,
    pub parent_message_id: MessageId,
    /// Canonical span of the parent message the child branches from.
    pub selection: Selection,
    pub initial_message: Option<Message>,
}

impl ChildNodeRequest {
    #[must_use]
    pub fn new(parent_node_id: NodeId, parent_message_id: MessageId, selection: Selection) -> Self {
        Self {
            parent_node_id,
            parent_message_id,
            selection,
            initial_message: None,
        }
    }

    #[must_use]
    pub fn with_initial_message(mut self, message: Message) -> Self {
        self.initial_message = Some(message);
        self
    }
}

impl BranchingState {
    /// Appends `message` to a node of the active session.
    #[must_use]
    pub fn append_message(&self, node_id: &NodeId, message: Message) -> Self {
        match self.active_session_id.clone() {
            Some(session_id) => self.append_message_in(&session_id, node_id, message),
            None => {
                debug!(node = %node_id, "append_message: no active session");
                self.clone()
            }
        }
    }

    /// Appends `message` to a node of any session, active or not.
    #[must_use]
    pub fn append_message_in(
        &self,
        session_id: &SessionId,
        node_id: &NodeId,
        message: Message,
    ) -> Self {
        let Some(session) = self.session(session_id) else {
            debug!(session = %session_id, "append_message: unknown session");
            return self.clone();
        };
        let Some(node) = session.node(node_id) else {
            debug!(session = %session_id, node = %node_id, "append_message: unknown node");
            return self.clone();
        };

        let mut node = (**node).clone();
        node.messages.push(Arc::new(message));
        let mut session = (**session).clone();
        session.nodes.insert(node.id.clone(), Arc::new(node));
        self.with_session(session)
    }

    /// Forks a new child node from a span of a message in the active session.
    ///
    /// The child becomes the tail of the active branch and the current node.
    /// Returns `None` as the id, with the state unchanged, when the parent
    /// node or message is unknown, the selection is out of bounds, or it
    /// overlaps an existing highlight on that message.
    #[must_use]
    pub fn create_child_node(&self, request: ChildNodeRequest) -> (Self, Option<NodeId>) {
        let Some(session) = self.active_session() else {
            debug!("create_child_node: no active session");
            return (self.clone(), None);
        };
        let Some(parent) = session.node(&request.parent_node_id) else {
            debug!(node = %request.parent_node_id, "create_child_node: unknown parent node");
            return (self.clone(), None);
        };
        let Some(message_index) = parent
            .messages
            .iter()
            .position(|message| message.id == request.parent_message_id)
        else {
            debug!(
                message = %request.parent_message_id,
                "create_child_node: unknown parent message"
            );
            return (self.clone(), None);
        };

        let message = &parent.messages[message_index];
        let (start, end) = (request.selection.start_offset, request.selection.end_offset);
        if start >= end || end > message.text_len() {
            debug!(
                start,
                end,
                len = message.text_len(),
                "create_child_node: selection out of bounds"
            );
            return (self.clone(), None);
        }
        if overlaps(start, end, &message.highlights) {
            debug!(start, end, "create_child_node: selection overlaps an existing highlight");
            return (self.clone(), None);
        }

        let child_id = NodeId::generate();

        let mut message = (**message).clone();
        message.highlights.push(Highlight {
            id: HighlightId::generate(),
            child_node_id: child_id.clone(),
            text: request.selection.text.clone(),
            start_offset: start,
            end_offset: end,
            is_active: false,
        });

        let mut updated_parent = (**parent).clone();
        updated_parent.messages[message_index] = Arc::new(message);
        updated_parent.children.push(child_id.clone());

        let child = Node {
            id: child_id.clone(),
            depth: parent.depth + 1,
            header: None,
            parent: Some(ParentLink {
                parent_node_id: parent.id.clone(),
                parent_message_id: request.parent_message_id,
                selection: request.selection,
            }),
            messages: request.initial_message.map(Arc::new).into_iter().collect(),
            children: Vec::new(),
        };

        let mut branch = match self
            .active_branch_node_ids
            .iter()
            .position(|node_id| node_id == &parent.id)
        {
            Some(index) => self.active_branch_node_ids[..=index].to_vec(),
            None => path_to_root(session, &parent.id),
        };
        branch.push(child_id.clone());

        let mut next_session = (**session).clone();
        next_session
            .nodes
            .insert(updated_parent.id.clone(), Arc::new(updated_parent));
        next_session.nodes.insert(child_id.clone(), Arc::new(child));

        let mut next = self.clone();
        next.active_branch_node_ids = branch;
        next.current_node_id = Some(child_id.clone());
        (next.with_session(next_session), Some(child_id))
    }
}
