use std::sync::Arc;

use chat_provider::{CompletionError, CompletionResponse};
use tracing::debug;

use crate::model::{BranchingState, Message, NodeId, SessionId};

/// Result of one completion request, as handed back to the engine.
pub type CompletionOutcome = Result<CompletionResponse, CompletionError>;

/// Leading sentence of the assistant message appended when a completion fails.
pub const FALLBACK_MESSAGE_PREFIX: &str = "I couldn't fetch a response.";

/// User-visible assistant text standing in for a failed completion.
#[must_use]
pub fn fallback_message_text(error: &CompletionError) -> String {
    format!("{FALLBACK_MESSAGE_PREFIX} {error}")
}

fn normalize_header(header: Option<&str>) -> Option<String> {
    header
        .map(str::trim)
        .filter(|header| !header.is_empty())
        .map(str::to_string)
}

impl BranchingState {
    /// Sets a node header in the active session. See [`Self::set_node_header_in`].
    #[must_use]
    pub fn set_node_header(&self, node_id: &NodeId, header: Option<&str>) -> Self {
        match self.active_session_id.clone() {
            Some(session_id) => self.set_node_header_in(&session_id, node_id, header),
            None => self.clone(),
        }
    }

    /// Sets a node header, trimmed; blank headers clear it.
    ///
    /// The root node's header is mirrored into the session title. Setting the
    /// value a node already carries returns an equal state.
    #[must_use]
    pub fn set_node_header_in(
        &self,
        session_id: &SessionId,
        node_id: &NodeId,
        header: Option<&str>,
    ) -> Self {
        let Some(session) = self.session(session_id) else {
            debug!(session = %session_id, "set_node_header: unknown session");
            return self.clone();
        };
        let Some(node) = session.node(node_id) else {
            debug!(session = %session_id, node = %node_id, "set_node_header: unknown node");
            return self.clone();
        };

        let header = normalize_header(header);
        let is_root = node.id == session.root_node_id;
        if node.header == header && (!is_root || session.title == header) {
            return self.clone();
        }

        let mut node = (**node).clone();
        node.header = header.clone();
        let mut session = (**session).clone();
        if is_root {
            session.title = header;
        }
        session.nodes.insert(node.id.clone(), Arc::new(node));
        self.with_session(session)
    }

    /// Lands a completion result on the node it was requested for.
    ///
    /// The target is addressed by id, so a late reply still lands after the
    /// user has moved to another branch or session. Success appends the reply
    /// and adopts the response header only when the node has none yet; failure
    /// appends a fallback assistant message.
    #[must_use]
    pub fn apply_completion(
        &self,
        session_id: &SessionId,
        node_id: &NodeId,
        outcome: &CompletionOutcome,
    ) -> Self {
        match outcome {
            Ok(response) => {
                let next = self.append_message_in(
                    session_id,
                    node_id,
                    Message::assistant(response.message.clone()),
                );
                let has_header = next
                    .session(session_id)
                    .and_then(|session| session.node(node_id))
                    .map_or(true, |node| node.header.is_some());
                if has_header {
                    next
                } else {
                    next.set_node_header_in(session_id, node_id, Some(&response.header))
                }
            }
            Err(error) => self.append_message_in(
                session_id,
                node_id,
                Message::assistant(fallback_message_text(error)),
            ),
        }
    }
}
