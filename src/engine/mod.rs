//! Pure state transitions over [`BranchingState`].
//!
//! Every operation borrows the current snapshot and returns a new one; the
//! input is never modified. Operations that name an unknown session, node or
//! message, or that would produce an invalid tree, return an unchanged clone
//! of the input and log the rejection at `debug` level. Whenever the active
//! session is replaced or the active branch moves, highlight activation is
//! re-resolved so `is_active` always agrees with `active_branch_node_ids`.

mod branch;
mod completion;
mod messages;
mod sessions;

use std::sync::Arc;

use crate::activation::resolve_activation;
use crate::model::{BranchingState, NodeId, Session};

pub use completion::{fallback_message_text, CompletionOutcome, FALLBACK_MESSAGE_PREFIX};
pub use messages::ChildNodeRequest;

impl BranchingState {
    fn is_active_session(&self, session: &Session) -> bool {
        self.active_session_id.as_ref() == Some(&session.id)
    }

    /// Installs an edited copy of one session, bumping its `updated_at` and,
    /// when it is the active session, resolving activation on the current branch.
    fn with_session(&self, session: Session) -> Self {
        let mut next = self.clone();
        let session = Arc::new(session.touched());
        let session = if next.is_active_session(&session) {
            resolve_activation(&session, &next.active_branch_node_ids)
        } else {
            session
        };
        next.sessions.insert(session.id.clone(), session);
        next
    }

    /// Moves the active branch and current node, then resolves activation for
    /// the active session. The session is only replaced when a flag flips.
    fn with_branch(&self, branch: Vec<NodeId>, current: NodeId) -> Self {
        let mut next = self.clone();
        next.active_branch_node_ids = branch;
        next.current_node_id = Some(current);
        next.resolve_active_session();
        next
    }

    fn resolve_active_session(&mut self) {
        let Some(session) = self.active_session() else {
            return;
        };
        let resolved = resolve_activation(session, &self.active_branch_node_ids);
        if Arc::ptr_eq(&resolved, session) {
            return;
        }

        let resolved = Arc::new((*resolved).clone().touched());
        self.sessions.insert(resolved.id.clone(), resolved);
    }
}
