use tracing::debug;

use crate::model::{BranchingState, NodeId};
use crate::tree::path_to_root;

impl BranchingState {
    /// Replaces the active branch wholesale; the current node becomes its tail.
    ///
    /// The caller vouches that `branch` is a connected root-to-node path in the
    /// active session. Empty branches and states without an active session are
    /// ignored.
    #[must_use]
    pub fn set_active_branch(&self, branch: &[NodeId]) -> Self {
        let Some(tail) = branch.last() else {
            debug!("set_active_branch: empty branch");
            return self.clone();
        };
        if self.active_session().is_none() {
            debug!("set_active_branch: no active session");
            return self.clone();
        }

        self.with_branch(branch.to_vec(), tail.clone())
    }

    /// Moves the current node along the active branch without changing it.
    #[must_use]
    pub fn set_current_node_id(&self, node_id: &NodeId) -> Self {
        let known = self
            .active_session()
            .is_some_and(|session| session.node(node_id).is_some());
        if !known
            || !self.active_branch_node_ids.contains(node_id)
            || self.current_node_id.as_ref() == Some(node_id)
        {
            return self.clone();
        }

        let mut next = self.clone();
        next.current_node_id = Some(node_id.clone());
        next
    }

    /// Jumps to any node of the active session: the branch becomes its root path.
    #[must_use]
    pub fn focus_node(&self, node_id: &NodeId) -> Self {
        let path = self
            .active_session()
            .map(|session| path_to_root(session, node_id))
            .unwrap_or_default();
        if path.is_empty() {
            debug!(node = %node_id, "focus_node: node is not reachable in the active session");
            return self.clone();
        }

        self.with_branch(path, node_id.clone())
    }
}
