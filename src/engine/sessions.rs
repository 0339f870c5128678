use std::sync::Arc;

use tracing::debug;

use crate::model::{BranchingState, Session, SessionId};

impl BranchingState {
    /// A state holding one freshly created, active session.
    #[must_use]
    pub fn fresh() -> Self {
        Self::empty().with_new_session()
    }

    /// Adds a new empty session and makes it active with branch `[root]`.
    #[must_use]
    pub fn with_new_session(&self) -> Self {
        self.create_session().0
    }

    /// Like [`Self::with_new_session`], also returning the new session's id.
    #[must_use]
    pub fn create_session(&self) -> (Self, SessionId) {
        let session = Session::new();
        let session_id = session.id.clone();
        let root_id = session.root_node_id.clone();

        let mut next = self.clone();
        next.sessions.insert(session_id.clone(), Arc::new(session));
        next.active_session_id = Some(session_id.clone());
        next.active_branch_node_ids = vec![root_id.clone()];
        next.current_node_id = Some(root_id);
        (next, session_id)
    }

    /// Removes a session.
    ///
    /// Deleting the active session activates the first remaining session in
    /// [`Self::sessions_by_creation`] order; deleting the last session yields
    /// [`Self::fresh`].
    #[must_use]
    pub fn delete_session(&self, session_id: &SessionId) -> Self {
        if !self.sessions.contains_key(session_id) {
            debug!(session = %session_id, "delete_session: unknown session");
            return self.clone();
        }

        let mut next = self.clone();
        next.sessions.remove(session_id);
        if next.sessions.is_empty() {
            return Self::fresh();
        }
        if self.active_session_id.as_ref() != Some(session_id) {
            return next;
        }

        match next.sessions_by_creation().first() {
            Some(first) => next.activate(first),
            None => Self::fresh(),
        }
    }

    /// Activates a known session with branch `[root]`; unknown ids are ignored.
    #[must_use]
    pub fn set_active_session(&self, session_id: &SessionId) -> Self {
        match self.session(session_id) {
            Some(session) => self.activate(session),
            None => {
                debug!(session = %session_id, "set_active_session: unknown session");
                self.clone()
            }
        }
    }

    fn activate(&self, session: &Session) -> Self {
        let mut next = self.clone();
        next.active_session_id = Some(session.id.clone());
        next.with_branch(
            vec![session.root_node_id.clone()],
            session.root_node_id.clone(),
        )
    }
}
