//! Linear model context reconstructed from a branch path.

use chat_provider::HistoryLine;

use crate::model::{BranchingState, NodeId, Session};

/// Maximum number of chars of the selection quoted in a branch note.
pub const BRANCH_NOTE_MAX_CHARS: usize = 140;

/// Synthetic user line marking the text a branch was forked from.
#[must_use]
pub fn branch_note(selection_text: &str) -> String {
    let quoted: String = selection_text.chars().take(BRANCH_NOTE_MAX_CHARS).collect();
    format!("[Branch created from previous text: \"{quoted}\"]")
}

/// History for `branch` within the active session; empty without one.
#[must_use]
pub fn build_history(state: &BranchingState, branch: &[NodeId]) -> Vec<HistoryLine> {
    state
        .active_session()
        .map(|session| build_session_history(session, branch))
        .unwrap_or_default()
}

/// Walks `branch` in order, emitting a branch note before every non-first
/// node that has a parent link, followed by that node's messages.
///
/// Ids missing from `session` are skipped.
#[must_use]
pub fn build_session_history(session: &Session, branch: &[NodeId]) -> Vec<HistoryLine> {
    let mut lines = Vec::new();

    for (index, node_id) in branch.iter().enumerate() {
        let Some(node) = session.node(node_id) else {
            continue;
        };

        if index > 0 {
            if let Some(link) = &node.parent {
                lines.push(HistoryLine::user(branch_note(&link.selection.text)));
            }
        }

        lines.extend(
            node.messages
                .iter()
                .map(|message| HistoryLine::new(message.role, message.text.clone())),
        );
    }

    lines
}
