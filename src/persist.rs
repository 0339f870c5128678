//! Versioned encoding of [`BranchingState`] and hydration from a store.
//!
//! The persisted record is the camelCase JSON form of [`BranchingState`].
//! A record with another schema version, invalid JSON, or a session that
//! violates a tree invariant is treated as absent: hydration falls back to a
//! fresh state and never fails.

use serde::Deserialize;
use state_store::{StateStore, StateStoreError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::activation::resolve_activation;
use crate::model::{BranchingState, STATE_VERSION};
use crate::tree::{validate_session, TreeError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode state: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode state: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported state version {found:?}; expected {expected}")]
    UnsupportedVersion { found: Option<u64>, expected: u32 },

    #[error("session stored under key {key} has id {session}")]
    SessionKeyMismatch { key: String, session: String },

    #[error("session {session} is corrupt: {source}")]
    CorruptSession {
        session: String,
        #[source]
        source: TreeError,
    },

    #[error(transparent)]
    Store(#[from] StateStoreError),
}

#[derive(Deserialize)]
struct VersionHeader {
    version: Option<u64>,
}

/// Serializes `state` into the persisted record.
pub fn encode_state(state: &BranchingState) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec(state).map_err(|source| PersistError::Encode { source })
}

/// Parses and validates a persisted record.
///
/// The state is returned exactly as stored; see [`ensure_session_available`]
/// for making it usable.
pub fn decode_state(bytes: &[u8]) -> Result<BranchingState, PersistError> {
    let header: VersionHeader =
        serde_json::from_slice(bytes).map_err(|source| PersistError::Decode { source })?;
    if header.version != Some(u64::from(STATE_VERSION)) {
        return Err(PersistError::UnsupportedVersion {
            found: header.version,
            expected: STATE_VERSION,
        });
    }

    let state: BranchingState =
        serde_json::from_slice(bytes).map_err(|source| PersistError::Decode { source })?;
    for (key, session) in &state.sessions {
        if key != &session.id {
            return Err(PersistError::SessionKeyMismatch {
                key: key.to_string(),
                session: session.id.to_string(),
            });
        }
        validate_session(session).map_err(|source| PersistError::CorruptSession {
            session: session.id.to_string(),
            source,
        })?;
    }

    Ok(state)
}

/// Makes a decoded (or empty) state usable.
///
/// Keeps a valid active session, defaulting an empty branch to `[root]` and a
/// missing current node to the branch tail. Otherwise activates the first
/// session by creation order, or creates one when there are none. Highlight
/// activation is re-resolved for whichever session ends up active.
#[must_use]
pub fn ensure_session_available(mut state: BranchingState) -> BranchingState {
    if let Some(session) = state.active_session().cloned() {
        if state.active_branch_node_ids.is_empty() {
            state.active_branch_node_ids = vec![session.root_node_id.clone()];
        }
        if state.current_node_id.is_none() {
            state.current_node_id = state.active_branch_node_ids.last().cloned();
        }
        let resolved = resolve_activation(&session, &state.active_branch_node_ids);
        state.sessions.insert(resolved.id.clone(), resolved);
        return state;
    }

    match state.sessions_by_creation().first() {
        Some(first) => state.set_active_session(&first.id),
        None => state.with_new_session(),
    }
}

/// Loads, decodes and readies the state held by `store`.
///
/// Missing, unreadable, or invalid records all yield a fresh state.
pub fn hydrate(store: &dyn StateStore) -> BranchingState {
    let decoded = match store.load() {
        Ok(Some(bytes)) => match decode_state(&bytes) {
            Ok(state) => state,
            Err(error) => {
                warn!(%error, "discarding persisted state, starting fresh");
                BranchingState::empty()
            }
        },
        Ok(None) => {
            debug!("no persisted state, starting fresh");
            BranchingState::empty()
        }
        Err(error) => {
            warn!(%error, "failed to load persisted state, starting fresh");
            BranchingState::empty()
        }
    };

    ensure_session_available(decoded)
}

/// Encodes `state` and writes it to `store`.
pub fn save_state(store: &dyn StateStore, state: &BranchingState) -> Result<(), PersistError> {
    let bytes = encode_state(state)?;
    store.save(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use state_store::MemoryStateStore;

    use crate::model::{Message, NodeId, Selection};
    use crate::ChildNodeRequest;

    use super::*;

    fn populated() -> BranchingState {
        let state = BranchingState::fresh();
        let root = state.current_node_id.clone().expect("root");
        let reply = Message::assistant("Hi there");
        let reply_id = reply.id.clone();
        let state = state
            .append_message(&root, Message::user("Hello"))
            .append_message(&root, reply)
            .set_node_header(&root, Some("Greeting"));
        state
            .create_child_node(
                ChildNodeRequest::new(root, reply_id, Selection::new("Hi", 0, 2))
                    .with_initial_message(Message::user("Tell me more")),
            )
            .0
    }

    #[test]
    fn encoded_record_round_trips() {
        let state = populated();
        let bytes = encode_state(&state).expect("encode");
        assert_eq!(decode_state(&bytes).expect("decode"), state);
    }

    #[test]
    fn record_uses_camel_case_top_level_fields() {
        let bytes = encode_state(&populated()).expect("encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(value["version"], 1);
        for field in ["activeSessionId", "activeBranchNodeIds", "currentNodeId", "sessions"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&encode_state(&populated()).expect("encode")).expect("json");
        value["version"] = serde_json::json!(2);
        let bytes = serde_json::to_vec(&value).expect("bytes");

        assert!(matches!(
            decode_state(&bytes),
            Err(PersistError::UnsupportedVersion { found: Some(2), expected: 1 })
        ));
        assert!(matches!(
            decode_state(br#"{"sessions":{}}"#),
            Err(PersistError::UnsupportedVersion { found: None, .. })
        ));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        assert!(matches!(
            decode_state(b"{not json"),
            Err(PersistError::Decode { .. })
        ));
    }

    #[test]
    fn broken_tree_is_corrupt() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&encode_state(&populated()).expect("encode")).expect("json");
        let sessions = value["sessions"].as_object_mut().expect("sessions");
        let session = sessions.values_mut().next().expect("one session");
        let nodes = session["nodes"].as_object_mut().expect("nodes");
        for node in nodes.values_mut() {
            if !node["parent"].is_null() {
                node["parent"]["parentNodeId"] = serde_json::json!("gone");
            }
        }
        let bytes = serde_json::to_vec(&value).expect("bytes");

        assert!(matches!(
            decode_state(&bytes),
            Err(PersistError::CorruptSession { .. })
        ));
    }

    #[test]
    fn hydrate_falls_back_to_fresh_state() {
        for store in [
            MemoryStateStore::new(),
            MemoryStateStore::with_bytes(b"garbage".to_vec()),
            MemoryStateStore::with_bytes(br#"{"version":7}"#.to_vec()),
        ] {
            let state = hydrate(&store);
            assert_eq!(state.sessions.len(), 1);
            let session = state.active_session().expect("active session");
            assert_eq!(state.active_branch_node_ids, vec![session.root_node_id.clone()]);
        }
    }

    #[test]
    fn hydrate_restores_saved_state() {
        let store = MemoryStateStore::new();
        let state = populated();
        save_state(&store, &state).expect("save");

        assert_eq!(hydrate(&store), state);
    }

    #[test]
    fn ensure_session_available_repairs_missing_focus() {
        let mut state = populated();
        let session = state.active_session().cloned().expect("session");
        state.active_branch_node_ids.clear();
        state.current_node_id = None;

        let repaired = ensure_session_available(state);
        assert_eq!(repaired.active_branch_node_ids, vec![session.root_node_id.clone()]);
        assert_eq!(repaired.current_node_id, Some(session.root_node_id.clone()));
        let root = &repaired.active_session().expect("session").nodes[&session.root_node_id];
        assert!(!root.messages[1].highlights[0].is_active);
    }

    #[test]
    fn ensure_session_available_activates_a_stored_session() {
        let mut state = populated();
        state.active_session_id = None;
        state.current_node_id = Some(NodeId::from("stale"));

        let repaired = ensure_session_available(state);
        let session = repaired.active_session().expect("active session");
        assert_eq!(repaired.current_node_id, Some(session.root_node_id.clone()));
    }
}
