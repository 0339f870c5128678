//! Entity shapes of the branching conversation tree.
//!
//! Every container that a mutation may replace is held behind an [`Arc`], so a
//! new snapshot shares every untouched node/message with its predecessor and
//! readers can detect change with [`Arc::ptr_eq`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use chat_provider::Role;

/// Schema version stamped into every persisted record.
pub const STATE_VERSION: u32 = 1;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> Timestamp {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Allocates a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifies a [`Session`] within a [`BranchingState`].
    SessionId
);
string_id!(
    /// Identifies a [`Node`] within its session.
    NodeId
);
string_id!(
    /// Identifies a [`Message`] within its session.
    MessageId
);
string_id!(HighlightId);

/// A span of a message that anchors exactly one child node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub child_node_id: NodeId,
    /// Snapshot of the spanned text; also what the span displays as.
    pub text: String,
    /// Canonical start offset (chars) into the owning message's raw text.
    pub start_offset: usize,
    /// Canonical end offset (exclusive).
    pub end_offset: usize,
    /// Derived: the active branch continues from the owner into the target child.
    #[serde(default)]
    pub is_active: bool,
}

impl Highlight {
    /// Raw span length in chars.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }
}

/// One atomic conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            text: text.into(),
            created_at: now_millis(),
            highlights: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Length of the raw text in chars, the unit every offset is measured in.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A span chosen in a parent message, in canonical offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Selection {
    #[must_use]
    pub fn new(text: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
        }
    }
}

/// Back-pointer from a child node to the message span it branched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    pub parent_node_id: NodeId,
    pub parent_message_id: MessageId,
    pub selection: Selection,
}

/// A vertex of the conversation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub depth: u32,
    pub header: Option<String>,
    pub parent: Option<ParentLink>,
    pub messages: Vec<Arc<Message>>,
    /// Child ids in creation order; kept consistent with the children's parent links.
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl Node {
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: NodeId::generate(),
            depth: 0,
            header: None,
            parent: None,
            messages: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn message(&self, message_id: &MessageId) -> Option<&Arc<Message>> {
        self.messages.iter().find(|message| &message.id == message_id)
    }
}

/// One full conversation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    /// Mirrors the root node's header.
    pub title: Option<String>,
    pub root_node_id: NodeId,
    pub nodes: BTreeMap<NodeId, Arc<Node>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    /// Creates a session holding only an empty root node.
    #[must_use]
    pub fn new() -> Self {
        let root = Node::root();
        let now = now_millis();
        Self {
            id: SessionId::generate(),
            title: None,
            root_node_id: root.id.clone(),
            nodes: BTreeMap::from([(root.id.clone(), Arc::new(root))]),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(node_id)
    }

    #[must_use]
    pub fn root(&self) -> Option<&Arc<Node>> {
        self.nodes.get(&self.root_node_id)
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.nodes.values().map(|node| node.messages.len()).sum()
    }

    /// Returns a copy with `updated_at` bumped.
    #[must_use]
    pub(crate) fn touched(mut self) -> Self {
        self.updated_at = now_millis().max(self.updated_at);
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide engine state; replaced wholesale by every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchingState {
    pub version: u32,
    pub active_session_id: Option<SessionId>,
    pub active_branch_node_ids: Vec<NodeId>,
    pub current_node_id: Option<NodeId>,
    pub sessions: BTreeMap<SessionId, Arc<Session>>,
}

impl BranchingState {
    /// State with no sessions at all; only valid transiently.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: STATE_VERSION,
            active_session_id: None,
            active_branch_node_ids: Vec::new(),
            current_node_id: None,
            sessions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn session(&self, session_id: &SessionId) -> Option<&Arc<Session>> {
        self.sessions.get(session_id)
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&Arc<Session>> {
        self.active_session_id
            .as_ref()
            .and_then(|session_id| self.sessions.get(session_id))
    }

    #[must_use]
    pub fn current_node(&self) -> Option<&Arc<Node>> {
        let session = self.active_session()?;
        self.current_node_id
            .as_ref()
            .and_then(|node_id| session.node(node_id))
    }

    /// Nodes of the active branch in order, skipping ids absent from the session.
    #[must_use]
    pub fn active_nodes(&self) -> Vec<Arc<Node>> {
        let Some(session) = self.active_session() else {
            return Vec::new();
        };

        self.active_branch_node_ids
            .iter()
            .filter_map(|node_id| session.node(node_id).cloned())
            .collect()
    }

    /// Sessions ordered by `(created_at, id)`.
    #[must_use]
    pub fn sessions_by_creation(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        sessions
    }
}

impl Default for BranchingState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_holds_only_an_empty_root() {
        let session = Session::new();
        let root = session.root().expect("root should exist");

        assert_eq!(session.nodes.len(), 1);
        assert_eq!(root.depth, 0);
        assert!(root.parent.is_none());
        assert!(root.messages.is_empty());
        assert!(session.title.is_none());
    }

    #[test]
    fn text_len_counts_chars_not_bytes() {
        assert_eq!(Message::user("héllo").text_len(), 5);
    }

    #[test]
    fn persisted_field_names_are_camel_case() {
        let mut message = Message::assistant("Hi there");
        message.highlights.push(Highlight {
            id: HighlightId::from("h-1"),
            child_node_id: NodeId::from("n-2"),
            text: "Hi".to_string(),
            start_offset: 0,
            end_offset: 2,
            is_active: true,
        });

        let value = serde_json::to_value(&message).expect("message should encode");
        assert_eq!(value["role"], "assistant");
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["highlights"][0]["childNodeId"], "n-2");
        assert_eq!(value["highlights"][0]["startOffset"], 0);
        assert_eq!(value["highlights"][0]["isActive"], true);
    }

    #[test]
    fn ids_are_unique_and_transparent() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert_eq!(
            serde_json::to_string(&NodeId::from("n-1")).expect("id should encode"),
            "\"n-1\""
        );
    }

    #[test]
    fn sessions_by_creation_orders_by_timestamp_then_id() {
        let mut state = BranchingState::empty();
        let mut older = Session::new();
        older.created_at = 10;
        let mut newer = Session::new();
        newer.created_at = 20;
        state.sessions.insert(newer.id.clone(), Arc::new(newer.clone()));
        state.sessions.insert(older.id.clone(), Arc::new(older.clone()));

        let ordered: Vec<SessionId> = state
            .sessions_by_creation()
            .iter()
            .map(|session| session.id.clone())
            .collect();
        assert_eq!(ordered, vec![older.id, newer.id]);
    }
}
