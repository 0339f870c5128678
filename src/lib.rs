//! Branching conversation trees.
//!
//! Any span of an assistant reply can be forked into its own child
//! conversation. A [`Session`] holds one tree of [`Node`]s; the
//! [`BranchingState`] tracks every session plus the active branch (a
//! root-to-node path) the user is extending.
//!
//! Invariant: a [`BranchingState`] is never modified in place. Every mutation
//! is a method taking `&self` and returning the next snapshot, which shares
//! untouched sessions, nodes and messages with its predecessor.
//!
//! # Public API Overview
//! - Build and navigate trees with the mutation methods on [`BranchingState`]
//!   (`create_session`, `append_message`, [`ChildNodeRequest`] forks, `focus_node`, ...).
//! - Linearize a branch for the model with [`build_history`].
//! - Translate rendered selections with [`offset::canonical_selection`].
//! - Persist and restore with [`hydrate`] / [`save_state`] over any
//!   [`state_store::StateStore`], coalescing writes with [`Debouncer`].

#![allow(clippy::unnecessary_map_or)]

pub mod activation;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod history;
pub mod logging;
pub mod model;
pub mod offset;
pub mod persist;
pub mod slug;
pub mod tree;

pub use crate::activation::resolve_activation;
pub use crate::config::EnvConfig;
pub use crate::debounce::Debouncer;
pub use crate::engine::{fallback_message_text, ChildNodeRequest, CompletionOutcome};
pub use crate::history::{branch_note, build_history, build_session_history};
pub use crate::model::{
    BranchingState, Highlight, HighlightId, Message, MessageId, Node, NodeId, ParentLink, Role,
    Selection, Session, SessionId, STATE_VERSION,
};
pub use crate::persist::{
    decode_state, encode_state, ensure_session_available, hydrate, save_state, PersistError,
};
pub use crate::tree::{path_to_root, validate_session, TreeError};
