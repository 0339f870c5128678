#![allow(unused_imports)]

use rabbithole::config::{EnvConfig, CHAT_URL_VAR, PROVIDER_VAR, STATE_PATH_VAR};
use rabbithole::debounce::{Debouncer, DEFAULT_PERSIST_DEBOUNCE};
use rabbithole::offset::{canonical_selection, overlaps, to_canonical};
use rabbithole::slug::{find_node_by_slug, node_slug_map, slugify};
use rabbithole::tree::{children_of, is_ancestor};
use rabbithole::{
    branch_note, build_history, build_session_history, decode_state, encode_state,
    ensure_session_available, fallback_message_text, hydrate, path_to_root, resolve_activation,
    save_state, validate_session, BranchingState, ChildNodeRequest, CompletionOutcome, Highlight,
    HighlightId, Message, MessageId, Node, NodeId, ParentLink, PersistError, Role, Selection,
    Session, SessionId, TreeError, STATE_VERSION,
};

#[test]
fn public_api_exports_compile() {}
