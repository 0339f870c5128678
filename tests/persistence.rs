use std::fs;

use rabbithole::{
    decode_state, encode_state, hydrate, save_state, BranchingState, ChildNodeRequest, Message,
    Selection, STATE_VERSION,
};
use state_store::{FileStateStore, StateStore};

fn reachable_state() -> BranchingState {
    let state = BranchingState::fresh();
    let root = state.current_node_id.clone().expect("root");
    let reply = Message::assistant("Rust borrows, it does not copy");
    let reply_id = reply.id.clone();
    let state = state
        .append_message(&root, Message::user("How does Rust manage memory?"))
        .append_message(&root, reply)
        .set_node_header(&root, Some("Memory"));
    let (state, child) = state.create_child_node(
        ChildNodeRequest::new(root.clone(), reply_id, Selection::new("borrows", 5, 12))
            .with_initial_message(Message::user("What is borrowing?")),
    );
    let child = child.expect("child");
    let state = state.set_node_header(&child, Some("Borrowing"));
    let first = state.active_session_id.clone().expect("first session");
    let (state, _) = state.create_session();
    state.set_active_session(&first).focus_node(&child)
}

#[test]
fn file_store_round_trips_a_reachable_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path().join("nested").join("state.json"));
    let state = reachable_state();

    save_state(&store, &state).expect("save");
    let restored = hydrate(&store);

    assert_eq!(restored, state);
    assert_eq!(decode_state(&encode_state(&state).expect("encode")).expect("decode"), state);
}

#[test]
fn persisted_record_is_versioned_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    let store = FileStateStore::new(&path);
    save_state(&store, &reachable_state()).expect("save");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(value["version"], STATE_VERSION);
    assert!(value["activeBranchNodeIds"].is_array());
    let session = value["sessions"]
        .as_object()
        .and_then(|sessions| sessions.values().find(|session| session["title"] == "Memory"))
        .expect("titled session");
    assert!(session["rootNodeId"].is_string());
}

#[test]
fn corrupt_file_hydrates_to_a_fresh_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    fs::write(&path, b"{\"version\": 1, \"sessions\": ").expect("write");
    let store = FileStateStore::new(&path);

    let state = hydrate(&store);
    let session = state.active_session().expect("active session");
    assert_eq!(state.sessions.len(), 1);
    assert_eq!(session.message_count(), 0);
    assert_eq!(state.current_node_id.as_ref(), Some(&session.root_node_id));
}

#[test]
fn missing_file_hydrates_to_a_fresh_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path().join("absent.json"));

    assert_eq!(store.load().expect("load"), None);
    assert_eq!(hydrate(&store).sessions.len(), 1);
}
