//! Plain-text views of the conversation state for the REPL.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use chat_provider::HistoryLine;
use rabbithole::slug::node_slug_map;
use rabbithole::{BranchingState, Message, Node, NodeId, Session};

const UNTITLED: &str = "Untitled";

fn title_of(session: &Session) -> &str {
    session.title.as_deref().unwrap_or(UNTITLED)
}

fn header_of(node: &Node) -> &str {
    node.header.as_deref().unwrap_or(UNTITLED)
}

/// Sessions in creation order, numbered from 1; `*` marks the active one.
pub fn render_sessions(state: &BranchingState) -> String {
    let mut out = String::new();
    for (index, session) in state.sessions_by_creation().iter().enumerate() {
        let marker = if state.active_session_id.as_ref() == Some(&session.id) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {}. {} ({} messages)",
            index + 1,
            title_of(session),
            session.message_count()
        );
    }
    out
}

/// Indented tree of the active session. Nodes on the active branch are marked
/// `>`, the current node `@`, and nodes awaiting a reply `...`.
pub fn render_tree(state: &BranchingState, loading: &HashSet<NodeId>) -> String {
    let Some(session) = state.active_session() else {
        return String::new();
    };
    let slugs = node_slug_map(session);
    let mut out = String::new();
    let mut stack = vec![session.root_node_id.clone()];

    while let Some(node_id) = stack.pop() {
        let Some(node) = session.node(&node_id) else {
            continue;
        };
        let marker = if state.current_node_id.as_ref() == Some(&node.id) {
            '@'
        } else if state.active_branch_node_ids.contains(&node.id) {
            '>'
        } else {
            ' '
        };
        let pending = if loading.contains(&node.id) { " ..." } else { "" };
        let slug = slugs.get(&node.id).map(String::as_str).unwrap_or_default();
        let _ = writeln!(
            out,
            "{marker} {}{} [{slug}]{pending}",
            "  ".repeat(node.depth as usize),
            header_of(node),
        );
        stack.extend(node.children.iter().rev().cloned());
    }

    out
}

fn render_message(
    out: &mut String,
    number: Option<usize>,
    message: &Message,
    slugs: &BTreeMap<NodeId, String>,
) {
    let label = match number {
        Some(number) => format!("{number}. {}", message.role),
        None => message.role.to_string(),
    };
    let _ = writeln!(out, "  {label}: {}", message.text);
    for highlight in &message.highlights {
        let target = slugs
            .get(&highlight.child_node_id)
            .map(String::as_str)
            .unwrap_or_default();
        let active = if highlight.is_active { " (active)" } else { "" };
        let _ = writeln!(
            out,
            "       [{}, {}) \"{}\" -> {target}{active}",
            highlight.start_offset, highlight.end_offset, highlight.text
        );
    }
}

/// Every node along the active branch with its messages. Messages of the
/// current node are numbered for use with `/branch`.
pub fn render_branch(state: &BranchingState, loading: &HashSet<NodeId>) -> String {
    let Some(session) = state.active_session() else {
        return String::new();
    };
    let slugs = node_slug_map(session);
    let mut out = String::new();

    for node in state.active_nodes() {
        let is_current = state.current_node_id.as_ref() == Some(&node.id);
        let _ = writeln!(
            out,
            "== {} [{}]{}",
            header_of(&node),
            slugs.get(&node.id).map(String::as_str).unwrap_or_default(),
            if is_current { " (current)" } else { "" }
        );
        if let Some(link) = &node.parent {
            let _ = writeln!(out, "  branched from \"{}\"", link.selection.text);
        }
        for (index, message) in node.messages.iter().enumerate() {
            render_message(&mut out, is_current.then_some(index + 1), message, &slugs);
        }
        if loading.contains(&node.id) {
            let _ = writeln!(out, "  assistant: ...");
        }
    }

    out
}

pub fn render_history(lines: &[HistoryLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{}: {}", line.role, line.text);
    }
    out
}
