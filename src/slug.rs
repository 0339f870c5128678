//! Human-readable node names derived from headers.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Node, NodeId, Session};

/// Slug used for nodes with no usable header.
pub const UNTITLED_SLUG: &str = "untitled";

/// Lowercases `value` and collapses every run of non-ASCII-alphanumerics into
/// a single `-`, trimming dashes at both ends.
#[must_use]
pub fn slugify(value: Option<&str>) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for ch in value.unwrap_or_default().trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        UNTITLED_SLUG.to_string()
    } else {
        slug
    }
}

/// Unique slug for every node of `session`.
///
/// Nodes are visited by `(depth, id)`; the first node to claim a slug keeps
/// it and later ones get `-2`, `-3`, ... suffixes.
#[must_use]
pub fn node_slug_map(session: &Session) -> BTreeMap<NodeId, String> {
    let mut nodes: Vec<&Node> = session.nodes.values().map(|node| &**node).collect();
    nodes.sort_by(|a, b| (a.depth, &a.id).cmp(&(b.depth, &b.id)));

    let mut taken = HashSet::new();
    let mut slugs = BTreeMap::new();
    for node in nodes {
        let base = slugify(node.header.as_deref());
        let mut slug = base.clone();
        let mut suffix = 2;
        while !taken.insert(slug.clone()) {
            slug = format!("{base}-{suffix}");
            suffix += 1;
        }
        slugs.insert(node.id.clone(), slug);
    }

    slugs
}

/// Node whose slug is `slug`, if any.
#[must_use]
pub fn find_node_by_slug(session: &Session, slug: &str) -> Option<NodeId> {
    node_slug_map(session)
        .into_iter()
        .find_map(|(node_id, candidate)| (candidate == slug).then_some(node_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::model::{MessageId, ParentLink, Selection};

    use super::*;

    #[test]
    fn slugify_normalizes_headers() {
        assert_eq!(slugify(Some("  Hello, World!  ")), "hello-world");
        assert_eq!(slugify(Some("--Rust & Go--")), "rust-go");
        assert_eq!(slugify(Some("ümlaut")), "mlaut");
        assert_eq!(slugify(Some("   ")), "untitled");
        assert_eq!(slugify(None), "untitled");
    }

    fn child(id: &str, parent: &NodeId, header: Option<&str>) -> Node {
        Node {
            id: NodeId::from(id),
            depth: 1,
            header: header.map(str::to_string),
            parent: Some(ParentLink {
                parent_node_id: parent.clone(),
                parent_message_id: MessageId::from("m"),
                selection: Selection::new("x", 0, 1),
            }),
            messages: Vec::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn duplicate_slugs_get_numeric_suffixes() {
        let mut session = Session::new();
        let root = session.root_node_id.clone();
        let mut root_node = (**session.root().expect("root")).clone();
        root_node.header = Some("Topic".to_string());
        session.nodes.insert(root.clone(), Arc::new(root_node));
        for (id, header) in [("b", Some("topic")), ("a", Some("Topic!")), ("c", None)] {
            let node = child(id, &root, header);
            session.nodes.insert(node.id.clone(), Arc::new(node));
        }

        let slugs = node_slug_map(&session);
        assert_eq!(slugs[&root], "topic");
        assert_eq!(slugs[&NodeId::from("a")], "topic-2");
        assert_eq!(slugs[&NodeId::from("b")], "topic-3");
        assert_eq!(slugs[&NodeId::from("c")], "untitled");
        assert_eq!(find_node_by_slug(&session, "topic-3"), Some(NodeId::from("b")));
        assert_eq!(find_node_by_slug(&session, "nope"), None);
    }
}
