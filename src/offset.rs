//! Mapping between rendered and canonical character offsets.
//!
//! A rendered message shows each highlight's anchor text in place of its raw
//! span, so rendered offsets drift from raw ones by the accumulated
//! `display_len - raw_len` of every highlight before them. Canonical offsets
//! are measured against the raw text and stay stable as highlights come and
//! go. Bounds are the caller's contract; nothing here validates them.

use crate::model::{Highlight, Selection};

fn display_len(highlight: &Highlight) -> usize {
    match highlight.text.chars().count() {
        0 => highlight.raw_len(),
        len => len,
    }
}

/// Translates an offset into the rendered text into a canonical offset.
///
/// Offsets that fall inside a highlight's displayed span are clamped into that
/// highlight's raw `[start, end]` range.
#[must_use]
pub fn to_canonical(rendered_offset: usize, highlights: &[Highlight]) -> usize {
    if highlights.is_empty() {
        return rendered_offset;
    }

    let mut ordered: Vec<&Highlight> = highlights.iter().collect();
    ordered.sort_by_key(|highlight| highlight.start_offset);

    let rendered = to_signed(rendered_offset);
    let mut delta: i64 = 0;
    for highlight in ordered {
        let raw_len = to_signed(highlight.raw_len());
        let shown_len = to_signed(display_len(highlight));
        let shown_start = to_signed(highlight.start_offset).saturating_add(delta);
        let shown_end = shown_start.saturating_add(shown_len);

        if rendered < shown_start {
            return clamp_non_negative(rendered.saturating_sub(delta));
        }
        if rendered < shown_end {
            let relative = rendered.saturating_sub(shown_start);
            return highlight.start_offset + clamp_non_negative(relative.min(raw_len));
        }

        delta = delta.saturating_add(shown_len - raw_len);
    }

    clamp_non_negative(rendered.saturating_sub(delta))
}

fn to_signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn clamp_non_negative(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Returns true when `[start, end)` intersects any highlight's `[start, end)`.
#[must_use]
pub fn overlaps(start: usize, end: usize, highlights: &[Highlight]) -> bool {
    highlights
        .iter()
        .any(|highlight| start < highlight.end_offset && end > highlight.start_offset)
}

/// Builds a canonical [`Selection`] from a selection made on rendered text.
///
/// The anchor text is re-read from the raw message text between the canonical
/// offsets, so it always matches what the offsets denote.
#[must_use]
pub fn canonical_selection(
    raw_text: &str,
    rendered_start: usize,
    rendered_end: usize,
    highlights: &[Highlight],
) -> Selection {
    let start = to_canonical(rendered_start, highlights);
    let end = to_canonical(rendered_end, highlights).max(start);
    let text: String = raw_text.chars().skip(start).take(end - start).collect();
    Selection::new(text, start, end)
}

#[cfg(test)]
mod tests {
    use crate::model::{HighlightId, NodeId};

    use super::*;

    fn highlight(start: usize, end: usize, text: &str) -> Highlight {
        Highlight {
            id: HighlightId::generate(),
            child_node_id: NodeId::generate(),
            text: text.to_string(),
            start_offset: start,
            end_offset: end,
            is_active: false,
        }
    }

    #[test]
    fn empty_highlights_are_identity() {
        assert_eq!(to_canonical(17, &[]), 17);
        assert!(!overlaps(0, 100, &[]));
    }

    #[test]
    fn same_length_display_leaves_offsets_unchanged() {
        let highlights = [highlight(2, 8, "cdefgh")];
        for offset in [0, 2, 5, 8, 12] {
            assert_eq!(to_canonical(offset, &highlights), offset);
        }
    }

    #[test]
    fn shorter_display_shifts_following_offsets_forward() {
        // raw span [2, 8) shown as "xy": rendered text is 4 chars shorter.
        let highlights = [highlight(2, 8, "xy")];
        assert_eq!(to_canonical(1, &highlights), 1);
        assert_eq!(to_canonical(2, &highlights), 2);
        assert_eq!(to_canonical(3, &highlights), 3);
        assert_eq!(to_canonical(4, &highlights), 8);
        assert_eq!(to_canonical(6, &highlights), 10);
    }

    #[test]
    fn longer_display_clamps_inside_raw_span() {
        // raw span [2, 4) shown as "abcdef".
        let highlights = [highlight(2, 4, "abcdef")];
        assert_eq!(to_canonical(5, &highlights), 4);
        assert_eq!(to_canonical(7, &highlights), 4);
        assert_eq!(to_canonical(8, &highlights), 4);
        assert_eq!(to_canonical(9, &highlights), 5);
    }

    #[test]
    fn empty_anchor_text_displays_raw_span() {
        let highlights = [highlight(2, 6, "")];
        assert_eq!(to_canonical(4, &highlights), 4);
        assert_eq!(to_canonical(9, &highlights), 9);
    }

    #[test]
    fn deltas_accumulate_in_start_order_regardless_of_input_order() {
        let highlights = [highlight(10, 14, "z"), highlight(2, 6, "x")];
        // Both spans shrink by 3; rendered 5 sits between them.
        assert_eq!(to_canonical(5, &highlights), 8);
        // Rendered 12 sits after both.
        assert_eq!(to_canonical(12, &highlights), 18);
    }

    #[test]
    fn offsets_past_i64_range_saturate_instead_of_wrapping() {
        let highlights = [highlight(2, 8, "x")];
        assert_eq!(to_canonical(usize::MAX, &highlights), i64::MAX as usize);
        assert_eq!(to_canonical(1, &highlights), 1);
    }

    #[test]
    fn overlap_is_half_open() {
        let highlights = [highlight(2, 8, "cdefgh")];
        assert!(overlaps(5, 10, &highlights));
        assert!(overlaps(0, 3, &highlights));
        assert!(overlaps(3, 4, &highlights));
        assert!(!overlaps(8, 10, &highlights));
        assert!(!overlaps(0, 2, &highlights));
    }

    #[test]
    fn canonical_selection_reads_raw_text() {
        let raw = "Hi there, friend";
        let highlights = [highlight(0, 2, "Hi")];
        let selection = canonical_selection(raw, 3, 8, &highlights);
        assert_eq!(selection, Selection::new("there", 3, 8));
    }
}
