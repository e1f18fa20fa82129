//! Splitting source text into plain and highlighted segments.

use crate::types::HighlightRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
    pub reason: Option<String>,
}

impl Segment {
    fn plain(text: String) -> Self {
        Self {
            text,
            highlighted: false,
            reason: None,
        }
    }
}

/// Split `content` at the given highlight ranges.
///
/// Offsets count characters, not bytes. Ranges are applied in start order,
/// clamped to the text; empty ranges and ranges overlapping an earlier one
/// are skipped.
pub fn highlight_segments(content: &str, highlights: &[HighlightRange]) -> Vec<Segment> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    let slice = |a: usize, b: usize| chars[a..b].iter().collect::<String>();

    let mut sorted: Vec<&HighlightRange> = highlights.iter().collect();
    sorted.sort_by_key(|h| h.start);

    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for h in sorted {
        let start = h.start.min(len);
        let end = h.end.min(len);
        if start < cursor || end <= start {
            continue;
        }
        if start > cursor {
            segments.push(Segment::plain(slice(cursor, start)));
        }
        segments.push(Segment {
            text: slice(start, end),
            highlighted: true,
            reason: h.reason.clone(),
        });
        cursor = end;
    }
    if cursor < len {
        segments.push(Segment::plain(slice(cursor, len)));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> HighlightRange {
        HighlightRange {
            start,
            end,
            reason: None,
        }
    }

    #[test]
    fn no_highlights_is_one_plain_segment() {
        let segs = highlight_segments("Section 173.", &[]);
        assert_eq!(segs.len(), 1);
        assert!(!segs[0].highlighted);
        assert_eq!(segs[0].text, "Section 173.");
    }

    #[test]
    fn highlights_are_sorted_and_split() {
        let segs = highlight_segments("abcdefghij", &[range(6, 8), range(1, 3)]);
        let parts: Vec<(&str, bool)> = segs.iter().map(|s| (s.text.as_str(), s.highlighted)).collect();
        assert_eq!(
            parts,
            vec![
                ("a", false),
                ("bc", true),
                ("def", false),
                ("gh", true),
                ("ij", false)
            ]
        );
    }

    #[test]
    fn out_of_range_and_overlaps_do_not_panic() {
        let segs = highlight_segments("short", &[range(2, 50), range(3, 4), range(90, 99), range(4, 1)]);
        let joined: String = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "short");
        assert_eq!(segs.iter().filter(|s| s.highlighted).count(), 1);
    }

    #[test]
    fn offsets_count_characters() {
        let segs = highlight_segments("धारा 103", &[range(0, 4)]);
        assert_eq!(segs[0].text, "धारा");
        assert!(segs[0].highlighted);
    }
}
