//! Markdown micro-tokenizer for assistant answers.
//!
//! Splits (possibly partial) answer text into typed segments: plain words,
//! whitespace runs, `***bold italic***`, `**bold**`, `*italic*` and
//! `[label](target)` links. Each call scans the text in linear time and keeps
//! no state between calls, so it can be re-run on every growing prefix of a
//! streamed answer.
//!
//! Anything that does not form a complete construct (a lone `*`, an
//! unterminated `[label](`) stays in the plain text untouched.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Kind of a parsed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    Text,
    Space,
    Bold,
    Italic,
    BoldItalic,
    Link,
}

/// One atomic unit of display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Visible text, with markdown delimiters stripped.
    pub content: String,
    /// Link target, only set for [`SegmentKind::Link`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Segment {
    fn new(kind: SegmentKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
            href: None,
        }
    }

    fn link(label: &str, href: &str) -> Self {
        Self {
            kind: SegmentKind::Link,
            content: label.to_string(),
            href: Some(href.to_string()),
        }
    }

    /// Rebuilds the markdown source this segment was parsed from.
    pub fn to_markdown(&self) -> String {
        match self.kind {
            SegmentKind::Text | SegmentKind::Space => self.content.clone(),
            SegmentKind::Bold => format!("**{}**", self.content),
            SegmentKind::Italic => format!("*{}*", self.content),
            SegmentKind::BoldItalic => format!("***{}***", self.content),
            SegmentKind::Link => format!(
                "[{}]({})",
                self.content,
                self.href.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Display policy for link segments; `None` for every other kind.
    pub fn link_target(&self) -> Option<LinkTarget> {
        self.href.as_deref().map(LinkTarget::classify)
    }
}

/// How a rendered link should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// Site-relative path (`/works`): same tab, no `rel`.
    Internal,
    /// `mailto:` link: same tab.
    Mailto,
    /// Anything else: new tab, no referrer.
    External,
}

impl LinkTarget {
    pub fn classify(href: &str) -> Self {
        if href.starts_with('/') {
            LinkTarget::Internal
        } else if href.starts_with("mailto:") {
            LinkTarget::Mailto
        } else {
            LinkTarget::External
        }
    }

    pub fn opens_new_tab(self) -> bool {
        matches!(self, LinkTarget::External)
    }

    pub fn rel(self) -> Option<&'static str> {
        match self {
            LinkTarget::Internal => None,
            LinkTarget::Mailto | LinkTarget::External => Some("noopener noreferrer"),
        }
    }
}

/// Tokenizes `text` into an ordered list of segments.
///
/// Links are found first and act as barriers: emphasis never spans across a
/// link, and stars inside a link's label or target are not delimiters. The
/// text between links is then scanned for `***x***`, then `**x**`, then
/// `*x*`, each pass left to right. A span is kept only if it does not overlap
/// a span claimed by an earlier pass. Inner text is non-empty and star-free;
/// a single-star span must not touch another star on either side.
pub fn tokenize(text: &str) -> Vec<Segment> {
    let scanner = Scanner::new(text);
    let mut segments = Vec::new();
    let mut cursor = 0;
    for link in scanner.links() {
        scanner.push_emphasis(cursor, link.start, &mut segments);
        segments.push(Segment::link(
            &text[link.label.clone()],
            &text[link.href.clone()],
        ));
        cursor = link.end;
    }
    scanner.push_emphasis(cursor, text.len(), &mut segments);
    segments
}

/// Concatenated visible text of `segments`.
pub fn visible_text(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.content.as_str()).collect()
}

struct LinkSpan {
    start: usize,
    end: usize,
    label: Range<usize>,
    href: Range<usize>,
}

struct EmphasisSpan {
    start: usize,
    end: usize,
    kind: SegmentKind,
    inner: Range<usize>,
}

/// Byte-level view of the text with next-delimiter tables, so every lookahead
/// is a single index instead of a rescan. All delimiters are ASCII, so every
/// position they yield is a char boundary.
struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    next_star: Vec<usize>,
    next_bracket: Vec<usize>,
    next_paren: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        Self {
            text,
            bytes,
            next_star: next_positions(bytes, b'*'),
            next_bracket: next_positions(bytes, b']'),
            next_paren: next_positions(bytes, b')'),
        }
    }

    /// Non-overlapping `[label](target)` spans, leftmost first.
    fn links(&self) -> Vec<LinkSpan> {
        let mut links = Vec::new();
        let mut pos = 0;
        while pos < self.bytes.len() {
            if self.bytes[pos] == b'[' {
                if let Some(link) = self.link_at(pos) {
                    pos = link.end;
                    links.push(link);
                    continue;
                }
            }
            pos += 1;
        }
        links
    }

    /// Neither part may be empty; the label ends at the first `]`, the target
    /// at the first `)`.
    fn link_at(&self, start: usize) -> Option<LinkSpan> {
        let len = self.bytes.len();
        let close = self.next_bracket[start + 1];
        if close == len || close == start + 1 {
            return None;
        }
        if self.bytes.get(close + 1) != Some(&b'(') {
            return None;
        }
        let end = self.next_paren[close + 2];
        if end == len || end == close + 2 {
            return None;
        }
        Some(LinkSpan {
            start,
            end: end + 1,
            label: start + 1..close,
            href: close + 2..end,
        })
    }

    /// Emits `text[lo..hi]` (which holds no link) as emphasis and plain segments.
    fn push_emphasis(&self, lo: usize, hi: usize, segments: &mut Vec<Segment>) {
        let mut claimed = vec![false; hi - lo];
        let mut spans = Vec::new();
        self.scan_paired(lo, hi, 3, SegmentKind::BoldItalic, &mut claimed, &mut spans);
        self.scan_paired(lo, hi, 2, SegmentKind::Bold, &mut claimed, &mut spans);
        self.scan_italic(lo, hi, &mut claimed, &mut spans);
        spans.sort_by_key(|span| span.start);

        let mut cursor = lo;
        for span in spans {
            push_plain(segments, &self.text[cursor..span.start]);
            segments.push(Segment::new(span.kind, &self.text[span.inner]));
            cursor = span.end;
        }
        push_plain(segments, &self.text[cursor..hi]);
    }

    /// `run` stars, star-free inner text, `run` stars.
    fn scan_paired(
        &self,
        lo: usize,
        hi: usize,
        run: usize,
        kind: SegmentKind,
        claimed: &mut [bool],
        spans: &mut Vec<EmphasisSpan>,
    ) {
        let mut pos = lo;
        while pos + 2 * run < hi {
            if !self.is_run(pos, run, hi) {
                pos += 1;
                continue;
            }
            let inner = pos + run;
            let close = self.next_star[inner];
            if close == inner || close >= hi || !self.is_run(close, run, hi) {
                pos += 1;
                continue;
            }
            let end = close + run;
            claim(lo, pos, end, kind, inner..close, claimed, spans);
            pos = end;
        }
    }

    /// `*x*` where neither star is part of a longer run.
    fn scan_italic(
        &self,
        lo: usize,
        hi: usize,
        claimed: &mut [bool],
        spans: &mut Vec<EmphasisSpan>,
    ) {
        let mut pos = lo;
        while pos + 2 < hi {
            if self.bytes[pos] != b'*' || (pos > lo && self.bytes[pos - 1] == b'*') {
                pos += 1;
                continue;
            }
            let close = self.next_star[pos + 1];
            if close == pos + 1 || close >= hi || self.bytes.get(close + 1) == Some(&b'*') {
                pos += 1;
                continue;
            }
            let end = close + 1;
            claim(lo, pos, end, SegmentKind::Italic, pos + 1..close, claimed, spans);
            pos = end;
        }
    }

    fn is_run(&self, pos: usize, run: usize, hi: usize) -> bool {
        pos + run <= hi && self.bytes[pos..pos + run].iter().all(|&b| b == b'*')
    }
}

/// Records the span unless an earlier pass already claimed any of its bytes.
fn claim(
    lo: usize,
    start: usize,
    end: usize,
    kind: SegmentKind,
    inner: Range<usize>,
    claimed: &mut [bool],
    spans: &mut Vec<EmphasisSpan>,
) {
    let taken = &mut claimed[start - lo..end - lo];
    if taken.iter().any(|&c| c) {
        return;
    }
    taken.fill(true);
    spans.push(EmphasisSpan {
        start,
        end,
        kind,
        inner,
    });
}

/// `table[i]` is the first index `>= i` holding `needle`, or `bytes.len()`.
/// The table has one extra slot so `table[bytes.len()]` is valid.
fn next_positions(bytes: &[u8], needle: u8) -> Vec<usize> {
    let mut table = vec![bytes.len(); bytes.len() + 1];
    for i in (0..bytes.len()).rev() {
        table[i] = if bytes[i] == needle { i } else { table[i + 1] };
    }
    table
}

/// Emits `chunk` as alternating text/space segments.
fn push_plain(segments: &mut Vec<Segment>, chunk: &str) {
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, c) in chunk.char_indices() {
        let is_space = c.is_whitespace();
        if let Some(prev) = in_space {
            if prev != is_space {
                segments.push(plain_segment(&chunk[start..i], prev));
                start = i;
            }
        }
        in_space = Some(is_space);
    }
    if let Some(prev) = in_space {
        segments.push(plain_segment(&chunk[start..], prev));
    }
}

fn plain_segment(content: &str, is_space: bool) -> Segment {
    let kind = if is_space {
        SegmentKind::Space
    } else {
        SegmentKind::Text
    };
    Segment::new(kind, content)
}
