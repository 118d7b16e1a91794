//! Text chunking for embedding and ingestion
//!
//! Splits transcript text into paragraph-aligned chunks sized for the
//! embedding backend. Paragraphs are greedily packed up to a target size;
//! oversized paragraphs are split at sentence or word boundaries.

use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// A chunk of text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk text content
    pub content: String,

    /// Zero-based position of this chunk within the document
    pub index: usize,
}

/// Split text into chunks of roughly `target_chars` characters, never
/// exceeding `max_chars`.
///
/// Paragraph boundaries (blank lines) are preferred split points. A
/// paragraph longer than `max_chars` is cut at sentence ends, then word
/// boundaries, then hard character limits. Returns an empty vector for
/// blank input; any other input yields at least one chunk.
pub fn chunk_text(text: &str, target_chars: usize, max_chars: usize) -> Vec<Chunk> {
    let normalized = text.replace("\r\n", "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = PARAGRAPH_BREAK
        .split(trimmed)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for para in paragraphs {
        if para.len() > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            split_oversized(para, max_chars, &mut pieces);
            continue;
        }

        // +2 accounts for the paragraph separator restored on join
        if !current.is_empty() && current.len() + 2 + para.len() > target_chars {
            pieces.push(std::mem::take(&mut current));
        }

        if current.is_empty() {
            current.push_str(para);
        } else {
            current.push_str("\n\n");
            current.push_str(para);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    if pieces.is_empty() {
        // Degenerate input (e.g. a single run of whitespace-heavy text that
        // collapsed away): keep the head of the original so nothing is lost.
        let end = ensure_char_boundary(trimmed, target_chars.min(trimmed.len()));
        pieces.push(trimmed[..end].to_string());
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk { content, index })
        .collect()
}

/// Split a single oversized paragraph into pieces no longer than `max_chars`.
///
/// Prefers cutting just after a sentence terminator in the back half of the
/// window, then at the last space in the back half, then at the hard limit.
fn split_oversized(para: &str, max_chars: usize, pieces: &mut Vec<String>) {
    let mut start = 0;

    while start < para.len() {
        let remaining = &para[start..];
        if remaining.len() <= max_chars {
            let piece = remaining.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            break;
        }

        let end_cap = ensure_char_boundary(para, start + max_chars);
        let window = &para[start..end_cap];

        let cut = match rfind_sentence_end(window) {
            Some(p) if p > max_chars / 2 => start + p + 1,
            _ => match window.rfind(' ') {
                Some(p) if p > max_chars / 2 => start + p,
                _ => end_cap,
            },
        };

        // A window too narrow for one character must still advance
        let cut = if cut > start {
            cut
        } else {
            start + remaining.chars().next().map_or(1, char::len_utf8)
        };

        let piece = para[start..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = cut;
    }
}

fn rfind_sentence_end(window: &str) -> Option<usize> {
    window.rfind(['.', '?', '!'])
}

/// Walk `pos` back to the nearest char boundary at or before it.
fn ensure_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut p = pos;
    while p > 0 && !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}
