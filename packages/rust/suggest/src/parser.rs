//! Heuristic parser for freeform pasted remix text.
//!
//! Users paste assistant output or hand-written notes; the parser splits the
//! text into (label, prompt) pairs. A line starts a prompt when it begins
//! with an action verb, or when it has a `Title: instruction` shape whose
//! right side begins with one. Titles are pulled from the text before the
//! colon or from the nearest preceding free line; following lines fold into
//! the prompt until the next instruction (or its title line) shows up.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use remixstudio_shared::RemixSuggestion;

/// Verbs that mark the start of an image edit instruction.
///
/// Matched by prefix on the cleaned, lowercased line ("Adding sparkle"
/// counts via "add").
const ACTION_KEYWORDS: &[&str] = &[
    "create",
    "change",
    "recreate",
    "replace",
    "generate",
    "make",
    "transform",
    "add",
    "switch",
    "use",
    "apply",
    "convert",
    "turn",
];

/// Fallback label when no title can be associated with a prompt.
const DEFAULT_LABEL: &str = "Remix Option";

/// Leading list markers: digits, dots, hyphens, asterisks, whitespace.
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.\-*\s]+").expect("valid regex"));

/// Strip leading list markers and surrounding whitespace.
fn clean_line_start(s: &str) -> String {
    LIST_MARKER_RE.replace(s, "").trim().to_string()
}

fn starts_with_keyword(s: &str) -> bool {
    let lower = s.to_lowercase();
    ACTION_KEYWORDS.iter().any(|kw| lower.starts_with(kw))
}

/// `Title: instruction` on one line; split at the first colon of the raw
/// line so list markers before the title still get stripped.
fn split_inline(line: &str) -> Option<(String, String)> {
    let (head, tail) = line.split_once(':')?;
    let tail_clean = clean_line_start(tail);
    if starts_with_keyword(&tail_clean) {
        Some((clean_line_start(head), tail_clean))
    } else {
        None
    }
}

/// Whether a line begins a new pair, in bare or inline form.
fn starts_pair(line: &str) -> bool {
    starts_with_keyword(&clean_line_start(line)) || split_inline(line).is_some()
}

/// Split pasted text into (label, prompt) pairs.
///
/// Returns every pair found, in order; callers normalize the count to the
/// slide's suggestion slots. Text without a single action line yields an
/// empty vec.
pub fn parse_pasted(text: &str) -> Vec<RemixSuggestion> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut parsed = Vec::new();
    // Lines consumed as a title or continuation never start a new pair.
    let mut consumed = vec![false; lines.len()];

    for i in 0..lines.len() {
        if consumed[i] {
            continue;
        }

        let clean_current = clean_line_start(lines[i]);
        let inline = split_inline(lines[i]);

        if !starts_with_keyword(&clean_current) && inline.is_none() {
            continue;
        }

        let mut label = DEFAULT_LABEL.to_string();
        let mut prompt;

        if let Some((head, tail)) = inline {
            label = head;
            prompt = tail;
            consumed[i] = true;
        } else {
            prompt = clean_current;
            consumed[i] = true;
            // Walk back to the nearest free non-empty line for the title.
            for k in (0..i).rev() {
                let prev = lines[k].trim();
                if !prev.is_empty() && !consumed[k] {
                    label = clean_line_start(prev);
                    consumed[k] = true;
                    break;
                }
            }
        }

        // Fold continuation lines into the prompt. Stop at the next pair
        // start in either form, or one line early when the line after next
        // starts a pair (that line is presumed to be the next pair's title).
        // Stopping lines stay unconsumed for the outer loop.
        let mut j = i + 1;
        while j < lines.len() {
            let next = lines[j].trim();
            if next.is_empty() {
                j += 1;
                continue;
            }
            if starts_pair(lines[j]) {
                break;
            }
            if j + 1 < lines.len() && starts_pair(lines[j + 1]) {
                break;
            }
            prompt.push(' ');
            prompt.push_str(next);
            consumed[j] = true;
            j += 1;
        }

        parsed.push(RemixSuggestion::new(label, prompt));
    }

    debug!(pairs = parsed.len(), "parsed pasted remix text");
    parsed
}
