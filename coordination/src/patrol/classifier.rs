//! Pane text classifier
//!
//! Maps one capture of an agent's pane to an [`Outcome`]. Pure and total:
//! every input, including the empty string, yields an outcome.
//!
//! Signatures are tested in priority order, first match wins:
//!
//! ```text
//! Error ──▶ Menu ──▶ (sticky Typed) ──▶ Working ──▶ Idle ──▶ Typed ──▶ fallback
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Outcome;

const ESC: char = '\u{1b}';
const BEL: char = '\u{07}';
const BOX_DRAWING: std::ops::RangeInclusive<char> = '\u{2500}'..='\u{257F}';

/// Remove terminal escape sequences.
///
/// Handles CSI (`ESC [ params final`), OSC (`ESC ] ... BEL` or `ESC ] ... ESC \`)
/// and two-byte `ESC x` escapes. An unterminated sequence swallows the rest of
/// the input.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != ESC {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('[') => {
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == BEL {
                        break;
                    }
                    if c == ESC && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) | None => {}
        }
    }
    out
}

/// Strip escapes, drop carriage returns and trailing blank space.
///
/// Checks store this form, and "unchanged" compares it.
pub fn normalize(pane: &str) -> String {
    let stripped = strip_ansi(pane).replace('\r', "");
    let lines: Vec<&str> = stripped.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end().to_string()
}

static ERROR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?m)\bpanicked at\b|^panic: ",
        r"Segmentation fault",
        r"(?i)\bfatal error\b",
        r"\b\w*Error:",
        r"Traceback \(most recent call last\):",
        r"\bFAILED\b",
        r"\b[1-9]\d* failed\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("error pattern should compile"))
    .collect()
});

static MENU_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?ms)\?[ \t]*$.*^[ \t│]*[❯>][ \t]*\d+\.",
        r"(?i)\b(would you like|do you want) to proceed\?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("menu pattern should compile"))
    .collect()
});

static WORKING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // `*` and `·` also open markdown bullets, so they only count through
        // the gerund and interrupt-hint patterns below.
        r"(?m)(^|\s)[✶✻✽✢\x{2800}-\x{28FF}][ \t]+\w",
        r"\b\w+ing(…|\.\.\.)",
        r"(?i)\b(esc|ctrl\+c) to interrupt\b|\bto cancel\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("working pattern should compile"))
    .collect()
});

static BARE_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[>❯$%#]$").expect("BARE_PROMPT regex should compile"));

static TYPED_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[>❯$%#][ \t]+\S").expect("TYPED_PROMPT regex should compile")
});

static ANY_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t│]*[>❯$%#]").expect("ANY_PROMPT regex should compile")
});

/// Status lines an agent UI draws under its input box.
static FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\?[ \t]+for shortcuts\b").expect("FOOTER regex should compile")
});

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

/// Blank, box-border-only or footer line.
fn is_chrome(line: &str) -> bool {
    line.chars().all(|c| c.is_whitespace() || BOX_DRAWING.contains(&c)) || FOOTER.is_match(line)
}

/// Last meaningful line, with input-box side borders removed.
fn last_line(text: &str) -> Option<&str> {
    text.lines()
        .rev()
        .map(|l| l.trim_matches(|c: char| c.is_whitespace() || c == '│'))
        .find(|l| !is_chrome(l))
}

/// Classify raw pane text given the previous check of the same patrol.
pub fn classify(pane: &str, previous_text: Option<&str>, previous_outcome: Option<Outcome>) -> Outcome {
    classify_normalized(&normalize(pane), previous_text, previous_outcome)
}

/// Classify text already passed through [`normalize`].
pub fn classify_normalized(
    text: &str,
    previous_text: Option<&str>,
    previous_outcome: Option<Outcome>,
) -> Outcome {
    if any_match(&ERROR_PATTERNS, text) {
        return Outcome::Error;
    }
    if any_match(&MENU_PATTERNS, text) {
        return Outcome::Menu;
    }
    if previous_outcome == Some(Outcome::Typed) && previous_text == Some(text) {
        return Outcome::Typed;
    }
    if any_match(&WORKING_PATTERNS, text) {
        return Outcome::Working;
    }
    if let Some(line) = last_line(text) {
        if BARE_PROMPT.is_match(line) {
            return Outcome::Idle;
        }
        if TYPED_PROMPT.is_match(line) {
            return Outcome::Typed;
        }
    }
    if ANY_PROMPT.is_match(text) {
        Outcome::Typed
    } else {
        Outcome::Idle
    }
}
