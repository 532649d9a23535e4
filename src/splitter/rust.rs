//! Brace-matching detector for Rust sources.

use once_cell::sync::Lazy;
use regex::Regex;

use super::boundary::{Boundary, BoundaryDetector, BoundaryKind};

const VISIBILITY: &str = r"pub(?:\([^)]*\))?";

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^(\s*)(?:(?:{VISIBILITY}|default|async|unsafe|const|extern(?:\s+"[^"]*")?)\s+)*fn\s+\w+"#
    ))
    .expect("fn pattern is valid")
});

static STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\s*)(?:{VISIBILITY}\s+)?struct\s+\w+")).expect("struct pattern is valid")
});

static ENUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\s*)(?:{VISIBILITY}\s+)?enum\s+\w+")).expect("enum pattern is valid")
});

static TRAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(\s*)(?:{VISIBILITY}\s+)?(?:unsafe\s+)?(?:auto\s+)?trait\s+\w+"
    ))
    .expect("trait pattern is valid")
});

static IMPL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(?:unsafe\s+)?impl(?:\s|<)").expect("impl pattern is valid")
});

const KINDS: &[BoundaryKind] = &[
    BoundaryKind::Function,
    BoundaryKind::Struct,
    BoundaryKind::Enum,
    BoundaryKind::Trait,
    BoundaryKind::Impl,
];

/// Finds `fn`, `struct`, `enum`, `trait` and `impl` items.
///
/// Each boundary starts at the first attribute or doc-comment line directly
/// above the item (blank lines in between are allowed) and ends where the
/// item's braces balance, or on the first line ending in `;` when no brace
/// has opened yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBoundaryDetector;

impl RustBoundaryDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BoundaryDetector for RustBoundaryDetector {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn find_boundaries(&self, text: &str) -> Vec<Boundary> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut boundaries = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_plain_comment(trimmed) {
                continue;
            }

            let Some((indent, kind)) = match_item(line) else {
                continue;
            };

            boundaries.push(Boundary {
                start_line: item_start(&lines, i),
                end_line: item_end(&lines, i),
                kind,
                indent,
            });
        }

        boundaries
    }

    fn supported_kinds(&self) -> &'static [BoundaryKind] {
        KINDS
    }
}

fn match_item(line: &str) -> Option<(usize, BoundaryKind)> {
    let patterns: [(&Regex, BoundaryKind); 5] = [
        (&FUNCTION, BoundaryKind::Function),
        (&STRUCT, BoundaryKind::Struct),
        (&ENUM, BoundaryKind::Enum),
        (&TRAIT, BoundaryKind::Trait),
        (&IMPL, BoundaryKind::Impl),
    ];

    patterns.iter().find_map(|(pattern, kind)| {
        pattern
            .captures(line)
            .map(|caps| (caps.get(1).map_or(0, |m| m.as_str().chars().count()), *kind))
    })
}

fn is_plain_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") && !is_doc_comment(trimmed)
}

fn is_doc_comment(trimmed: &str) -> bool {
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

fn is_attribute(trimmed: &str) -> bool {
    trimmed.starts_with("#[") || trimmed.starts_with("#!")
}

/// Walk upwards over attributes, doc comments and blank lines.
fn item_start(lines: &[&str], item_line: usize) -> usize {
    let mut start = item_line;

    for i in (0..item_line).rev() {
        let trimmed = lines[i].trim();
        if is_attribute(trimmed) || is_doc_comment(trimmed) {
            start = i;
        } else if !trimmed.is_empty() {
            break;
        }
    }

    start
}

fn item_end(lines: &[&str], item_line: usize) -> usize {
    let mut scanner = BraceScanner::default();

    for (i, line) in lines.iter().enumerate().skip(item_line) {
        if scanner.in_code() && line.trim_start().starts_with("//") {
            continue;
        }

        match scanner.scan_line(line) {
            LineOutcome::Closed => return i,
            LineOutcome::Open if !scanner.opened && scanner.ends_with_semicolon => return i,
            LineOutcome::Open => {}
        }
    }

    lines.len() - 1
}

enum LineOutcome {
    Open,
    Closed,
}

#[derive(Clone, Copy)]
enum Literal {
    Str,
    /// Raw string closed by `"` and this many `#`.
    RawStr(usize),
}

/// Brace counter that skips string and raw string literals, brace char
/// literals, line comments and (nested) block comments.
#[derive(Default)]
struct BraceScanner {
    depth: usize,
    opened: bool,
    literal: Option<Literal>,
    comment_depth: usize,
    ends_with_semicolon: bool,
}

impl BraceScanner {
    fn in_code(&self) -> bool {
        self.literal.is_none() && self.comment_depth == 0
    }

    fn scan_line(&mut self, line: &str) -> LineOutcome {
        let chars: Vec<char> = line.chars().collect();
        let mut last_code = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if self.comment_depth > 0 {
                match (c, next) {
                    ('*', Some('/')) => {
                        self.comment_depth -= 1;
                        i += 2;
                    }
                    ('/', Some('*')) => {
                        self.comment_depth += 1;
                        i += 2;
                    }
                    _ => i += 1,
                }
                continue;
            }

            match self.literal {
                Some(Literal::Str) => {
                    match c {
                        '\\' => i += 1,
                        '"' => self.literal = None,
                        _ => {}
                    }
                    i += 1;
                    continue;
                }
                Some(Literal::RawStr(hashes)) => {
                    if c == '"' && closes_raw_string(&chars[i + 1..], hashes) {
                        self.literal = None;
                        i += hashes;
                    }
                    i += 1;
                    continue;
                }
                None => {}
            }

            if let Some((hashes, len)) = raw_string_prefix(&chars, i) {
                self.literal = Some(Literal::RawStr(hashes));
                last_code = Some('"');
                i += len;
                continue;
            }

            match c {
                '"' => self.literal = Some(Literal::Str),
                '\'' => {
                    if let Some(len) = char_literal_len(&chars[i..]) {
                        i += len;
                        last_code = Some('\'');
                        continue;
                    }
                }
                '/' if next == Some('/') => break,
                '/' if next == Some('*') => {
                    self.comment_depth = 1;
                    i += 2;
                    continue;
                }
                '{' => {
                    self.depth += 1;
                    self.opened = true;
                }
                '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.opened && self.depth == 0 {
                        return LineOutcome::Closed;
                    }
                }
                _ => {}
            }

            if !c.is_whitespace() {
                last_code = Some(c);
            }
            i += 1;
        }

        self.ends_with_semicolon = last_code == Some(';');
        LineOutcome::Open
    }
}

/// Hash count and opener length of a raw string (`r"`, `r#"`, `br##"`, ...)
/// starting at `chars[i]`.
///
/// Raw identifiers such as `r#type` and names ending in `r` yield `None`.
fn raw_string_prefix(chars: &[char], i: usize) -> Option<(usize, usize)> {
    let prefix = match &chars[i..] {
        ['r', ..] => 1,
        ['b', 'r', ..] => 2,
        _ => return None,
    };
    if i > 0 && is_ident_char(chars[i - 1]) {
        return None;
    }

    let hashes = chars[i + prefix..].iter().take_while(|c| **c == '#').count();
    (chars.get(i + prefix + hashes) == Some(&'"')).then_some((hashes, prefix + hashes + 1))
}

fn closes_raw_string(rest: &[char], hashes: usize) -> bool {
    rest.len() >= hashes && rest[..hashes].iter().all(|c| *c == '#')
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Length of a char literal such as `'{'` or `'\''` at the start of `chars`.
///
/// Lifetimes (`'a`, `'_`) are not literals and yield `None`.
fn char_literal_len(chars: &[char]) -> Option<usize> {
    match chars {
        ['\'', '\\', _, '\'', ..] => Some(4),
        ['\'', c, '\'', ..] if *c != '\\' => Some(3),
        _ => None,
    }
}
