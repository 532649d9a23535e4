//! Indentation-based detector for Python sources.

use once_cell::sync::Lazy;
use regex::Regex;

use super::boundary::{indent_of, Boundary, BoundaryDetector, BoundaryKind};

static CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)class\s+\w+.*?:").expect("class pattern is valid"));

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(?:async\s+)?def\s+\w+.*?:").expect("function pattern is valid")
});

const KINDS: &[BoundaryKind] = &[BoundaryKind::Class, BoundaryKind::Function];

/// Finds `class`, `def` and `async def` blocks.
///
/// A block ends on the last line before the first non-blank line indented
/// at or below the declaration, or at end of input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonBoundaryDetector;

impl PythonBoundaryDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BoundaryDetector for PythonBoundaryDetector {
    fn name(&self) -> &'static str {
        "python"
    }

    fn find_boundaries(&self, text: &str) -> Vec<Boundary> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut boundaries = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let matched = CLASS
                .captures(line)
                .map(|caps| (caps, BoundaryKind::Class))
                .or_else(|| FUNCTION.captures(line).map(|caps| (caps, BoundaryKind::Function)));

            if let Some((caps, kind)) = matched {
                let indent = caps.get(1).map_or(0, |m| m.as_str().chars().count());
                boundaries.push(Boundary {
                    start_line: i,
                    end_line: block_end(&lines, i, indent),
                    kind,
                    indent,
                });
            }
        }

        boundaries
    }

    fn supported_kinds(&self) -> &'static [BoundaryKind] {
        KINDS
    }
}

fn block_end(lines: &[&str], start: usize, base_indent: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| !line.trim().is_empty() && indent_of(line) <= base_indent)
        .map_or(lines.len() - 1, |(i, _)| i - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str) -> Vec<(usize, usize, BoundaryKind, usize)> {
        PythonBoundaryDetector::new()
            .find_boundaries(text)
            .into_iter()
            .map(|b| (b.start_line, b.end_line, b.kind, b.indent))
            .collect()
    }

    #[test]
    fn test_class_with_methods() {
        let text = "class A:\n    def f(self):\n        pass\n\n    async def g(self):\n        pass\n\nx = 1\n";
        assert_eq!(
            find(text),
            vec![
                (0, 6, BoundaryKind::Class, 0),
                (1, 3, BoundaryKind::Function, 4),
                (4, 6, BoundaryKind::Function, 4),
            ]
        );
    }

    #[test]
    fn test_block_runs_to_end_of_input() {
        let text = "def f():\n    return 1\n";
        assert_eq!(find(text), vec![(0, 2, BoundaryKind::Function, 0)]);
    }

    #[test]
    fn test_multiline_signature_matches_first_colon() {
        let text = "def f(a: int,\n      b: int) -> int:\n    return a + b";
        assert_eq!(find(text), vec![(0, 2, BoundaryKind::Function, 0)]);
    }

    #[test]
    fn test_no_boundaries_in_plain_code() {
        assert!(find("import os\nprint(os.getcwd())\n").is_empty());
        assert!(find("").is_empty());
    }

    #[test]
    fn test_supported_kinds() {
        let detector = PythonBoundaryDetector::new();
        assert_eq!(detector.supported_kinds(), &[BoundaryKind::Class, BoundaryKind::Function]);
    }
}
