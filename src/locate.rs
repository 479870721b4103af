//! Fragment extraction from Python source via tree-sitter.
//!
//! A fragment is a top-level or nested definition (class or function) lifted
//! out of its file with enough positional metadata to be reinserted later:
//! the dedented text, the leading-indentation prefix of its first line, and
//! its 1-indexed starting line.

use crate::exemplar::TransformKind;
use ast_grep_language::{LanguageExt, SupportLang};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("node span {byte_start}..{byte_end} does not align with source text")]
    SpanMismatch { byte_start: usize, byte_end: usize },
}

/// A definition extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Dedented text of the definition. The leading-whitespace run of the
    /// first physical line is stripped from every line.
    pub text: String,
    /// The whitespace prefix that was stripped (empty for top-level
    /// definitions).
    pub indent: String,
    /// 1-indexed starting line in the original source.
    pub start_line: usize,
}

impl Fragment {
    /// Reinsert this fragment's text (or a rewritten stand-in for it) into
    /// its originating source: all lines strictly preceding `start_line`,
    /// followed by `text`'s lines with the indentation prefix restored.
    pub fn recontextualize(&self, text: &str, source: &str) -> Vec<String> {
        let mut lines: Vec<String> = source
            .lines()
            .take(self.start_line.saturating_sub(1))
            .map(str::to_string)
            .collect();
        for line in text.lines() {
            lines.push(format!("{}{}", self.indent, line));
        }
        lines
    }
}

/// Tree-sitter parser wrapper for Python source code.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, LocateError> {
        let mut parser = Parser::new();
        let ts_lang = SupportLang::Python.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| LocateError::LanguageSet)?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, LocateError> {
        self.parser
            .parse(source, None)
            .ok_or(LocateError::ParseFailed)
    }
}

/// Extract every definition of the requested kind from `source`, in document
/// order. Nested definitions are yielded both on their own and as part of
/// their enclosing fragment's text.
pub fn fragments(source: &str, kind: TransformKind) -> Result<Vec<Fragment>, LocateError> {
    let mut parser = PythonParser::new()?;
    let tree = parser.parse(source)?;

    let mut found = Vec::new();
    collect(tree.root_node(), source, kind.node_kinds(), &mut found)?;
    Ok(found)
}

fn collect(
    node: Node<'_>,
    source: &str,
    kinds: &[&str],
    found: &mut Vec<Fragment>,
) -> Result<(), LocateError> {
    if kinds.contains(&node.kind()) {
        found.push(extract(node, source)?);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, kinds, found)?;
    }

    Ok(())
}

/// Slice the definition out of the source, starting at the beginning of its
/// first physical line so that leading indentation is captured, then dedent.
fn extract(node: Node<'_>, source: &str) -> Result<Fragment, LocateError> {
    let byte_start = node.start_byte();
    let byte_end = node.end_byte();

    // tree-sitter columns are byte offsets within the line.
    let column = node.start_position().column;
    let line_start = byte_start
        .checked_sub(column)
        .ok_or(LocateError::SpanMismatch {
            byte_start,
            byte_end,
        })?;

    let slice = source
        .get(line_start..byte_end)
        .ok_or(LocateError::SpanMismatch {
            byte_start,
            byte_end,
        })?;

    // A definition's line prefix is whitespace; anything else means the parse
    // tree and source have desynced.
    let prefix = slice.get(..column).ok_or(LocateError::SpanMismatch {
        byte_start,
        byte_end,
    })?;
    if !prefix.chars().all(char::is_whitespace) {
        return Err(LocateError::SpanMismatch {
            byte_start,
            byte_end,
        });
    }

    Ok(dedent(slice, node.start_position().row + 1))
}

/// Strip the first line's leading-whitespace run from every line.
///
/// This is a heuristic, not a true dedent: a multi-line string literal whose
/// internal lines start with less indentation than the definition itself will
/// lose the wrong prefix. Kept for compatibility with the patch format.
fn dedent(slice: &str, start_line: usize) -> Fragment {
    let indent: String = slice
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let text = if indent.is_empty() {
        slice.to_string()
    } else {
        slice
            .lines()
            .map(|line| line.strip_prefix(indent.as_str()).unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Fragment {
        text,
        indent,
        start_line,
    }
}
