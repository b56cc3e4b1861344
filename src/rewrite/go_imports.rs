//! Go source import extraction
//!
//! Uses tree-sitter to locate the path literal of every import spec:
//! - Single: `import "fmt"`
//! - Named: `import yaml "gopkg.in/yaml.v3"`
//! - Grouped:
//!   ```text
//!   import (
//!       "fmt"
//!       cmp "github.com/google/go-cmp/cmp"
//!   )
//!   ```

use std::ops::Range;

use tracing::warn;

use crate::rewrite::error::SourceError;

/// A single import path literal inside a Go source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLiteral {
    /// Unquoted import path
    pub path: String,
    /// Byte range of the literal including its quotes
    pub range: Range<usize>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in bytes)
    pub column: usize,
    /// Written as a raw (backquoted) string
    pub raw: bool,
}

/// Result of parsing a Go source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSource {
    /// Empty or comment-only file without a package clause
    NoPackage,
    /// Import literals in source order
    Imports(Vec<ImportLiteral>),
}

/// Parse Go source and extract its import path literals
pub fn parse_imports(content: &str) -> Result<ParsedSource, SourceError> {
    let mut parser = tree_sitter::Parser::new();
    let language = tree_sitter_go::LANGUAGE;
    parser.set_language(&language.into()).map_err(|e| {
        warn!("Failed to set Go language for tree-sitter: {}", e);
        SourceError::TreeSitter(e.to_string())
    })?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| SourceError::TreeSitter("Failed to parse Go source".to_string()))?;
    let root = tree.root_node();

    let mut cursor = root.walk();
    let top_level: Vec<_> = root
        .named_children(&mut cursor)
        .filter(|node| node.kind() != "comment")
        .collect();

    if top_level.is_empty() {
        return Ok(ParsedSource::NoPackage);
    }

    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let point = node.start_position();
        return Err(SourceError::Syntax {
            line: point.row + 1,
            column: point.column + 1,
        });
    }

    if top_level[0].kind() != "package_clause" {
        let point = top_level[0].start_position();
        return Err(SourceError::MissingPackage {
            line: point.row + 1,
            column: point.column + 1,
        });
    }

    let mut imports = Vec::new();
    for declaration in top_level.iter().filter(|n| n.kind() == "import_declaration") {
        let mut cursor = declaration.walk();
        for child in declaration.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => imports.push(import_literal(child, content)?),
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    for spec in child.named_children(&mut list_cursor) {
                        if spec.kind() == "import_spec" {
                            imports.push(import_literal(spec, content)?);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(ParsedSource::Imports(imports))
}

/// Find the first error or missing node in document order
fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn import_literal(spec: tree_sitter::Node, content: &str) -> Result<ImportLiteral, SourceError> {
    let point = spec.start_position();
    let literal = spec.child_by_field_name("path").ok_or(SourceError::Syntax {
        line: point.row + 1,
        column: point.column + 1,
    })?;

    let text = &content[literal.byte_range()];
    let point = literal.start_position();
    let raw = literal.kind() == "raw_string_literal";
    let path = unquote(text).ok_or_else(|| SourceError::InvalidLiteral {
        literal: text.to_string(),
        line: point.row + 1,
        column: point.column + 1,
    })?;

    Ok(ImportLiteral {
        path,
        range: literal.byte_range(),
        line: point.row + 1,
        column: point.column + 1,
        raw,
    })
}

/// Unquote a Go string literal (interpreted `"..."` or raw `` `...` ``)
pub fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return Some(raw.replace('\r', ""));
    }

    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let escaped = match chars.next()? {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' => '\\',
            '"' => '"',
            'x' => hex_char(&mut chars, 2)?,
            'u' => hex_char(&mut chars, 4)?,
            'U' => hex_char(&mut chars, 8)?,
            d @ '0'..='7' => {
                let mut value = d.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                char::from_u32(value)?
            }
            _ => return None,
        };
        result.push(escaped);
    }

    Some(result)
}

fn hex_char(chars: &mut std::str::Chars, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Quote an import path as a Go string literal.
///
/// Raw literals are kept raw when the path allows it.
pub fn quote(path: &str, raw: bool) -> String {
    if raw && !path.contains('`') && !path.contains('\r') {
        return format!("`{}`", path);
    }

    let mut result = String::with_capacity(path.len() + 2);
    result.push('"');
    for c in path.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                result.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
