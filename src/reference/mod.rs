//! The reference language: the target syntax that parsed concrete text is
//! bridged into.
//!
//! The reference language determines the syntax-tree format and what counts
//! as an identifier.  For now it is S-expressions: small enough that the
//! reader and renderer fit in two files, and newlines are ordinary
//! whitespace, so the multi-line output of indented-block matchers reads
//! without ceremony.  The rest of the crate touches this module only
//! through [`parse_text`], [`render_node`] and [`is_identifier`].

pub mod ast;
pub mod parser;

pub use ast::{Node, render_node};
pub use parser::ReferenceError;

/// Parse reference-language source into a syntax tree.
///
/// The whole input is consumed; the result is always a [`Node::Program`]
/// holding the top-level forms.
pub fn parse_text(source: &str) -> Result<Node, ReferenceError> {
    parser::parse_program(source)
}

/// True if `s` is a plain name: letters, digits and underscores, not
/// starting with a digit.
///
/// This is the rule used to classify bare grammar literals: names become
/// whole-word matches, everything else matches exact text.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_shapes() {
        assert!(is_identifier("if"));
        assert!(is_identifier("_tmp"));
        assert!(is_identifier("x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("+"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a b"));
    }

    #[test]
    fn parse_text_returns_program() {
        let node = parse_text("(a) (b)").unwrap();
        assert!(matches!(&node, Node::Program(forms) if forms.len() == 2));
    }
}
