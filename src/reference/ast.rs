//! Syntax tree of the reference language.

use std::fmt;

use itertools::Itertools;

/// A node of the reference-language syntax tree.
///
/// A whole program is a [`Node::Program`] holding its top-level forms;
/// everything below that is an atom or a parenthesized list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Zero or more top-level forms.
    Program(Vec<Node>),
    /// A parenthesized form.
    List(Vec<Node>),
    /// A bare name, including operator names like `+` or `<=`.
    Symbol(String),
    /// A double-quoted string.
    Str(String),
    Int(i64),
    Float(f64),
}

impl Node {
    /// The top-level forms of a program, or a single-element view of any
    /// other node.
    pub fn forms(&self) -> &[Node] {
        match self {
            Node::Program(forms) => forms,
            other => std::slice::from_ref(other),
        }
    }
}

/// Render `node` back to reference-language text.
///
/// Program forms go on separate lines; everything else renders flat.
/// Rendered text is canonical: parsing it again yields an equal tree.
pub fn render_node(node: &Node) -> String {
    node.to_string()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(forms) => write!(f, "{}", forms.iter().format("\n")),
            Node::List(items) => write!(f, "({})", items.iter().format(" ")),
            Node::Symbol(name) => f.write_str(name),
            Node::Str(text) => {
                write!(f, "\"")?;
                for c in text.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Node::Int(n) => write!(f, "{n}"),
            // {:?} keeps a trailing ".0" so floats re-read as floats
            Node::Float(x) => write!(f, "{x:?}"),
        }
    }
}
