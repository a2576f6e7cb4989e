//! Recursive descent reader for reference-language text.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::ast::Node;

/// Errors that can occur while reading reference-language text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
    #[error("unexpected character {0:?} in reference source")]
    UnexpectedChar(char),
    #[error("unexpected end of reference source")]
    UnexpectedEnd,
    #[error("unclosed list")]
    UnclosedList,
    #[error("unclosed string literal")]
    UnclosedString,
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

/// Parse a whole program (zero or more forms) into a [`Node::Program`].
pub fn parse_program(input: &str) -> Result<Node, ReferenceError> {
    let mut reader = Reader {
        chars: input.chars().peekable(),
    };
    let mut forms = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.chars.peek().is_none() {
            break;
        }
        forms.push(reader.parse_form()?);
    }
    Ok(Node::Program(forms))
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Reader<'_> {
    fn parse_form(&mut self) -> Result<Node, ReferenceError> {
        match self.chars.peek() {
            None => Err(ReferenceError::UnexpectedEnd),
            Some(&'(') => self.parse_list(),
            Some(&'"') => self.parse_string(),
            Some(&')') => Err(ReferenceError::UnexpectedChar(')')),
            _ => self.parse_atom(),
        }
    }

    fn parse_list(&mut self) -> Result<Node, ReferenceError> {
        self.chars.next(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.chars.peek() {
                None => return Err(ReferenceError::UnclosedList),
                Some(&')') => {
                    self.chars.next();
                    break;
                }
                _ => items.push(self.parse_form()?),
            }
        }
        Ok(Node::List(items))
    }

    fn parse_string(&mut self) -> Result<Node, ReferenceError> {
        self.chars.next(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ReferenceError::UnclosedString),
                Some('"') => break,
                Some('\\') => match self.chars.next() {
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => return Err(ReferenceError::InvalidEscape(c)),
                    None => return Err(ReferenceError::UnclosedString),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(Node::Str(text))
    }

    /// Parse a symbol or number.  Atoms run until a delimiter; what they
    /// mean is decided afterwards from their spelling.
    fn parse_atom(&mut self) -> Result<Node, ReferenceError> {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_delimiter(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Node::Int(n));
        }
        if looks_numeric(&s) {
            return match s.parse::<f64>() {
                Ok(x) => Ok(Node::Float(x)),
                Err(_) => Err(ReferenceError::InvalidNumber(s)),
            };
        }
        Ok(Node::Symbol(s))
    }

    /// Skip whitespace, commas and `;` line comments.  Commas count as
    /// whitespace so that delimited-list output reads directly.
    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                self.chars.next();
            } else if c == ';' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '(' | ')' | '"' | ';')
}

/// True for atoms that must be numbers: a leading digit, or a sign/dot
/// followed by a digit-ish character.
fn looks_numeric(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+' | '-' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::ast::render_node;
    use super::*;
    use proptest::prelude::*;

    fn parse_ok(s: &str) -> Node {
        parse_program(s).expect("parse should succeed")
    }
    fn parse_err(s: &str) -> ReferenceError {
        parse_program(s).expect_err("parse should fail")
    }
    fn single(s: &str) -> Node {
        let Node::Program(forms) = parse_ok(s) else {
            panic!("expected Program");
        };
        assert_eq!(forms.len(), 1, "expected a single form");
        forms.into_iter().next().unwrap()
    }

    // --- Atoms ---

    #[test]
    fn parse_symbol() {
        assert_eq!(single("foo"), Node::Symbol("foo".into()));
    }

    #[test]
    fn parse_operator_symbol() {
        assert_eq!(single("+"), Node::Symbol("+".into()));
        assert_eq!(single("<="), Node::Symbol("<=".into()));
    }

    #[test]
    fn parse_int() {
        assert_eq!(single("42"), Node::Int(42));
        assert_eq!(single("-7"), Node::Int(-7));
    }

    #[test]
    fn parse_float() {
        assert_eq!(single("2.5"), Node::Float(2.5));
        assert_eq!(single("-0.5"), Node::Float(-0.5));
    }

    #[test]
    fn digit_led_atom_must_be_numeric() {
        assert!(matches!(
            parse_err("1abc"),
            ReferenceError::InvalidNumber(_)
        ));
    }

    // --- Strings ---

    #[test]
    fn parse_string_with_escapes() {
        assert_eq!(single(r#""a\"b\n""#), Node::Str("a\"b\n".into()));
    }

    #[test]
    fn unclosed_string() {
        assert!(matches!(
            parse_err("\"abc"),
            ReferenceError::UnclosedString
        ));
    }

    #[test]
    fn invalid_escape() {
        assert!(matches!(
            parse_err(r#""a\q""#),
            ReferenceError::InvalidEscape('q')
        ));
    }

    // --- Lists ---

    #[test]
    fn parse_nested_list() {
        assert_eq!(
            single("(add 1 (neg 2))"),
            Node::List(vec![
                Node::Symbol("add".into()),
                Node::Int(1),
                Node::List(vec![Node::Symbol("neg".into()), Node::Int(2)]),
            ])
        );
    }

    #[test]
    fn unclosed_list() {
        assert!(matches!(parse_err("(a b"), ReferenceError::UnclosedList));
    }

    #[test]
    fn stray_close_paren() {
        assert!(matches!(
            parse_err(")"),
            ReferenceError::UnexpectedChar(')')
        ));
    }

    // --- Trivia ---

    #[test]
    fn commas_are_whitespace() {
        assert_eq!(
            parse_ok("1,2,3"),
            Node::Program(vec![Node::Int(1), Node::Int(2), Node::Int(3)])
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            parse_ok("1 ; the first\n2"),
            Node::Program(vec![Node::Int(1), Node::Int(2)])
        );
    }

    #[test]
    fn newlines_between_tokens() {
        assert_eq!(
            single("(do\n  (a)\n  (b))"),
            Node::List(vec![
                Node::Symbol("do".into()),
                Node::List(vec![Node::Symbol("a".into())]),
                Node::List(vec![Node::Symbol("b".into())]),
            ])
        );
    }

    #[test]
    fn empty_input_is_empty_program() {
        assert_eq!(parse_ok("  \n "), Node::Program(vec![]));
    }

    // --- Round trips ---

    #[test]
    fn rendered_text_is_a_fixed_point() {
        for src in ["(add 1 2)", "(f \"a\\\"b\" 2.5)", "foo", "(a (b (c)))"] {
            let node = parse_ok(src);
            let rendered = render_node(&node);
            assert_eq!(parse_ok(&rendered), node, "round trip of {src}");
            assert_eq!(render_node(&parse_ok(&rendered)), rendered);
        }
    }

    proptest! {
        #[test]
        fn integer_atoms_round_trip(n in any::<i64>()) {
            let text = n.to_string();
            let node = single(&text);
            prop_assert_eq!(render_node(&node), text);
        }

        #[test]
        fn symbol_atoms_round_trip(s in "[a-z_][a-z0-9_]{0,12}") {
            let node = single(&s);
            prop_assert_eq!(node, Node::Symbol(s));
        }
    }
}
