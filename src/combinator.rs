//! Reusable structural combinators built on the matcher primitives.

use itertools::Itertools;

use crate::matcher::{Matcher, Semantics, Value, classify_literal};

/// Delimiter-separated repetition, combined into a single token.
///
/// Accepts `min`-or-more occurrences of `item` separated by the literal
/// `delim` (classified like any clause literal).  Sub-results and
/// delimiters are concatenated into one text token; when `trailing` is
/// permitted, one trailing delimiter is consumed but left out of the
/// result, so `1,2,3` and `1,2,3,` read identically.
///
/// `min` counts items and should be at least 1.
pub fn list_of(item: Matcher, delim: &str, trailing: bool, min: usize) -> Matcher {
    let delim = classify_literal(delim);
    let tail = Matcher::Seq(vec![delim.clone(), item.clone()]);
    let mut elems = vec![
        item,
        Matcher::Repeat {
            inner: Box::new(tail),
            min: min.saturating_sub(1),
            max: None,
        },
    ];
    if trailing {
        elems.push(Matcher::suppress(Matcher::optional(delim)));
    }
    Matcher::Seq(elems).with_action(combine())
}

/// [`list_of`] with the common defaults: comma delimiter, trailing comma
/// permitted, at least one item.
pub fn comma_list(item: Matcher) -> Matcher {
    list_of(item, ",", true, 1)
}

/// An indented block of `item`s: one-or-more matches at a uniform
/// indentation column deeper than the line the block starts on,
/// re-serialized with each sub-result on its own line at exactly the
/// first element's column.
pub fn block_of(item: Matcher) -> Matcher {
    Matcher::Block(Box::new(item))
}

/// Concatenate sub-results into one text token, no separators.
fn combine() -> Semantics {
    Semantics::new(|toks| Value::Text(toks.iter().map(|t| t.to_string()).join("")))
}
