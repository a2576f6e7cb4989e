//! Matching engine: run a [`Matcher`] against input text.
//!
//! All positions are **character** (not byte) indices into the input.
//! Terminals skip leading whitespace; repetition is greedy without
//! give-back; choice evaluates every alternative and keeps the longest,
//! ties going to the earliest.  Failures record the furthest position
//! reached and the terminals attempted there.

use itertools::Itertools;

use crate::grammar::Store;

use super::ast::{Matcher, Value};

/// Context for one parse: the input and the rule store to resolve
/// deferred rule references against.  Read-only for the whole parse.
pub(crate) struct MatchCtx<'a> {
    pub chars: Vec<char>,
    pub store: &'a Store,
}

/// Furthest failure position and the terminals expected there.
#[derive(Debug, Default)]
pub(crate) struct Expectations {
    pub furthest: usize,
    pub expected: Vec<String>,
}

impl Expectations {
    fn record(&mut self, pos: usize, label: String) {
        if pos > self.furthest {
            self.furthest = pos;
            self.expected.clear();
        }
        if pos == self.furthest && !self.expected.contains(&label) {
            self.expected.push(label);
        }
    }
}

/// Maximum nesting of rule references before a match is abandoned.
/// Turns runaway indirect recursion into a plain failure instead of a
/// stack overflow.
const MAX_RULE_DEPTH: usize = 4096;

// ─── Public entry ────────────────────────────────────────────────────────────

/// Match `m` against the whole of `input`, requiring full consumption
/// (trailing whitespace permitted).  On failure, returns the expectation
/// record for diagnostics.
pub(crate) fn parse_all(
    m: &Matcher,
    store: &Store,
    input: &str,
) -> Result<Vec<Value>, Expectations> {
    let ctx = MatchCtx {
        chars: input.chars().collect(),
        store,
    };
    let mut err = Expectations::default();
    if let Some((end, toks)) = match_at(m, &ctx, 0, 0, &mut err) {
        let end = skip_ws(&ctx.chars, end);
        if end == ctx.chars.len() {
            return Ok(toks);
        }
        err.record(end, "end of input".to_string());
    }
    Err(err)
}

// ─── Core matching ───────────────────────────────────────────────────────────

/// Match `m` at `pos`.  Returns the end position and the emitted values,
/// or `None` (with `err` updated) on failure.
pub(crate) fn match_at(
    m: &Matcher,
    ctx: &MatchCtx,
    pos: usize,
    depth: usize,
    err: &mut Expectations,
) -> Option<(usize, Vec<Value>)> {
    match m {
        Matcher::Exact(text) => match_exact(text, ctx, pos, err),
        Matcher::Keyword(word) => match_keyword(word, ctx, pos, err),

        Matcher::Seq(items) => {
            let mut cur = pos;
            let mut toks = Vec::new();
            for item in items {
                let (next, vs) = match_at(item, ctx, cur, depth, err)?;
                cur = next;
                toks.extend(vs);
            }
            Some((cur, toks))
        }

        Matcher::Choice(alts) => {
            let mut best: Option<(usize, Vec<Value>)> = None;
            for alt in alts {
                if let Some((end, vs)) = match_at(alt, ctx, pos, depth, err) {
                    // strict comparison keeps the earliest alternative on ties
                    if best.as_ref().is_none_or(|(b, _)| end > *b) {
                        best = Some((end, vs));
                    }
                }
            }
            best
        }

        Matcher::Repeat { inner, min, max } => {
            let mut cur = pos;
            let mut toks = Vec::new();
            let mut count = 0usize;
            while max.is_none_or(|hi| count < hi) {
                match match_at(inner, ctx, cur, depth, err) {
                    // zero-width matches end the repetition (infinite loop guard)
                    Some((next, vs)) if next != cur => {
                        cur = next;
                        toks.extend(vs);
                        count += 1;
                    }
                    _ => break,
                }
            }
            (count >= *min).then_some((cur, toks))
        }

        Matcher::Group(inner) => {
            let (end, vs) = match_at(inner, ctx, pos, depth, err)?;
            Some((end, vec![Value::Group(vs)]))
        }

        Matcher::Suppress(inner) => {
            let (end, _) = match_at(inner, ctx, pos, depth, err)?;
            Some((end, Vec::new()))
        }

        Matcher::Action { inner, action } => {
            let (end, vs) = match_at(inner, ctx, pos, depth, err)?;
            Some((end, vec![action.apply(&vs)]))
        }

        Matcher::Rule(id) => {
            if depth >= MAX_RULE_DEPTH {
                return None;
            }
            let cell = ctx.store.cell(*id);
            match cell.matcher() {
                Some(m) => match_at(m, ctx, pos, depth + 1, err),
                // a rule with no clauses yet never matches
                None => {
                    err.record(skip_ws(&ctx.chars, pos), format!("<{}>", cell.name()));
                    None
                }
            }
        }

        Matcher::Block(inner) => match_block(inner, ctx, pos, depth, err),
    }
}

// ─── Terminals ───────────────────────────────────────────────────────────────

fn match_exact(
    text: &str,
    ctx: &MatchCtx,
    pos: usize,
    err: &mut Expectations,
) -> Option<(usize, Vec<Value>)> {
    let start = skip_ws(&ctx.chars, pos);
    if literal_matches(&ctx.chars, start, text) {
        let end = start + text.chars().count();
        Some((end, vec![Value::Text(text.to_string())]))
    } else {
        err.record(start, format!("{text:?}"));
        None
    }
}

/// Whole-word match: the literal must not continue an identifier on
/// either side.
fn match_keyword(
    word: &str,
    ctx: &MatchCtx,
    pos: usize,
    err: &mut Expectations,
) -> Option<(usize, Vec<Value>)> {
    let start = skip_ws(&ctx.chars, pos);
    let end = start + word.chars().count();
    let bounded_before = start == 0 || !is_ident_char(ctx.chars[start - 1]);
    let bounded_after = !ctx.chars.get(end).is_some_and(|&c| is_ident_char(c));
    if bounded_before && bounded_after && literal_matches(&ctx.chars, start, word) {
        Some((end, vec![Value::Text(word.to_string())]))
    } else {
        err.record(start, word.to_string());
        None
    }
}

// ─── Indented blocks ─────────────────────────────────────────────────────────

/// Match one-or-more `inner` at a uniform indentation column strictly
/// deeper than the indentation of the line the block starts on, then
/// re-serialize every sub-result on its own line at that column.
fn match_block(
    inner: &Matcher,
    ctx: &MatchCtx,
    pos: usize,
    depth: usize,
    err: &mut Expectations,
) -> Option<(usize, Vec<Value>)> {
    let anchor = line_indent(&ctx.chars, pos);
    let first = skip_ws(&ctx.chars, pos);
    let indent = column(&ctx.chars, first);
    if first >= ctx.chars.len() || indent <= anchor {
        err.record(first, "indented block".to_string());
        return None;
    }

    let mut toks = Vec::new();
    let mut cur = first;
    loop {
        let Some((next, vs)) = match_at(inner, ctx, cur, depth, err) else {
            break;
        };
        toks.extend(vs);
        cur = next;
        // peers continue only at exactly the block's column
        let peek = skip_ws(&ctx.chars, cur);
        if peek >= ctx.chars.len() || column(&ctx.chars, peek) != indent {
            break;
        }
        cur = peek;
    }
    if toks.is_empty() {
        return None;
    }

    let white = format!("\n{}", " ".repeat(indent));
    let text: String = toks.iter().map(|t| format!("{white}{t}")).join("");
    Some((cur, vec![Value::Text(text)]))
}

// ─── Position helpers ────────────────────────────────────────────────────────

fn skip_ws(chars: &[char], mut pos: usize) -> usize {
    while matches!(chars.get(pos), Some(' ' | '\t' | '\r' | '\n')) {
        pos += 1;
    }
    pos
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn literal_matches(chars: &[char], start: usize, text: &str) -> bool {
    let mut pos = start;
    for ch in text.chars() {
        if chars.get(pos) != Some(&ch) {
            return false;
        }
        pos += 1;
    }
    true
}

/// Characters between the last newline and `pos`.
fn column(chars: &[char], pos: usize) -> usize {
    let mut col = 0;
    let mut i = pos;
    while i > 0 && chars[i - 1] != '\n' {
        col += 1;
        i -= 1;
    }
    col
}

/// Indentation width of the line containing `pos`.
fn line_indent(chars: &[char], pos: usize) -> usize {
    let line_start = pos - column(chars, pos);
    let mut i = line_start;
    while matches!(chars.get(i), Some(' ' | '\t')) {
        i += 1;
    }
    i - line_start
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ast::classify_literal;

    fn run(m: &Matcher, input: &str) -> Result<Vec<Value>, Expectations> {
        let store = Store::default();
        parse_all(m, &store, input)
    }

    fn texts(toks: Vec<Value>) -> Vec<String> {
        toks.iter().map(|t| t.to_string()).collect()
    }

    // --- Terminals ---

    #[test]
    fn exact_skips_leading_whitespace() {
        let m = Matcher::Exact("+".into());
        assert_eq!(texts(run(&m, "   +").unwrap()), ["+"]);
    }

    #[test]
    fn exact_matches_adjacent_to_identifiers() {
        let m = Matcher::seq(vec![
            Matcher::Keyword("a".into()),
            Matcher::Exact("+".into()),
            Matcher::Keyword("b".into()),
        ]);
        assert_eq!(texts(run(&m, "a+b").unwrap()), ["a", "+", "b"]);
    }

    #[test]
    fn keyword_requires_right_boundary() {
        let m = Matcher::Keyword("if".into());
        assert!(run(&m, "if").is_ok());
        assert!(run(&m, "ifx").is_err());
    }

    #[test]
    fn keyword_requires_left_boundary() {
        let m = Matcher::seq(vec![
            Matcher::Keyword("x".into()),
            Matcher::Keyword("if".into()),
        ]);
        assert!(run(&m, "x if").is_ok());
        assert!(run(&m, "xif").is_err());
    }

    // --- Sequences and choice ---

    #[test]
    fn seq_concatenates_sub_results() {
        let m = Matcher::seq(vec![classify_literal("let"), classify_literal("=")]);
        assert_eq!(texts(run(&m, "let =").unwrap()), ["let", "="]);
    }

    #[test]
    fn choice_prefers_longest_match() {
        let m = Matcher::choice(vec![
            Matcher::Keyword("a".into()),
            Matcher::seq(vec![Matcher::Keyword("a".into()), Matcher::Keyword("b".into())]),
        ]);
        // the second alternative consumes more, despite being appended later
        assert_eq!(texts(run(&m, "a b").unwrap()), ["a", "b"]);
    }

    #[test]
    fn choice_tie_goes_to_earliest() {
        let first = Matcher::Keyword("x".into())
            .with_action(crate::matcher::Semantics::new(|_| Value::text("first")));
        let second = Matcher::Keyword("x".into())
            .with_action(crate::matcher::Semantics::new(|_| Value::text("second")));
        let m = Matcher::choice(vec![first, second]);
        assert_eq!(texts(run(&m, "x").unwrap()), ["first"]);
    }

    // --- Repetition ---

    #[test]
    fn repeat_is_greedy() {
        let m = Matcher::one_or_more(Matcher::Keyword("a".into()));
        assert_eq!(texts(run(&m, "a a a").unwrap()), ["a", "a", "a"]);
    }

    #[test]
    fn repeat_enforces_min() {
        let m = Matcher::Repeat {
            inner: Box::new(Matcher::Keyword("a".into())),
            min: 2,
            max: None,
        };
        assert!(run(&m, "a").is_err());
        assert!(run(&m, "a a").is_ok());
    }

    #[test]
    fn repeat_enforces_max() {
        let m = Matcher::seq(vec![
            Matcher::optional(Matcher::Exact(",".into())),
            Matcher::Keyword("a".into()),
        ]);
        assert!(run(&m, ", a").is_ok());
        assert!(run(&m, ", , a").is_err());
    }

    #[test]
    fn zero_width_repetition_terminates() {
        let m = Matcher::zero_or_more(Matcher::Seq(vec![]));
        assert_eq!(run(&m, "").unwrap(), Vec::<Value>::new());
    }

    // --- Group, suppress, action ---

    #[test]
    fn group_wraps_sub_results() {
        let m = Matcher::group(Matcher::seq(vec![
            Matcher::Keyword("a".into()),
            Matcher::Keyword("b".into()),
        ]));
        let toks = run(&m, "a b").unwrap();
        assert_eq!(
            toks,
            vec![Value::Group(vec![Value::text("a"), Value::text("b")])]
        );
    }

    #[test]
    fn suppress_discards_sub_results() {
        let m = Matcher::seq(vec![
            Matcher::Keyword("a".into()),
            Matcher::suppress(Matcher::Exact(";".into())),
        ]);
        assert_eq!(texts(run(&m, "a;").unwrap()), ["a"]);
    }

    // --- Rules ---

    #[test]
    fn empty_rule_reports_its_name() {
        let mut store = Store::default();
        let id = store.create("orphan");
        let m = Matcher::Rule(id);
        let err = parse_all(&m, &store, "x").unwrap_err();
        assert_eq!(err.expected, ["<orphan>"]);
    }

    // --- Diagnostics ---

    #[test]
    fn expectations_track_furthest_position() {
        let m = Matcher::seq(vec![
            Matcher::Keyword("a".into()),
            Matcher::choice(vec![Matcher::Exact("+".into()), Matcher::Exact("-".into())]),
        ]);
        let err = run(&m, "a *").unwrap_err();
        assert_eq!(err.furthest, 2);
        assert_eq!(err.expected, ["\"+\"", "\"-\""]);
    }

    #[test]
    fn trailing_input_expects_end() {
        let m = Matcher::Keyword("a".into());
        let err = run(&m, "a b").unwrap_err();
        assert_eq!(err.furthest, 2);
        assert!(err.expected.contains(&"end of input".to_string()));
    }

    // --- Blocks ---

    #[test]
    fn block_matches_uniform_indentation() {
        let item = Matcher::choice(vec![Matcher::Keyword("x".into()), Matcher::Keyword("y".into())]);
        let m = Matcher::seq(vec![
            Matcher::Keyword("begin".into()),
            Matcher::Block(Box::new(item)),
        ]);
        let toks = run(&m, "begin\n  x\n  y").unwrap();
        assert_eq!(texts(toks), ["begin", "\n  x\n  y"]);
    }

    #[test]
    fn block_reindents_to_first_element_column() {
        // elements sit at column 4; output is re-emitted at exactly that width
        let item = Matcher::Keyword("x".into());
        let m = Matcher::seq(vec![
            Matcher::Keyword("begin".into()),
            Matcher::Block(Box::new(item)),
        ]);
        let toks = run(&m, "begin\n    x\n    x").unwrap();
        assert_eq!(texts(toks), ["begin", "\n    x\n    x"]);
    }

    #[test]
    fn block_requires_deeper_indentation() {
        let item = Matcher::Keyword("x".into());
        let m = Matcher::seq(vec![
            Matcher::Keyword("begin".into()),
            Matcher::Block(Box::new(item)),
        ]);
        assert!(run(&m, "begin\nx").is_err());
    }

    #[test]
    fn block_ends_at_dedent() {
        let item = Matcher::Keyword("x".into());
        let block = Matcher::seq(vec![
            Matcher::Keyword("begin".into()),
            Matcher::Block(Box::new(item)),
        ]);
        let m = Matcher::seq(vec![block, Matcher::Keyword("end".into())]);
        let toks = run(&m, "begin\n  x\n  x\nend").unwrap();
        assert_eq!(texts(toks), ["begin", "\n  x\n  x", "end"]);
    }

    #[test]
    fn nested_line_indent_anchors_block() {
        // the inner block must be deeper than the line its opener sits on
        let item = Matcher::Keyword("x".into());
        let m = Matcher::seq(vec![
            Matcher::Keyword("begin".into()),
            Matcher::Block(Box::new(item)),
        ]);
        // opener line indented two; elements at two are not deeper
        assert!(run(&m, "  begin\n  x").is_err());
        assert!(run(&m, "  begin\n    x").is_ok());
    }
}
