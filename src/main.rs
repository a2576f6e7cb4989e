use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Parser;

use gramsmith::{Grammar, Matcher, Rule, Term, Value, format_output};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expression to read; stdin when omitted
    expr: Option<String>,

    /// Print the intermediate concrete syntax
    #[arg(short, long)]
    verbose: bool,
}

/// A small arithmetic grammar bridging infix text into reference forms.
fn arithmetic() -> Result<Rule> {
    let g = Grammar::new();

    let number = g.rule("number");
    let digit = Matcher::choice((0..10).map(|d| Matcher::Exact(d.to_string())).collect());
    number.define_with(
        [Term::from(Matcher::one_or_more(digit))],
        |toks| Value::Text(toks.iter().map(|t| t.to_string()).collect()),
    )?;

    let expr = g.rule("expr");
    let term = g.rule("term");
    term.define([Term::from(&number)])?;
    term.define_with(
        [Term::from("("), Term::from(&expr), Term::from(")")],
        |t| t[1].clone(),
    )?;

    // one left-recursive clause with an operator alternation, so mixed
    // chains like `1 - 2 + 3` reduce left-associatively
    let op = Matcher::choice(vec![Matcher::Exact("+".into()), Matcher::Exact("-".into())]);
    expr.define([Term::from(&term)])?;
    expr.define_with(
        [Term::from(&expr), Term::from(op), Term::from(&term)],
        format_output("({1} {0} {2})"),
    )?;

    Ok(expr)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let input = match args.expr {
        Some(expr) => expr,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let expr = arithmetic()?;
    let node = if args.verbose {
        expr.read_verbose(&input)?
    } else {
        expr.read(&input)?
    };
    println!("{node}");
    Ok(())
}
