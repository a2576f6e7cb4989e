//! Error types for grammar definition and parsing.

use thiserror::Error;

use crate::reference::ReferenceError;

/// The error type for grammar operations.
///
/// The first variant is a definition-time configuration error; the rest
/// occur while reading input.  There is no partial-result mode: a read
/// either fully succeeds or fails with one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// A left-recursive clause was appended to a rule that has no prior
    /// clause to serve as the base case.
    #[error("left-recursive clause for rule `{rule}` requires a prior base clause")]
    MissingBaseCase {
        /// Name of the rule being defined.
        rule: String,
    },

    /// The composed matcher could not consume the entire input.
    #[error("syntax error at offset {position}: expected {}", .expected.join(" | "))]
    Syntax {
        /// Furthest input position reached, in characters.
        position: usize,
        /// The terminals attempted at that position.
        expected: Vec<String>,
    },

    /// A clause's semantic action produced concrete-syntax text that the
    /// reference-language parser rejects.  This is an authoring bug in the
    /// grammar, not bad input.
    #[error("semantics of rule `{rule}` produced invalid reference text {text:?}")]
    Semantics {
        /// Name of the rule whose semantics misfired.
        rule: String,
        /// The offending concrete-syntax text.
        text: String,
        /// The reference parser's rejection.
        #[source]
        source: ReferenceError,
    },

    /// A reference-language parse failure, passed through unchanged.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}
