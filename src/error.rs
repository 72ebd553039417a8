//! Parse error kinds.
//!
//! Every error here is fatal: a malformed registry is a build-time input
//! error, so parsing aborts on the first failure and no partial IR is
//! produced. There is no skip-and-continue or default substitution.

use std::fmt;

use thiserror::Error;

/// Fatal registry parsing error.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The registry document itself is not well-formed XML.
    #[error("registry document is not well-formed: {0}")]
    Document(#[from] roxmltree::Error),

    /// A length expression was syntactically invalid or not fully consumed.
    #[error("malformed length expression '{text}' (unconsumed input '{remainder}')")]
    MalformedExpression {
        /// The expression text the parser was handed.
        text: String,
        /// The input left over when parsing stopped.
        remainder: String,
    },

    /// A type spelling has no entry in the recognized vocabulary.
    #[error("no type mapping exists for '{0}'")]
    UnknownType(String),

    /// An enum value literal carried an unrecognized numeric suffix.
    #[error("invalid enum literal suffix '{0}'")]
    InvalidLiteralSuffix(String),

    /// A numeric literal could not be parsed in its expected width.
    #[error("malformed numeric literal '{0}'")]
    MalformedLiteral(String),

    /// A feature version number was not a strict major.minor pair.
    #[error("malformed version number '{0}'")]
    MalformedVersion(String),

    /// A required attribute or child element was absent on a parsed element.
    #[error("element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Tag name of the offending element.
        element: String,
        /// The attribute (or child element) that was expected.
        attribute: String,
    },

    /// A require/remove entry referenced a command or enum that was never
    /// declared in the tables built so far.
    #[error("{kind} '{name}' is referenced by a require/remove entry but does not exist")]
    UnresolvedReference {
        /// Whether the dangling name pointed at a command or an enum.
        kind: ReferenceKind,
        /// The name that failed to resolve.
        name: String,
    },

    /// An extension name did not contain a vendor tag in the expected position.
    #[error("extension name '{0}' does not contain a vendor tag")]
    MalformedExtensionName(String),

    /// An attribute value fell outside its closed enumeration.
    #[error("'{value}' is not a recognized {what}")]
    InvalidEnumeratedValue {
        /// Which enumeration was being parsed (API identifier, profile, ...).
        what: &'static str,
        /// The offending attribute value.
        value: String,
    },
}

/// What kind of name an unresolved reference pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A `<command name="..."/>` entry.
    Command,
    /// An `<enum name="..."/>` entry.
    Enum,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Command => write!(f, "command"),
            ReferenceKind::Enum => write!(f, "enum"),
        }
    }
}
