//! Hard failures of a generation call.
//!
//! Every variant is raised before the registry or ledger is touched, so a
//! failed call leaves the generator exactly as it was.

use socialgraph_model::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Duplicate {namespace} identifier: {id}")]
    DuplicateIdentifier { namespace: &'static str, id: String },

    #[error("Capacity exhausted: {0}")]
    CapacityExhausted(String),

    #[error("Ambiguous {kind} name `{name}`: {matches} matches")]
    AmbiguousName {
        kind: &'static str,
        name: String,
        matches: usize,
    },

    #[error("No {kind} found for `{name}`")]
    NotFound { kind: &'static str, name: String },

    #[error("Conversation `{reference}` mentions non-participants: {}", offenders.join(", "))]
    ConversationIntegrity {
        reference: String,
        offenders: Vec<String>,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid interval {start}..{end}: {reason}")]
    InvalidInterval {
        start: String,
        end: String,
        reason: String,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl GenerationError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        GenerationError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn exhausted(message: impl Into<String>) -> Self {
        GenerationError::CapacityExhausted(message.into())
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
