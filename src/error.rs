use thiserror::Error;

/// Rendering failures. Both mean the value does not conform to the schema it
/// was printed against; neither is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrettyError {
    #[error("cannot pretty print a `never` value")]
    Never,
    #[error("value {actual} does not match any member of the union")]
    NoMatchingMember { actual: String },
}

pub type Result<T, E = PrettyError> = std::result::Result<T, E>;
