use lgc_store::StoreError;

/// Errors from lexicon operations.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    /// Error from the item-disk persistence layer.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested form has no lexicon entry.
    #[error("no lexicon entry for form {0:?}")]
    FormNotFound(String),

    /// The form is empty or contains whitespace.
    #[error("invalid lexical form {0:?}")]
    InvalidForm(String),

    /// A stored token location could not be parsed.
    #[error("invalid token location {0:?}")]
    BadLocation(String),

    /// The part/whole graph contains a cycle (a data-entry error).
    ///
    /// The chain lists the forms along the offending path, ending with
    /// the form that was revisited.
    #[error("part/whole cycle detected: {}", .chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },
}

/// Result alias for lexicon operations.
pub type LexiconResult<T> = Result<T, LexiconError>;
