use lgc_lexicon::LexiconError;
use lgc_store::StoreError;

/// Errors from corpus operations.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Error from the item-disk persistence layer.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from the lexicon engine.
    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    /// The requested language is not in the language table.
    #[error("unknown language {0:?}")]
    LanguageNotFound(String),

    /// A language with this id already exists.
    #[error("language {0:?} already exists")]
    DuplicateLanguage(String),

    /// The requested text is not in the table of contents.
    #[error("unknown text {0:?}")]
    TextNotFound(String),

    /// A text with this id already exists.
    #[error("text {0:?} already exists")]
    DuplicateText(String),

    /// Two aggregate texts both list the same child (malformed corpus).
    #[error("text {child:?} is claimed by both {first:?} and {second:?}")]
    DuplicateChild {
        child: String,
        first: String,
        second: String,
    },

    /// The operation needs a simple text, but this text aggregates
    /// children.
    #[error("text {0:?} is an aggregate, not a simple text")]
    NotASimpleText(String),

    /// A stored sentence timestamp could not be parsed.
    #[error("invalid timestamp {0:?} in sentence record")]
    BadTimestamp(String),

    /// The language or text id is empty, reserved, or contains a
    /// forbidden character.
    #[error("invalid id {0:?}")]
    InvalidId(String),
}

/// Result alias for corpus operations.
pub type CorpusResult<T> = Result<T, CorpusError>;
