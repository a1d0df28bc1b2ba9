//! Corpus object graph for the LGC store.
//!
//! A corpus holds languages; a language holds a table of contents, a
//! lexicon, and a token index. Texts form a parent/child hierarchy:
//! aggregates list their children in the toc, simple texts carry a
//! persisted sentence list. Parenthood is never stored on the child --
//! it is recovered by inverting the `ch` lists on demand.
//!
//! Everything here is a thin, disposable view over items owned by the
//! [`lgc_store::ItemDisk`] identity map; multi-step edits wrap in
//! [`Corpus::hold`] so they commit together or not at all.
//!
//! # Modules
//!
//! - [`error`] — Error types for corpus operations
//! - [`names`] — Language/text id validation
//! - [`corpus`] — [`Corpus`], [`LanguageTable`], [`Language`]
//! - [`toc`] — [`Toc`] and parent/child resolution
//! - [`text`] — [`Text`] views and the [`TextTable`] projection
//! - [`sentence`] — [`SentenceList`], [`Sentence`], [`SentenceToken`]
//! - [`concordance`] — Keyword-in-context listings over the token index

pub mod concordance;
pub mod corpus;
pub mod error;
pub mod names;
pub mod sentence;
pub mod text;
pub mod toc;

pub use concordance::{Concordance, ConcordanceRow};
pub use corpus::{Corpus, Language, LanguageTable};
pub use error::{CorpusError, CorpusResult};
pub use names::{validate_lang_id, validate_text_id};
pub use sentence::{Sentence, SentenceList, SentenceToken};
pub use text::{Text, TextTable};
pub use toc::Toc;
