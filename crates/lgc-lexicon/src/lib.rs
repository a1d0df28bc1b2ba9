//! Lexicon engine for the LGC corpus store.
//!
//! A lexicon is a form-keyed table of word entries for one language. An
//! entry optionally carries a gloss (`g`), a space-separated list of
//! constituent forms for compounds (`pp`), and a canonical form for
//! variant spellings (`cf`). Only forward edges are stored; the inverted
//! indices -- part → wholes and canonical → variants -- are derived on
//! demand ([`LexiconBacklinks`]) and cached on the backing item until the
//! next mutation.
//!
//! Direct token occurrences live in a separate per-language index item
//! ([`TokenIndex`]). The frequency of a form is its direct occurrence
//! count plus the frequency of every larger form that contains it as a
//! constituent; the computation is an iterative memoized traversal of the
//! part→whole graph that reports a cycle (a data-entry error) instead of
//! recursing forever.
//!
//! # Modules
//!
//! - [`error`] — Error types for lexicon operations
//! - [`loc`] — [`Loc`], a `text.sentence[.word]` token location
//! - [`index`] — The per-language [`TokenIndex`]
//! - [`lexicon`] — [`Lexicon`] and the [`Lexent`] entry view
//! - [`backlinks`] — [`LexiconBacklinks`] inverted indices
//! - [`freq`] — Transitive frequency computation

pub mod backlinks;
pub mod error;
pub mod freq;
pub mod index;
pub mod lexicon;
pub mod loc;

pub use backlinks::LexiconBacklinks;
pub use error::{LexiconError, LexiconResult};
pub use index::TokenIndex;
pub use lexicon::{validate_form, Lexent, Lexicon};
pub use loc::Loc;
