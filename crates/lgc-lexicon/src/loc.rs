use std::fmt;
use std::str::FromStr;

use crate::error::LexiconError;

/// A token location: text id, 1-based sentence number, and optional
/// 0-based word offset.
///
/// Rendered as `text.sentence` or `text.sentence.word`, which is also the
/// stored form inside a [`crate::TokenIndex`] row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Loc {
    text: String,
    sent: usize,
    word: Option<usize>,
}

impl Loc {
    /// A location naming a whole sentence.
    pub fn sentence(text: impl Into<String>, sent: usize) -> Self {
        Self {
            text: text.into(),
            sent,
            word: None,
        }
    }

    /// A location naming one word within a sentence.
    pub fn word(text: impl Into<String>, sent: usize, word: usize) -> Self {
        Self {
            text: text.into(),
            sent,
            word: Some(word),
        }
    }

    /// The text id.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The 1-based sentence number.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// The 0-based word offset, if this names a single word.
    pub fn word_offset(&self) -> Option<usize> {
        self.word
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.text, self.sent)?;
        if let Some(word) = self.word {
            write!(f, ".{word}")?;
        }
        Ok(())
    }
}

impl FromStr for Loc {
    type Err = LexiconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LexiconError::BadLocation(s.to_string());
        let fields: Vec<&str> = s.split('.').collect();
        let (text, sent, word) = match fields.as_slice() {
            [text, sent] => (*text, *sent, None),
            [text, sent, word] => (*text, *sent, Some(*word)),
            _ => return Err(bad()),
        };
        if text.is_empty() {
            return Err(bad());
        }
        let sent: usize = sent.parse().map_err(|_| bad())?;
        let word = match word {
            Some(w) => Some(w.parse().map_err(|_| bad())?),
            None => None,
        };
        Ok(Self {
            text: text.to_string(),
            sent,
            word,
        })
    }
}
