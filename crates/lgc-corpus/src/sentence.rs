use std::fmt;
use std::sync::Arc;

use lgc_store::{Format, Item, ItemDisk, Record};

use crate::error::{CorpusError, CorpusResult};

/// The item name a text's sentences are persisted under.
pub(crate) fn sentence_item_name(langid: &str, textid: &str) -> String {
    format!("/{langid}/txt/{textid}")
}

/// One element of a raw sentence: a word (possibly several,
/// whitespace-separated) or an inline timestamp in seconds.
///
/// Timestamps attach to the word position they precede, so interleaving
/// them with words records where in the audio each stretch begins.
#[derive(Clone, Debug, PartialEq)]
pub enum SentenceToken {
    Word(String),
    Timestamp(f64),
}

impl SentenceToken {
    /// A word token.
    pub fn word(w: impl Into<String>) -> Self {
        Self::Word(w.into())
    }

    /// A timestamp token, in seconds.
    pub fn timestamp(seconds: f64) -> Self {
        Self::Timestamp(seconds)
    }
}

/// The ordered sentence sequence of one simple text.
///
/// Persisted as a property-list item at `/<langid>/txt/<textid>`: one
/// block per sentence, `w` lines carrying word groups, `t` lines carrying
/// timestamps at the current word offset, a trailing `g` line carrying
/// the translation.
#[derive(Clone)]
pub struct SentenceList {
    item: Arc<Item>,
}

impl SentenceList {
    pub(crate) fn open(
        disk: &Arc<ItemDisk>,
        langid: &str,
        textid: &str,
    ) -> CorpusResult<Self> {
        let item = disk.intern(&sentence_item_name(langid, textid), Format::Plists)?;
        Ok(Self { item })
    }

    /// The item name this sentence list is persisted under.
    pub fn item_name(&self) -> &str {
        self.item.name()
    }

    /// Number of sentences.
    pub fn len(&self) -> CorpusResult<usize> {
        Ok(self.item.with_plists(|pl| pl.len())?)
    }

    /// Returns `true` if the text has no sentences yet.
    pub fn is_empty(&self) -> CorpusResult<bool> {
        Ok(self.item.with_plists(|pl| pl.is_empty())?)
    }

    /// The sentence with 1-based number `sno`, or `None` past the end.
    pub fn get(&self, sno: usize) -> CorpusResult<Option<Sentence>> {
        if sno == 0 {
            return Ok(None);
        }
        let record = self.item.with_plists(|pl| pl.get(sno - 1).cloned())?;
        record.map(|rec| Sentence::from_record(sno, &rec)).transpose()
    }

    /// All sentences, in order.
    pub fn sentences(&self) -> CorpusResult<Vec<Sentence>> {
        let records = self.item.with_plists(|pl| pl.to_vec())?;
        records
            .iter()
            .enumerate()
            .map(|(i, rec)| Sentence::from_record(i + 1, rec))
            .collect()
    }

    /// Append a raw sentence and mark the list modified.
    ///
    /// Words accumulate into `w` groups; each timestamp flushes the group
    /// and records the current word offset. The gloss, if given, lands in
    /// a trailing `g` line.
    pub fn append(&self, tokens: &[SentenceToken], gloss: Option<&str>) -> CorpusResult<()> {
        let mut record = Record::new();
        let mut run: Vec<&str> = Vec::new();
        for token in tokens {
            match token {
                SentenceToken::Word(w) => run.extend(w.split_whitespace()),
                SentenceToken::Timestamp(t) => {
                    flush_words(&mut record, &mut run);
                    record.push("t", t.to_string());
                }
            }
        }
        flush_words(&mut record, &mut run);
        if let Some(gloss) = gloss {
            record.push("g", gloss);
        }
        self.item.with_plists_mut(|pl| pl.push(record))?;
        Ok(())
    }

    /// Append a plain whitespace-separated sentence.
    pub fn append_plain(&self, text: &str, gloss: Option<&str>) -> CorpusResult<()> {
        self.append(&[SentenceToken::word(text)], gloss)
    }
}

fn flush_words(record: &mut Record, run: &mut Vec<&str>) {
    if !run.is_empty() {
        record.push("w", run.join(" "));
        run.clear();
    }
}

impl fmt::Debug for SentenceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentenceList")
            .field("item", &self.item.name())
            .finish()
    }
}

/// One sentence: a derived, non-persisted view over a property-list.
#[derive(Clone, Debug, PartialEq)]
pub struct Sentence {
    sno: usize,
    words: Vec<String>,
    timestamps: Vec<(usize, f64)>,
    translation: Option<String>,
}

impl Sentence {
    fn from_record(sno: usize, record: &Record) -> CorpusResult<Self> {
        let mut words: Vec<String> = Vec::new();
        let mut timestamps = Vec::new();
        let mut translation = None;
        for (tag, value) in record.pairs() {
            match tag {
                "w" => words.extend(value.split_whitespace().map(str::to_string)),
                "t" => {
                    let seconds: f64 = value
                        .parse()
                        .map_err(|_| CorpusError::BadTimestamp(value.to_string()))?;
                    timestamps.push((words.len(), seconds));
                }
                "g" => translation = Some(value.to_string()),
                // Unknown tags are tolerated so newer corpora still load.
                _ => {}
            }
        }
        Ok(Self {
            sno,
            words,
            timestamps,
            translation,
        })
    }

    /// The 1-based sentence number within its text.
    pub fn sno(&self) -> usize {
        self.sno
    }

    /// The word tokens, in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Sparse `(word-offset, seconds)` pairs; offsets are 0-based.
    pub fn timestamps(&self) -> &[(usize, f64)] {
        &self.timestamps
    }

    /// The translation or gloss, if recorded.
    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the sentence has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}
