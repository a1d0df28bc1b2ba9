use std::fmt;

use lgc_lexicon::{Lexicon, Loc};
use tracing::warn;

use crate::error::CorpusResult;
use crate::text::TextTable;

/// One keyword-in-context row: the word at a location together with the
/// sentence text on either side of it.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcordanceRow {
    keyword: String,
    loc: Loc,
    left: String,
    right: String,
}

impl ConcordanceRow {
    /// The word form at the location.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Where the keyword occurs.
    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    /// The sentence text before the keyword.
    pub fn left(&self) -> &str {
        &self.left
    }

    /// The sentence text after the keyword.
    pub fn right(&self) -> &str {
        &self.right
    }
}

/// Keyword-in-context listing for one lexicon entry.
///
/// Rows cover every location of the form, direct or inside a larger form
/// that contains it. The listing is built from the token index, which may
/// lag behind the texts; a location that no longer resolves is skipped
/// with a warning rather than failing the whole listing (the same degrade
/// policy the table codec applies to malformed rows).
pub struct Concordance {
    form: String,
    rows: Vec<ConcordanceRow>,
}

impl Concordance {
    pub(crate) fn build(
        txt: &TextTable,
        lexicon: &Lexicon,
        form: &str,
    ) -> CorpusResult<Self> {
        let mut rows = Vec::new();
        for loc in lexicon.all_locations(form)? {
            let Some(text) = txt.get(loc.text())? else {
                warn!(loc = %loc, "concordance location names a missing text");
                continue;
            };
            if !text.is_simple_text()? {
                warn!(loc = %loc, "concordance location names an aggregate");
                continue;
            }
            let Some(sentence) = text.sentences()?.get(loc.sent())? else {
                warn!(loc = %loc, "concordance location past the end of its text");
                continue;
            };
            let words = sentence.words();
            let offset = loc.word_offset().unwrap_or(0);
            let Some(keyword) = words.get(offset) else {
                warn!(loc = %loc, "concordance location past the end of its sentence");
                continue;
            };
            rows.push(ConcordanceRow {
                keyword: keyword.clone(),
                left: words[..offset].join(" "),
                right: words[offset + 1..].join(" "),
                loc,
            });
        }
        Ok(Self {
            form: form.to_string(),
            rows,
        })
    }

    /// The form this listing was built for.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// The rows, in location order as recorded by the index.
    pub fn rows(&self) -> &[ConcordanceRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the form has no resolvable occurrences.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        s.to_string()
    } else {
        s.chars().skip(count - n).collect()
    }
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

impl fmt::Display for Concordance {
    /// Aligned two-column rendering: right-justified left context, then
    /// the keyword and what follows it, each clipped to 40 characters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let left = tail_chars(&row.left, 40);
            let mut focus = row.keyword.clone();
            if !row.right.is_empty() {
                focus.push(' ');
                focus.push_str(&row.right);
            }
            writeln!(f, "{left:>40}  {}", head_chars(&focus, 40))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Concordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Concordance")
            .field("form", &self.form)
            .field("rows", &self.rows.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use lgc_store::{MemDisk, VirtualDisk};
    use std::sync::Arc;

    fn make_language() -> (Corpus, crate::corpus::Language) {
        let corpus = Corpus::with_disk(Arc::new(MemDisk::new()) as Arc<dyn VirtualDisk>);
        let lang = corpus.create_language("eng", "English").unwrap();
        (corpus, lang)
    }

    #[test]
    fn rows_carry_context_on_both_sides() {
        let (_corpus, lang) = make_language();
        let txt = lang.txt().unwrap();
        txt.create("t01", None, None).unwrap();
        txt.text("t01")
            .unwrap()
            .sentences()
            .unwrap()
            .append_plain("the dog barks at the moon", None)
            .unwrap();
        lang.rebuild_index().unwrap();
        lang.lexicon().unwrap().intern("barks").unwrap();

        let conc = lang.concordance("barks").unwrap();
        assert_eq!(conc.len(), 1);
        let row = &conc.rows()[0];
        assert_eq!(row.keyword(), "barks");
        assert_eq!(row.left(), "the dog");
        assert_eq!(row.right(), "at the moon");
        assert_eq!(row.loc(), &Loc::word("t01", 1, 2));
    }

    #[test]
    fn listing_spans_containing_wholes() {
        let (_corpus, lang) = make_language();
        let txt = lang.txt().unwrap();
        txt.create("t01", None, None).unwrap();
        txt.text("t01")
            .unwrap()
            .sentences()
            .unwrap()
            .append_plain("two dogs bark", None)
            .unwrap();
        lang.rebuild_index().unwrap();

        let lex = lang.lexicon().unwrap();
        lex.intern("dog").unwrap();
        lex.intern("dogs").unwrap();
        lex.set_parts("dogs", &["dog", "s"]).unwrap();

        // dog itself never occurs; the dogs occurrence shows up for it.
        let conc = lang.concordance("dog").unwrap();
        assert_eq!(conc.len(), 1);
        assert_eq!(conc.rows()[0].keyword(), "dogs");
    }

    #[test]
    fn stale_locations_are_skipped() {
        let (_corpus, lang) = make_language();
        let txt = lang.txt().unwrap();
        txt.create("t01", None, None).unwrap();
        txt.text("t01")
            .unwrap()
            .sentences()
            .unwrap()
            .append_plain("the dog", None)
            .unwrap();
        lang.rebuild_index().unwrap();
        lang.lexicon().unwrap().intern("dog").unwrap();

        // Remove the text but leave the index stale.
        txt.remove("t01").unwrap();
        let conc = lang.concordance("dog").unwrap();
        assert!(conc.is_empty());
    }

    #[test]
    fn display_aligns_the_keyword_column() {
        let (_corpus, lang) = make_language();
        let txt = lang.txt().unwrap();
        txt.create("t01", None, None).unwrap();
        txt.text("t01")
            .unwrap()
            .sentences()
            .unwrap()
            .append_plain("the dog barks", None)
            .unwrap();
        lang.rebuild_index().unwrap();
        lang.lexicon().unwrap().intern("dog").unwrap();

        let rendered = lang.concordance("dog").unwrap().to_string();
        assert_eq!(rendered, format!("{:>40}  dog barks\n", "the"));
    }

    #[test]
    fn unknown_form_is_an_error() {
        let (_corpus, lang) = make_language();
        assert!(lang.concordance("ghost").is_err());
    }
}
