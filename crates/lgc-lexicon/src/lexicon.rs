use std::collections::BTreeMap;
use std::sync::Arc;

use lgc_store::{Format, Hold, Item, ItemDisk, Record};

use crate::backlinks::LexiconBacklinks;
use crate::error::{LexiconError, LexiconResult};
use crate::freq;
use crate::index::TokenIndex;
use crate::loc::Loc;

/// Validate a lexical form: non-empty, no whitespace.
///
/// Forms key the lexicon table and appear inside space-separated `pp`
/// lists, so embedded whitespace would corrupt both.
pub fn validate_form(form: &str) -> LexiconResult<()> {
    if form.is_empty() || form.chars().any(char::is_whitespace) {
        return Err(LexiconError::InvalidForm(form.to_string()));
    }
    Ok(())
}

/// The word-form store for one language.
///
/// A form-keyed table item at `/<langid>/lexicon`. Entry records carry a
/// gloss (`g`), constituent forms for compounds (`pp`), and a canonical
/// form for variant spellings (`cf`). [`intern`] is the only creation
/// path: there is no separate "new" versus "get".
///
/// [`intern`]: Lexicon::intern
#[derive(Clone)]
pub struct Lexicon {
    disk: Arc<ItemDisk>,
    langid: String,
    item: Arc<Item>,
}

impl Lexicon {
    /// Open the lexicon for `langid`.
    pub fn open(disk: &Arc<ItemDisk>, langid: &str) -> LexiconResult<Self> {
        let item = disk.intern(&format!("/{langid}/lexicon"), Format::Table)?;
        Ok(Self {
            disk: Arc::clone(disk),
            langid: langid.to_string(),
            item,
        })
    }

    /// The language this lexicon belongs to.
    pub fn langid(&self) -> &str {
        &self.langid
    }

    /// The item name this lexicon is persisted under.
    pub fn item_name(&self) -> &str {
        self.item.name()
    }

    /// Number of entries.
    pub fn len(&self) -> LexiconResult<usize> {
        Ok(self.item.with_table(|t| t.len())?)
    }

    /// Returns `true` if the lexicon has no entries.
    pub fn is_empty(&self) -> LexiconResult<bool> {
        Ok(self.item.with_table(|t| t.is_empty())?)
    }

    /// Returns `true` if an entry for `form` exists.
    pub fn contains(&self, form: &str) -> LexiconResult<bool> {
        Ok(self.item.with_table(|t| t.contains(form))?)
    }

    /// All forms, in sorted order.
    pub fn forms(&self) -> LexiconResult<Vec<String>> {
        Ok(self
            .item
            .with_table(|t| t.ids().map(str::to_string).collect())?)
    }

    /// The entry for `form`, or `None` if absent.
    pub fn get(&self, form: &str) -> LexiconResult<Option<Lexent>> {
        if self.contains(form)? {
            Ok(Some(Lexent {
                lexicon: self.clone(),
                form: form.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    /// The entry for `form`; an absent form is an error.
    pub fn entry(&self, form: &str) -> LexiconResult<Lexent> {
        self.get(form)?
            .ok_or_else(|| LexiconError::FormNotFound(form.to_string()))
    }

    /// Return the entry for `form`, creating an empty one if absent.
    ///
    /// This is the only creation path. Creating marks the lexicon
    /// modified; a plain lookup does not.
    pub fn intern(&self, form: &str) -> LexiconResult<Lexent> {
        validate_form(form)?;
        if !self.contains(form)? {
            self.item.with_table_mut(|t| t.insert(form, Record::new()))?;
        }
        Ok(Lexent {
            lexicon: self.clone(),
            form: form.to_string(),
        })
    }

    /// Set the gloss of an existing entry.
    pub fn set_gloss(&self, form: &str, gloss: &str) -> LexiconResult<()> {
        self.set_field(form, "g", gloss)
    }

    /// Set the constituent forms of an existing entry.
    pub fn set_parts(&self, form: &str, parts: &[&str]) -> LexiconResult<()> {
        for part in parts {
            validate_form(part)?;
        }
        self.set_field(form, "pp", &parts.join(" "))
    }

    /// Set the canonical form of an existing (variant) entry.
    pub fn set_canonical(&self, form: &str, canonical: &str) -> LexiconResult<()> {
        validate_form(canonical)?;
        self.set_field(form, "cf", canonical)
    }

    fn set_field(&self, form: &str, tag: &str, value: &str) -> LexiconResult<()> {
        if !self.contains(form)? {
            return Err(LexiconError::FormNotFound(form.to_string()));
        }
        self.item.with_table_mut(|t| {
            // Presence was just checked; the row is still there.
            if let Some(row) = t.get_mut(form) {
                row.set(tag, value);
            }
        })?;
        Ok(())
    }

    /// One field of an existing entry.
    pub(crate) fn field(&self, form: &str, tag: &str) -> LexiconResult<Option<String>> {
        let value = self.item.with_table(|t| {
            t.get(form)
                .map(|row| row.get(tag).map(str::to_string))
        })?;
        value.ok_or_else(|| LexiconError::FormNotFound(form.to_string()))
    }

    /// The inverted part → whole and canonical → variant indices,
    /// memoized on the lexicon item until the next mutation.
    pub fn backlinks(&self) -> LexiconResult<Arc<LexiconBacklinks>> {
        self.item
            .cached_backlinks(|| LexiconBacklinks::build(&self.item).map_err(LexiconError::from))
    }

    /// Forms listing `form` among their constituents.
    pub fn part_of(&self, form: &str) -> LexiconResult<Vec<String>> {
        Ok(self.backlinks()?.wholes(form).to_vec())
    }

    /// Variant spellings whose canonical form is `form`.
    pub fn variants(&self, form: &str) -> LexiconResult<Vec<String>> {
        Ok(self.backlinks()?.variant_forms(form).to_vec())
    }

    /// Transitive usage frequency of `form` (see [`crate::freq`]).
    pub fn frequency(&self, form: &str) -> LexiconResult<u64> {
        freq::frequency_of(self, form)
    }

    /// Transitive usage frequency of every form, in one traversal.
    pub fn frequencies(&self) -> LexiconResult<BTreeMap<String, u64>> {
        freq::all_frequencies(self)
    }

    /// Every location where `form` occurs, directly or inside a larger
    /// form that contains it.
    pub fn all_locations(&self, form: &str) -> LexiconResult<Vec<Loc>> {
        freq::all_locations_of(self, form)
    }

    /// The token index supplying this lexicon's direct occurrence counts.
    pub fn token_index(&self) -> LexiconResult<TokenIndex> {
        TokenIndex::open(&self.disk, &self.langid)
    }

    /// Open a transaction scope on the owning disk.
    pub fn hold(&self) -> Hold {
        self.disk.hold()
    }
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("langid", &self.langid)
            .finish()
    }
}

/// One lexicon entry: a cheap, disposable view over a table record.
#[derive(Clone)]
pub struct Lexent {
    lexicon: Lexicon,
    form: String,
}

impl Lexent {
    /// The word form.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// The gloss, if one is recorded.
    pub fn gloss(&self) -> LexiconResult<Option<String>> {
        self.lexicon.field(&self.form, "g")
    }

    /// Constituent forms, as recorded in the `pp` field.
    pub fn part_forms(&self) -> LexiconResult<Vec<String>> {
        Ok(self
            .lexicon
            .field(&self.form, "pp")?
            .map(|pp| pp.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Constituent entries.
    ///
    /// Constituents that have no entry yet are interned, under a held
    /// transaction so all resulting mutations batch into one flush.
    pub fn parts(&self) -> LexiconResult<Vec<Lexent>> {
        let forms = self.part_forms()?;
        let hold = self.lexicon.hold();
        let mut parts = Vec::with_capacity(forms.len());
        for form in &forms {
            parts.push(self.lexicon.intern(form)?);
        }
        hold.commit()?;
        Ok(parts)
    }

    /// The canonical form, if this entry is a variant spelling.
    pub fn canonical(&self) -> LexiconResult<Option<String>> {
        self.lexicon.field(&self.form, "cf")
    }

    /// Forms listing this form among their constituents.
    pub fn part_of(&self) -> LexiconResult<Vec<String>> {
        self.lexicon.part_of(&self.form)
    }

    /// Variant spellings whose canonical form is this form.
    pub fn variants(&self) -> LexiconResult<Vec<String>> {
        self.lexicon.variants(&self.form)
    }

    /// Direct occurrence locations.
    pub fn locations(&self) -> LexiconResult<Vec<Loc>> {
        self.lexicon.token_index()?.locations(&self.form)
    }

    /// Every location, direct or via a containing whole.
    pub fn all_locations(&self) -> LexiconResult<Vec<Loc>> {
        self.lexicon.all_locations(&self.form)
    }

    /// Transitive usage frequency.
    pub fn frequency(&self) -> LexiconResult<u64> {
        self.lexicon.frequency(&self.form)
    }
}

impl std::fmt::Debug for Lexent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexent").field("form", &self.form).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgc_store::{MemDisk, VirtualDisk};

    fn make_lexicon() -> (Arc<MemDisk>, Arc<ItemDisk>, Lexicon) {
        let mem = Arc::new(MemDisk::new());
        let disk = ItemDisk::open(Arc::clone(&mem) as Arc<dyn VirtualDisk>);
        let lexicon = Lexicon::open(&disk, "deu").unwrap();
        (mem, disk, lexicon)
    }

    // -----------------------------------------------------------------------
    // Intern / lookup
    // -----------------------------------------------------------------------

    #[test]
    fn intern_creates_once() {
        let (_, _disk, lex) = make_lexicon();
        lex.intern("hund").unwrap();
        lex.intern("hund").unwrap();
        assert_eq!(lex.len().unwrap(), 1);
        assert!(lex.contains("hund").unwrap());
    }

    #[test]
    fn intern_rejects_invalid_forms() {
        let (_, _disk, lex) = make_lexicon();
        assert!(matches!(
            lex.intern(""),
            Err(LexiconError::InvalidForm(_))
        ));
        assert!(matches!(
            lex.intern("two words"),
            Err(LexiconError::InvalidForm(_))
        ));
    }

    #[test]
    fn get_does_not_create() {
        let (_, _disk, lex) = make_lexicon();
        assert!(lex.get("hund").unwrap().is_none());
        assert_eq!(lex.len().unwrap(), 0);
    }

    #[test]
    fn entry_for_missing_form_fails() {
        let (_, _disk, lex) = make_lexicon();
        assert!(matches!(
            lex.entry("hund"),
            Err(LexiconError::FormNotFound(_))
        ));
    }

    #[test]
    fn intern_persists_the_entry() {
        let (mem, _disk, lex) = make_lexicon();
        lex.intern("hund").unwrap();
        let stored = String::from_utf8(mem.read("/deu/lexicon").unwrap().unwrap()).unwrap();
        assert!(stored.contains("id hund"));
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    #[test]
    fn gloss_roundtrip() {
        let (_, _disk, lex) = make_lexicon();
        lex.intern("hund").unwrap();
        lex.set_gloss("hund", "dog").unwrap();
        assert_eq!(lex.entry("hund").unwrap().gloss().unwrap().unwrap(), "dog");
    }

    #[test]
    fn set_gloss_on_missing_form_fails() {
        let (_, _disk, lex) = make_lexicon();
        assert!(matches!(
            lex.set_gloss("hund", "dog"),
            Err(LexiconError::FormNotFound(_))
        ));
    }

    #[test]
    fn parts_are_recorded_space_separated() {
        let (mem, _disk, lex) = make_lexicon();
        lex.intern("hunde").unwrap();
        lex.set_parts("hunde", &["hund", "e"]).unwrap();
        let stored = String::from_utf8(mem.read("/deu/lexicon").unwrap().unwrap()).unwrap();
        assert!(stored.contains("pp hund e"));
    }

    // -----------------------------------------------------------------------
    // parts() interning
    // -----------------------------------------------------------------------

    #[test]
    fn parts_interns_missing_constituents() {
        let (_, _disk, lex) = make_lexicon();
        lex.intern("hunde").unwrap();
        lex.set_parts("hunde", &["hund", "e"]).unwrap();

        let parts = lex.entry("hunde").unwrap().parts().unwrap();
        let forms: Vec<&str> = parts.iter().map(Lexent::form).collect();
        assert_eq!(forms, vec!["hund", "e"]);
        // The constituents now exist as entries of their own.
        assert!(lex.contains("hund").unwrap());
        assert!(lex.contains("e").unwrap());
    }

    #[test]
    fn parts_batch_under_one_hold() {
        let (mem, disk, lex) = make_lexicon();
        lex.intern("hunde").unwrap();
        lex.set_parts("hunde", &["hund", "e"]).unwrap();

        // Wrap in an outer hold: nothing may hit storage until it commits.
        let before = mem.read("/deu/lexicon").unwrap().unwrap();
        let outer = disk.hold();
        lex.entry("hunde").unwrap().parts().unwrap();
        assert_eq!(mem.read("/deu/lexicon").unwrap().unwrap(), before);
        outer.commit().unwrap();
        let after = String::from_utf8(mem.read("/deu/lexicon").unwrap().unwrap()).unwrap();
        assert!(after.contains("id hund"));
    }

    #[test]
    fn parts_of_a_simplex_entry_are_empty() {
        let (_, _disk, lex) = make_lexicon();
        lex.intern("hund").unwrap();
        assert!(lex.entry("hund").unwrap().parts().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Backlink queries
    // -----------------------------------------------------------------------

    #[test]
    fn part_of_accumulates_all_wholes() {
        let (_, _disk, lex) = make_lexicon();
        for form in ["hunde", "hundehaus"] {
            lex.intern(form).unwrap();
        }
        lex.set_parts("hunde", &["hund", "e"]).unwrap();
        lex.set_parts("hundehaus", &["hund", "haus"]).unwrap();

        let wholes = lex.part_of("hund").unwrap();
        assert_eq!(wholes, vec!["hunde".to_string(), "hundehaus".to_string()]);
    }

    #[test]
    fn variants_invert_canonical_references() {
        let (_, _disk, lex) = make_lexicon();
        for form in ["colour", "color"] {
            lex.intern(form).unwrap();
        }
        lex.set_canonical("colour", "color").unwrap();

        assert_eq!(lex.variants("color").unwrap(), vec!["colour".to_string()]);
        assert_eq!(
            lex.entry("colour").unwrap().canonical().unwrap().unwrap(),
            "color"
        );
    }

    #[test]
    fn backlinks_reflect_structural_changes() {
        let (_, _disk, lex) = make_lexicon();
        lex.intern("hunde").unwrap();
        lex.set_parts("hunde", &["hund", "e"]).unwrap();
        assert_eq!(lex.part_of("hund").unwrap().len(), 1);

        // Rewriting pp must invalidate the cached inversion.
        lex.set_parts("hunde", &["hund"]).unwrap();
        assert!(lex.part_of("e").unwrap().is_empty());
        assert_eq!(lex.part_of("hund").unwrap().len(), 1);
    }
}
