use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use lgc_lexicon::{Lexicon, TokenIndex};
use lgc_store::{DirDisk, DiskConfig, Format, Hold, Item, ItemDisk, Record, VirtualDisk};
use tracing::debug;

use crate::concordance::Concordance;
use crate::error::{CorpusError, CorpusResult};
use crate::names::validate_lang_id;
use crate::sentence::{sentence_item_name, Sentence};
use crate::text::{Text, TextTable};
use crate::toc::Toc;

/// The item name of the language table.
const LANGS_ITEM: &str = "/langs";

/// Root handle over one corpus.
///
/// A corpus is a directory (or any [`VirtualDisk`]) holding one item disk;
/// everything else hangs off the language table at `/langs`.
#[derive(Clone)]
pub struct Corpus {
    disk: Arc<ItemDisk>,
}

impl Corpus {
    /// Open a corpus stored in a directory, creating it if missing.
    pub fn open(root: impl AsRef<Path>) -> CorpusResult<Self> {
        Self::open_with(root, DiskConfig::default())
    }

    /// Open a directory-backed corpus with explicit configuration.
    pub fn open_with(root: impl AsRef<Path>, config: DiskConfig) -> CorpusResult<Self> {
        let vdisk = DirDisk::open_with(root, config)?;
        Ok(Self::with_disk(Arc::new(vdisk)))
    }

    /// Open a corpus over an arbitrary storage backend.
    pub fn with_disk(vdisk: Arc<dyn VirtualDisk>) -> Self {
        Self {
            disk: ItemDisk::open(vdisk),
        }
    }

    /// The underlying item disk.
    pub fn disk(&self) -> &Arc<ItemDisk> {
        &self.disk
    }

    /// Open a transaction scope: mutations made before the outermost
    /// commit flush together, or not at all.
    pub fn hold(&self) -> Hold {
        self.disk.hold()
    }

    /// The language table.
    pub fn langs(&self) -> CorpusResult<LanguageTable> {
        LanguageTable::open(&self.disk)
    }

    /// All language ids, in sorted order.
    pub fn language_ids(&self) -> CorpusResult<Vec<String>> {
        self.langs()?.ids()
    }

    /// The language with `langid`; an absent id is an error.
    pub fn language(&self, langid: &str) -> CorpusResult<Language> {
        self.langs()?
            .get(langid)?
            .ok_or_else(|| CorpusError::LanguageNotFound(langid.to_string()))
    }

    /// Add a language. A duplicate id is an error.
    pub fn create_language(&self, langid: &str, full_name: &str) -> CorpusResult<Language> {
        self.langs()?.insert(langid, full_name)
    }

    /// Delete a language and its whole subtree (lexicon, toc, index, and
    /// every text's sentence list).
    pub fn remove_language(&self, langid: &str) -> CorpusResult<()> {
        self.langs()?.remove(langid)
    }
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus").finish_non_exhaustive()
    }
}

/// The language table: langid → properties, persisted at `/langs`.
#[derive(Clone)]
pub struct LanguageTable {
    disk: Arc<ItemDisk>,
    item: Arc<Item>,
}

impl LanguageTable {
    fn open(disk: &Arc<ItemDisk>) -> CorpusResult<Self> {
        let item = disk.intern(LANGS_ITEM, Format::Table)?;
        Ok(Self {
            disk: Arc::clone(disk),
            item,
        })
    }

    /// Number of languages.
    pub fn len(&self) -> CorpusResult<usize> {
        Ok(self.item.with_table(|t| t.len())?)
    }

    /// Returns `true` if the corpus has no languages.
    pub fn is_empty(&self) -> CorpusResult<bool> {
        Ok(self.item.with_table(|t| t.is_empty())?)
    }

    /// All language ids, in sorted order.
    pub fn ids(&self) -> CorpusResult<Vec<String>> {
        Ok(self
            .item
            .with_table(|t| t.ids().map(str::to_string).collect())?)
    }

    /// Returns `true` if a language with `langid` exists.
    pub fn contains(&self, langid: &str) -> CorpusResult<bool> {
        Ok(self.item.with_table(|t| t.contains(langid))?)
    }

    /// The language with `langid`, or `None` if absent.
    pub fn get(&self, langid: &str) -> CorpusResult<Option<Language>> {
        if self.contains(langid)? {
            Ok(Some(Language {
                disk: Arc::clone(&self.disk),
                langs_item: Arc::clone(&self.item),
                langid: langid.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    /// Add a language. A duplicate id is an error.
    pub fn insert(&self, langid: &str, full_name: &str) -> CorpusResult<Language> {
        validate_lang_id(langid)?;
        if self.contains(langid)? {
            return Err(CorpusError::DuplicateLanguage(langid.to_string()));
        }
        self.item.with_table_mut(|t| {
            let mut record = Record::new();
            record.set("name", full_name);
            t.insert(langid, record);
        })?;
        Ok(Language {
            disk: Arc::clone(&self.disk),
            langs_item: Arc::clone(&self.item),
            langid: langid.to_string(),
        })
    }

    /// Delete a language, cascading over its whole subtree.
    ///
    /// The toc is loaded first so every text's sentence item can be
    /// deleted from storage; `rmtree` only covers items that are live in
    /// the registry. A failing backing delete propagates before the table
    /// entry is dropped, so the language never half-disappears.
    pub fn remove(&self, langid: &str) -> CorpusResult<()> {
        if !self.contains(langid)? {
            return Err(CorpusError::LanguageNotFound(langid.to_string()));
        }
        let toc = Toc::open(&self.disk, langid)?;
        for textid in toc.ids()? {
            self.disk.remove(&sentence_item_name(langid, &textid))?;
        }
        for part in ["lexicon", "toc", "index"] {
            self.disk.remove(&format!("/{langid}/{part}"))?;
        }
        self.disk.rmtree(&format!("/{langid}"))?;
        self.item.with_table_mut(|t| {
            t.remove(langid);
        })?;
        debug!(langid = %langid, "removed language subtree");
        Ok(())
    }
}

impl std::fmt::Debug for LanguageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageTable").finish_non_exhaustive()
    }
}

/// A view over one language-table record.
#[derive(Clone)]
pub struct Language {
    disk: Arc<ItemDisk>,
    langs_item: Arc<Item>,
    langid: String,
}

impl Language {
    /// The language id.
    pub fn langid(&self) -> &str {
        &self.langid
    }

    /// The item-name prefix of this language's subtree.
    pub fn item_name(&self) -> String {
        format!("/{}", self.langid)
    }

    /// The full properties record from the language table.
    pub fn metadata(&self) -> CorpusResult<Record> {
        self.langs_item
            .with_table(|t| t.get(&self.langid).cloned())?
            .ok_or_else(|| CorpusError::LanguageNotFound(self.langid.clone()))
    }

    /// The human-readable language name, if recorded.
    pub fn full_name(&self) -> CorpusResult<Option<String>> {
        Ok(self.langs_item.with_table(|t| {
            t.get(&self.langid)
                .and_then(|rec| rec.get("name"))
                .map(str::to_string)
        })?)
    }

    /// Rename the language and mark the table modified.
    pub fn set_full_name(&self, full_name: &str) -> CorpusResult<()> {
        self.langs_item.with_table_mut(|t| {
            if let Some(record) = t.get_mut(&self.langid) {
                record.set("name", full_name);
            }
        })?;
        Ok(())
    }

    /// The table of contents.
    pub fn toc(&self) -> CorpusResult<Toc> {
        Toc::open(&self.disk, &self.langid)
    }

    /// The texts, projected over the toc.
    pub fn txt(&self) -> CorpusResult<TextTable> {
        TextTable::open(&self.disk, &self.langid)
    }

    /// The lexicon.
    pub fn lexicon(&self) -> CorpusResult<Lexicon> {
        Ok(Lexicon::open(&self.disk, &self.langid)?)
    }

    /// The token index feeding lexicon frequencies.
    pub fn token_index(&self) -> CorpusResult<TokenIndex> {
        Ok(TokenIndex::open(&self.disk, &self.langid)?)
    }

    /// Texts no aggregate claims as a child.
    pub fn roots(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.roots()
    }

    /// Texts typed `collection`.
    pub fn collections(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.collections()
    }

    /// Document tops.
    pub fn documents(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.documents()
    }

    /// Texts whose elements are sentences.
    pub fn simple_texts(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.simple_texts()
    }

    /// Texts typed `vocab`.
    pub fn vocabularies(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.vocabularies()
    }

    /// Simple texts that are not vocabulary lists.
    pub fn running_texts(&self) -> CorpusResult<Vec<Text>> {
        self.txt()?.running_texts()
    }

    /// Every sentence of every running text.
    pub fn sentences(&self) -> CorpusResult<Vec<Sentence>> {
        let mut out = Vec::new();
        for text in self.running_texts()? {
            out.extend(text.sentences()?.sentences()?);
        }
        Ok(out)
    }

    /// Every word token of every running text.
    pub fn words(&self) -> CorpusResult<Vec<String>> {
        let mut out = Vec::new();
        for sentence in self.sentences()? {
            out.extend(sentence.words().iter().cloned());
        }
        Ok(out)
    }

    /// Intern every word of every running text into the lexicon.
    ///
    /// The sweep runs under one hold so the lexicon flushes once however
    /// many forms are new. Returns the number of entries created.
    pub fn intern_words(&self) -> CorpusResult<usize> {
        let lexicon = self.lexicon()?;
        let hold = self.disk.hold();
        let mut created = 0;
        for word in self.words()? {
            if !lexicon.contains(&word)? {
                lexicon.intern(&word)?;
                created += 1;
            }
        }
        hold.commit()?;
        debug!(langid = %self.langid, created, "interned text words");
        Ok(created)
    }

    /// Keyword-in-context listing for one lexicon entry (see
    /// [`Concordance`]). An absent form is an error.
    pub fn concordance(&self, form: &str) -> CorpusResult<Concordance> {
        Concordance::build(&self.txt()?, &self.lexicon()?, form)
    }

    /// Render the text hierarchy, one root per tree.
    pub fn render_tree(&self) -> CorpusResult<String> {
        self.txt()?.render_tree()
    }

    /// Regenerate the token index from the current texts.
    ///
    /// Replaces the index wholesale, so deleted or edited texts drop
    /// their stale locations.
    pub fn rebuild_index(&self) -> CorpusResult<()> {
        let mut per_form: BTreeMap<String, Vec<lgc_lexicon::Loc>> = BTreeMap::new();
        for (loc, word) in self.txt()?.tokens()? {
            per_form.entry(word).or_default().push(loc);
        }
        self.token_index()?.replace_all(&per_form)?;
        debug!(langid = %self.langid, forms = per_form.len(), "rebuilt token index");
        Ok(())
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("langid", &self.langid)
            .finish()
    }
}
