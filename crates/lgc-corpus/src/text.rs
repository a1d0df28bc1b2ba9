use std::collections::HashSet;
use std::sync::Arc;

use lgc_lexicon::Loc;
use lgc_store::{ItemDisk, Record};

use crate::error::{CorpusError, CorpusResult};
use crate::sentence::{sentence_item_name, SentenceList};
use crate::toc::Toc;

/// The `ty` tag marking a text as a collection of other texts.
const TYPE_COLLECTION: &str = "collection";

/// The `ty` tag marking a text as a vocabulary list.
const TYPE_VOCAB: &str = "vocab";

/// A view over one table-of-contents entry.
///
/// A text with a `ch` field is an aggregate whose elements are its child
/// texts; a text without one is a simple text whose elements are its
/// [`SentenceList`]. Views are cheap and disposable: they hold ids and a
/// handle to the table, nothing else.
#[derive(Clone)]
pub struct Text {
    toc: Toc,
    textid: String,
}

impl Text {
    pub(crate) fn new(toc: Toc, textid: &str) -> Self {
        Self {
            toc,
            textid: textid.to_string(),
        }
    }

    /// The text id.
    pub fn textid(&self) -> &str {
        &self.textid
    }

    /// The language this text belongs to.
    pub fn langid(&self) -> &str {
        self.toc.langid()
    }

    /// The item name of this text's sentence list.
    pub fn item_name(&self) -> String {
        sentence_item_name(self.toc.langid(), &self.textid)
    }

    /// The full metadata record.
    pub fn metadata(&self) -> CorpusResult<Record> {
        self.toc.metadata(&self.textid)
    }

    /// The type tag (`ty`), if any.
    pub fn text_type(&self) -> CorpusResult<Option<String>> {
        self.toc.get_field(&self.textid, "ty")
    }

    /// The title (`ti`), if any.
    pub fn title(&self) -> CorpusResult<Option<String>> {
        self.toc.get_field(&self.textid, "ti")
    }

    /// The author (`au`), if any.
    pub fn author(&self) -> CorpusResult<Option<String>> {
        self.toc.get_field(&self.textid, "au")
    }

    /// Child text ids (empty for a simple text).
    pub fn child_ids(&self) -> CorpusResult<Vec<String>> {
        self.toc.children(&self.textid)
    }

    /// Child texts, in `ch` order.
    pub fn children(&self) -> CorpusResult<Vec<Text>> {
        let mut out = Vec::new();
        for id in self.child_ids()? {
            if !self.toc.contains(&id)? {
                return Err(CorpusError::TextNotFound(id));
            }
            out.push(Text::new(self.toc.clone(), &id));
        }
        Ok(out)
    }

    /// The parent text, or `None` if this is a root.
    pub fn parent(&self) -> CorpusResult<Option<Text>> {
        Ok(self
            .toc
            .parent(&self.textid)?
            .map(|id| Text::new(self.toc.clone(), &id)))
    }

    /// Returns `true` if this text aggregates children.
    pub fn is_aggregate(&self) -> CorpusResult<bool> {
        Ok(self.toc.get_field(&self.textid, "ch")?.is_some())
    }

    /// Returns `true` if this text's elements are sentences.
    pub fn is_simple_text(&self) -> CorpusResult<bool> {
        Ok(!self.is_aggregate()?)
    }

    /// Returns `true` if no aggregate lists this text as a child.
    pub fn is_root(&self) -> CorpusResult<bool> {
        Ok(self.toc.parent(&self.textid)?.is_none())
    }

    /// Returns `true` if the type tag is `collection`.
    pub fn is_collection(&self) -> CorpusResult<bool> {
        Ok(self.text_type()?.as_deref() == Some(TYPE_COLLECTION))
    }

    /// Anything that is not a collection is part of a document.
    pub fn is_document_part(&self) -> CorpusResult<bool> {
        Ok(!self.is_collection()?)
    }

    /// Returns `true` for the top of a document: a document part whose
    /// parent is absent or a collection.
    pub fn is_document(&self) -> CorpusResult<bool> {
        if !self.is_document_part()? {
            return Ok(false);
        }
        match self.parent()? {
            None => Ok(true),
            Some(parent) => parent.is_collection(),
        }
    }

    /// Returns `true` if the type tag is `vocab`.
    pub fn is_vocabulary(&self) -> CorpusResult<bool> {
        Ok(self.text_type()?.as_deref() == Some(TYPE_VOCAB))
    }

    /// Running text: a simple text that is not a vocabulary list.
    pub fn is_running_text(&self) -> CorpusResult<bool> {
        Ok(self.is_simple_text()? && !self.is_vocabulary()?)
    }

    /// This text's sentences. An aggregate has none.
    pub fn sentences(&self) -> CorpusResult<SentenceList> {
        if self.is_aggregate()? {
            return Err(CorpusError::NotASimpleText(self.textid.clone()));
        }
        SentenceList::open(self.toc.disk(), self.toc.langid(), &self.textid)
    }

    /// Preorder traversal of this text and its descendants.
    ///
    /// A malformed `ch` graph could revisit a text; the traversal keeps a
    /// seen-set so it terminates regardless.
    pub fn walk(&self) -> CorpusResult<Vec<Text>> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(self.textid.clone());
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(text) = stack.pop() {
            let children = text.children()?;
            out.push(text);
            for child in children.into_iter().rev() {
                if seen.insert(child.textid.clone()) {
                    stack.push(child);
                }
            }
        }
        Ok(out)
    }

    /// Render this text and its descendants as an indented tree, one
    /// `[textid] title` line per text.
    pub fn render_tree(&self) -> CorpusResult<String> {
        let mut out = String::new();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(self.textid.clone());
        let mut stack = vec![(self.clone(), 0usize)];
        while let Some((text, indent)) = stack.pop() {
            for _ in 0..indent {
                out.push(' ');
            }
            out.push('[');
            out.push_str(&text.textid);
            out.push_str("] ");
            out.push_str(text.title()?.as_deref().unwrap_or("(no title)"));
            out.push('\n');
            for child in text.children()?.into_iter().rev() {
                if seen.insert(child.textid.clone()) {
                    stack.push((child, indent + 2));
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("langid", &self.toc.langid())
            .field("textid", &self.textid)
            .finish()
    }
}

/// The texts of one language, projected over its [`Toc`].
///
/// Not itself a persisted item: it materializes [`Text`] views from the
/// table of contents.
#[derive(Clone, Debug)]
pub struct TextTable {
    toc: Toc,
}

impl TextTable {
    pub(crate) fn open(disk: &Arc<ItemDisk>, langid: &str) -> CorpusResult<Self> {
        Ok(Self {
            toc: Toc::open(disk, langid)?,
        })
    }

    /// The backing table of contents.
    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    /// The text with `textid`, or `None` if absent.
    pub fn get(&self, textid: &str) -> CorpusResult<Option<Text>> {
        if self.toc.contains(textid)? {
            Ok(Some(Text::new(self.toc.clone(), textid)))
        } else {
            Ok(None)
        }
    }

    /// The text with `textid`; an absent id is an error.
    pub fn text(&self, textid: &str) -> CorpusResult<Text> {
        self.get(textid)?
            .ok_or_else(|| CorpusError::TextNotFound(textid.to_string()))
    }

    /// All texts, in id order.
    pub fn texts(&self) -> CorpusResult<Vec<Text>> {
        Ok(self
            .toc
            .ids()?
            .into_iter()
            .map(|id| Text::new(self.toc.clone(), &id))
            .collect())
    }

    /// Add a text with the given type and title.
    pub fn create(
        &self,
        textid: &str,
        text_type: Option<&str>,
        title: Option<&str>,
    ) -> CorpusResult<Text> {
        let mut record = Record::new();
        if let Some(ty) = text_type {
            record.set("ty", ty);
        }
        if let Some(ti) = title {
            record.set("ti", ti);
        }
        self.toc.insert(textid, record)?;
        Ok(Text::new(self.toc.clone(), textid))
    }

    /// Delete a text and its sentence item.
    pub fn remove(&self, textid: &str) -> CorpusResult<()> {
        self.toc.remove(textid)
    }

    fn filtered(
        &self,
        keep: impl Fn(&Text) -> CorpusResult<bool>,
    ) -> CorpusResult<Vec<Text>> {
        let mut out = Vec::new();
        for text in self.texts()? {
            if keep(&text)? {
                out.push(text);
            }
        }
        Ok(out)
    }

    /// Texts no aggregate claims as a child.
    pub fn roots(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_root)
    }

    /// Texts typed `collection`.
    pub fn collections(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_collection)
    }

    /// Document tops (see [`Text::is_document`]).
    pub fn documents(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_document)
    }

    /// Texts whose elements are sentences.
    pub fn simple_texts(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_simple_text)
    }

    /// Texts typed `vocab`.
    pub fn vocabularies(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_vocabulary)
    }

    /// Simple texts that are not vocabulary lists.
    pub fn running_texts(&self) -> CorpusResult<Vec<Text>> {
        self.filtered(Text::is_running_text)
    }

    /// Render the whole hierarchy, one tree per root text.
    pub fn render_tree(&self) -> CorpusResult<String> {
        let mut out = String::new();
        for root in self.roots()? {
            out.push_str(&root.render_tree()?);
        }
        Ok(out)
    }

    /// Enumerate every token of every running text as `(location, word)`.
    ///
    /// This is the feed for regenerating the per-language token index.
    pub fn tokens(&self) -> CorpusResult<Vec<(Loc, String)>> {
        let mut out = Vec::new();
        for text in self.running_texts()? {
            let sentences = text.sentences()?.sentences()?;
            for sentence in &sentences {
                for (offset, word) in sentence.words().iter().enumerate() {
                    out.push((
                        Loc::word(text.textid(), sentence.sno(), offset),
                        word.clone(),
                    ));
                }
            }
        }
        Ok(out)
    }
}
