//! The contract of the multilingual lexical knowledge base which senses are looked up in.
//!
//! A knowledge base answers [SenseQuery]s with [SenseId]s and resolves ids to full [Sense]s.
//! Two implementations are provided: the in-process [MemoryKnowledgeBase][memory::MemoryKnowledgeBase]
//! and, behind the `remote` feature, the [HttpKnowledgeBase][remote::HttpKnowledgeBase] talking to the BabelNet HTTP API.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, str::FromStr, sync::Arc};
use thiserror::Error;

use crate::utils;

pub mod memory;
#[cfg(feature = "remote")]
pub mod remote;

pub use memory::MemoryKnowledgeBase;
#[cfg(feature = "remote")]
pub use remote::{HttpKnowledgeBase, HttpOptions};

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error("unknown language code '{0}'. Expected an ISO-639-1 code e.g. 'en'.")]
    UnknownLanguage(String),
    #[error("unknown sense source '{name}'. Known sources: {known:?}")]
    UnknownSenseSource { name: String, known: Vec<String> },
    #[error("unknown part-of-speech label '{0}'")]
    UnknownPos(String),
    #[error("no sense with id '{0}' exists in the knowledge base")]
    UnknownSense(SenseId),
    #[error("knowledge base unavailable: {0}")]
    Unavailable(String),
    #[cfg(feature = "remote")]
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// A language the knowledge base knows about, identified by its uppercase ISO-639-1 code e.g. `EN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Resolves a language from its ISO-639-1 code. Case-insensitive.
    /// # Errors
    /// - If the code is not a known ISO-639-1 code.
    pub fn from_iso(code: &str) -> Result<Self, Error> {
        let lower = code.trim().to_lowercase();

        if utils::languages().contains(lower.as_str()) {
            Ok(Language(lower.to_uppercase()))
        } else {
            Err(Error::UnknownLanguage(code.to_owned()))
        }
    }

    /// The uppercase code e.g. `"EN"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lowercase ISO-639-1 code e.g. `"en"`.
    pub fn iso(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::convert::TryFrom<String> for Language {
    type Error = Error;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Language::from_iso(&code)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.0
    }
}

/// The part-of-speech enumeration of the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensePos {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl SensePos {
    pub fn iter() -> impl Iterator<Item = SensePos> {
        [
            SensePos::Noun,
            SensePos::Verb,
            SensePos::Adjective,
            SensePos::Adverb,
        ]
        .iter()
        .copied()
    }

    /// The label used in cache files e.g. `"ADJECTIVE"`.
    pub fn label(&self) -> &'static str {
        match self {
            SensePos::Noun => "NOUN",
            SensePos::Verb => "VERB",
            SensePos::Adjective => "ADJECTIVE",
            SensePos::Adverb => "ADVERB",
        }
    }

    /// The short tag used by the BabelNet HTTP API e.g. `"ADJ"`.
    pub fn tag(&self) -> &'static str {
        match self {
            SensePos::Noun => "NOUN",
            SensePos::Verb => "VERB",
            SensePos::Adjective => "ADJ",
            SensePos::Adverb => "ADV",
        }
    }
}

impl fmt::Display for SensePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SensePos {
    type Err = Error;

    /// Parses both labels (`"ADJECTIVE"`) and short tags (`"ADJ"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensePos::iter()
            .find(|pos| pos.label() == s || pos.tag() == s)
            .ok_or_else(|| Error::UnknownPos(s.to_owned()))
    }
}

/// A named resource within the knowledge base which sense data was derived from e.g. `WN` for WordNet.
/// Obtained by [KnowledgeBase::sense_source].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenseSource(String);

impl SenseSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque handle to a sense in the knowledge base e.g. `bn:00046516n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenseId(String);

impl SenseId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        SenseId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SenseId {
    fn from(id: &str) -> Self {
        SenseId::new(id)
    }
}

impl From<String> for SenseId {
    fn from(id: String) -> Self {
        SenseId(id)
    }
}

impl Borrow<str> for SenseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One meaning of a word: an id and the lemma forms per language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    id: SenseId,
    pos: SensePos,
    #[serde(default)]
    sources: Vec<SenseSource>,
    lemmas: IndexMap<Language, Vec<String>>,
}

impl Sense {
    pub fn new(id: SenseId, pos: SensePos) -> Self {
        Sense {
            id,
            pos,
            sources: Vec::new(),
            lemmas: IndexMap::new(),
        }
    }

    /// Adds a lemma in the given language. Duplicates are ignored.
    pub fn with_lemma<S: Into<String>>(mut self, language: Language, lemma: S) -> Self {
        let lemma = lemma.into();
        let lemmas = self.lemmas.entry(language).or_insert_with(Vec::new);
        if !lemmas.contains(&lemma) {
            lemmas.push(lemma);
        }
        self
    }

    pub fn with_source(mut self, source: SenseSource) -> Self {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
        self
    }

    pub fn id(&self) -> &SenseId {
        &self.id
    }

    pub fn pos(&self) -> SensePos {
        self.pos
    }

    /// The sources this sense was derived from.
    pub fn sources(&self) -> &[SenseSource] {
        &self.sources
    }

    /// The lemma forms of this sense in `language`. Empty if there are none.
    pub fn lemmas(&self, language: &Language) -> &[String] {
        self.lemmas
            .get(language)
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }

    /// All languages this sense has lemmas in.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.lemmas.keys()
    }
}

/// A request to the knowledge base: all senses of `word` in `language`, optionally restricted
/// by part-of-speech and sense source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SenseQuery {
    word: String,
    language: Language,
    pos: Option<SensePos>,
    source: Option<SenseSource>,
}

impl SenseQuery {
    pub fn new<S: Into<String>>(word: S, language: Language) -> Self {
        SenseQuery {
            word: word.into(),
            language,
            pos: None,
            source: None,
        }
    }

    pub fn pos(mut self, pos: SensePos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn source(mut self, source: SenseSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn part_of_speech(&self) -> Option<SensePos> {
        self.pos
    }

    pub fn sense_source(&self) -> Option<&SenseSource> {
        self.source.as_ref()
    }
}

/// A lexical knowledge base.
pub trait KnowledgeBase {
    /// Ids of all senses matching the query, in the order the knowledge base ranks them.
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error>;

    /// Resolves an id to the full sense.
    fn resolve(&self, id: &SenseId) -> Result<Sense, Error>;

    /// Resolves the name of a sense source. Case-insensitive.
    /// # Errors
    /// - If the knowledge base does not recognize the name.
    fn sense_source(&self, name: &str) -> Result<SenseSource, Error> {
        let upper = name.trim().to_uppercase();

        if utils::sense_sources().contains(upper.as_str()) {
            Ok(SenseSource(upper))
        } else {
            Err(Error::UnknownSenseSource {
                name: name.to_owned(),
                known: utils::sense_sources().iter().cloned().collect(),
            })
        }
    }
}

impl<'a, T> KnowledgeBase for &'a T
where
    T: KnowledgeBase + ?Sized,
{
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error> {
        (*self).query(query)
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, Error> {
        (*self).resolve(id)
    }

    fn sense_source(&self, name: &str) -> Result<SenseSource, Error> {
        (*self).sense_source(name)
    }
}

impl<T> KnowledgeBase for Arc<T>
where
    T: KnowledgeBase + ?Sized,
{
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error> {
        (**self).query(query)
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, Error> {
        (**self).resolve(id)
    }

    fn sense_source(&self, name: &str) -> Result<SenseSource, Error> {
        (**self).sense_source(name)
    }
}

impl<T> KnowledgeBase for Box<T>
where
    T: KnowledgeBase + ?Sized,
{
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error> {
        (**self).query(query)
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, Error> {
        (**self).resolve(id)
    }

    fn sense_source(&self, name: &str) -> Result<SenseSource, Error> {
        (**self).sense_source(name)
    }
}
