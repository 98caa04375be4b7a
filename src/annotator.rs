//! The pipeline step attaching word senses to tokens.
//!
//! ```
//! use babelnet_annotator::{
//!     annotator::{Annotation, AnnotatorOptions, SenseAnnotator, FIELD},
//!     kb::{Language, MemoryKnowledgeBase, Sense, SensePos},
//!     properties::{Pipeline, Property},
//!     types::{Doc, Token, UPos},
//! };
//!
//! let en = Language::from_iso("en")?;
//! let kb: MemoryKnowledgeBase = vec![
//!     Sense::new("bn:00083184v".into(), SensePos::Verb).with_lemma(en.clone(), "run"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut pipeline = Pipeline::new("en", &[Property::Lemma, Property::Pos])?;
//! let annotator = SenseAnnotator::for_pipeline(kb, &AnnotatorOptions::default(), &pipeline)?;
//! pipeline.add_pipe(annotator)?;
//!
//! let doc: Doc = vec![Token::tagged("running", "run", UPos::Verb)].into_iter().collect();
//! let doc = pipeline.process(doc)?;
//!
//! let annotation = doc[0].extension::<Annotation>(FIELD).expect("every token is annotated");
//! assert_eq!(annotation.ids()[0].as_str(), "bn:00083184v");
//! # Ok::<(), babelnet_annotator::Error>(())
//! ```

use indexmap::IndexSet;
use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{
    cache::SharedCache,
    kb::{KnowledgeBase, Language, Sense, SenseId},
    lookup::SenseLookup,
    properties::*,
    types::Doc,
    Error,
};

/// The extension field annotations are stored under.
pub const FIELD: &str = "babelnet";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
/// Options to configure the [SenseAnnotator].
pub struct AnnotatorOptions {
    /// ISO-639-1 code of the language to look senses up in. If `None`, the language of the pipeline is used.
    pub lang: Option<String>,
    /// Name of the preferred sense source e.g. `"WN"`. If `None`, senses from all sources are returned.
    pub source: Option<String>,
}

/// The senses found for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    ids: Vec<SenseId>,
    language: Language,
    #[serde(skip)]
    lemmas: OnceCell<Vec<String>>,
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.language == other.language
    }
}

impl Annotation {
    pub fn new(ids: Vec<SenseId>, language: Language) -> Self {
        Annotation {
            ids,
            language,
            lemmas: OnceCell::new(),
        }
    }

    /// Ids of the senses. Possibly empty.
    pub fn ids(&self) -> &[SenseId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Resolves all sense ids. Queries the knowledge base on every call.
    pub fn senses<K: KnowledgeBase + ?Sized>(&self, kb: &K) -> Result<Vec<Sense>, Error> {
        Ok(self
            .ids
            .iter()
            .map(|id| kb.resolve(id))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// The distinct lemmas of all senses in the language of this annotation.
    /// Computed on first access, later calls return the stored result.
    pub fn lemmas<K: KnowledgeBase + ?Sized>(&self, kb: &K) -> Result<&[String], Error> {
        self.lemmas
            .get_or_try_init(|| {
                let mut lemmas = IndexSet::new();
                for sense in self.senses(kb)? {
                    lemmas.extend(sense.lemmas(&self.language).iter().cloned());
                }

                Ok(lemmas.into_iter().collect())
            })
            .map(|x| x.as_slice())
    }
}

/// Annotates every token of a doc with the senses found by a [SenseLookup].
pub struct SenseAnnotator<K> {
    lookup: SenseLookup<K>,
}

impl<K: KnowledgeBase> SenseAnnotator<K> {
    /// Creates an annotator.
    /// # Errors
    /// - If `options.lang` is unset or not a known language code.
    /// - If `options.source` is set but not recognized by the knowledge base.
    pub fn new(kb: K, options: &AnnotatorOptions) -> Result<Self, Error> {
        let lang = options
            .lang
            .as_deref()
            .ok_or_else(|| crate::kb::Error::UnknownLanguage(String::new()))?;

        Self::with_language(kb, Language::from_iso(lang)?, options.source.as_deref())
    }

    /// Creates an annotator for the given pipeline. The language is taken from the options if set,
    /// otherwise from the pipeline.
    pub fn for_pipeline(kb: K, options: &AnnotatorOptions, pipeline: &Pipeline) -> Result<Self, Error> {
        let language = match options.lang.as_deref() {
            Some(lang) => Language::from_iso(lang)?,
            None => pipeline.lang().clone(),
        };

        Self::with_language(kb, language, options.source.as_deref())
    }

    fn with_language(kb: K, language: Language, source: Option<&str>) -> Result<Self, Error> {
        let source = source.map(|name| kb.sense_source(name)).transpose()?;

        let mut lookup = SenseLookup::new(kb, language);
        if let Some(source) = source {
            lookup = lookup.with_source(source);
        }

        Ok(SenseAnnotator { lookup })
    }

    /// Creates an annotator from an existing lookup.
    pub fn from_lookup(lookup: SenseLookup<K>) -> Self {
        SenseAnnotator { lookup }
    }

    /// Uses `cache` for all lookups of this annotator.
    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.lookup = self.lookup.with_cache(cache);
        self
    }

    pub fn lookup(&self) -> &SenseLookup<K> {
        &self.lookup
    }

    pub fn cache(&self) -> &SharedCache {
        self.lookup.cache()
    }

    fn annotation(&self, text: &str, ids: Vec<SenseId>) -> Annotation {
        debug!("'{}' has {} senses.", text, ids.len());
        Annotation::new(ids, self.lookup.language().clone())
    }

    /// Attaches an [Annotation] to every token of the doc under [FIELD], replacing any previous value.
    /// Tokens without part-of-speech get an empty annotation.
    /// Stops at the first failing lookup; tokens after it are left untouched.
    pub fn annotate(&self, doc: &mut Doc) -> Result<(), Error> {
        for token in doc.iter_mut() {
            let annotation = self.annotation(token.text(), self.lookup.resolve(token)?);
            token.extensions_mut().set(FIELD, annotation);
        }

        Ok(())
    }
}

impl<K: KnowledgeBase> Transform for SenseAnnotator<K> {
    fn name(&self) -> &str {
        FIELD
    }

    fn properties(&self) -> PropertiesMut {
        Properties::default()
            .read(&[Property::Lemma, Property::Pos])
            .write(&[Property::Senses])
    }

    fn transform(&self, mut doc: Doc) -> Result<Doc, Error> {
        let guard = self.property_guard(&doc)?;

        for token in doc.iter_mut() {
            let ids = self.lookup.resolve_tagged(
                token.text(),
                Some(guard.lemma(token)?),
                Some(guard.pos(token)?),
            )?;
            let annotation = self.annotation(token.text(), ids);

            guard.extensions_mut(token)?.set(FIELD, annotation);
        }

        Ok(doc)
    }
}
