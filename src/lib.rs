//! Word sense annotation of tokenized text using a multilingual lexical knowledge base such as BabelNet.
//! # Overview
//!
//! babelnet_annotator has the following core abstractions:
//! - A [KnowledgeBase][kb::KnowledgeBase] which finds the [SenseId][kb::SenseId]s of a word and resolves them to [Sense][kb::Sense]s.
//!   An in-memory inventory is provided, and a client for the BabelNet HTTP API behind the `remote` feature.
//! - A [SenseLookup][lookup::SenseLookup] which maps host part-of-speech tags to the tags of the knowledge base
//!   and memoizes every query in a [SenseCache][cache::SenseCache]. The cache can be dumped to and loaded from JSON.
//! - A [SenseAnnotator][annotator::SenseAnnotator], a [Transform][properties::Transform] to be added to a
//!   [Pipeline][properties::Pipeline], which stores an [Annotation][annotator::Annotation] on every token.
//!
//! # Examples
//!
//! Annotate a pre-tagged sentence and persist the lookups:
//!
//! ```no_run
//! use babelnet_annotator::{
//!     annotator::{Annotation, AnnotatorOptions, SenseAnnotator, FIELD},
//!     cache::SenseCache,
//!     kb::MemoryKnowledgeBase,
//!     properties::{Pipeline, Property},
//!     types::{Doc, Token, UPos},
//! };
//! use std::sync::Arc;
//!
//! let kb = Arc::new(MemoryKnowledgeBase::from_json(std::fs::File::open("inventory.json")?)?);
//! let cache = SenseCache::from_path("senses.json")?.shared();
//!
//! let mut pipeline = Pipeline::new("en", &[Property::Lemma, Property::Pos])?;
//! let annotator = SenseAnnotator::for_pipeline(kb.clone(), &AnnotatorOptions::default(), &pipeline)?
//!     .with_cache(cache.clone());
//! pipeline.add_pipe(annotator)?;
//!
//! let doc: Doc = vec![
//!     Token::tagged("dogs", "dog", UPos::Noun),
//!     Token::tagged("bark", "bark", UPos::Verb),
//! ]
//! .into_iter()
//! .collect();
//!
//! for token in pipeline.process(doc)?.iter() {
//!     let annotation = token.extension::<Annotation>(FIELD).expect("all tokens are annotated");
//!     println!("{}: {:?} {:?}", token.text(), annotation.ids(), annotation.lemmas(&*kb)?);
//! }
//!
//! cache.lock().dump("senses.json")?;
//! # Ok::<(), babelnet_annotator::Error>(())
//! ```

// #![warn(missing_docs)]
use std::io;

use thiserror::Error;

pub mod annotator;
pub mod cache;
pub mod components;
pub mod conllu;
pub mod kb;
pub mod lookup;
pub mod properties;
pub mod types;
pub(crate) mod utils;

pub use annotator::{Annotation, AnnotatorOptions, SenseAnnotator};
pub use cache::{SenseCache, SharedCache};
pub use lookup::SenseLookup;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// (De)serialization error of a binary snapshot.
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    /// Error reading or writing JSON e.g. a cache file or an inventory.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("malformed cache entry '{key}': {reason}")]
    MalformedCache { key: String, reason: String },
    #[error(transparent)]
    KnowledgeBase(#[from] kb::Error),
    #[error(transparent)]
    Property(#[from] properties::Error),
    #[error(transparent)]
    Conllu(#[from] conllu::Error),
}
