//! The host pipeline contract: steps implementing [Transform] are registered by name into a [Pipeline]
//! and declare which token [Property]s they read and write.

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{annotator::FIELD, kb::Language, types::*};

pub trait Transform {
    /// The name under which this step is registered. Must be unique within a pipeline.
    fn name(&self) -> &str;

    fn properties(&self) -> PropertiesMut {
        PropertiesMut::default()
    }

    fn property_guard(&self, doc: &Doc) -> Result<PropertyGuard, Error> {
        self.properties().build(doc)
    }

    fn transform(&self, doc: Doc) -> Result<Doc, crate::Error>;
}

impl<'a, T> Transform for &'a T
where
    T: Transform + ?Sized,
{
    fn name(&self) -> &str {
        (*self).name()
    }

    fn properties(&self) -> PropertiesMut {
        (*self).properties()
    }

    fn property_guard(&self, doc: &Doc) -> Result<PropertyGuard, Error> {
        (*self).property_guard(doc)
    }

    fn transform(&self, doc: Doc) -> Result<Doc, crate::Error> {
        (*self).transform(doc)
    }
}

impl<T> Transform for Box<T>
where
    T: Transform + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn properties(&self) -> PropertiesMut {
        (**self).properties()
    }

    fn property_guard(&self, doc: &Doc) -> Result<PropertyGuard, Error> {
        (**self).property_guard(doc)
    }

    fn transform(&self, doc: Doc) -> Result<Doc, crate::Error> {
        (**self).transform(doc)
    }
}

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error("unset token property: {0:?}.")]
    Unset(Property),
    #[error("invalid pipeline: properties {0:?} are read without being written.")]
    InvalidPipeline(Vec<Property>),
    #[error("a step named '{0}' already exists in the pipeline.")]
    DuplicatePipe(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Lemma = 0,
    Pos = 1,
    Senses = 2,
}

impl Property {
    pub fn properties() -> &'static [Property] {
        &[Property::Lemma, Property::Pos, Property::Senses]
    }

    /// Whether every token of the doc has this property set.
    fn is_set(&self, doc: &Doc) -> bool {
        match self {
            Property::Lemma => doc.iter().all(|token| token.lemma().is_some()),
            Property::Pos => doc.iter().all(|token| token.pos().is_some()),
            Property::Senses => doc.iter().all(|token| token.extensions().has(FIELD)),
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
struct Bitset(u16);

impl Bitset {
    pub fn insert(&mut self, value: Property) {
        self.0 |= 1 << (value as u16);
    }

    pub fn contains(&self, value: &Property) -> bool {
        self.0 & (1 << (*value as u16)) != 0
    }

    pub fn union(mut self, other: Bitset) -> Self {
        self.0 |= other.0;
        self
    }

    pub fn intersection(mut self, other: Bitset) -> Self {
        self.0 &= other.0;
        self
    }

    pub fn inverse(mut self) -> Self {
        self.0 = !self.0;
        self
    }

    pub fn into_iter<'a>(self) -> impl Iterator<Item = Property> + 'a {
        Property::properties().iter().filter_map(move |property| {
            if self.contains(property) {
                Some(*property)
            } else {
                None
            }
        })
    }
}

/// Properties a step reads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Properties {
    read_mask: Bitset,
}

/// Properties a step reads and writes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PropertiesMut {
    read_mask: Bitset,
    write_mask: Bitset,
}

impl Properties {
    pub fn read(mut self, properties: &[Property]) -> Self {
        for property in properties {
            self.read_mask.insert(*property);
        }

        self
    }

    pub fn write(self, properties: &[Property]) -> PropertiesMut {
        let mut write_mask = Bitset::default();
        let mut read_mask = self.read_mask;

        for property in properties {
            // write implies read
            read_mask.insert(*property);
            write_mask.insert(*property);
        }

        PropertiesMut {
            read_mask,
            write_mask,
        }
    }
}

impl PropertiesMut {
    pub fn reads(&self) -> impl Iterator<Item = Property> {
        self.read_mask.into_iter()
    }

    pub fn writes(&self) -> impl Iterator<Item = Property> {
        self.write_mask.into_iter()
    }

    pub(crate) fn reads_without_write(&self) -> impl Iterator<Item = Property> {
        self.read_mask
            .intersection(self.write_mask.inverse())
            .into_iter()
    }

    /// Combines these properties with the properties of a step running afterwards.
    /// Reads of `next` which are satisfied by writes of `self` are not reads of the combination.
    pub fn chain(mut self, next: PropertiesMut) -> Self {
        let next_reads = next.read_mask.intersection(next.write_mask.inverse());
        let new_reads = next_reads.intersection(self.write_mask.inverse());

        self.read_mask = self.read_mask.union(new_reads);
        self.write_mask = self.write_mask.union(next.write_mask);
        self
    }

    /// Checks that all read properties which are not also written are set on the doc.
    pub fn build(&self, doc: &Doc) -> Result<PropertyGuard, Error> {
        for property in self.reads_without_write() {
            if !property.is_set(doc) {
                return Err(Error::Unset(property));
            }
        }

        Ok(PropertyGuard {
            read_mask: self.read_mask,
            write_mask: self.write_mask,
        })
    }
}

/// Proof that the properties a step reads are set. Obtained by [PropertiesMut::build].
#[derive(Debug, Copy, Clone)]
pub struct PropertyGuard {
    read_mask: Bitset,
    write_mask: Bitset,
}

impl PropertyGuard {
    pub fn lemma<'a>(&self, token: &'a Token) -> Result<&'a str, Error> {
        match (token.lemma(), self.read_mask.contains(&Property::Lemma)) {
            (Some(lemma), true) => Ok(lemma),
            _ => Err(Error::Unset(Property::Lemma)),
        }
    }

    pub fn pos(&self, token: &Token) -> Result<UPos, Error> {
        match (token.pos(), self.read_mask.contains(&Property::Pos)) {
            (Some(pos), true) => Ok(pos),
            _ => Err(Error::Unset(Property::Pos)),
        }
    }

    pub fn extensions_mut<'a>(&self, token: &'a mut Token) -> Result<&'a mut Extensions, Error> {
        if self.write_mask.contains(&Property::Senses) {
            Ok(token.extensions_mut())
        } else {
            Err(Error::Unset(Property::Senses))
        }
    }
}

/// An ordered sequence of named steps. Documents entering the pipeline are expected to have
/// the properties given at construction set.
pub struct Pipeline {
    lang: Language,
    provided: PropertiesMut,
    properties: PropertiesMut,
    steps: Vec<Box<dyn Transform + Send + Sync>>,
}

impl Pipeline {
    /// Creates an empty pipeline for the language with the ISO-639-1 code `lang`.
    /// `provided` are the properties set on all incoming documents, e.g. by an upstream tagger.
    pub fn new(lang: &str, provided: &[Property]) -> Result<Self, crate::Error> {
        let provided = Properties::default().write(provided);

        Ok(Pipeline {
            lang: Language::from_iso(lang)?,
            provided,
            properties: provided,
            steps: Vec::new(),
        })
    }

    /// The language of the documents this pipeline processes.
    pub fn lang(&self) -> &Language {
        &self.lang
    }

    /// Appends a step to the pipeline.
    /// # Errors
    /// - If a step with the same name is already registered.
    /// - If the step reads properties that are neither provided nor written by an earlier step.
    pub fn add_pipe<T: Transform + Send + Sync + 'static>(
        &mut self,
        step: T,
    ) -> Result<&mut Self, Error> {
        if self.get_pipe(step.name()).is_some() {
            return Err(Error::DuplicatePipe(step.name().to_owned()));
        }

        let properties = self.properties.chain(step.properties());
        let missing: Vec<_> = properties.reads_without_write().collect();
        if !missing.is_empty() {
            return Err(Error::InvalidPipeline(missing));
        }

        info!("Adding step '{}' to the pipeline.", step.name());
        self.properties = properties;
        self.steps.push(Box::new(step));
        Ok(self)
    }

    /// Removes the step with the given name, returning it if it existed.
    /// Properties written by the removed step are no longer considered available to later steps.
    pub fn remove_pipe(&mut self, name: &str) -> Option<Box<dyn Transform + Send + Sync>> {
        let index = self.steps.iter().position(|x| x.name() == name)?;
        let step = self.steps.remove(index);

        self.properties = self
            .steps
            .iter()
            .fold(self.provided, |properties, step| properties.chain(step.properties()));

        Some(step)
    }

    pub fn get_pipe(&self, name: &str) -> Option<&(dyn Transform + Send + Sync)> {
        self.steps
            .iter()
            .find(|x| x.name() == name)
            .map(|x| &**x)
    }

    /// Names of the registered steps in the order they are applied.
    pub fn pipe_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|x| x.name())
    }

    pub fn process(&self, doc: Doc) -> Result<Doc, crate::Error> {
        self.transform(doc)
    }
}

impl Transform for Pipeline {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn properties(&self) -> PropertiesMut {
        self.properties
    }

    fn transform(&self, mut doc: Doc) -> Result<Doc, crate::Error> {
        for step in &self.steps {
            step.property_guard(&doc)?;
            doc = step.transform(doc)?;
        }

        Ok(doc)
    }
}
