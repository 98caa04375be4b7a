//! An in-process knowledge base holding a fixed inventory of senses.

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    io::{Read, Write},
    iter::FromIterator,
};
use unicase::UniCase;

use super::{Error, KnowledgeBase, Language, Sense, SenseId, SenseQuery};
use crate::components::Component;

type LemmaIndex = HashMap<(Language, UniCase<String>), Vec<usize>>;

/// The serialized form of a [MemoryKnowledgeBase]: a flat list of senses.
#[derive(Serialize, Deserialize, Default)]
struct Inventory {
    senses: Vec<Sense>,
}

/// A knowledge base backed by an in-memory list of senses.
/// Words are matched case-insensitively against the lemmas of each sense in the query language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Inventory", into = "Inventory")]
pub struct MemoryKnowledgeBase {
    senses: IndexMap<SenseId, Sense>,
    index: OnceCell<LemmaIndex>,
}

impl From<Inventory> for MemoryKnowledgeBase {
    fn from(inventory: Inventory) -> Self {
        inventory.senses.into_iter().collect()
    }
}

impl From<MemoryKnowledgeBase> for Inventory {
    fn from(kb: MemoryKnowledgeBase) -> Self {
        Inventory {
            senses: kb.senses.into_iter().map(|(_, sense)| sense).collect(),
        }
    }
}

impl FromIterator<Sense> for MemoryKnowledgeBase {
    fn from_iter<I: IntoIterator<Item = Sense>>(iter: I) -> Self {
        let mut kb = MemoryKnowledgeBase::default();
        for sense in iter {
            kb.insert(sense);
        }
        kb
    }
}

impl Component for MemoryKnowledgeBase {
    fn name() -> &'static str {
        "inventory"
    }
}

impl MemoryKnowledgeBase {
    /// Loads an inventory from JSON of the form `{"senses": [{"id": ..., "pos": ..., "lemmas": {"EN": [...]}}]}`.
    pub fn from_json<R: Read>(reader: R) -> Result<Self, crate::Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json<W: Write>(&self, writer: W) -> Result<(), crate::Error> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    /// Adds a sense, replacing any sense with the same id.
    pub fn insert(&mut self, sense: Sense) {
        self.senses.insert(sense.id().clone(), sense);
        self.index = OnceCell::new();
    }

    pub fn get(&self, id: &SenseId) -> Option<&Sense> {
        self.senses.get(id)
    }

    /// All senses in insertion order.
    pub fn senses(&self) -> impl Iterator<Item = &Sense> {
        self.senses.values()
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    fn index(&self) -> &LemmaIndex {
        self.index.get_or_init(|| {
            let mut index = LemmaIndex::new();

            for (i, sense) in self.senses.values().enumerate() {
                for language in sense.languages() {
                    for lemma in sense.lemmas(language) {
                        let entry = index
                            .entry((language.clone(), UniCase::new(lemma.clone())))
                            .or_insert_with(Vec::new);
                        if !entry.contains(&i) {
                            entry.push(i);
                        }
                    }
                }
            }

            index
        })
    }
}

impl KnowledgeBase for MemoryKnowledgeBase {
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error> {
        let key = (query.language().clone(), UniCase::new(query.word().to_owned()));

        let ids: Vec<SenseId> = self
            .index()
            .get(&key)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|i| self.senses.get_index(*i).map(|(_, sense)| sense))
                    .filter(|sense| query.part_of_speech().map_or(true, |pos| sense.pos() == pos))
                    .filter(|sense| {
                        query
                            .sense_source()
                            .map_or(true, |source| sense.sources().contains(source))
                    })
                    .map(|sense| sense.id().clone())
                    .collect()
            })
            .unwrap_or_else(Vec::new);

        debug!("{:?} matched {} senses.", query, ids.len());
        Ok(ids)
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, Error> {
        self.senses
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSense(id.clone()))
    }
}
