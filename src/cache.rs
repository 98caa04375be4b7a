//! Memoization of knowledge base lookups keyed by (word, part-of-speech).
//!
//! The cache can be persisted as a flat JSON object mapping `"<word>|<POS>"` to arrays of sense ids:
//!
//! ```json
//! {"run|VERB": ["bn:001", "bn:002"], "fast|ADJECTIVE": []}
//! ```

use fs_err::File;
use indexmap::{IndexMap, IndexSet};
use log::info;
use parking_lot::Mutex;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::{
    collections::BTreeMap,
    fmt,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    sync::Arc,
};

use crate::{
    kb::{SenseId, SensePos},
    Error,
};

/// Separates word and part-of-speech label in the keys of cache files.
pub const KEY_DELIMITER: char = '|';

/// A [SenseCache] which can be handed to several lookups and kept by the caller e.g. to dump it after processing.
pub type SharedCache = Arc<Mutex<SenseCache>>;

/// Maps (word, part-of-speech) to the ids of the matching senses.
/// Entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenseCache {
    entries: IndexMap<(String, SensePos), IndexSet<SenseId>>,
}

fn encode_key(word: &str, pos: SensePos) -> String {
    format!("{}{}{}", word, KEY_DELIMITER, pos.label())
}

fn decode_key(key: &str) -> Result<(String, SensePos), Error> {
    let (word, label) = key
        .rsplit_once(KEY_DELIMITER)
        .ok_or_else(|| Error::MalformedCache {
            key: key.to_owned(),
            reason: format!("expected '<word>{}<pos>'", KEY_DELIMITER),
        })?;

    // only the spellings written by `encode_key`, not the short API tags
    let pos = SensePos::iter()
        .find(|pos| pos.label() == label)
        .ok_or_else(|| Error::MalformedCache {
            key: key.to_owned(),
            reason: format!("unknown part-of-speech label '{}'", label),
        })?;

    Ok((word.to_owned(), pos))
}

/// The entries of a cache file in file order. Unlike a map, repeated keys are kept.
struct RawEntries(Vec<(String, Vec<SenseId>)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping '<word>|<pos>' to arrays of sense ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl SenseCache {
    pub fn new() -> Self {
        SenseCache::default()
    }

    /// Wraps this cache for sharing.
    pub fn shared(self) -> SharedCache {
        Arc::new(Mutex::new(self))
    }

    /// Reads a cache file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let cache = Self::from_reader(reader)?;

        info!(
            "Loaded {} cache entries from {}.",
            cache.len(),
            path.as_ref().display()
        );
        Ok(cache)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let RawEntries(raw) = serde_json::from_reader(reader)?;

        let mut entries = IndexMap::with_capacity(raw.len());
        for (key, ids) in raw {
            if entries
                .insert(decode_key(&key)?, ids.into_iter().collect())
                .is_some()
            {
                return Err(Error::MalformedCache {
                    key,
                    reason: "duplicate entry for this word and part-of-speech".into(),
                });
            }
        }

        Ok(SenseCache { entries })
    }

    /// Writes all entries as one JSON object. Keys are sorted so equal caches produce equal files.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let raw: BTreeMap<String, Vec<&str>> = self
            .entries
            .iter()
            .map(|((word, pos), ids)| {
                (
                    encode_key(word, *pos),
                    ids.iter().map(|x| x.as_str()).collect(),
                )
            })
            .collect();

        Ok(serde_json::to_writer(writer, &raw)?)
    }

    /// Replaces the contents of this cache with the contents of the file at `path`.
    /// On error, the cache is left unchanged.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        *self = Self::from_path(path)?;
        Ok(())
    }

    /// Writes the cache to `path`, overwriting any existing file.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut writer)?;
        writer.flush()?;

        info!(
            "Dumped {} cache entries to {}.",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn get(&self, word: &str, pos: SensePos) -> Option<&IndexSet<SenseId>> {
        // the tuple key can not be borrowed as (&str, SensePos)
        self.entries.get(&(word.to_owned(), pos))
    }

    pub fn contains(&self, word: &str, pos: SensePos) -> bool {
        self.get(word, pos).is_some()
    }

    /// Stores the ids for (word, pos). Entries are append-only: ids are added to an existing entry.
    pub fn insert<I: IntoIterator<Item = SenseId>>(&mut self, word: &str, pos: SensePos, ids: I) {
        self.entries
            .entry((word.to_owned(), pos))
            .or_insert_with(IndexSet::new)
            .extend(ids);
    }

    /// Gets the entry for (word, pos), computing and storing it with `f` if it does not exist.
    /// If `f` fails, nothing is stored.
    pub fn get_or_try_insert_with<F, E>(
        &mut self,
        word: &str,
        pos: SensePos,
        f: F,
    ) -> Result<&IndexSet<SenseId>, E>
    where
        F: FnOnce() -> Result<Vec<SenseId>, E>,
    {
        let key = (word.to_owned(), pos);

        if !self.entries.contains_key(&key) {
            let ids = f()?;
            self.entries.insert(key.clone(), ids.into_iter().collect());
        }

        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SensePos, &IndexSet<SenseId>)> {
        self.entries
            .iter()
            .map(|((word, pos), ids)| (word.as_str(), *pos, ids))
    }
}
