//! Memoized sense lookup for single tokens.

use indexmap::IndexSet;
use itertools::Itertools;
use log::debug;

use crate::{
    cache::{SenseCache, SharedCache},
    kb::{KnowledgeBase, Language, SenseId, SensePos, SenseQuery, SenseSource},
    types::{Token, UPos},
    Error,
};

/// Maps a coarse host tag to the part-of-speech of the knowledge base.
/// Tags without a clear counterpart (e.g. determiners and pronouns) are not mapped.
pub fn map_pos(pos: UPos) -> Option<SensePos> {
    match pos {
        UPos::Adj => Some(SensePos::Adjective),
        UPos::Adv => Some(SensePos::Adverb),
        UPos::Aux | UPos::Verb => Some(SensePos::Verb),
        UPos::Noun | UPos::Propn | UPos::Num => Some(SensePos::Noun),
        UPos::Adp
        | UPos::Conj
        | UPos::Cconj
        | UPos::Det
        | UPos::Intj
        | UPos::Part
        | UPos::Pron
        | UPos::Punct
        | UPos::Sconj
        | UPos::Sym
        | UPos::X
        | UPos::Eol
        | UPos::Space => None,
    }
}

/// The words to look up for a token: the surface text and, for verbs, nouns and adjectives, the lemma.
pub fn candidates<'t>(text: &'t str, lemma: Option<&'t str>, pos: SensePos) -> Vec<&'t str> {
    let lemma = lemma.filter(|_| {
        matches!(
            pos,
            SensePos::Verb | SensePos::Noun | SensePos::Adjective
        )
    });

    std::iter::once(text)
        .chain(lemma)
        .filter(|word| !word.trim().is_empty())
        .unique()
        .collect()
}

/// Looks up the senses of tokens in a knowledge base, memoizing each (word, part-of-speech) query
/// in a [SenseCache].
pub struct SenseLookup<K> {
    kb: K,
    language: Language,
    source: Option<SenseSource>,
    cache: SharedCache,
}

impl<K: KnowledgeBase> SenseLookup<K> {
    /// Creates a lookup querying `kb` in `language` with a fresh, empty cache.
    pub fn new(kb: K, language: Language) -> Self {
        SenseLookup {
            kb,
            language,
            source: None,
            cache: SenseCache::new().shared(),
        }
    }

    /// Restricts all queries to senses from `source`.
    pub fn with_source(mut self, source: SenseSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Uses `cache` instead of the cache this lookup was created with.
    /// Entries are keyed by word and part-of-speech only, so a cache should not be shared between
    /// lookups with different languages or sources.
    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn kb(&self) -> &K {
        &self.kb
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn source(&self) -> Option<&SenseSource> {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Gets the ids of all senses of the token.
    /// Returns an empty list without querying if the token has no part-of-speech or it can not be mapped.
    pub fn resolve(&self, token: &Token) -> Result<Vec<SenseId>, Error> {
        self.resolve_tagged(token.text(), token.lemma(), token.pos())
    }

    /// Like [SenseLookup::resolve] for a word whose lemma and part-of-speech were read separately.
    pub fn resolve_tagged(
        &self,
        text: &str,
        lemma: Option<&str>,
        pos: Option<UPos>,
    ) -> Result<Vec<SenseId>, Error> {
        match pos.and_then(map_pos) {
            Some(pos) => self.resolve_words(&candidates(text, lemma, pos), pos),
            None => Ok(Vec::new()),
        }
    }

    /// Gets the ids of all senses of one word.
    pub fn resolve_word(&self, word: &str, pos: SensePos) -> Result<Vec<SenseId>, Error> {
        self.resolve_words(&[word], pos)
    }

    /// Union of the senses of all `words`, in order of first occurrence.
    fn resolve_words(&self, words: &[&str], pos: SensePos) -> Result<Vec<SenseId>, Error> {
        let mut cache = self.cache.lock();
        let mut ids = IndexSet::new();

        for word in words {
            let entry = cache.get_or_try_insert_with(word, pos, || self.query(word, pos))?;
            ids.extend(entry.iter().cloned());
        }

        Ok(ids.into_iter().collect())
    }

    fn query(&self, word: &str, pos: SensePos) -> Result<Vec<SenseId>, crate::kb::Error> {
        let mut query = SenseQuery::new(word, self.language.clone()).pos(pos);
        if let Some(source) = &self.source {
            query = query.source(source.clone());
        }

        debug!("Cache miss for {}|{}, querying knowledge base.", word, pos);
        self.kb.query(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_tags_are_unmapped() {
        assert_eq!(map_pos(UPos::Det), None);
        assert_eq!(map_pos(UPos::Pron), None);
        assert_eq!(map_pos(UPos::Punct), None);
        assert_eq!(map_pos(UPos::Aux), Some(SensePos::Verb));
        assert_eq!(map_pos(UPos::Propn), Some(SensePos::Noun));
    }

    #[test]
    fn lemma_is_candidate_for_open_classes() {
        assert_eq!(
            candidates("running", Some("run"), SensePos::Verb),
            vec!["running", "run"]
        );
        assert_eq!(
            candidates("dogs", Some("dog"), SensePos::Noun),
            vec!["dogs", "dog"]
        );
        assert_eq!(
            candidates("faster", Some("fast"), SensePos::Adjective),
            vec!["faster", "fast"]
        );
        assert_eq!(
            candidates("quickly", Some("quick"), SensePos::Adverb),
            vec!["quickly"]
        );
    }

    #[test]
    fn duplicate_and_empty_candidates_collapse() {
        assert_eq!(candidates("run", Some("run"), SensePos::Verb), vec!["run"]);
        assert_eq!(candidates("run", Some(""), SensePos::Verb), vec!["run"]);
        assert_eq!(candidates("run", None, SensePos::Verb), vec!["run"]);
    }
}
