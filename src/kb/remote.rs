//! A knowledge base backed by the BabelNet HTTP API. Requires the `remote` feature.
//!
//! Every [KnowledgeBase::query] and [KnowledgeBase::resolve] call issues one blocking request.
//! Memoization is left to the [SenseCache][crate::cache::SenseCache].

use log::debug;
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;

use super::{Error, KnowledgeBase, Language, Sense, SenseId, SensePos, SenseQuery};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Options to configure the [HttpKnowledgeBase].
pub struct HttpOptions {
    /// Base URL of the API, without trailing slash.
    pub endpoint: String,
    /// The API key.
    pub key: String,
    /// ISO-639-1 codes of the languages lemmas are fetched in when resolving senses.
    pub target_languages: Vec<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            endpoint: "https://babelnet.io/v9".into(),
            key: String::new(),
            target_languages: vec!["en".into()],
        }
    }
}

#[derive(Deserialize)]
struct SynsetId {
    id: SenseId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SenseProperties {
    #[serde(default)]
    full_lemma: Option<String>,
    #[serde(default)]
    simple_lemma: Option<String>,
    language: String,
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Deserialize)]
struct SynsetSense {
    properties: SenseProperties,
}

#[derive(Deserialize)]
struct Synset {
    #[serde(default)]
    senses: Vec<SynsetSense>,
}

/// Synset ids end with a letter encoding the part-of-speech e.g. `bn:00046516n`.
fn pos_from_id(id: &SenseId) -> Option<SensePos> {
    match id.as_str().chars().last()? {
        'n' => Some(SensePos::Noun),
        'v' => Some(SensePos::Verb),
        'a' => Some(SensePos::Adjective),
        'r' => Some(SensePos::Adverb),
        _ => None,
    }
}

pub struct HttpKnowledgeBase {
    client: Client,
    options: HttpOptions,
    target_languages: Vec<Language>,
}

impl HttpKnowledgeBase {
    /// Creates a knowledge base client. No request is made until the first query.
    /// # Errors
    /// - If a target language is not a known language code.
    pub fn new(options: HttpOptions) -> Result<Self, Error> {
        let target_languages = options
            .target_languages
            .iter()
            .map(|code| Language::from_iso(code))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HttpKnowledgeBase {
            client: Client::builder().build()?,
            options,
            target_languages,
        })
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    fn get<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T, Error> {
        let url = format!("{}/{}", self.options.endpoint, method);
        debug!("Requesting {} with {:?}.", url, params);

        let value: serde_json::Value = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.options.key.as_str())])
            .send()?
            .error_for_status()?
            .json()?;

        // the API reports invalid keys and exhausted limits as a JSON object with a message
        if let Some(message) = value.get("message").and_then(|x| x.as_str()) {
            return Err(Error::Unavailable(message.to_owned()));
        }

        serde_json::from_value(value)
            .map_err(|err| Error::Unavailable(format!("unexpected response from {}: {}", url, err)))
    }
}

impl KnowledgeBase for HttpKnowledgeBase {
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, Error> {
        let mut params = vec![("lemma", query.word()), ("searchLang", query.language().as_str())];
        if let Some(pos) = query.part_of_speech() {
            params.push(("pos", pos.tag()));
        }
        if let Some(source) = query.sense_source() {
            params.push(("source", source.as_str()));
        }

        let ids: Vec<SynsetId> = self.get("getSynsetIds", &params)?;
        Ok(ids.into_iter().map(|x| x.id).collect())
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, Error> {
        let mut params = vec![("id", id.as_str())];
        params.extend(
            self.target_languages
                .iter()
                .map(|language| ("targetLang", language.as_str())),
        );

        let synset: Synset = self.get("getSynset", &params)?;

        let pos = pos_from_id(id)
            .or_else(|| {
                synset
                    .senses
                    .iter()
                    .find_map(|x| x.properties.pos.as_deref().and_then(|pos| SensePos::from_str(pos).ok()))
            })
            .ok_or_else(|| Error::Unavailable(format!("part-of-speech of '{}' is unknown", id)))?;

        let mut sense = Sense::new(id.clone(), pos);
        for SynsetSense { properties } in synset.senses {
            let language = match Language::from_iso(&properties.language) {
                Ok(language) => language,
                Err(_) => continue,
            };

            if let Some(lemma) = properties.simple_lemma.or(properties.full_lemma) {
                sense = sense.with_lemma(language, lemma);
            }
            if let Some(source) = properties.source.and_then(|x| self.sense_source(&x).ok()) {
                sense = sense.with_source(source);
            }
        }

        Ok(sense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_read_pos_from_id() {
        assert_eq!(pos_from_id(&"bn:00046516n".into()), Some(SensePos::Noun));
        assert_eq!(pos_from_id(&"bn:00083184v".into()), Some(SensePos::Verb));
        assert_eq!(pos_from_id(&"bn:00098125a".into()), Some(SensePos::Adjective));
        assert_eq!(pos_from_id(&"bn:00114520r".into()), Some(SensePos::Adverb));
        assert_eq!(pos_from_id(&"".into()), None);
    }

    #[test]
    fn can_parse_synset_response() {
        let json = r#"{"senses": [
            {"type": "BabelSense", "properties": {"fullLemma": "run", "simpleLemma": "run", "language": "EN", "pos": "VERB", "source": "WN"}},
            {"type": "BabelSense", "properties": {"fullLemma": "laufen", "language": "DE", "pos": "VERB", "source": "WIKT"}}
        ], "wnOffsets": []}"#;

        let synset: Synset = serde_json::from_str(json).unwrap();
        assert_eq!(synset.senses.len(), 2);
        assert_eq!(synset.senses[1].properties.simple_lemma, None);
        assert_eq!(synset.senses[1].properties.full_lemma.as_deref(), Some("laufen"));
    }

    #[test]
    fn rejects_unknown_target_languages() {
        let options = HttpOptions {
            target_languages: vec!["en".into(), "xx".into()],
            ..HttpOptions::default()
        };

        assert!(matches!(
            HttpKnowledgeBase::new(options),
            Err(Error::UnknownLanguage(code)) if code == "xx"
        ));
    }
}
