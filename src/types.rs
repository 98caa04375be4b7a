//! Fundamental types used by this crate: the host-side [Token] and [Doc] and the coarse part-of-speech tagset.

use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    collections::HashMap,
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

/// A coarse (universal) part-of-speech tag as assigned by the host pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs, clippy::upper_case_acronyms)]
pub enum UPos {
    Adj,
    Adp,
    Adv,
    Aux,
    Conj,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Eol,
    Space,
}

impl UPos {
    /// All tags in the set.
    pub fn iter() -> impl Iterator<Item = UPos> {
        use UPos::*;

        [
            Adj, Adp, Adv, Aux, Conj, Cconj, Det, Intj, Noun, Num, Part, Pron, Propn, Punct, Sconj,
            Sym, Verb, X, Eol, Space,
        ]
        .iter()
        .copied()
    }

    /// The tag as written in CoNLL-U files e.g. `"PROPN"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UPos::Adj => "ADJ",
            UPos::Adp => "ADP",
            UPos::Adv => "ADV",
            UPos::Aux => "AUX",
            UPos::Conj => "CONJ",
            UPos::Cconj => "CCONJ",
            UPos::Det => "DET",
            UPos::Intj => "INTJ",
            UPos::Noun => "NOUN",
            UPos::Num => "NUM",
            UPos::Part => "PART",
            UPos::Pron => "PRON",
            UPos::Propn => "PROPN",
            UPos::Punct => "PUNCT",
            UPos::Sconj => "SCONJ",
            UPos::Sym => "SYM",
            UPos::Verb => "VERB",
            UPos::X => "X",
            UPos::Eol => "EOL",
            UPos::Space => "SPACE",
        }
    }
}

impl fmt::Display for UPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known coarse tag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown part-of-speech tag: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for UPos {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();

        UPos::iter()
            .find(|tag| tag.as_str() == upper)
            .ok_or_else(|| UnknownTag(s.to_owned()))
    }
}

/// Arbitrary data attached to a token by pipeline steps, addressed by field name.
/// Setting a field overwrites any previous value.
#[derive(Default)]
pub struct Extensions {
    fields: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Sets the field `name` to `value`. Returns `true` if a previous value was replaced.
    pub fn set<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> bool {
        self.fields.insert(name.to_owned(), Box::new(value)).is_some()
    }

    /// Gets the value of field `name` if it is set and has type `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.fields.get(name).and_then(|value| value.downcast_ref())
    }

    /// Whether the field `name` is set (to a value of any type).
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields.keys()).finish()
    }
}

/// A token as produced by the host pipeline.
/// Lemma and part-of-speech are optional until an upstream step has set them.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Token {
    text: String,
    lemma: Option<String>,
    pos: Option<UPos>,
    #[derivative(Debug = "ignore")]
    extensions: Extensions,
}

impl Token {
    /// Creates a token with only the surface text set.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Token {
            text: text.into(),
            lemma: None,
            pos: None,
            extensions: Extensions::default(),
        }
    }

    /// Creates a token with text, lemma and part-of-speech set.
    pub fn tagged<S1: Into<String>, S2: Into<String>>(text: S1, lemma: S2, pos: UPos) -> Self {
        Token::new(text).with_lemma(lemma).with_pos(pos)
    }

    pub fn with_lemma<S: Into<String>>(mut self, lemma: S) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_pos(mut self, pos: UPos) -> Self {
        self.pos = Some(pos);
        self
    }

    /// The surface text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    pub fn pos(&self) -> Option<UPos> {
        self.pos
    }

    pub fn set_lemma<S: Into<String>>(&mut self, lemma: S) {
        self.lemma = Some(lemma.into());
    }

    pub fn set_pos(&mut self, pos: UPos) {
        self.pos = Some(pos);
    }

    /// Data attached by pipeline steps.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Shorthand for `self.extensions().get(name)`.
    pub fn extension<T: Any>(&self, name: &str) -> Option<&T> {
        self.extensions.get(name)
    }
}

/// One unit of processing (a sentence or a document): an ordered sequence of tokens.
#[derive(Debug, Default)]
pub struct Doc {
    tokens: Vec<Token>,
}

impl Doc {
    pub fn new(tokens: Vec<Token>) -> Self {
        Doc { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Token> {
        self.tokens.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The surface texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|x| x.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Index<usize> for Doc {
    type Output = Token;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

impl IndexMut<usize> for Doc {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.tokens[index]
    }
}

impl std::iter::FromIterator<Token> for Doc {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        Doc::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Doc {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a> IntoIterator for &'a Doc {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_tags() {
        assert_eq!("PROPN".parse::<UPos>(), Ok(UPos::Propn));
        assert_eq!("verb".parse::<UPos>(), Ok(UPos::Verb));
        assert!("NN".parse::<UPos>().is_err());

        for tag in UPos::iter() {
            assert_eq!(tag.as_str().parse::<UPos>(), Ok(tag));
        }
    }

    #[test]
    fn extensions_overwrite() {
        let mut token = Token::new("run");

        assert!(!token.extensions_mut().set("field", 1usize));
        assert!(token.extensions_mut().set("field", 2usize));

        assert_eq!(token.extension::<usize>("field"), Some(&2));
        // wrong type
        assert_eq!(token.extension::<String>("field"), None);
        assert!(token.extensions().has("field"));
    }
}
