use indexmap::IndexSet;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Deserialize)]
struct KbConfigs {
    languages: HashSet<String>,
    sense_sources: IndexSet<String>,
}

lazy_static! {
    static ref KB_CONFIGS: KbConfigs = {
        serde_json::from_slice(include_bytes!(concat!(
            env!("OUT_DIR"),
            "/",
            "kb_configs.json"
        )))
        .expect("knowledge base configs must be valid JSON")
    };
}

/// Lowercase ISO-639-1 codes of all languages the knowledge base can be queried in.
pub(crate) fn languages() -> &'static HashSet<String> {
    &KB_CONFIGS.languages
}

/// Uppercase names of the sense sources the knowledge base recognizes.
pub(crate) fn sense_sources() -> &'static IndexSet<String> {
    &KB_CONFIGS.sense_sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configs_are_embedded() {
        assert!(languages().contains("en"));
        assert!(!languages().contains("EN"));
        assert_eq!(sense_sources().get_index(0).map(|x| x.as_str()), Some("BABELNET"));
    }
}
