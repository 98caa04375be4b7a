use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use babelnet_annotator::{
    annotator::{Annotation, AnnotatorOptions, SenseAnnotator, FIELD},
    cache::SenseCache,
    conllu,
    kb::{self, KnowledgeBase, Language, MemoryKnowledgeBase, Sense, SenseId, SensePos, SenseQuery},
    lookup::{map_pos, SenseLookup},
    properties::{self, Pipeline, Property},
    types::{Doc, Token, UPos},
    Error,
};
use lazy_static::lazy_static;
use quickcheck_macros::quickcheck;

lazy_static! {
    static ref EN: Language = Language::from_iso("en").unwrap();
    static ref KB: MemoryKnowledgeBase = vec![
        Sense::new("bn:001".into(), SensePos::Verb)
            .with_lemma(EN.clone(), "run")
            .with_lemma(EN.clone(), "running"),
        Sense::new("bn:002".into(), SensePos::Verb).with_lemma(EN.clone(), "run"),
        Sense::new("bn:003".into(), SensePos::Noun).with_lemma(EN.clone(), "dog"),
        Sense::new("bn:004".into(), SensePos::Adjective).with_lemma(EN.clone(), "fast"),
    ]
    .into_iter()
    .collect();
}

/// Counts the queries reaching the wrapped knowledge base and fails on one word.
struct Counting<K> {
    inner: K,
    queries: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl<K> Counting<K> {
    fn new(inner: K) -> Self {
        Counting {
            inner,
            queries: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    fn failing_on(inner: K, word: &'static str) -> Self {
        Counting {
            fail_on: Some(word),
            ..Counting::new(inner)
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl<K: KnowledgeBase> KnowledgeBase for Counting<K> {
    fn query(&self, query: &SenseQuery) -> Result<Vec<SenseId>, kb::Error> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.fail_on == Some(query.word()) {
            return Err(kb::Error::Unavailable("connection reset".into()));
        }
        self.inner.query(query)
    }

    fn resolve(&self, id: &SenseId) -> Result<Sense, kb::Error> {
        self.inner.resolve(id)
    }
}

fn options() -> AnnotatorOptions {
    AnnotatorOptions {
        lang: Some("en".into()),
        source: None,
    }
}

fn ids(doc: &Doc) -> Vec<Vec<&str>> {
    doc.iter()
        .map(|token| {
            token
                .extension::<Annotation>(FIELD)
                .map(|annotation| annotation.ids().iter().map(|x| x.as_str()).collect())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn lemma_senses_are_merged() {
    let kb = Counting::new(&*KB);
    let annotator = SenseAnnotator::new(&kb, &options()).unwrap();

    let mut doc: Doc = vec![Token::tagged("running", "run", UPos::Verb)].into_iter().collect();
    annotator.annotate(&mut doc).unwrap();

    assert_eq!(ids(&doc), vec![vec!["bn:001", "bn:002"]]);
    assert_eq!(kb.queries(), 2);
}

#[test]
fn unmapped_pos_is_not_queried() {
    let kb = Counting::new(&*KB);
    let annotator = SenseAnnotator::new(&kb, &options()).unwrap();

    let mut doc: Doc = vec![
        Token::tagged("the", "the", UPos::Det),
        Token::new("run"),
    ]
    .into_iter()
    .collect();
    annotator.annotate(&mut doc).unwrap();

    let annotation = doc[0].extension::<Annotation>(FIELD).unwrap();
    assert!(annotation.is_empty());
    assert_eq!(ids(&doc), vec![Vec::<&str>::new(), vec![]]);
    assert_eq!(kb.queries(), 0);
}

#[test]
fn repeated_lookups_hit_the_cache() {
    let kb = Counting::new(&*KB);
    let lookup = SenseLookup::new(&kb, EN.clone());

    let first = lookup.resolve_word("run", SensePos::Verb).unwrap();
    let second = lookup.resolve_word("run", SensePos::Verb).unwrap();

    assert_eq!(first, second);
    assert_eq!(kb.queries(), 1);

    // the same word with another part-of-speech is a different entry
    assert!(lookup.resolve_word("run", SensePos::Noun).unwrap().is_empty());
    assert_eq!(kb.queries(), 2);
    assert_eq!(lookup.cache().lock().len(), 2);
}

#[test]
fn loaded_cache_answers_without_querying() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("senses.json");
    std::fs::write(&path, r#"{"run|VERB": ["bn:001"]}"#).unwrap();

    let kb = Counting::new(&*KB);
    let annotator = SenseAnnotator::new(&kb, &options())
        .unwrap()
        .with_cache(SenseCache::from_path(&path).unwrap().shared());

    let mut doc: Doc = vec![Token::tagged("run", "run", UPos::Verb)].into_iter().collect();
    annotator.annotate(&mut doc).unwrap();

    // the stale cache entry wins over the knowledge base
    assert_eq!(ids(&doc), vec![vec!["bn:001"]]);
    assert_eq!(kb.queries(), 0);
}

#[test]
fn dumped_cache_can_be_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("senses.json");

    let annotator = SenseAnnotator::new(&*KB, &options()).unwrap();
    let mut doc: Doc = vec![
        Token::tagged("dogs", "dog", UPos::Noun),
        Token::tagged("ran", "run", UPos::Verb),
        Token::tagged("fast", "fast", UPos::Adv),
    ]
    .into_iter()
    .collect();
    annotator.annotate(&mut doc).unwrap();
    annotator.cache().lock().dump(&path).unwrap();

    let mut loaded = SenseCache::new();
    loaded.load(&path).unwrap();
    assert_eq!(&loaded, &*annotator.cache().lock());

    // 'dogs', 'dog', 'ran', 'run' and 'fast' as adverb
    assert_eq!(loaded.len(), 5);
    assert!(loaded.get("fast", SensePos::Adverb).unwrap().is_empty());
    assert!(loaded.get("fast", SensePos::Adjective).is_none());

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["run|VERB"], serde_json::json!(["bn:001", "bn:002"]));
}

#[test]
fn failed_query_aborts_the_doc() {
    let kb = Counting::failing_on(&*KB, "dog");
    let annotator = SenseAnnotator::new(&kb, &options()).unwrap();

    let mut doc: Doc = vec![
        Token::tagged("running", "run", UPos::Verb),
        Token::tagged("dog", "dog", UPos::Noun),
        Token::tagged("fast", "fast", UPos::Adj),
    ]
    .into_iter()
    .collect();

    assert!(matches!(
        annotator.annotate(&mut doc),
        Err(Error::KnowledgeBase(kb::Error::Unavailable(_)))
    ));
    assert!(doc[0].extensions().has(FIELD));
    assert!(!doc[1].extensions().has(FIELD));
    assert!(!doc[2].extensions().has(FIELD));

    // nothing is cached for the failed word, so it is queried again
    assert!(!annotator.cache().lock().contains("dog", SensePos::Noun));
    assert!(annotator.annotate(&mut doc).is_err());
    assert_eq!(kb.queries(), 4);
}

#[test]
fn preferred_source_restricts_senses() {
    let inventory: MemoryKnowledgeBase = vec![
        Sense::new("bn:001".into(), SensePos::Verb)
            .with_lemma(EN.clone(), "run")
            .with_source(KB.sense_source("WN").unwrap()),
        Sense::new("bn:002".into(), SensePos::Verb)
            .with_lemma(EN.clone(), "run")
            .with_source(KB.sense_source("WIKI").unwrap()),
    ]
    .into_iter()
    .collect();
    let kb = Counting::new(&inventory);

    let preferred = AnnotatorOptions {
        source: Some("wn".into()),
        ..options()
    };
    let annotator = SenseAnnotator::new(&kb, &preferred).unwrap();
    assert_eq!(annotator.lookup().source().map(|x| x.as_str()), Some("WN"));

    let mut doc: Doc = vec![Token::tagged("run", "run", UPos::Verb)].into_iter().collect();
    annotator.annotate(&mut doc).unwrap();
    assert_eq!(ids(&doc), vec![vec!["bn:001"]]);

    // without a preferred source both senses match
    let annotator = SenseAnnotator::new(&kb, &options()).unwrap();
    annotator.annotate(&mut doc).unwrap();
    assert_eq!(ids(&doc), vec![vec!["bn:001", "bn:002"]]);
    assert_eq!(kb.queries(), 2);
}

#[test]
fn cache_can_be_shared_between_annotators() {
    let kb = Counting::new(&*KB);
    let cache = SenseCache::new().shared();

    let first = SenseAnnotator::new(&kb, &options()).unwrap().with_cache(cache.clone());
    let second = SenseAnnotator::new(&kb, &options()).unwrap().with_cache(cache.clone());

    let mut doc: Doc = vec![Token::tagged("dog", "dog", UPos::Noun)].into_iter().collect();
    first.annotate(&mut doc).unwrap();
    second.annotate(&mut doc).unwrap();

    assert_eq!(kb.queries(), 1);
    assert_eq!(ids(&doc), vec![vec!["bn:003"]]);
}

#[test]
fn pipeline_annotates_conllu() {
    let text = "# text = The dog runs fast.
1\tThe\tthe\tDET\t_\t_\t_\t_\t_\t_
2\tdog\tdog\tNOUN\t_\t_\t_\t_\t_\t_
3\truns\trun\tVERB\t_\t_\t_\t_\t_\t_
4\tfast\tfast\tADJ\t_\t_\t_\t_\t_\t_
5\t.\t.\tPUNCT\t_\t_\t_\t_\t_\t_
";
    let kb = Arc::new(KB.clone());

    let mut pipeline = Pipeline::new("en", &[Property::Lemma, Property::Pos]).unwrap();
    let annotator =
        SenseAnnotator::for_pipeline(kb.clone(), &AnnotatorOptions::default(), &pipeline).unwrap();
    pipeline.add_pipe(annotator).unwrap();

    let docs = conllu::read_docs(text.as_bytes()).unwrap();
    let doc = pipeline.process(docs.into_iter().next().unwrap()).unwrap();

    assert_eq!(
        ids(&doc),
        vec![vec![], vec!["bn:003"], vec!["bn:001", "bn:002"], vec!["bn:004"], vec![]]
    );

    let annotation = doc[2].extension::<Annotation>(FIELD).unwrap();
    assert_eq!(annotation.lemmas(&*kb).unwrap(), &["run", "running"]);
}

#[test]
fn pipeline_rejects_untagged_docs() {
    let mut pipeline = Pipeline::new("en", &[Property::Lemma, Property::Pos]).unwrap();
    pipeline
        .add_pipe(SenseAnnotator::for_pipeline(Arc::new(KB.clone()), &options(), &pipeline).unwrap())
        .unwrap();

    let doc: Doc = vec![Token::new("dog")].into_iter().collect();
    assert!(matches!(
        pipeline.process(doc),
        Err(Error::Property(properties::Error::Unset(Property::Lemma)))
    ));
}

#[test]
fn pipeline_rejects_duplicate_annotators() {
    let mut pipeline = Pipeline::new("en", &[Property::Lemma, Property::Pos]).unwrap();
    pipeline
        .add_pipe(SenseAnnotator::new(Arc::new(KB.clone()), &options()).unwrap())
        .unwrap();

    assert!(matches!(
        pipeline.add_pipe(SenseAnnotator::new(Arc::new(KB.clone()), &options()).unwrap()),
        Err(properties::Error::DuplicatePipe(name)) if name == FIELD
    ));
    assert!(pipeline.remove_pipe(FIELD).is_some());
    assert_eq!(pipeline.pipe_names().count(), 0);
}

#[quickcheck]
fn unmapped_pos_is_always_empty(word: String, lemma: String, index: usize) -> bool {
    let unmapped: Vec<_> = UPos::iter().filter(|pos| map_pos(*pos).is_none()).collect();
    let pos = unmapped[index % unmapped.len()];

    let kb = Counting::new(&*KB);
    let lookup = SenseLookup::new(&kb, EN.clone());

    let ids = lookup.resolve(&Token::tagged(word, lemma, pos)).unwrap();
    ids.is_empty() && kb.queries() == 0 && lookup.cache().lock().is_empty()
}

#[quickcheck]
fn lookups_are_idempotent(word: String) -> bool {
    let kb = Counting::new(&*KB);
    let lookup = SenseLookup::new(&kb, EN.clone());

    let first = lookup.resolve_word(&word, SensePos::Verb).unwrap();
    let second = lookup.resolve_word(&word, SensePos::Verb).unwrap();

    first == second && kb.queries() == 1
}
