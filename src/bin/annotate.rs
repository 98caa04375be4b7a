use babelnet_annotator::{
    annotator::{Annotation, AnnotatorOptions, SenseAnnotator, FIELD},
    cache::SenseCache,
    conllu,
    kb::{KnowledgeBase, MemoryKnowledgeBase},
    properties::{Pipeline, Property},
    Error,
};
use clap::Parser;
use directories::ProjectDirs;
use fs_err::File;
use log::{info, warn};
use serde_json::json;
use std::{
    io::{self, BufReader, BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

/// Annotates the tokens of a CoNLL-U file with word senses and prints one JSON object per token.
#[derive(Parser)]
#[clap(
    version = "1.0",
    author = "Benjamin Minixhofer <bminixhofer@gmail.com>"
)]
struct Opts {
    /// CoNLL-U file with lemmas and universal part-of-speech tags.
    input: PathBuf,
    /// JSON sense inventory to look senses up in.
    #[clap(long, short, required_unless_present = "key")]
    inventory: Option<PathBuf>,
    /// BabelNet API key. Senses are looked up remotely if set.
    #[clap(long, short)]
    key: Option<String>,
    /// ISO-639-1 code of the document language.
    #[clap(long, short, default_value = "en")]
    lang: String,
    /// Preferred sense source e.g. WN.
    #[clap(long, short)]
    source: Option<String>,
    /// Cache file to load before and dump after annotating. Defaults to the user cache directory.
    #[clap(long, short)]
    cache: Option<PathBuf>,
    /// Also print the lemmas of all senses.
    #[clap(long)]
    lemmas: bool,
}

fn knowledge_base(opts: &Opts) -> Result<Arc<dyn KnowledgeBase + Send + Sync>, Error> {
    if let Some(path) = &opts.inventory {
        let kb = MemoryKnowledgeBase::from_json(BufReader::new(File::open(path)?))?;
        info!("Loaded {} senses from {}.", kb.len(), path.display());
        return Ok(Arc::new(kb));
    }

    remote(opts)
}

#[cfg(feature = "remote")]
fn remote(opts: &Opts) -> Result<Arc<dyn KnowledgeBase + Send + Sync>, Error> {
    use babelnet_annotator::kb::{HttpKnowledgeBase, HttpOptions};

    let options = HttpOptions {
        key: opts.key.clone().unwrap_or_default(),
        target_languages: vec![opts.lang.clone()],
        ..HttpOptions::default()
    };
    Ok(Arc::new(HttpKnowledgeBase::new(options)?))
}

#[cfg(not(feature = "remote"))]
fn remote(_opts: &Opts) -> Result<Arc<dyn KnowledgeBase + Send + Sync>, Error> {
    Err(babelnet_annotator::kb::Error::Unavailable(
        "remote lookups require the `remote` feature, pass an --inventory instead".into(),
    )
    .into())
}

fn cache_path(opts: &Opts) -> Option<PathBuf> {
    opts.cache.clone().or_else(|| {
        ProjectDirs::from("", "", "babelnet_annotator").map(|dirs| dirs.cache_dir().join("senses.json"))
    })
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let kb = knowledge_base(&opts)?;

    let cache_path = cache_path(&opts);
    let cache = match &cache_path {
        Some(path) if path.exists() => SenseCache::from_path(path)?,
        _ => SenseCache::new(),
    }
    .shared();

    let mut pipeline = Pipeline::new(&opts.lang, &[Property::Lemma, Property::Pos])?;
    let options = AnnotatorOptions {
        lang: None,
        source: opts.source.clone(),
    };
    let annotator = SenseAnnotator::for_pipeline(kb.clone(), &options, &pipeline)?.with_cache(cache.clone());
    pipeline.add_pipe(annotator)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    for (i, doc) in conllu::from_path(&opts.input)?.enumerate() {
        let doc = pipeline.process(doc?)?;

        for token in doc.iter() {
            let annotation = match token.extension::<Annotation>(FIELD) {
                Some(annotation) => annotation,
                None => {
                    warn!("Token '{}' of sentence {} is not annotated.", token.text(), i);
                    continue;
                }
            };

            let mut value = json!({
                "sentence": i,
                "text": token.text(),
                "lemma": token.lemma(),
                "pos": token.pos().map(|x| x.as_str()),
                "ids": annotation.ids(),
            });
            if opts.lemmas {
                value["lemmas"] = json!(annotation.lemmas(&*kb)?);
            }

            serde_json::to_writer(&mut writer, &value)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;

    if let Some(path) = cache_path {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        cache.lock().dump(&path)?;
    }

    Ok(())
}
