//! Joins the knowledge base configs in configs/ into one file so it can be inlined. These configs are included
//! at compile time because they define the names the knowledge base recognizes (languages and sense sources).
//! They are NOT user configuration.

use fs::File;
use fs_err as fs;
use std::{collections::BTreeMap, io::BufWriter, path::Path};

fn main() {
    let path = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(path).join("configs");

    let out_dir =
        std::env::var("OUT_DIR").expect("OUT_DIR env var must be set when build.rs is run");
    let out_dir = Path::new(&out_dir);

    println!("cargo:rerun-if-changed={}", path.display());

    let mut config_map: BTreeMap<String, serde_json::Value> = BTreeMap::new();

    for entry in fs::read_dir(&path).expect("must be able to read config dir") {
        let entry = entry.expect("must be able to read config dir entry");
        let entry_path = entry.path();

        println!("cargo:rerun-if-changed={}", entry_path.display());

        if entry_path.extension().map_or(false, |ext| ext == "json") {
            let name = entry_path
                .file_stem()
                .expect("config file must have name")
                .to_str()
                .expect("config file name must be unicode")
                .to_string();

            let json_str = fs::read_to_string(&entry_path)
                .unwrap_or_else(|_| panic!("{} must be readable", entry_path.display()));

            config_map.insert(
                name,
                serde_json::from_str(&json_str)
                    .unwrap_or_else(|_| panic!("{} must be valid json", entry_path.display())),
            );
        }
    }

    let config_writer = BufWriter::new(
        File::create(out_dir.join("kb_configs.json"))
            .expect("must be able to create file in out dir"),
    );
    serde_json::to_writer_pretty(config_writer, &config_map)
        .expect("must be able to write JSON to file");
}
