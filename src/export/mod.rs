//! Persisted search results: a JSON array of derivation trees in the `{name, children?,
//! highlight?}` shape front-ends consume.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::tree::DerivationTree;
use crate::error::SearchError;

/// Write `trees` to `path` as pretty JSON. An existing file is only replaced with `force`.
pub fn write_trees(path: &Path, trees: &[DerivationTree], force: bool) -> Result<(), SearchError> {
    if path.exists() && !force {
        return Err(SearchError::Io {
            stage: "trees_export_create",
            path: path.display().to_string(),
            error: "output file already exists (use --force to overwrite)".to_string(),
        });
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| SearchError::Io {
            stage: "trees_export_create_dir",
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;
    }

    let f = fs::File::create(path).map_err(|e| SearchError::Io {
        stage: "trees_export_create",
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, trees).map_err(|e| SearchError::Io {
        stage: "trees_export_serialize",
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    w.write_all(b"\n")
        .and_then(|_| w.flush())
        .map_err(|e| SearchError::Io {
            stage: "trees_export_flush",
            path: path.display().to_string(),
            error: e.to_string(),
        })
}

pub fn read_trees(path: &Path) -> Result<Vec<DerivationTree>, SearchError> {
    let f = fs::File::open(path).map_err(|e| SearchError::Io {
        stage: "trees_load_open",
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| SearchError::Io {
        stage: "trees_load_parse",
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// Compact single-line JSON, as sent to a client.
pub fn trees_to_json(trees: &[DerivationTree]) -> Result<String, SearchError> {
    serde_json::to_string(trees).map_err(|e| SearchError::Json {
        stage: "trees_serialize",
        error: e.to_string(),
    })
}
