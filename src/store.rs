//! Collection persistence: read a collection, write a collection.
//!
//! Every write replaces the whole collection. [`JsonStore`] keeps one
//! pretty-printed JSON file per collection under a data directory;
//! [`MemoryStore`] keeps them in a map for tests and embedding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

/// The collections produced by a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Discoveries,
    Features,
    Scores,
    Approved,
    Stats,
}

impl Collection {
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Discoveries => "discoveries.json",
            Collection::Features => "extracted_features.json",
            Collection::Scores => "quality_scores.json",
            Collection::Approved => "approved_loops.json",
            Collection::Stats => "pipeline_stats.json",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Persistence seam used by the pipeline.
pub trait Store: Send + Sync {
    /// Read a whole collection. Errors when it has never been written.
    fn read(&self, collection: Collection) -> anyhow::Result<Value>;

    /// Replace a whole collection.
    fn write(&self, collection: Collection, value: &Value) -> anyhow::Result<()>;
}

/// Serialize and write a collection.
pub fn write_collection<T: Serialize + ?Sized>(
    store: &dyn Store,
    collection: Collection,
    items: &T,
) -> anyhow::Result<()> {
    let value = serde_json::to_value(items)
        .with_context(|| format!("serializing {}", collection))?;
    store.write(collection, &value)
}

/// Read a collection that holds a JSON array.
pub fn read_records(store: &dyn Store, collection: Collection) -> anyhow::Result<Vec<Value>> {
    match store.read(collection)? {
        Value::Array(items) => Ok(items),
        other => anyhow::bail!(
            "{} must contain a JSON array, found {}",
            collection,
            json_kind(&other)
        ),
    }
}

/// Read a JSON array of records from a file.
pub fn read_records_file(path: &Path) -> anyhow::Result<Vec<Value>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Array(items) => Ok(items),
        other => anyhow::bail!(
            "{} must contain a JSON array, found {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

/// Write a value as pretty-printed JSON, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One JSON file per collection under a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }
}

impl Store for JsonStore {
    fn read(&self, collection: Collection) -> anyhow::Result<Value> {
        let path = self.path(collection);
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn write(&self, collection: Collection, value: &Value) -> anyhow::Result<()> {
        write_json_file(&self.path(collection), value)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, collection: Collection) -> anyhow::Result<Value> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        collections
            .get(&collection)
            .cloned()
            .with_context(|| format!("{} has not been written", collection))
    }

    fn write(&self, collection: Collection, value: &Value) -> anyhow::Result<()> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        collections.insert(collection, value.clone());
        Ok(())
    }
}
