//! Persistence for preprocessed PPR vectors.
//!
//! Records are grouped by namespace (one per algorithm + parameters) and keyed by
//! source node id. The text format is one `<nodeId>\t<score>` pair per line; scores are
//! written with Rust's shortest round-trip float formatting, so a write followed by a
//! read returns the same values.

use crate::graph::NodeId;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub trait PprStore {
    fn write(&mut self, namespace: &str, key: NodeId, entries: &[(NodeId, f64)]) -> Result<()>;

    /// `Ok(None)` when no record exists for `key`.
    fn read(&self, namespace: &str, key: NodeId) -> Result<Option<Vec<(NodeId, f64)>>>;

    /// Total stored bytes under `namespace`.
    fn size_of(&self, namespace: &str) -> Result<u64>;

    /// Remove every record under `namespace`. Removing a missing namespace is not an error.
    fn delete(&mut self, namespace: &str) -> Result<()>;
}

impl<S: PprStore + ?Sized> PprStore for &mut S {
    fn write(&mut self, namespace: &str, key: NodeId, entries: &[(NodeId, f64)]) -> Result<()> {
        (**self).write(namespace, key, entries)
    }
    fn read(&self, namespace: &str, key: NodeId) -> Result<Option<Vec<(NodeId, f64)>>> {
        (**self).read(namespace, key)
    }
    fn size_of(&self, namespace: &str) -> Result<u64> {
        (**self).size_of(namespace)
    }
    fn delete(&mut self, namespace: &str) -> Result<()> {
        (**self).delete(namespace)
    }
}

fn write_entries<W: Write>(mut w: W, entries: &[(NodeId, f64)]) -> io::Result<()> {
    for &(id, score) in entries {
        writeln!(w, "{id}\t{score}")?;
    }
    w.flush()
}

fn parse_line(key: &str, line: &str) -> Result<(NodeId, f64)> {
    let corrupt = || Error::Corrupt { key: key.to_string(), line: line.to_string() };
    let (id, score) = line.split_once('\t').ok_or_else(corrupt)?;
    let id = id.trim().parse::<NodeId>().map_err(|_| corrupt())?;
    let score = score.trim().parse::<f64>().map_err(|_| corrupt())?;
    Ok((id, score))
}

/// One text file per record: `<root>/<namespace>/<key>.txt`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    fn path(&self, namespace: &str, key: NodeId) -> PathBuf {
        self.dir(namespace).join(format!("{key}.txt"))
    }
}

fn persistence(path: &Path, source: io::Error) -> Error {
    Error::Persistence { key: path.display().to_string(), source }
}

/// Fill a sibling `.tmp` file and rename it over `path` once `fill` succeeds.
///
/// On failure the temporary file is removed and `path` keeps whatever it held before,
/// so a reader never sees a partially written record.
fn replace_file<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let tmp = path.with_extension("txt.tmp");
    let written = File::create(&tmp).and_then(|file| {
        let mut w = BufWriter::new(file);
        fill(&mut w)?;
        w.flush()
    });
    match written.and_then(|()| fs::rename(&tmp, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

impl PprStore for DirStore {
    fn write(&mut self, namespace: &str, key: NodeId, entries: &[(NodeId, f64)]) -> Result<()> {
        let dir = self.dir(namespace);
        fs::create_dir_all(&dir).map_err(|e| persistence(&dir, e))?;
        let path = self.path(namespace, key);
        replace_file(&path, |w| write_entries(w, entries)).map_err(|e| persistence(&path, e))
    }

    fn read(&self, namespace: &str, key: NodeId) -> Result<Option<Vec<(NodeId, f64)>>> {
        let path = self.path(namespace, key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(persistence(&path, e)),
        };
        let label = path.display().to_string();
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| persistence(&path, e))?;
            if line.is_empty() {
                continue;
            }
            entries.push(parse_line(&label, &line)?);
        }
        Ok(Some(entries))
    }

    fn size_of(&self, namespace: &str) -> Result<u64> {
        let dir = self.dir(namespace);
        if !dir.exists() {
            return Ok(0);
        }
        let mut total = 0u64;
        for entry in walkdir::WalkDir::new(&dir) {
            let entry = entry.map_err(|e| {
                let source = e.into_io_error().unwrap_or_else(|| io::Error::other("walk failed"));
                persistence(&dir, source)
            })?;
            if entry.file_type().is_file() {
                total += entry.metadata().map_err(|e| persistence(entry.path(), e.into()))?.len();
            }
        }
        Ok(total)
    }

    fn delete(&mut self, namespace: &str) -> Result<()> {
        let dir = self.dir(namespace);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence(&dir, e)),
        }
    }
}

/// In-memory store holding the same text encoding as [`DirStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, HashMap<NodeId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, namespace: &str) -> usize {
        self.records.get(namespace).map_or(0, HashMap::len)
    }
}

impl PprStore for MemoryStore {
    fn write(&mut self, namespace: &str, key: NodeId, entries: &[(NodeId, f64)]) -> Result<()> {
        let mut buf = Vec::new();
        write_entries(&mut buf, entries).map_err(|e| Error::Persistence { key: format!("{namespace}/{key}"), source: e })?;
        // `write_entries` only emits ASCII.
        let text = String::from_utf8_lossy(&buf).into_owned();
        self.records.entry(namespace.to_string()).or_default().insert(key, text);
        Ok(())
    }

    fn read(&self, namespace: &str, key: NodeId) -> Result<Option<Vec<(NodeId, f64)>>> {
        let Some(text) = self.records.get(namespace).and_then(|r| r.get(&key)) else {
            return Ok(None);
        };
        let label = format!("{namespace}/{key}");
        text.lines()
            .filter(|l| !l.is_empty())
            .map(|l| parse_line(&label, l))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn size_of(&self, namespace: &str) -> Result<u64> {
        Ok(self.records.get(namespace).map_or(0, |r| r.values().map(|t| t.len() as u64).sum()))
    }

    fn delete(&mut self, namespace: &str) -> Result<()> {
        self.records.remove(namespace);
        Ok(())
    }
}
