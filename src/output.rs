use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn temp_with(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    Ok(tmp)
}

/// Write `bytes` to `path` via a temp file in the same directory and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;
    temp_with(&dir, bytes)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Output files of one run, held as temp files until [`commit`](Self::commit).
///
/// Either every staged file lands in the output directory or none of them does.
/// Dropping an uncommitted set removes its temp files.
pub struct StagedWrites {
    dir: PathBuf,
    titles: Vec<String>,
    files: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedWrites {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            titles: Vec::new(),
            files: Vec::new(),
        })
    }

    /// Stage a single file named `name` in the output directory.
    pub fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.dir.join(name);
        self.files.push((temp_with(&self.dir, bytes)?, target.clone()));
        Ok(target)
    }

    /// Stage `<title>.<ext>` for every artifact. On commit, other leftovers of `title` are removed.
    pub fn stage_artifacts(&mut self, title: &str, artifacts: &[(&str, Vec<u8>)]) -> Result<Vec<PathBuf>> {
        let mut targets = Vec::new();
        for (ext, bytes) in artifacts {
            targets.push(self.stage(&format!("{title}.{ext}"), bytes)?);
        }
        self.titles.push(title.to_string());
        Ok(targets)
    }

    /// Move every staged file into place. If one fails, the ones already moved are removed again.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut written: Vec<PathBuf> = Vec::new();
        for (tmp, target) in self.files {
            if let Err(e) = tmp.persist(&target) {
                for path in &written {
                    let _ = std::fs::remove_file(path);
                }
                debug!("Rolled back {} files after failing on {}", written.len(), target.display());
                return Err(e.error.into());
            }
            written.push(target);
        }
        for title in &self.titles {
            purge_stale(&self.dir, title, &written)?;
        }
        Ok(written)
    }
}

/// Remove files named `<title>.<ext>` from earlier runs that this run did not rewrite.
fn purge_stale(dir: &Path, title: &str, keep: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let prefix = format!("{title}.");
    let mut removed = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_artifact = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix));
        if is_artifact && path.is_file() && !keep.contains(&path) {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

pub fn print_artifacts(paths: &[PathBuf]) {
    let mut table = Table::new();
    table.set_header(vec!["Datei", "Bytes"]);
    for p in paths {
        let size = std::fs::metadata(p).map(|m| m.len()).unwrap_or(0);
        table.add_row(vec![Cell::new(p.display()), Cell::new(size)]);
    }
    println!("{}\n{table}", "Neu erstellt".green().bold());
}
