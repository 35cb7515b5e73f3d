//! Loading of labeled trace directories.
//!
//! Every regular file in the directory is a trace file: one trace per line (a blank line is
//! the empty trace). The label comes from the file name: a file whose stem contains "ok"
//! (case-insensitive) holds accepted traces, any other file holds rejected ones.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("error reading {0}: {1}")]
    File(PathBuf, io::Error),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("no traces found in {0}")]
    EmptyDirectory(PathBuf),
}

/// One line of a trace file, still unsplit, together with its label and origin.
#[derive(Debug, Clone)]
pub struct Trace {
    pub text: String,
    pub accept: bool,
    pub file: PathBuf,
    pub line: usize,
}

/// Loads every trace of every file directly inside `dir`, in file-name order.
pub fn load_dir(dir: &Path) -> Result<Vec<Trace>, TraceError> {
    if !dir.is_dir() {
        return Err(TraceError::NotADirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| TraceError::File(dir.to_path_buf(), e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut traces = Vec::new();
    for path in files {
        let accept = accepted_by_name(&path);
        let content = fs::read_to_string(&path).map_err(|e| TraceError::File(path.clone(), e))?;
        for (index, line) in content.lines().enumerate() {
            traces.push(Trace {
                text: line.to_string(),
                accept,
                file: path.clone(),
                line: index + 1,
            });
        }
    }
    if traces.is_empty() {
        return Err(TraceError::EmptyDirectory(dir.to_path_buf()));
    }
    Ok(traces)
}

fn accepted_by_name(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_lowercase().contains("ok"))
        .unwrap_or(false)
}
