//! Path resolution for source and destination files

use crate::error::Result;
use clap::ValueEnum;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// How `--source-file-name` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchType {
    #[default]
    #[value(name = "exact_match")]
    ExactMatch,
    #[value(name = "regex_match")]
    RegexMatch,
}

/// Lexically normalize a path: collapse repeated separators, drop `.`
/// segments and fold `..` into its parent where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Join folder and file with exactly one separator. A rooted `file` stays
/// inside `folder`.
pub fn combine(folder: &str, file: &str) -> PathBuf {
    if folder.is_empty() {
        normalize(Path::new(file))
    } else {
        normalize(Path::new(&format!("{}/{}", folder, file)))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Recursively list regular files under `folder` (or the working directory
/// when `folder` is empty), as absolute paths in walk order. Hidden entries
/// are skipped and symlinks are followed.
pub fn list_files(folder: &str) -> Result<Vec<PathBuf>> {
    let root = std::env::current_dir()?.join(folder);
    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(normalize(entry.path()));
        }
    }
    debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}

/// Keep the paths whose string form contains a match for `pattern`.
pub fn filter_by_pattern(paths: &[PathBuf], pattern: &Regex) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| pattern.is_match(&path.to_string_lossy()))
        .cloned()
        .collect()
}

/// Expand the source flags into the list of files to import.
pub fn resolve_sources(folder: &str, file_name: &str, match_type: MatchType) -> Result<Vec<PathBuf>> {
    match match_type {
        MatchType::ExactMatch => Ok(vec![combine(folder, file_name)]),
        MatchType::RegexMatch => {
            let pattern = Regex::new(file_name)?;
            let files = list_files(folder)?;
            Ok(filter_by_pattern(&files, &pattern))
        }
    }
}
