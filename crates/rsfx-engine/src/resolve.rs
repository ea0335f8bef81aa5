//! Case-insensitive path resolution for imports.
//!
//! Scripts are written on case-insensitive filesystems and imported on
//! case-sensitive ones, so every existence probe here tolerates case
//! mismatches per path component.

use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a case-insensitive existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseResolution {
    /// No file matches, even ignoring case.
    NotFound,
    /// The path exists exactly as spelled.
    Exact(PathBuf),
    /// A file exists whose components match ignoring case.
    Inexact(PathBuf),
}

impl CaseResolution {
    /// The resolved path, if any.
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            CaseResolution::NotFound => None,
            CaseResolution::Exact(p) | CaseResolution::Inexact(p) => Some(p),
        }
    }
}

/// Probe `base/relative` for existence, matching each component of
/// `relative` case-insensitively against actual directory entries.
pub fn case_resolve(base: &Path, relative: &str) -> CaseResolution {
    // Scripts written on Windows spell imports with backslashes.
    let components: Vec<&str> = relative
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    if components.is_empty() {
        return CaseResolution::NotFound;
    }

    let exact: PathBuf = components.iter().fold(base.to_path_buf(), |p, c| p.join(c));
    if exact.exists() {
        return CaseResolution::Exact(exact);
    }

    let mut resolved = base.to_path_buf();
    for component in &components {
        let next = resolved.join(component);
        if next.exists() {
            resolved = next;
            continue;
        }
        let Ok(entries) = fs::read_dir(&resolved) else {
            return CaseResolution::NotFound;
        };
        let mut found = None;
        for entry in entries.flatten() {
            if entry.file_name().eq_ignore_ascii_case(component) {
                found = Some(entry.path());
                break;
            }
        }
        match found {
            Some(path) => resolved = path,
            None => return CaseResolution::NotFound,
        }
    }
    CaseResolution::Inexact(resolved)
}

/// Resolve an import name against an ordered set of search roots.
///
/// Each root is probed directly first, then its subdirectories are walked
/// recursively in directory-entry order, first match wins. The traversal
/// order within one directory is platform-defined; with unambiguous script
/// layouts this does not matter in practice.
pub fn resolve_import_path(name: &str, roots: &[&Path]) -> Option<PathBuf> {
    for root in roots {
        if let Some(path) = case_resolve(root, name).into_path() {
            return Some(path);
        }
    }
    for root in roots {
        if let Some(path) = search_subdirectories(root, name) {
            return Some(path);
        }
    }
    None
}

fn search_subdirectories(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(found) = case_resolve(&path, name).into_path() {
            return Some(found);
        }
        if let Some(found) = search_subdirectories(&path, name) {
            return Some(found);
        }
    }
    None
}
