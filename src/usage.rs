// Usage scanner: walks source roots and records which files mention which
// tables. Matching is a literal substring test (or SQL-verb regexes for the
// read/write variant) — a deliberately coarse audit heuristic that tolerates
// false positives from comments and strings and misses dynamically built
// names. It is an aid for manual review, not a dependency graph.

use crate::logger;
use ahash::AHashSet;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Table name -> set of referencing file paths. Every requested table has an
/// entry; unreferenced tables map to an empty set. Sets carry no ordering;
/// callers wanting deterministic output sort themselves.
pub type UsageMap = HashMap<String, AHashSet<String>>;

/// Source extensions the original audit scripts looked at.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "sql"];

pub struct UsageScanner {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl UsageScanner {
    /// Roots may be directories or single files (e.g. a top-level server.js).
    pub fn new<P: Into<PathBuf>>(roots: Vec<P>, extensions: Vec<String>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extensions,
        }
    }

    pub fn with_default_extensions<P: Into<PathBuf>>(roots: Vec<P>) -> Self {
        Self::new(
            roots,
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        )
    }

    /// Enumerate candidate files under the roots. Walk errors (permissions,
    /// dangling links) are skipped, not fatal.
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in &self.roots {
            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                if self.matches_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        }
        logger::debug(&format!(
            "Scan: {} candidate files under {} roots",
            files.len(),
            self.roots.len()
        ));
        files
    }

    /// Plain usage scan: a file references a table if the table name appears
    /// anywhere in its text as a literal substring.
    pub fn scan(
        &self,
        tables: &[String],
        bar: Option<&indicatif::ProgressBar>,
    ) -> UsageMap {
        let files = self.collect_files();
        if let Some(b) = bar {
            b.set_length(files.len() as u64);
        }

        // Fan out per file, fan in with a merge; file scans are independent.
        let per_file: Vec<Vec<usize>> = files
            .par_iter()
            .map(|path| {
                let hits = match read_lossy(path) {
                    Some(content) => tables
                        .iter()
                        .enumerate()
                        .filter(|(_, name)| content.contains(name.as_str()))
                        .map(|(idx, _)| idx)
                        .collect(),
                    None => Vec::new(),
                };
                if let Some(b) = bar {
                    b.inc(1);
                }
                hits
            })
            .collect();

        if let Some(b) = bar {
            b.finish();
        }

        let mut usage = empty_map(tables);
        for (path, hits) in files.iter().zip(per_file) {
            for idx in hits {
                if let Some(set) = usage.get_mut(&tables[idx]) {
                    set.insert(path.display().to_string());
                }
            }
        }
        usage
    }

    /// SQL-verb-aware variant: returns (reads, writes). A file is a write
    /// reference when a mutation verb immediately precedes the table name,
    /// a read reference when a query verb does; it can be both.
    pub fn scan_reads_writes(
        &self,
        tables: &[String],
        bar: Option<&indicatif::ProgressBar>,
    ) -> (UsageMap, UsageMap) {
        let patterns: Vec<VerbPatterns> = tables.iter().map(|t| VerbPatterns::new(t)).collect();
        let files = self.collect_files();
        if let Some(b) = bar {
            b.set_length(files.len() as u64);
        }

        let per_file: Vec<Vec<(usize, bool, bool)>> = files
            .par_iter()
            .map(|path| {
                let hits = match read_lossy(path) {
                    Some(content) => patterns
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| content.contains(p.table.as_str()))
                        .map(|(idx, p)| {
                            (idx, p.read.is_match(&content), p.write.is_match(&content))
                        })
                        .filter(|(_, r, w)| *r || *w)
                        .collect(),
                    None => Vec::new(),
                };
                if let Some(b) = bar {
                    b.inc(1);
                }
                hits
            })
            .collect();

        if let Some(b) = bar {
            b.finish();
        }

        let mut reads = empty_map(tables);
        let mut writes = empty_map(tables);
        for (path, hits) in files.iter().zip(per_file) {
            for (idx, is_read, is_write) in hits {
                let shown = path.display().to_string();
                if is_read {
                    if let Some(set) = reads.get_mut(&tables[idx]) {
                        set.insert(shown.clone());
                    }
                }
                if is_write {
                    if let Some(set) = writes.get_mut(&tables[idx]) {
                        set.insert(shown);
                    }
                }
            }
        }
        (reads, writes)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|want| want == ext))
            .unwrap_or(false)
    }
}

// Per-table verb regexes, compiled once per scan.
struct VerbPatterns {
    table: String,
    read: Regex,
    write: Regex,
}

impl VerbPatterns {
    fn new(table: &str) -> Self {
        let escaped = regex::escape(table);
        let write = Regex::new(&format!(
            r"(?i)(INSERT\s+INTO|UPDATE|DELETE\s+FROM)\s+{}",
            escaped
        ))
        .expect("valid write pattern");
        let read = Regex::new(&format!(r"(?i)(SELECT|FROM|JOIN)\s+{}", escaped))
            .expect("valid read pattern");
        Self {
            table: table.to_string(),
            read,
            write,
        }
    }
}

// Read a file as text, substituting undecodable bytes. Unreadable files are
// skipped from the scan rather than failing it.
fn read_lossy(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            logger::debug(&format!("Scan: skipping {}: {}", path.display(), e));
            None
        }
    }
}

fn empty_map(tables: &[String]) -> UsageMap {
    tables
        .iter()
        .map(|t| (t.clone(), AHashSet::new()))
        .collect()
}
