// Audit analyses over parser and scanner output: row counts, unused tables,
// column-set similarity, migration provenance, and the per-table verdict used
// by the validation report. All pure functions over already-collected data.

use crate::logger;
use crate::parser::{ColumnDef, ParsedDump};
use crate::usage::UsageMap;
use crate::BoxError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Rows per declared table (tables with only a COPY block are counted too).
pub fn row_counts(dump: &ParsedDump) -> HashMap<String, usize> {
    dump.data
        .iter()
        .map(|(table, rows)| (table.clone(), rows.len()))
        .collect()
}

/// Tables with no referencing file at all, in the order given.
pub fn unused_tables(tables: &[String], usage: &UsageMap) -> Vec<String> {
    tables
        .iter()
        .filter(|t| usage.get(t.as_str()).map(|s| s.is_empty()).unwrap_or(true))
        .cloned()
        .collect()
}

/// Jaccard similarity of two column-name sets; 0.0 when either is empty.
pub fn jaccard(a: &[ColumnDef], b: &[ColumnDef]) -> f64 {
    let sa: ahash::AHashSet<&str> = a.iter().map(|c| c.name.as_str()).collect();
    let sb: ahash::AHashSet<&str> = b.iter().map(|c| c.name.as_str()).collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    inter as f64 / union as f64
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SimilarPair {
    pub table_a: String,
    pub table_b: String,
    pub similarity: f64,
}

/// Table pairs whose column sets overlap at or above the threshold, most
/// similar first. Possible duplicates to review by hand.
pub fn similar_pairs(dump: &ParsedDump, threshold: f64) -> Vec<SimilarPair> {
    let tables = dump.table_names();
    let mut pairs = Vec::new();
    for (i, a) in tables.iter().enumerate() {
        for b in &tables[i + 1..] {
            let sim = jaccard(&dump.schema[a], &dump.schema[b]);
            if sim >= threshold {
                pairs.push(SimilarPair {
                    table_a: a.clone(),
                    table_b: b.clone(),
                    similarity: sim,
                });
            }
        }
    }
    pairs.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    logger::debug(&format!(
        "Audit: {} similar pairs at threshold {}",
        pairs.len(),
        threshold
    ));
    pairs
}

/// Which migration files declare each table, by scanning `*.sql` files in the
/// given directory for a word-bounded CREATE TABLE of that exact name.
pub fn migration_sources(
    tables: &[String],
    migrations_dir: &Path,
) -> Result<HashMap<String, Vec<String>>, BoxError> {
    let mut sources: HashMap<String, Vec<String>> = HashMap::new();
    let mut entries: Vec<_> = fs::read_dir(migrations_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("sql"))
        .collect();
    entries.sort();

    for path in entries {
        let Ok(bytes) = fs::read(&path) else { continue };
        let content = String::from_utf8_lossy(&bytes);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        for table in tables {
            let pattern = format!(r"CREATE\s+TABLE\s+{}\b", regex::escape(table));
            let re = Regex::new(&pattern).expect("valid migration pattern");
            if re.is_match(&content) {
                sources.entry(table.clone()).or_default().push(file_name.clone());
            }
        }
    }
    Ok(sources)
}

/// Validation verdict for one table, from its row count and usage evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TableStatus {
    /// Has data and code references.
    Keep,
    /// Has data but nothing in the code mentions it.
    ReviewDataNoUsage,
    /// Referenced by code but holds no rows.
    ReviewUsageNoData,
    /// No data and no references.
    ArchiveCandidate,
}

impl TableStatus {
    pub fn classify(rows: usize, referenced: bool) -> Self {
        match (rows > 0, referenced) {
            (true, true) => TableStatus::Keep,
            (true, false) => TableStatus::ReviewDataNoUsage,
            (false, true) => TableStatus::ReviewUsageNoData,
            (false, false) => TableStatus::ArchiveCandidate,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TableStatus::Keep => "Keep (has data and usage)",
            TableStatus::ReviewDataNoUsage => "Review (has data, no code reference)",
            TableStatus::ReviewUsageNoData => "Review (referenced, but no data)",
            TableStatus::ArchiveCandidate => "Archive candidate (no data, no usage)",
        };
        f.write_str(text)
    }
}
