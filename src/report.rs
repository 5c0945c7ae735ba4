// Markdown rendering of the audit results. The scanner returns unordered
// sets, so sorting and truncation of evidence happen here.

use crate::audit::{SimilarPair, TableStatus};
use crate::parser::ParsedDump;
use crate::usage::UsageMap;
use std::collections::HashMap;
use std::fmt::Write as _;

const MAX_EVIDENCE: usize = 3;

/// Validation report: one row per declared table with row count, usage
/// evidence, and verdict, followed by the unused-table and similar-pair
/// sections.
pub fn render_validation(
    dump: &ParsedDump,
    usage: &UsageMap,
    migrations: Option<&HashMap<String, Vec<String>>>,
    similar: &[SimilarPair],
) -> String {
    let tables = dump.table_names();
    let mut out = String::new();

    out.push_str("# Database Table Validation\n\n");
    out.push_str("Criteria:\n");
    out.push_str("- Code references the table (textual match, coarse heuristic)\n");
    out.push_str("- The table holds rows in the dump\n");
    out.push_str("- Tables with data but no reference are flagged for manual review\n\n");

    out.push_str("## Summary\n\n");
    out.push_str("| Table | Rows (dump) | Referenced | Status | Evidence |\n");
    out.push_str("| --- | --- | --- | --- | --- |\n");
    for table in &tables {
        let rows = dump.row_count(table);
        let files = sorted_paths(usage, table);
        let status = TableStatus::classify(rows, !files.is_empty());
        let referenced = if files.is_empty() { "No" } else { "Yes" };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            table,
            rows,
            referenced,
            status,
            evidence(&files)
        );
    }
    out.push('\n');

    let unused: Vec<&String> = tables
        .iter()
        .filter(|t| usage.get(t.as_str()).map(|s| s.is_empty()).unwrap_or(true))
        .collect();
    out.push_str("## Tables with no code reference\n\n");
    if unused.is_empty() {
        out.push_str("None found.\n\n");
    } else {
        for table in unused {
            let _ = writeln!(out, "- {}", table);
        }
        out.push('\n');
    }

    out.push_str("## Possibly duplicated tables (column-set similarity)\n\n");
    if similar.is_empty() {
        out.push_str("None at the configured threshold.\n\n");
    } else {
        out.push_str("| Table A | Table B | Similarity |\n");
        out.push_str("| --- | --- | --- |\n");
        for pair in similar {
            let _ = writeln!(
                out,
                "| {} | {} | {:.0}% |",
                pair.table_a,
                pair.table_b,
                pair.similarity * 100.0
            );
        }
        out.push('\n');
    }

    if let Some(migrations) = migrations {
        out.push_str("## Migration provenance\n\n");
        out.push_str("| Table | Declared in |\n");
        out.push_str("| --- | --- |\n");
        for table in &tables {
            let declared = migrations
                .get(table)
                .map(|files| files.join(", "))
                .unwrap_or_else(|| "Unknown".to_string());
            let _ = writeln!(out, "| {} | {} |", table, declared);
        }
        out.push('\n');
    }

    out
}

/// Read/write mapping section: which files query a table and which mutate it.
pub fn render_reads_writes(tables: &[String], reads: &UsageMap, writes: &UsageMap) -> String {
    let mut out = String::new();
    out.push_str("## Read/write mapping\n\n");
    out.push_str("| Table | Reads (SELECT/FROM/JOIN) | Writes (INSERT/UPDATE/DELETE) |\n");
    out.push_str("| --- | --- | --- |\n");
    for table in tables {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            table,
            evidence(&sorted_paths(reads, table)),
            evidence(&sorted_paths(writes, table))
        );
    }
    out.push('\n');
    out
}

fn sorted_paths(map: &UsageMap, table: &str) -> Vec<String> {
    let mut paths: Vec<String> = map
        .get(table)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default();
    paths.sort();
    paths
}

fn evidence(paths: &[String]) -> String {
    if paths.is_empty() {
        return "No reference found".to_string();
    }
    let shown = paths.iter().take(MAX_EVIDENCE).cloned().collect::<Vec<_>>();
    let mut text = shown.join(", ");
    let extra = paths.len().saturating_sub(MAX_EVIDENCE);
    if extra > 0 {
        let _ = write!(text, " (+{} more)", extra);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit;
    use crate::parser::DumpParser;
    use ahash::AHashSet;
    use std::io::Cursor;

    fn sample_dump() -> ParsedDump {
        let text = concat!(
            "CREATE TABLE public.users (\n    id uuid,\n    name text\n);\n",
            "CREATE TABLE public.ghost (\n    id uuid\n);\n",
            "COPY public.users (id, name) FROM stdin;\n",
            "1\tAlice\n",
            "\\.\n",
        );
        DumpParser::new()
            .parse_reader(Cursor::new(text.to_string()), None)
            .unwrap()
    }

    #[test]
    fn validation_report_lists_statuses_and_unused() {
        let dump = sample_dump();
        let mut usage = UsageMap::new();
        let mut hit = AHashSet::new();
        hit.insert("src/api/users.ts".to_string());
        usage.insert("public.users".to_string(), hit);
        usage.insert("public.ghost".to_string(), AHashSet::new());

        let similar = audit::similar_pairs(&dump, 0.6);
        let md = render_validation(&dump, &usage, None, &similar);

        assert!(md.contains("| public.users | 1 | Yes | Keep (has data and usage) | src/api/users.ts |"));
        assert!(md.contains("| public.ghost | 0 | No | Archive candidate (no data, no usage) | No reference found |"));
        assert!(md.contains("- public.ghost"));
    }

    #[test]
    fn evidence_is_sorted_and_truncated() {
        let paths = vec![
            "a.ts".to_string(),
            "b.ts".to_string(),
            "c.ts".to_string(),
            "d.ts".to_string(),
        ];
        assert_eq!(evidence(&paths), "a.ts, b.ts, c.ts (+1 more)");
        assert_eq!(evidence(&[]), "No reference found");
    }

    #[test]
    fn reads_writes_section_shape() {
        let tables = vec!["public.users".to_string()];
        let mut reads = UsageMap::new();
        let mut writes = UsageMap::new();
        let mut r = AHashSet::new();
        r.insert("select.sql".to_string());
        reads.insert("public.users".to_string(), r);
        writes.insert("public.users".to_string(), AHashSet::new());

        let md = render_reads_writes(&tables, &reads, &writes);
        assert!(md.contains("| public.users | select.sql | No reference found |"));
    }
}
