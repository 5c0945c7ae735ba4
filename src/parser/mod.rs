// Dump parser: extracts CREATE TABLE column lists and COPY data blocks from a
// textual pg_dump file. Everything else in the dump (sequences, indexes,
// grants, SET lines) is inert input and skipped. The logic favors speed over
// perfect SQL parsing: two fixed statement shapes, one forward pass.

pub mod escape;

use crate::logger;
use crate::BoxError;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// One column declaration, in the order it appeared in CREATE TABLE.
/// `raw_type` is the rest of the line verbatim, inline constraints included.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub raw_type: String,
}

/// One data row: column name -> decoded value, `None` for the NULL sentinel.
pub type RowRecord = HashMap<String, Option<String>>;

/// Everything extracted from one dump file. Table keys are the
/// schema-qualified names exactly as the dump spelled them (`public.users`).
#[derive(Debug, Default, serde::Serialize)]
pub struct ParsedDump {
    /// Table -> ordered column declarations. Absent for tables the dump only
    /// ever COPYed (no CREATE TABLE seen); callers must treat lookup as
    /// optional.
    pub schema: HashMap<String, Vec<ColumnDef>>,
    /// Table -> rows in dump emission order. Every table seen in a CREATE
    /// TABLE has an entry here, possibly empty.
    pub data: HashMap<String, Vec<RowRecord>>,
    /// Table -> the column order of its COPY header, since RowRecord maps are
    /// unordered.
    pub copy_columns: HashMap<String, Vec<String>>,
}

impl ParsedDump {
    /// Table names that have a schema entry, sorted for stable iteration.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schema.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.data.get(table).map(Vec::len).unwrap_or(0)
    }
}

// Tracks which block the line cursor is inside.
enum Block {
    None,
    Create { table: String, columns: Vec<ColumnDef> },
    Copy { table: String, columns: Vec<String> },
}

pub struct DumpParser {
    copy_header_re: Regex,
}

impl Default for DumpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpParser {
    // Build the COPY header regex once for reuse.
    pub fn new() -> Self {
        let copy_header_re = Regex::new(r"^COPY\s+([^\s]+)\s*\((.*)\)\s+FROM\s+stdin;\s*$")
            .expect("valid copy header regex");
        Self { copy_header_re }
    }

    /// Parse a dump file. If a progress bar is provided, it is incremented by
    /// bytes read.
    pub fn parse_file(
        &self,
        filename: &str,
        bar: Option<&indicatif::ProgressBar>,
    ) -> Result<ParsedDump, BoxError> {
        logger::debug(&format!("ParseDump: Opening file {}", filename));
        let file = File::open(filename)?;
        self.parse_reader(BufReader::new(file), bar)
    }

    /// Parse dump text from any buffered reader in a single forward pass.
    pub fn parse_reader<R: BufRead>(
        &self,
        mut reader: R,
        bar: Option<&indicatif::ProgressBar>,
    ) -> Result<ParsedDump, BoxError> {
        let mut dump = ParsedDump::default();
        let mut block = Block::None;
        let mut bytes_read: u64 = 0;
        let mut last_logged: u64 = 0;

        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            let line_len = line.len() as u64;
            bytes_read += line_len;
            if let Some(b) = bar {
                b.inc(line_len);
            } else if logger::is_debug() && bytes_read - last_logged > 100 * 1024 * 1024 {
                logger::debug(&format!("ParseDump: {} bytes read", bytes_read));
                last_logged = bytes_read;
            }

            // Keep tabs and interior whitespace; only the line ending goes.
            let content = line.trim_end_matches(['\n', '\r'].as_ref());

            block = match block {
                Block::None => self.begin_block(content, &mut dump),
                Block::Create { table, mut columns } => {
                    if content.trim_end() == ");" {
                        finish_create(table, columns, &mut dump);
                        Block::None
                    } else {
                        push_column_line(content, &mut columns);
                        Block::Create { table, columns }
                    }
                }
                Block::Copy { table, columns } => {
                    if content == "\\." {
                        logger::debug(&format!(
                            "ParseDump: table {} has {} rows",
                            table,
                            dump.row_count(&table)
                        ));
                        Block::None
                    } else {
                        push_row_line(content, &table, &columns, &mut dump);
                        Block::Copy { table, columns }
                    }
                }
            };

            line.clear();
        }

        // A block cut off by EOF is a degenerate dump; keep what we saw.
        match block {
            Block::Create { table, columns } => finish_create(table, columns, &mut dump),
            Block::Copy { table, .. } => {
                logger::debug(&format!("ParseDump: COPY block for {} unterminated", table))
            }
            Block::None => {}
        }

        if let Some(b) = bar {
            b.finish();
        }
        logger::debug(&format!(
            "ParseDump: {} tables declared, {} tables with data",
            dump.schema.len(),
            dump.data.values().filter(|rows| !rows.is_empty()).count()
        ));
        Ok(dump)
    }

    // Decide whether this line opens a recognized block. Lines that look like
    // a block header but do not match the expected shape are plain noise.
    fn begin_block(&self, content: &str, dump: &mut ParsedDump) -> Block {
        if let Some(rest) = content.strip_prefix("CREATE TABLE ") {
            let table = rest.split(" (").next().unwrap_or(rest).trim().to_string();
            logger::debug(&format!("ParseDump: Found CREATE TABLE for {}", table));
            return Block::Create {
                table,
                columns: Vec::new(),
            };
        }
        if content.starts_with("COPY ") {
            if let Some(cap) = self.copy_header_re.captures(content) {
                let table = cap[1].to_string();
                let columns: Vec<String> = cap[2]
                    .split(',')
                    .map(|c| c.trim().trim_matches('"').to_string())
                    .collect();
                logger::debug(&format!("ParseDump: Found COPY block for {}", table));
                dump.copy_columns.insert(table.clone(), columns.clone());
                return Block::Copy { table, columns };
            }
        }
        Block::None
    }
}

fn finish_create(table: String, columns: Vec<ColumnDef>, dump: &mut ParsedDump) {
    // Declared tables always get a dataset entry, even without a COPY.
    dump.data.entry(table.clone()).or_default();
    dump.schema.insert(table, columns);
}

// Column line inside CREATE TABLE: `name type [inline constraints][,]`.
// Blank lines and table-level constraint clauses carry no column information.
fn push_column_line(content: &str, columns: &mut Vec<ColumnDef>) {
    let mut l = content.trim();
    if l.is_empty()
        || l.starts_with("CONSTRAINT")
        || l.starts_with("PRIMARY KEY")
        || l.starts_with("UNIQUE")
        || l.starts_with("FOREIGN KEY")
    {
        return;
    }
    l = l.strip_suffix(',').unwrap_or(l);
    let mut parts = l.split_whitespace();
    let Some(first) = parts.next() else { return };
    let name = first.trim_matches('"').to_string();
    let raw_type = parts.collect::<Vec<_>>().join(" ");
    columns.push(ColumnDef { name, raw_type });
}

// Data row inside a COPY block: tab-separated raw fields, positionally
// aligned with the header column list.
fn push_row_line(content: &str, table: &str, columns: &[String], dump: &mut ParsedDump) {
    let row: RowRecord = columns
        .iter()
        .zip(content.split('\t'))
        .map(|(col, raw)| (col.clone(), escape::decode_field(raw)))
        .collect();
    dump.data.entry(table.to_string()).or_default().push(row);
}
