// dumpaudit CLI: parse a pg_dump file, cross-reference its tables against the
// source tree, and emit a Markdown validation report plus an optional JSON
// inventory. One linear pass, run by hand when auditing the database.

use clap::{CommandFactory, Parser};
use dumpaudit::parser::DumpParser;
use dumpaudit::usage::{UsageScanner, DEFAULT_EXTENSIONS};
use dumpaudit::{audit, logger, progress, report, BoxError};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

// Command-line flags and positional arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Enable debug logging (disables progress bars).
    #[arg(long)]
    debug: bool,

    /// Source file extensions to scan (default: ts, tsx, js, sql).
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Directory of migration *.sql files to attribute tables to.
    #[arg(long)]
    migrations: Option<String>,

    /// Column-set similarity threshold for the duplicate-table section.
    #[arg(long, default_value_t = 0.6)]
    similar_threshold: f64,

    /// Also emit the read/write verb mapping section.
    #[arg(long)]
    reads_writes: bool,

    /// Scanner worker threads (0 = num CPU).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Write a machine-readable inventory JSON to this path.
    #[arg(long)]
    json: Option<String>,

    /// Output Markdown file (optional). If omitted, prints to stdout.
    #[arg(short, long)]
    output: Option<String>,

    /// Dump file path.
    dump: String,

    /// Source roots to scan (directories or single files).
    #[arg(required = true)]
    roots: Vec<String>,
}

fn main() -> Result<(), BoxError> {
    if std::env::args().len() == 1 {
        Args::command().print_help()?;
        eprintln!();
        std::process::exit(1);
    }
    let args = Args::parse();

    logger::set_debug(args.debug);
    logger::debug("main: Starting dump audit");
    logger::debug(&format!("main: Dump file: {}", args.dump));
    logger::debug(&format!("main: Source roots: {:?}", args.roots));

    // Missing inputs are the only fatal condition; check before any parsing.
    if !Path::new(&args.dump).exists() {
        logger::error(&format!("Dump not found: {}", args.dump));
        return Err(format!("Dump not found: {}", args.dump).into());
    }
    for root in &args.roots {
        if !Path::new(root).exists() {
            logger::error(&format!("Source root not found: {}", root));
            return Err(format!("Source root not found: {}", root).into());
        }
    }

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .map_err(|e| format!("failed to build thread pool: {}", e))?;
    }

    // Progress bars are disabled in debug mode to avoid mangled output.
    let progress = progress::ProgressManager::new(!args.debug);

    let parser = DumpParser::new();
    let parse_bar = progress.new_file_bar(&args.dump, &format!("Parsing {}", basename(&args.dump)));
    let dump = parser.parse_file(&args.dump, parse_bar.as_ref())?;
    let tables = dump.table_names();

    let extensions = if args.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        args.extensions.clone()
    };
    let scanner = UsageScanner::new(args.roots.clone(), extensions);

    let scan_bar = progress.new_scan_bar(0);
    let usage = scanner.scan(&tables, scan_bar.as_ref());

    let reads_writes = if args.reads_writes {
        let rw_bar = progress.new_scan_bar(0);
        Some(scanner.scan_reads_writes(&tables, rw_bar.as_ref()))
    } else {
        None
    };

    let similar = audit::similar_pairs(&dump, args.similar_threshold);
    let migrations = match args.migrations.as_deref() {
        Some(dir) => Some(audit::migration_sources(&tables, Path::new(dir))?),
        None => None,
    };

    let mut markdown = report::render_validation(&dump, &usage, migrations.as_ref(), &similar);
    if let Some((reads, writes)) = &reads_writes {
        markdown.push_str(&report::render_reads_writes(&tables, reads, writes));
    }

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(markdown.as_bytes())?;
            logger::debug(&format!("main: Report written to {}", path));
        }
        None => {
            io::stdout().write_all(markdown.as_bytes())?;
        }
    }

    if let Some(path) = args.json.as_ref() {
        let counts = audit::row_counts(&dump);
        let inventory = serde_json::json!({
            "dump": args.dump,
            "tables": tables.iter().map(|t| {
                let mut files: Vec<String> = usage
                    .get(t)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default();
                files.sort();
                serde_json::json!({
                    "name": t,
                    "rows": counts.get(t).copied().unwrap_or(0),
                    "columns": dump.schema.get(t),
                    "copy_columns": dump.copy_columns.get(t),
                    "status": audit::TableStatus::classify(
                        counts.get(t).copied().unwrap_or(0),
                        !files.is_empty(),
                    ),
                    "files": files,
                })
            }).collect::<Vec<_>>(),
            "unused": audit::unused_tables(&tables, &usage),
            "similar_pairs": similar,
        });
        std::fs::write(path, serde_json::to_string_pretty(&inventory)?)?;
        logger::debug(&format!("main: Inventory written to {}", path));
    }

    // Summary to stderr so it never mixes with a stdout report.
    let total_rows: usize = tables.iter().map(|t| dump.row_count(t)).sum();
    let referenced = tables
        .iter()
        .filter(|t| usage.get(t.as_str()).map(|s| !s.is_empty()).unwrap_or(false))
        .count();
    let sep = "=".repeat(60);
    {
        let mut stderr = io::stderr();
        writeln!(stderr, "\n{}\nSUMMARY\n{}", sep, sep)?;
        writeln!(stderr, "Tables:      {}", tables.len())?;
        writeln!(stderr, "Rows:        {}", total_rows)?;
        writeln!(stderr, "Referenced:  {}", referenced)?;
        writeln!(stderr, "Unreferenced: {}", tables.len() - referenced)?;
        writeln!(stderr, "{}", sep)?;
    }

    logger::debug("main: Audit complete");
    Ok(())
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
