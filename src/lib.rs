// dumpaudit: parse a textual PostgreSQL dump and cross-reference its tables
// against a source tree. The parser and scanner are the reusable core; the
// report module renders their output as Markdown for the CLI.

pub mod audit;
pub mod logger;
pub mod parser;
pub mod progress;
pub mod report;
pub mod usage;

// Shared error alias; parsing noise is recovered locally, so only I/O-level
// failures travel through this.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
