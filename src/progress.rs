// Progress bar management using indicatif. All bars live under one
// MultiProgress so they render on separate lines; when disabled (debug mode)
// every constructor returns None and callers pass the Option straight through.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProgressManager {
    multi: Option<Arc<MultiProgress>>,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        let multi = if enabled {
            Some(Arc::new(MultiProgress::new()))
        } else {
            None
        };
        Self { multi }
    }

    // Byte-progress bar for parsing one dump file.
    pub fn new_file_bar(&self, path: &str, label: &str) -> Option<ProgressBar> {
        let mp = self.multi.as_ref()?;
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let bar = mp.add(ProgressBar::new(size));
        bar.set_style(byte_style());
        bar.set_prefix(label.to_string());
        Some(bar)
    }

    // Count bar over the files visited by the usage scan.
    pub fn new_scan_bar(&self, total: u64) -> Option<ProgressBar> {
        let mp = self.multi.as_ref()?;
        let bar = mp.add(ProgressBar::new(total));
        bar.set_style(count_style());
        bar.set_prefix("Scanning sources".to_string());
        Some(bar)
    }
}

fn byte_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:20} {bytes:>10}/{total_bytes:<10} [{bar:67}] {percent:>3}%",
    )
    .expect("valid byte bar template")
    .progress_chars("█ ")
}

fn count_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:20} {pos:>5}/{len:<5} [{bar:67}] {percent:>3}%",
    )
    .expect("valid count bar template")
    .progress_chars("█ ")
}
