//! Run summary counters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one pipeline run. Each count is independently meaningful.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Product URLs found by discovery (or supplied explicitly)
    pub discovered: usize,
    /// Products the adapter returned successfully
    pub scraped: usize,
    /// Products with no colors, nothing to persist
    pub skipped: usize,
    /// Products whose page no longer exists
    pub not_found: usize,
    /// Variant keys produced by expansion
    pub variants: usize,
    /// Variants already present in the catalog
    pub skipped_existing: usize,
    pub inserted: usize,
    pub images_uploaded: usize,
    /// Product, variant and image failures
    pub errors: usize,
    /// Tracker failures, which never affect the catalog
    pub tracker_errors: usize,
}

impl RunSummary {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            started_at: Utc::now(),
            finished_at: None,
            discovered: 0,
            scraped: 0,
            skipped: 0,
            not_found: 0,
            variants: 0,
            skipped_existing: 0,
            inserted: 0,
            images_uploaded: 0,
            errors: 0,
            tracker_errors: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn items(&self) -> [(&'static str, usize); 10] {
        [
            ("Discovered", self.discovered),
            ("Scraped", self.scraped),
            ("Skipped (no colors)", self.skipped),
            ("Not found", self.not_found),
            ("Variants", self.variants),
            ("Skipped (existing)", self.skipped_existing),
            ("Inserted", self.inserted),
            ("Images uploaded", self.images_uploaded),
            ("Errors", self.errors),
            ("Tracker errors", self.tracker_errors),
        ]
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "─".repeat(60))?;
        writeln!(
            f,
            "[SUMMARY] {} ({:.1}s)",
            self.source,
            self.elapsed_secs()
        )?;
        for (key, value) in self.items() {
            writeln!(f, "    {key}: {value}")?;
        }
        write!(f, "{}", "─".repeat(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_counter() {
        let mut summary = RunSummary::new("acme");
        summary.inserted = 4;
        summary.skipped_existing = 2;
        summary.finish();

        let text = summary.to_string();
        assert!(text.contains("[SUMMARY] acme"));
        assert!(text.contains("Inserted: 4"));
        assert!(text.contains("Skipped (existing): 2"));
        assert!(text.contains("Tracker errors: 0"));
    }
}
