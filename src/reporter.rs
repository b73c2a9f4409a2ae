//! Progress reporting: throttled `eprintln!` of running totals, plus a
//! final wall-clock-stamped summary (ambient concern — see SPEC_FULL.md §3,
//! "matches the teacher: no external logging crate", grounded on the
//! teacher's `reporter.rs`).

use std::time::{Duration, Instant};

use chrono::Local;
use num_format::{Locale, ToFormattedString};

/// Prints a progress line at most once per [`Reporter::THROTTLE`], then a
/// final untimed summary on [`Reporter::finish`]. Silent unless `verbose`
/// (spec.md §6 `-O`) is set.
pub struct Reporter {
    verbose: bool,
    started: Instant,
    last_report: Instant,
}

impl Reporter {
    const THROTTLE: Duration = Duration::from_secs(2);

    pub fn new(verbose: bool) -> Self {
        let now = Instant::now();
        Self {
            verbose,
            started: now,
            last_report: now,
        }
    }

    /// Called by the driver after each chunk completes; only actually prints
    /// if `verbose` and the throttle interval has elapsed.
    pub fn progress(&mut self, n_done: u64, n_total: u64, n_decided: u64) {
        if !self.verbose {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.last_report) < Self::THROTTLE {
            return;
        }
        self.last_report = now;
        eprintln!(
            "{}/{} machines processed, {} decided ({:.1}s elapsed)",
            n_done.to_formatted_string(&Locale::en),
            n_total.to_formatted_string(&Locale::en),
            n_decided.to_formatted_string(&Locale::en),
            self.started.elapsed().as_secs_f64(),
        );
    }

    pub fn finish(&self, n_decided: u64, n_undecided: u64) {
        let elapsed = self.started.elapsed().as_secs_f64();
        eprintln!(
            "done at {}: {} decided, {} undecided ({:.2}s)",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            n_decided.to_formatted_string(&Locale::en),
            n_undecided.to_formatted_string(&Locale::en),
            elapsed,
        );
    }
}
