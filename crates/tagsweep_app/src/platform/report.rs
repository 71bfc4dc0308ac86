use std::fmt::Write;

use tagsweep_core::{Stats, TriggerSource};
use tagsweep_engine::{PassReport, SweepEvent};

/// Accumulates sweep events into an end-of-run summary.
#[derive(Debug, Default)]
pub struct RunReport {
    passes: Vec<(TriggerSource, PassReport)>,
    hidden: Vec<(String, String)>,
}

impl RunReport {
    pub fn record(&mut self, event: &SweepEvent) {
        match event {
            SweepEvent::ItemHidden { title, artist, .. } => {
                self.hidden.push((title.clone(), artist.clone()));
            }
            SweepEvent::PassFinished { source, report } => {
                self.passes.push((*source, report.clone()));
            }
            _ => {}
        }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn render(&self, session: &Stats, totals: &Stats) -> String {
        let mut out = String::new();
        for (n, (source, pass)) in self.passes.iter().enumerate() {
            let _ = writeln!(
                out,
                "pass {} ({:?}): {} on page, {} checked, {} removed, {} failed open",
                n + 1,
                source,
                pass.discovered,
                pass.dispatched,
                pass.removed,
                pass.failed
            );
        }
        for (title, artist) in &self.hidden {
            let _ = writeln!(out, "  hidden: {title} by {artist}");
        }
        let _ = writeln!(
            out,
            "session: {} checked, {} removed, {} errors",
            session.total_checked, session.total_removed, session.errors
        );
        let _ = write!(
            out,
            "all time: {} checked, {} removed, {} errors",
            totals.total_checked, totals.total_removed, totals.errors
        );
        out
    }
}
