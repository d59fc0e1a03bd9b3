//! Scan results as a table or JSON

use crate::project::{ObjectRef, ProjectHost};
use backref_scan::{ObjectModel, ReferenceHit, ResultBucket, ScanSession, ScanStats, WalkFailure};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub kind: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportGroup {
    pub bucket: ResultBucket,
    pub title: &'static str,
    /// Most recent discovery first
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportFailure {
    pub path: String,
    pub message: String,
}

/// Everything a finished (or cancelled) scan found
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub targets: Vec<ReportEntry>,
    pub groups: Vec<ReportGroup>,
    pub stats: Option<ScanStats>,
    pub failures: Vec<ReportFailure>,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn from_session(session: &ScanSession<ProjectHost>, cancelled: bool) -> Self {
        let host = session.host();

        let targets = session
            .targets()
            .iter()
            .map(|t| entry_for(host, t, host.display_name(t), host.kind(t).to_string()))
            .collect();

        let groups = ResultBucket::ALL
            .iter()
            .map(|&bucket| ReportGroup {
                bucket,
                title: bucket.title(),
                entries: session
                    .bucket(bucket)
                    .iter()
                    .rev()
                    .map(|hit| hit_entry(host, hit))
                    .collect(),
            })
            .collect();

        let failures = session
            .enumeration_failures()
            .iter()
            .map(|f: &WalkFailure| ReportFailure {
                path: f.path.clone(),
                message: f.message.clone(),
            })
            .collect();

        Self {
            targets,
            groups,
            stats: session.stats().cloned(),
            failures,
            cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn print(&self) {
        let names: Vec<&str> = self.targets.iter().map(|t| t.name.as_str()).collect();
        println!("References to {}", names.join(", "));
        if self.cancelled {
            println!("Scan cancelled; results are partial.");
        }

        for group in &self.groups {
            println!();
            println!("{} ({})", group.title, group.entries.len());
            if group.entries.is_empty() {
                continue;
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(
                ["Name", "Kind", "Location"]
                    .iter()
                    .map(|h| Cell::new(h).fg(Color::Cyan))
                    .collect::<Vec<_>>(),
            );
            for entry in &group.entries {
                table.add_row(vec![
                    entry.name.clone(),
                    entry.kind.clone(),
                    entry.location.clone(),
                ]);
            }
            println!("{}", table);
        }

        if !self.failures.is_empty() {
            println!();
            println!("Skipped {} unreadable path(s):", self.failures.len());
            for failure in &self.failures {
                println!("  {}: {}", failure.path, failure.message);
            }
        }

        if let Some(stats) = &self.stats {
            println!();
            println!(
                "{} reference(s) found across {} asset(s) and {} scene object(s); {} pairs probed in {:.1?}",
                self.total(),
                stats.assets_total,
                stats.live_total,
                stats.pairs_probed,
                stats.busy_time
            );
        }
    }
}

fn hit_entry(host: &ProjectHost, hit: &ReferenceHit<ObjectRef>) -> ReportEntry {
    entry_for(host, &hit.handle, hit.name.clone(), hit.kind.to_string())
}

fn entry_for(host: &ProjectHost, handle: &ObjectRef, name: String, kind: String) -> ReportEntry {
    ReportEntry {
        name,
        kind,
        location: host.location(handle),
    }
}
