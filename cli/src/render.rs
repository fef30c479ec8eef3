//! Text and JSON rendering for run reports and plans.

use std::fmt::Write as _;

use retag_core::{Family, FamilyReport, Outcome, RunConfig, RunMode, RunReport, Selection};
use url::Url;

pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Per-family summary: changed ids, failures and allow-listed ids the
/// listing did not return.
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    for family in &report.families {
        if !out.is_empty() {
            out.push('\n');
        }
        render_family(&mut out, report.mode, family);
    }
    out
}

fn render_family(out: &mut String, mode: RunMode, report: &FamilyReport) {
    let family = report.family;
    let _ = writeln!(out, "** {} **", family.as_str().to_uppercase());
    if report.skipped {
        let _ = writeln!(out, "Skipped: empty {family} list in run config.");
        return;
    }

    let changed = report.changed_ids();
    let verb = match mode {
        RunMode::Report => "Would update",
        RunMode::Commit => "Updated",
    };
    let _ = writeln!(out, "{verb} {} {}(s).", changed.len(), family.noun());
    if !changed.is_empty() {
        let _ = writeln!(out, "  {}", changed.join(", "));
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "Failed: {}", failures.len());
        for record in failures {
            if let Outcome::Failed { category, error } = &record.outcome {
                let _ = writeln!(out, "  {} [{category}] {error}", record.id);
            }
        }
    }

    if !report.missing.is_empty() {
        let _ = writeln!(out, "Not found: {}", report.missing.join(", "));
    }
}

/// What a run with `config` would touch, without contacting the API.
pub fn render_plan(config: &RunConfig, mode: RunMode, base_url: &Url) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "mode: {mode}");
    let _ = writeln!(out, "api: {base_url}");
    let _ = writeln!(out, "tags ({}):", config.tags.len());
    for (old, new) in config.tags.iter() {
        let _ = writeln!(out, "  {old} -> {new}");
    }
    for family in Family::ALL {
        let selection = match config.selection(family) {
            Selection::All => "all".to_string(),
            Selection::Skip => "skip".to_string(),
            Selection::Only(ids) => ids.iter().cloned().collect::<Vec<_>>().join(", "),
        };
        let _ = writeln!(out, "{family}: {selection}");
    }
    out.trim_end().to_string()
}
