//! CLI output: error mapping and text rendering for the route table.

use crate::api::{NotesEntry, ProtectionStatus};
use crate::cache::CacheStatistics;
use crate::error::{HearthError, StorageError};
use crate::ledger::LedgerEntry;
use crate::listing::{format_millis, Listing};
use crate::reconcile::{BatchReport, IdentityOutcome, Merged};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Map domain/service errors to a string for CLI output.
/// Keeps route handlers thin; extend with stable categories if needed.
pub fn map_error(e: &HearthError) -> String {
    e.to_string()
}

/// Pretty JSON for --format json output.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, HearthError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| HearthError::Storage(StorageError::SerializationFailed(e.to_string())))
}

pub fn listings_table(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return "No listings stored".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Address", "Price", "Beds", "Baths", "Decision", "URL"]);
    for listing in listings {
        table.add_row(vec![
            placeholder(&listing.address),
            placeholder(&listing.price),
            placeholder(&listing.beds),
            placeholder(&listing.baths),
            listing.decision.to_string(),
            listing.url.clone(),
        ]);
    }
    format!("{}\n{} listing(s)", table, listings.len())
}

pub fn listing_detail(listing: &Listing) -> String {
    let mut lines = Vec::new();
    lines.push(format!("URL:             {}", listing.url));
    lines.push(format!("Address:         {}", placeholder(&listing.address)));
    lines.push(format!("Price:           {}", placeholder(&listing.price)));
    lines.push(format!("Beds:            {}", placeholder(&listing.beds)));
    lines.push(format!("Baths:           {}", placeholder(&listing.baths)));
    lines.push(format!("Sqft:            {}", placeholder(&listing.sqft)));
    lines.push(format!("Type:            {}", placeholder(&listing.house_type)));
    lines.push(format!(
        "Available:       {}",
        placeholder(&listing.available_date)
    ));
    lines.push(format!("Parking:         {}", placeholder(&listing.parking)));
    lines.push(format!("Utilities:       {}", placeholder(&listing.utilities)));
    lines.push(format!(
        "Contact:         {}",
        placeholder(&listing.contact_info)
    ));
    lines.push(format!(
        "Appointment URL: {}",
        placeholder(&listing.appointment_url)
    ));
    lines.push(format!(
        "Amenities:       {}",
        placeholder(&listing.amenities.join(", "))
    ));
    lines.push(format!(
        "Description:     {}",
        placeholder(&listing.description)
    ));
    lines.push(format!("Decision:        {}", listing.decision));
    lines.push(format!("Notes:           {}", placeholder(&listing.notes)));
    lines.push(format!(
        "Scraped at:      {}",
        placeholder(&listing.scraped_at)
    ));
    lines.join("\n")
}

pub fn ledger_table(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return "No fingerprints recorded".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["URL", "Field", "Fingerprint", "Updated"]);
    for entry in entries {
        let fingerprint = if entry.is_sentinel() {
            "(forced)".to_string()
        } else {
            entry.fingerprint.clone()
        };
        table.add_row(vec![
            entry.identity.clone(),
            entry.field.to_string(),
            fingerprint,
            format_millis(entry.updated_at_ms),
        ]);
    }
    format!("{}\n{} fingerprint(s)", table, entries.len())
}

pub fn protected_table(statuses: &[ProtectionStatus]) -> String {
    if statuses.is_empty() {
        return "No listings stored".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["URL", "Protected fields"]);
    for status in statuses {
        let fields = if status.protected_fields.is_empty() {
            "-".to_string()
        } else {
            status
                .protected_fields
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![status.url.clone(), fields]);
    }
    table.to_string()
}

pub fn notes_table(entries: &[NotesEntry]) -> String {
    if entries.is_empty() {
        return "No listings carry notes".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["URL", "Notes"]);
    for entry in entries {
        table.add_row(vec![entry.url.clone(), entry.notes.clone()]);
    }
    table.to_string()
}

pub fn cache_stats_text(stats: &CacheStatistics) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Entries:       {}", stats.total_entries));
    lines.push(format!("Content bytes: {}", stats.total_content_bytes));
    lines.push(format!(
        "Oldest fetch:  {}",
        stats
            .oldest_ms
            .map(format_millis)
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!(
        "Newest fetch:  {}",
        stats
            .newest_ms
            .map(format_millis)
            .unwrap_or_else(|| "-".to_string())
    ));
    if !stats.by_status.is_empty() {
        lines.push("By HTTP status:".to_string());
        for (status, count) in &stats.by_status {
            lines.push(format!("  {}: {}", status, count));
        }
    }
    lines.join("\n")
}

pub fn merged_text(url: &str, merged: &Merged) -> String {
    if merged.created {
        format!("Added {}", url)
    } else if merged.adopted_changed == 0 && merged.kept_protected > 0 {
        format!(
            "{} unchanged: {} protected field(s) kept",
            url, merged.kept_protected
        )
    } else {
        format!(
            "Updated {}: {} field(s) adopted, {} protected field(s) kept",
            url, merged.adopted_changed, merged.kept_protected
        )
    }
}

pub fn batch_report_text(report: &BatchReport) -> String {
    let mut lines = Vec::new();
    for (url, outcome) in &report.results {
        let line = match outcome {
            IdentityOutcome::Applied { adopted, kept } => format!(
                "{} {} ({} adopted, {} kept)",
                "applied".green(),
                url,
                adopted,
                kept
            ),
            IdentityOutcome::SkippedProtected => {
                format!("{} {} (protected fields only)", "skipped".yellow(), url)
            }
            IdentityOutcome::Failed { reason } => {
                format!("{}  {} ({})", "failed".red(), url, reason)
            }
        };
        lines.push(line);
    }
    let mut summary = format!(
        "{} total: {} applied, {} skipped, {} failed",
        report.total(),
        report.applied(),
        report.skipped_protected(),
        report.failed()
    );
    if report.stopped_early {
        summary.push_str(" (stopped early)");
    }
    lines.push(summary);
    lines.join("\n")
}

fn placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
