//! CLI route: single route table and run context. Dispatches to the listing
//! service and output rendering.

use crate::api::{ListingService, ServiceOptions};
use crate::cache::SledContentCache;
use crate::cli::output;
use crate::cli::parse::{CacheCommands, Commands, LedgerCommands};
use crate::config::{ConfigLoader, HearthConfig};
use crate::error::{HearthError, StorageError};
use crate::fetch::PageFetcher;
use crate::ledger::SledFieldLedger;
use crate::listing::{parse_field_list, Decision, Listing};
use crate::reconcile::BatchPolicy;
use crate::source::{PageSource, SourceRegistry};
use crate::store::SledListingStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runtime context for CLI execution: configuration and the wired service.
///
/// Opens one sled database and shares it across the cache, ledger, and
/// listing store trees.
pub struct RunContext {
    service: ListingService,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Create a run context from the workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, HearthError> {
        let config = if let Some(ref path) = config_path {
            ConfigLoader::load_from_file(path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        if let Err(errors) = config.validate() {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HearthError::Config(joined));
        }

        let service = build_service(&config, &workspace_root)?;
        info!(workspace = %workspace_root.display(), "Run context initialized");
        Ok(RunContext {
            service,
            workspace_root,
        })
    }

    /// Reference to the underlying listing service.
    pub fn service(&self) -> &ListingService {
        &self.service
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, HearthError> {
        match command {
            Commands::Add { urls, file, reset } => {
                self.handle_add(urls, file.as_deref(), *reset)
            }
            Commands::Rescrape {
                ignore_protection,
                yes,
            } => self.handle_rescrape(*ignore_protection, *yes),
            Commands::List { format, decision } => self.handle_list(format, decision.as_deref()),
            Commands::Show { url, format } => self.handle_show(url, format),
            Commands::Notes { url, set, format } => {
                self.handle_notes(url.as_deref(), set.as_deref(), format)
            }
            Commands::Decide { url, decision } => {
                let listing = self.service.set_decision(url, decision)?;
                Ok(format!("Decision for {}: {}", listing.url, listing.decision))
            }
            Commands::Clear { yes } => self.handle_clear(*yes),
            Commands::Ledger { command } => self.handle_ledger_command(command),
            Commands::Cache { command } => self.handle_cache_command(command),
        }
    }

    fn handle_add(
        &self,
        urls: &[String],
        file: Option<&Path>,
        reset: bool,
    ) -> Result<String, HearthError> {
        let mut urls = urls.to_vec();
        if let Some(path) = file {
            let contents = std::fs::read_to_string(path)?;
            urls.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string),
            );
        }
        if urls.is_empty() {
            return Err(HearthError::Validation(
                "No URLs to collect".to_string(),
            ));
        }
        if urls.len() == 1 {
            let merged = block_on(self.service.add(&urls[0], reset))??;
            return Ok(output::merged_text(&urls[0], &merged));
        }
        let report = block_on(self.service.add_many(&urls, reset))??;
        Ok(output::batch_report_text(&report))
    }

    fn handle_rescrape(&self, ignore_protection: bool, yes: bool) -> Result<String, HearthError> {
        if ignore_protection && !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt("Overwrite manually edited fields, notes and decisions included?")
                .interact()
                .map_err(|e| HearthError::Config(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Rescrape cancelled".to_string());
            }
        }
        let report = block_on(self.service.rescrape(ignore_protection))??;
        if report.total() == 0 {
            return Ok("No listings stored".to_string());
        }
        Ok(output::batch_report_text(&report))
    }

    fn handle_list(&self, format: &str, decision: Option<&str>) -> Result<String, HearthError> {
        let mut listings = self.service.list()?;
        if let Some(decision) = decision {
            let wanted: Decision = decision.parse()?;
            listings.retain(|l| l.decision == wanted);
        }
        // Highest-priority decisions first, then by URL for a stable order.
        listings.sort_by(|a: &Listing, b: &Listing| {
            b.decision.cmp(&a.decision).then_with(|| a.url.cmp(&b.url))
        });
        if format == "json" {
            output::to_json(&listings)
        } else {
            Ok(output::listings_table(&listings))
        }
    }

    fn handle_show(&self, url: &str, format: &str) -> Result<String, HearthError> {
        let listing = self.service.get(url)?;
        if format == "json" {
            output::to_json(&listing)
        } else {
            Ok(output::listing_detail(&listing))
        }
    }

    fn handle_notes(
        &self,
        url: Option<&str>,
        set: Option<&str>,
        format: &str,
    ) -> Result<String, HearthError> {
        match (url, set) {
            (Some(url), Some(notes)) => {
                let listing = self.service.update_notes(url, notes)?;
                Ok(format!("Notes for {} updated", listing.url))
            }
            (Some(url), None) => {
                let listing = self.service.get(url)?;
                if listing.notes.trim().is_empty() {
                    Ok(format!("No notes for {}", listing.url))
                } else {
                    Ok(listing.notes)
                }
            }
            (None, _) => {
                let entries = self.service.notes_status()?;
                if format == "json" {
                    output::to_json(&entries)
                } else {
                    Ok(output::notes_table(&entries))
                }
            }
        }
    }

    fn handle_clear(&self, yes: bool) -> Result<String, HearthError> {
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt("Delete all stored listings and their fingerprints?")
                .interact()
                .map_err(|e| HearthError::Config(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Clear cancelled".to_string());
            }
        }
        let removed = self.service.clear_records()?;
        Ok(format!("Removed {} listing(s)", removed))
    }

    fn handle_ledger_command(&self, command: &LedgerCommands) -> Result<String, HearthError> {
        match command {
            LedgerCommands::Status { url, format } => {
                let entries = self.service.ledger_status(url.as_deref())?;
                if format == "json" {
                    output::to_json(&entries)
                } else {
                    Ok(output::ledger_table(&entries))
                }
            }
            LedgerCommands::Protected { url, format } => {
                let statuses = self.service.protection_status(url.as_deref())?;
                if format == "json" {
                    output::to_json(&statuses)
                } else {
                    Ok(output::protected_table(&statuses))
                }
            }
            LedgerCommands::Reset { url, fields, yes } => {
                let fields = fields.as_deref().map(parse_field_list).transpose()?;
                if !yes {
                    use dialoguer::Confirm;
                    let scope = match &fields {
                        Some(fields) => format!("{} field(s)", fields.len()),
                        None => "all fields".to_string(),
                    };
                    let confirmed = Confirm::new()
                        .with_prompt(format!(
                            "Reset {} of {}? The next scrape will overwrite them",
                            scope, url
                        ))
                        .interact()
                        .map_err(|e| {
                            HearthError::Config(format!("Failed to get user input: {}", e))
                        })?;
                    if !confirmed {
                        return Ok("Reset cancelled".to_string());
                    }
                }
                let removed = self.service.ledger_reset(url, fields.as_deref())?;
                Ok(format!("Removed {} fingerprint(s) for {}", removed, url))
            }
            LedgerCommands::Protect { url, fields } => {
                let fields = parse_field_list(fields)?;
                let report = self.service.ledger_protect(url, &fields)?;
                let mut lines = vec![format!("Protected {} field(s) of {}", report.marked, url)];
                if report.missing_record {
                    lines.push("Warning: no stored listing for this URL yet".to_string());
                }
                for field in &report.empty_fields {
                    lines.push(format!(
                        "Warning: field '{}' is empty on the stored listing",
                        field
                    ));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    fn handle_cache_command(&self, command: &CacheCommands) -> Result<String, HearthError> {
        match command {
            CacheCommands::Stats { format } => {
                let stats = self.service.cache_statistics()?;
                if format == "json" {
                    output::to_json(&stats)
                } else {
                    Ok(output::cache_stats_text(&stats))
                }
            }
            CacheCommands::Purge { older_than_hours } => {
                let max_age = match older_than_hours {
                    Some(hours) => Duration::from_secs(hours * 60 * 60),
                    None => self.service.cache_max_age(),
                };
                let removed = self.service.cache_purge(max_age)?;
                Ok(format!("Purged {} cached page(s)", removed))
            }
            CacheCommands::Clear { yes } => {
                if !yes {
                    use dialoguer::Confirm;
                    let confirmed = Confirm::new()
                        .with_prompt("Delete all cached pages?")
                        .interact()
                        .map_err(|e| {
                            HearthError::Config(format!("Failed to get user input: {}", e))
                        })?;
                    if !confirmed {
                        return Ok("Clear cancelled".to_string());
                    }
                }
                let removed = self.service.cache_clear()?;
                Ok(format!("Removed {} cached page(s)", removed))
            }
        }
    }
}

fn build_service(
    config: &HearthConfig,
    workspace_root: &PathBuf,
) -> Result<ListingService, HearthError> {
    let db_path = config.db_path(workspace_root);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::IoError)?;
    }
    let db = sled::open(&db_path).map_err(|e| {
        HearthError::Storage(StorageError::DatabaseUnavailable(format!(
            "Failed to open database at {}: {}",
            db_path.display(),
            e
        )))
    })?;

    let cache = Arc::new(SledContentCache::open(&db)?);
    let ledger = Arc::new(SledFieldLedger::open(&db)?);
    let store = Arc::new(SledListingStore::open(&db)?);

    let fetcher = Arc::new(PageFetcher::new(cache.clone(), config.fetcher_options())?);
    let mut sources = SourceRegistry::new();
    // Site-specific adapters register ahead of the generic page fallback.
    sources.register(Arc::new(PageSource::new(fetcher, config.cache_max_age())));

    let options = ServiceOptions {
        cache_max_age: config.cache_max_age(),
        concurrency: config.fetch.concurrency,
        batch_policy: BatchPolicy::SkipAndContinue,
    };
    Ok(ListingService::new(cache, ledger, store, sources, options))
}

/// Bridge async service calls into the synchronous route table.
///
/// The CLI never runs inside an async context; refuse instead of nesting
/// runtimes when a caller does.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, HearthError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(HearthError::Config(
            "Cannot run fetch commands from within an async runtime context".to_string(),
        ));
    }
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| HearthError::Config(format!("Failed to create runtime: {}", e)))?;
    Ok(rt.block_on(future))
}
