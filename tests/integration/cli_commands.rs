//! CLI command routing
//!
//! Exercises the route table through `RunContext` against a fresh workspace.
//! Commands that reach the network are covered by the service tests with
//! scripted sources; here the focus is parse-to-output wiring.

use clap::Parser;
use hearth::cli::{CacheCommands, Cli, Commands, LedgerCommands, RunContext};
use hearth::error::HearthError;
use std::fs;
use tempfile::TempDir;

fn context(dir: &TempDir) -> RunContext {
    RunContext::new(dir.path().to_path_buf(), None).unwrap()
}

#[test]
fn test_list_on_empty_workspace() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let output = ctx
        .execute(&Commands::List {
            format: "text".to_string(),
            decision: None,
        })
        .unwrap();
    assert_eq!(output, "No listings stored");
}

#[test]
fn test_list_json_is_valid_json() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let output = ctx
        .execute(&Commands::List {
            format: "json".to_string(),
            decision: None,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(parsed.as_array().unwrap().is_empty());
}

#[test]
fn test_list_rejects_invalid_decision_filter() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let err = ctx
        .execute(&Commands::List {
            format: "text".to_string(),
            decision: Some("Maybe".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, HearthError::InvalidDecision(_)));
}

#[test]
fn test_show_missing_record_is_not_found() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let err = ctx
        .execute(&Commands::Show {
            url: "https://example.com/listing/1".to_string(),
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, HearthError::RecordNotFound(_)));
}

#[test]
fn test_cache_stats_text_and_json() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let text = ctx
        .execute(&Commands::Cache {
            command: CacheCommands::Stats {
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert!(text.contains("Entries:       0"), "output: {}", text);

    let json = ctx
        .execute(&Commands::Cache {
            command: CacheCommands::Stats {
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["total_entries"], 0);
}

#[test]
fn test_cache_purge_and_clear() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let output = ctx
        .execute(&Commands::Cache {
            command: CacheCommands::Purge {
                older_than_hours: Some(1),
            },
        })
        .unwrap();
    assert_eq!(output, "Purged 0 cached page(s)");

    let output = ctx
        .execute(&Commands::Cache {
            command: CacheCommands::Clear { yes: true },
        })
        .unwrap();
    assert_eq!(output, "Removed 0 cached page(s)");
}

#[test]
fn test_ledger_protect_status_reset_round_trip() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let url = "https://example.com/listing/1".to_string();

    // Protecting ahead of any stored record warns but takes effect.
    let output = ctx
        .execute(&Commands::Ledger {
            command: LedgerCommands::Protect {
                url: url.clone(),
                fields: "price,beds".to_string(),
            },
        })
        .unwrap();
    assert!(output.contains("Protected 2 field(s)"), "output: {}", output);
    assert!(output.contains("no stored listing"), "output: {}", output);

    let output = ctx
        .execute(&Commands::Ledger {
            command: LedgerCommands::Status {
                url: Some(url.clone()),
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert!(output.contains("2 fingerprint(s)"), "output: {}", output);
    assert!(output.contains("(forced)"), "output: {}", output);

    let output = ctx
        .execute(&Commands::Ledger {
            command: LedgerCommands::Reset {
                url: url.clone(),
                fields: None,
                yes: true,
            },
        })
        .unwrap();
    assert!(output.contains("Removed 2 fingerprint(s)"), "output: {}", output);

    let output = ctx
        .execute(&Commands::Ledger {
            command: LedgerCommands::Status {
                url: Some(url),
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert_eq!(output, "No fingerprints recorded");
}

#[test]
fn test_ledger_protect_rejects_unknown_field() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let err = ctx
        .execute(&Commands::Ledger {
            command: LedgerCommands::Protect {
                url: "https://example.com/listing/1".to_string(),
                fields: "price,square_footage".to_string(),
            },
        })
        .unwrap_err();
    assert!(matches!(err, HearthError::UnknownField(_)));
}

#[test]
fn test_clear_on_empty_workspace() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let output = ctx.execute(&Commands::Clear { yes: true }).unwrap();
    assert_eq!(output, "Removed 0 listing(s)");
}

#[test]
fn test_explicit_config_file_controls_db_path() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("hearth.toml");
    fs::write(
        &config_path,
        "[storage]\ndb_path = \"custom/db\"\n\n[cache]\nmax_age_hours = 24\n",
    )
    .unwrap();

    let ctx = RunContext::new(dir.path().to_path_buf(), Some(config_path)).unwrap();
    ctx.execute(&Commands::List {
        format: "text".to_string(),
        decision: None,
    })
    .unwrap();
    assert!(dir.path().join("custom/db").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("hearth.toml");
    fs::write(&config_path, "[fetch]\nconcurrency = 0\n").unwrap();

    let err = RunContext::new(dir.path().to_path_buf(), Some(config_path))
        .err()
        .unwrap();
    assert!(matches!(err, HearthError::Config(_)));
    assert!(err.to_string().contains("concurrency"));
}

#[test]
fn test_cli_parses_nested_subcommands() {
    let cli = Cli::try_parse_from([
        "hearth",
        "ledger",
        "reset",
        "https://example.com/listing/1",
        "--fields",
        "price",
        "--yes",
    ])
    .unwrap();
    match cli.command {
        Commands::Ledger {
            command:
                LedgerCommands::Reset {
                    url,
                    fields: Some(fields),
                    yes: true,
                },
        } => {
            assert_eq!(url, "https://example.com/listing/1");
            assert_eq!(fields, "price");
        }
        _ => panic!("unexpected parse"),
    }
}

#[test]
fn test_cli_rejects_notes_set_without_url() {
    let result = Cli::try_parse_from(["hearth", "notes", "--set", "some text"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_requires_add_urls() {
    let result = Cli::try_parse_from(["hearth", "add"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_accepts_add_file_without_urls() {
    let cli = Cli::try_parse_from(["hearth", "add", "--file", "urls.txt"]).unwrap();
    match cli.command {
        Commands::Add { urls, file, .. } => {
            assert!(urls.is_empty());
            assert_eq!(file, Some("urls.txt".into()));
        }
        _ => panic!("unexpected parse"),
    }
}

#[test]
fn test_add_file_with_only_comments_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let path = dir.path().join("urls.txt");
    fs::write(&path, "# saved searches\n\n  \n").unwrap();

    let err = ctx
        .execute(&Commands::Add {
            urls: vec![],
            file: Some(path),
            reset: false,
        })
        .unwrap_err();
    assert!(matches!(err, HearthError::Validation(_)));
}
