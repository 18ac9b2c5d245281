//! CLI entrypoint for tally
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod batch;
mod commands;
mod output;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use commands::{Cli, Command};
use std::path::Path;
use tally_domain::submission::{FlatFields, unpack};
use tally_domain::{ConfigIssue, OutputFormat};
use tally_infrastructure::{ConfigLoader, FileConfig};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so the file writer flushes on exit
    let _guard = init_logging(cli.verbose, config.logging.file_path().as_deref())?;

    match cli.command {
        Command::Unpack { fields } => {
            let fields = parse_fields(&fields)?;
            let tree = unpack(&fields)?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Verify {
            batch: batch_path,
            output: format,
        } => {
            let (config, loaded) = prepare_batch(config, &batch_path)?;
            info!(tasks = loaded.tasks.len(), "Running batch");

            let report = batch::run(config, loaded).await?;
            let rendered = match format {
                OutputFormat::Text => output::format_text(&report),
                OutputFormat::Json => output::format_json(&report),
            };
            println!("{}", rendered);
        }
        Command::Config => {
            if cli.no_config {
                println!("Configuration files disabled (--no-config)");
            } else {
                ConfigLoader::print_config_sources(cli.config.as_ref());
            }
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
            print_issues(&config);
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level, plus an optional log file
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Parse `KEY=VALUE` arguments; a repeated key collects several values
fn parse_fields(args: &[String]) -> Result<FlatFields> {
    let mut fields = FlatFields::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("Expected KEY=VALUE, got '{}'", arg);
        };
        fields.push(key, value);
    }
    Ok(fields)
}

/// Load a batch, merge its task types into `config` and validate the result
fn prepare_batch(mut config: FileConfig, path: &Path) -> Result<(FileConfig, batch::Batch)> {
    let mut loaded = batch::Batch::load(path)?;
    loaded.merge_task_types(&mut config);
    check_config(&config.validate())?;
    Ok((config, loaded))
}

/// Log warnings and abort on errors
fn check_config(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.as_str())
        .collect();
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

fn print_issues(config: &FileConfig) {
    let issues = config.validate();
    if issues.is_empty() {
        println!("No configuration issues.");
        return;
    }
    println!("Configuration issues:");
    for issue in issues {
        println!("  {}", issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_domain::ConfigIssueCode;

    #[test]
    fn test_parse_fields_repeated_keys() {
        let fields = parse_fields(&[
            "tags[]=a".to_string(),
            "tags[]=b".to_string(),
            "note=x=y".to_string(),
        ])
        .unwrap();
        assert_eq!(
            unpack(&fields).unwrap().to_json(),
            json!({"tags": ["a", "b"], "note": "x=y"})
        );
    }

    #[test]
    fn test_parse_fields_rejects_missing_equals() {
        assert!(parse_fields(&["oops".to_string()]).is_err());
    }

    #[test]
    fn test_batch_task_types_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            json!({
                "task_types": {
                    "parent": {"follow_on": ["ghost"], "fields": {"note": "fuzzy"}}
                },
                "tasks": [{"type": "parent", "submissions": [{"note": "a"}, {"note": "a"}]}]
            })
            .to_string(),
        )
        .unwrap();

        let err = prepare_batch(FileConfig::default(), &path)
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("unknown verifier kind 'fuzzy'"), "{}", err);
        assert!(err.contains("'ghost' is not a configured task type"), "{}", err);
    }

    #[test]
    fn test_valid_batch_is_prepared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            json!({"task_types": {"find_table": {"initial": true}}}).to_string(),
        )
        .unwrap();

        let (config, loaded) = prepare_batch(FileConfig::default(), &path).unwrap();
        assert!(config.task_types.contains_key("find_table"));
        assert!(loaded.task_types.is_empty());
    }

    #[test]
    fn test_check_config() {
        let warning = ConfigIssue::warning(ConfigIssueCode::RequiredBelowMinimum, "w");
        assert!(check_config(&[warning.clone()]).is_ok());

        let error = ConfigIssue::error(ConfigIssueCode::TooFewSubmissions, "e");
        assert!(check_config(&[warning, error]).is_err());
    }
}
