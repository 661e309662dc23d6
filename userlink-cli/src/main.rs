//! userlink CLI - replace links to departed users in stored documents.
//!
//! Features:
//! - Scans a directory of storage-format documents
//! - Resolves every user link against a directory snapshot
//! - Replaces links to people the directory no longer knows with plain text
//! - Dry-run mode, JSON reports, per-document version ledger

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use userlink_core::{
    init_structured_logging, load_config, print_json, print_plain, Batch, Directory,
    MemoResolver, UserlinkConfig, DEFAULT_EXTENSIONS, DEFAULT_UNKNOWN_MARKER,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replace links to departed users in stored documents")]
pub struct Cli {
    /// Root directory holding the exported documents
    #[arg(default_value = ".")]
    path: String,

    /// Directory snapshot (JSON object of user key to display name)
    #[arg(long, short = 'd', value_name = "FILE")]
    directory: Option<String>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Show what would be replaced without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Document extensions to scan (default: xml, storage, html)
    #[arg(long = "ext", num_args = 1..)]
    extensions: Vec<String>,

    /// Directory names to skip
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Display-name marker for people the directory no longer knows
    #[arg(long, value_name = "TEXT")]
    unknown_marker: Option<String>,

    /// Number of worker threads (default: one per CPU)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,
}

/// Settings after merging CLI flags over userlink.toml.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    directory: PathBuf,
    unknown_marker: String,
    extensions: Vec<String>,
    exclude: Vec<String>,
    json: bool,
}

/// Flags win over the config file; the config file wins over defaults.
fn merge_settings(cli: &Cli, root: &Path, config: Option<UserlinkConfig>) -> Result<Settings> {
    let config = config.unwrap_or_default();

    let directory = match (&cli.directory, &config.directory) {
        (Some(flag), _) => PathBuf::from(flag),
        (None, Some(file)) => root.join(file),
        (None, None) => {
            return Err(anyhow!(
                "No directory snapshot given: pass --directory or set `directory` in userlink.toml"
            ))
        }
    };

    let unknown_marker = cli
        .unknown_marker
        .clone()
        .or(config.unknown_marker.clone())
        .unwrap_or_else(|| DEFAULT_UNKNOWN_MARKER.to_string());

    let extensions = if !cli.extensions.is_empty() {
        cli.extensions.clone()
    } else {
        config
            .extensions
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    };

    let mut exclude = config.exclude.clone().unwrap_or_default();
    exclude.extend(cli.exclude.iter().cloned());

    Ok(Settings {
        directory,
        unknown_marker,
        extensions,
        exclude,
        json: cli.json || config.wants_json(),
    })
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] userlink internal error: {}", info);
        eprintln!("[PANIC] Documents already written are kept; rerun to finish the batch.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let root = PathBuf::from(&cli.path);
    if !root.is_dir() {
        return Err(anyhow!("Not a directory: {}", root.display()));
    }

    let config = load_config(&root)?;
    let settings = merge_settings(&cli, &root, config)?;

    let directory = Directory::load(&settings.directory, settings.unknown_marker.as_str())
        .with_context(|| {
            format!(
                "Failed to load directory snapshot: {}",
                settings.directory.display()
            )
        })?;
    if directory.is_empty() {
        eprintln!(
            "[WARN] Directory snapshot {} is empty; every user link will fail to resolve.",
            settings.directory.display()
        );
    }
    let resolver = MemoResolver::new(directory);

    let report = Batch::new(&root)
        .extensions(settings.extensions.iter().cloned())
        .exclude_dirs(settings.exclude.iter().cloned())
        .dry_run(cli.dry_run)
        .run(&resolver)?;

    if settings.json {
        print_json(&report);
    } else {
        print_plain(&report);
    }

    std::process::exit(if report.has_failures() { 1 } else { 0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use userlink_core::OutputConfig;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("userlink").chain(args.iter().copied()))
    }

    #[test]
    fn test_directory_required() {
        let err = merge_settings(&cli(&[]), Path::new("/space"), None).unwrap_err();
        assert!(err.to_string().contains("--directory"));
    }

    #[test]
    fn test_defaults() {
        let settings =
            merge_settings(&cli(&["-d", "people.json"]), Path::new("/space"), None).unwrap();
        assert_eq!(settings.directory, PathBuf::from("people.json"));
        assert_eq!(settings.unknown_marker, DEFAULT_UNKNOWN_MARKER);
        assert_eq!(settings.extensions, vec!["xml", "storage", "html"]);
        assert!(settings.exclude.is_empty());
        assert!(!settings.json);
    }

    #[test]
    fn test_config_directory_relative_to_root() {
        let settings = merge_settings(
            &cli(&[]),
            Path::new("/space"),
            Some(UserlinkConfig {
                directory: Some("people.json".into()),
                extensions: Some(vec!["storage".into()]),
                ..Default::default()
            }),
        )
        .unwrap();
        assert_eq!(settings.directory, PathBuf::from("/space/people.json"));
        assert_eq!(settings.extensions, vec!["storage"]);
    }

    #[test]
    fn test_flags_override_config() {
        let settings = merge_settings(
            &cli(&[
                "--directory",
                "other.json",
                "--ext",
                "xml",
                "--exclude",
                "drafts",
                "--unknown-marker",
                "(gone)",
            ]),
            Path::new("/space"),
            Some(UserlinkConfig {
                directory: Some("people.json".into()),
                unknown_marker: Some("Unknown User".into()),
                extensions: Some(vec!["storage".into()]),
                exclude: Some(vec!["archive".into()]),
                output: Some(OutputConfig {
                    format: Some("json".into()),
                }),
            }),
        )
        .unwrap();

        assert_eq!(settings.directory, PathBuf::from("other.json"));
        assert_eq!(settings.unknown_marker, "(gone)");
        assert_eq!(settings.extensions, vec!["xml"]);
        assert_eq!(settings.exclude, vec!["archive", "drafts"]);
        assert!(settings.json);
    }

    #[test]
    fn test_cli_parses_flags() {
        let parsed = cli(&["/exports", "--json", "--dry-run", "-j", "4"]);
        assert_eq!(parsed.path, "/exports");
        assert!(parsed.json);
        assert!(parsed.dry_run);
        assert_eq!(parsed.jobs, Some(4));
    }
}
