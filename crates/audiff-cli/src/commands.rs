use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use tracing::debug;

use audiff_diff::{DiffConfig, DiffEngine, DiffSettings, BASELINE_IGNORED};
use audiff_types::DiffRecord;

use crate::cli::*;
use crate::settings;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.format),
        Command::Config(args) => cmd_config(args, cli.format),
    }
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records = diff_files(&args)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => print!("{}", render_text(&records)),
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let settings = settings::load(args.config.as_deref())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Text => print!("{}", render_settings(&settings)?),
    }
    Ok(())
}

/// Diff the two documents named by `args` with the effective settings.
fn diff_files(args: &DiffArgs) -> anyhow::Result<Vec<DiffRecord>> {
    let settings = settings::load(args.config.as_deref())?;
    let mut config = DiffConfig::from_settings(&settings);
    // JSON objects have no struct fields, so ignore rules target their keys.
    config
        .add_ignored_fields(args.ignore.iter().cloned())
        .set_ignore_map_keys(true);

    let old = read_json(&args.old)?;
    let new = read_json(&args.new)?;
    let records = DiffEngine::new(config)
        .diff(&old, &new)
        .with_context(|| {
            format!(
                "cannot diff {} against {}",
                args.old.display(),
                args.new.display()
            )
        })?;
    debug!(records = records.len(), "documents compared");
    Ok(records)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn render_text(records: &[DiffRecord]) -> String {
    if records.is_empty() {
        return "No changes.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let line = if record.is_addition() {
            format!(
                "{} {} = {}",
                "+".green().bold(),
                record.field_path.bold(),
                record.new_value.green()
            )
        } else if record.is_removal() {
            format!(
                "{} {} = {}",
                "-".red().bold(),
                record.field_path.bold(),
                record.old_value.red()
            )
        } else {
            format!(
                "{} {}: {} → {}",
                "~".yellow().bold(),
                record.field_path.bold(),
                record.old_value.red(),
                record.new_value.green()
            )
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn render_settings(settings: &DiffSettings) -> anyhow::Result<String> {
    let mut out = settings.to_toml_string()?;
    out.push_str(&format!("# always ignored: {}\n", BASELINE_IGNORED.join(", ")));
    Ok(out)
}
