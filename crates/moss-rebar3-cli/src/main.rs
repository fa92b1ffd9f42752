use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use moss_rebar3::{
    ActionRegistry, BuildTool, CONFIG_PATH, Diagnostic, Rebar3, SarifReport, default_registry,
    registry_for_project,
};
use serde::Serialize;
use std::fmt::Write;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "moss-rebar3")]
#[command(about = "Rebar3 actions and output diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, conflicts_with = "sarif")]
    json: bool,

    /// Output diagnostics as SARIF 2.1.0
    #[arg(long, global = true)]
    sarif: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether rebar3 applies to the project (exit 1 if not)
    Detect,

    /// List available actions
    Actions,

    /// Parse captured output of an action into diagnostics (exit 1 on errors)
    Parse {
        /// Action name (compile, eunit, ct, clean, dialyzer, or a configured one)
        action: String,

        /// File holding the captured output (reads stdin if omitted)
        file: Option<PathBuf>,
    },
}

/// Action info for list output.
#[derive(Debug, Serialize)]
struct ActionListItem {
    name: String,
    display_name: String,
    aliases: Vec<String>,
    command: String,
    env: Vec<String>,
    output: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let root = cli.root.as_deref().unwrap_or_else(|| Path::new("."));

    match &cli.command {
        Commands::Detect => cmd_detect(root, cli.json),
        Commands::Actions => Ok(cmd_actions(&load_registry(root), cli.json)),
        Commands::Parse { action, file } => {
            let output = read_output(file.as_deref())?;
            cmd_parse(&load_registry(root), action, &output, cli.json, cli.sarif)
        }
    }
}

/// Built-ins plus `.moss/rebar3.toml`; a broken config falls back to built-ins.
fn load_registry(root: &Path) -> ActionRegistry {
    match registry_for_project(root) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring {CONFIG_PATH}");
            default_registry()
        }
    }
}

fn read_output(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut output = String::new();
            std::io::stdin()
                .read_to_string(&mut output)
                .context("failed to read stdin")?;
            Ok(output)
        }
    }
}

fn cmd_detect(root: &Path, json: bool) -> Result<ExitCode> {
    let tool = Rebar3::new();
    let eligible = tool
        .is_eligible(root)
        .with_context(|| format!("failed to inspect {}", root.display()))?;

    if json {
        let output = serde_json::json!({
            "tool": tool.info().name,
            "root": root.display().to_string(),
            "eligible": eligible,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if eligible {
        println!("{}: {} project", root.display(), tool.info().nice_name);
    } else {
        println!("{}: no rebar.config", root.display());
    }

    Ok(if eligible {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_actions(registry: &ActionRegistry, json: bool) -> ExitCode {
    let items: Vec<ActionListItem> = registry
        .actions()
        .iter()
        .map(|a| ActionListItem {
            name: a.name.clone(),
            display_name: a.display_name.clone(),
            aliases: a.aliases.clone(),
            command: a.command_line(),
            env: a.env.iter().map(|(k, v)| format!("{k}={v}")).collect(),
            output: a.strategy.describe(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&items).unwrap_or_default());
    } else {
        print!("{}", format_actions(&items));
    }
    ExitCode::SUCCESS
}

fn format_actions(items: &[ActionListItem]) -> String {
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{} ({})", item.name, item.display_name);
        let _ = writeln!(out, "    Command: {}", item.command);
        if !item.aliases.is_empty() {
            let _ = writeln!(out, "    Aliases: {}", item.aliases.join(", "));
        }
        if !item.env.is_empty() {
            let _ = writeln!(out, "    Env: {}", item.env.join(" "));
        }
        let _ = writeln!(out, "    Output: {}", item.output);
    }
    out
}

fn cmd_parse(
    registry: &ActionRegistry,
    action: &str,
    output: &str,
    json: bool,
    sarif: bool,
) -> Result<ExitCode> {
    let result = registry.parse_result(action, output)?;

    if sarif {
        println!(
            "{}",
            SarifReport::from_diagnostics(Rebar3::new().info(), &result.action, &result.diagnostics)
                .to_json()
        );
    } else if json {
        println!("{}", serde_json::to_string_pretty(&result.diagnostics)?);
    } else {
        for diag in &result.diagnostics {
            print!("{}", format_diagnostic(diag));
        }
        eprintln!(
            "{}: {} error(s), {} warning(s)",
            result.action,
            result.error_count(),
            result.warning_count()
        );
    }

    Ok(if result.error_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn format_diagnostic(diag: &Diagnostic) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}:{}", diag.file.display(), diag.line);
    if let Some(column) = diag.column {
        let _ = write!(out, ":{column}");
    }
    let _ = writeln!(out, ": {}: {}", diag.severity, diag.message);
    for entry in diag.trace.iter().flatten() {
        for line in entry.message.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use moss_rebar3::TraceEntry;

    #[test]
    fn test_format_diagnostic() {
        let diag = Diagnostic::error("foo_tests.erl", 42, "foo_test failed")
            .with_trace(vec![TraceEntry::trace("assertion failed\n  detail")]);
        assert_eq!(
            format_diagnostic(&diag),
            "foo_tests.erl:42: Error: foo_test failed\n    assertion failed\n      detail\n"
        );

        let diag = Diagnostic::warning("src/a.erl", 3, "unused").with_column(Some(7));
        assert_eq!(format_diagnostic(&diag), "src/a.erl:3:7: Warning: unused\n");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
