// flux-improve - tells you which dev tools your setup is missing
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use flux_improve_lib::{
    core::ContextAnalyzer,
    facts::FactProvider,
    intelligence::{
        AnalysisReport, Analyzer, Category, MatchInput, RecommendationCatalog,
        RecommendationMatcher,
    },
    store::PreferenceStore,
    Config, FluxError,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flux-improve")]
#[command(version, about = "Recommend dev tooling your machine and project are missing", long_about = None)]
struct Cli {
    /// Preferences record to read and write
    #[arg(long, global = true, env = "FLUX_PREFS_FILE")]
    prefs_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print machine facts and current preferences as JSON
    Detect,

    /// Print the repository context of a directory as JSON
    Analyze {
        /// Directory to analyze (default: current directory)
        dir: Option<PathBuf>,
    },

    /// Match a `{ installed, context, preferences }` document against the catalog
    Match {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Only show one category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Detect, analyze and match in one go
    Improve {
        /// Directory to analyze (default: current directory)
        dir: Option<PathBuf>,

        /// Print the match results as JSON
        #[arg(long)]
        json: bool,

        /// Only show one category
        #[arg(long)]
        category: Option<Category>,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Show the stored preferences
    List,
    /// Never show a recommendation again
    Dismiss { id: String },
    /// Show a dismissed recommendation again
    Undismiss { id: String },
    /// Use another tool in place of a suggested one
    Alternative { from: String, to: String },
    /// Forget every dismissal and alternative
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let command_path = cli.command.path();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<FluxError>() {
                Some(flux) => eprintln!("Error: {}", flux.user_message()),
                None => eprintln!("Error: {:#}", e),
            }

            let code = exit_code_for(&e);
            if code == USAGE_EXIT_CODE {
                eprintln!("\n{}", usage_for(&command_path));
            }
            ExitCode::from(code)
        }
    }
}

/// Same code clap uses for its own argument errors
const USAGE_EXIT_CODE: u8 = 2;

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<FluxError>() {
        Some(FluxError::Usage(_)) => USAGE_EXIT_CODE,
        _ => 1,
    }
}

/// Rendered usage line of the (nested) subcommand at `path`
fn usage_for(path: &[&str]) -> String {
    let mut command = Cli::command();
    command.build();

    for name in path {
        match command.find_subcommand(name).cloned() {
            Some(sub) => command = sub,
            None => break,
        }
    }

    command.render_usage().to_string()
}

impl Commands {
    fn path(&self) -> Vec<&'static str> {
        match self {
            Commands::Detect => vec!["detect"],
            Commands::Analyze { .. } => vec!["analyze"],
            Commands::Match { .. } => vec!["match"],
            Commands::Prefs { action } => vec!["prefs", action.name()],
            Commands::Improve { .. } => vec!["improve"],
        }
    }
}

impl PrefsAction {
    fn name(&self) -> &'static str {
        match self {
            PrefsAction::List => "list",
            PrefsAction::Dismiss { .. } => "dismiss",
            PrefsAction::Undismiss { .. } => "undismiss",
            PrefsAction::Alternative { .. } => "alternative",
            PrefsAction::Clear => "clear",
        }
    }
}

/// Logs go to stderr so stdout stays JSON
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FLUX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let prefs_file = cli.prefs_file;

    match cli.command {
        Commands::Detect => handle_detect(load_config(prefs_file)?),
        Commands::Analyze { dir } => handle_analyze(dir),
        Commands::Match { file, category } => handle_match(file, category),
        Commands::Prefs { action } => handle_prefs(action, load_config(prefs_file)?),
        Commands::Improve {
            dir,
            json,
            category,
        } => handle_improve(dir, json, category, load_config(prefs_file)?).await,
    }
}

fn load_config(prefs_file: Option<PathBuf>) -> flux_improve_lib::Result<Config> {
    Config::from_env_with_prefs(prefs_file)
}

fn handle_detect(config: Config) -> anyhow::Result<()> {
    let preferences = PreferenceStore::from_config(&config).list();
    let snapshot = FactProvider::new(config).snapshot(preferences);
    print_json(&snapshot)
}

fn handle_analyze(dir: Option<PathBuf>) -> anyhow::Result<()> {
    let context = match dir {
        Some(dir) => ContextAnalyzer::analyze(dir),
        None => ContextAnalyzer::analyze_cwd(),
    };

    print_json(&serde_json::json!({ "repo": context }))
}

fn handle_match(file: Option<PathBuf>, category: Option<Category>) -> anyhow::Result<()> {
    let input = match file {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            MatchInput::parse(&content)?
        }
        None => MatchInput::from_reader(io::stdin().lock())?,
    };

    let results = RecommendationMatcher::builtin()
        .with_category(category)
        .matches(&input.facts, &input.context, &input.preferences);

    print_json(&results)
}

fn handle_prefs(action: PrefsAction, config: Config) -> anyhow::Result<()> {
    let store = PreferenceStore::from_config(&config);

    let preferences = match action {
        PrefsAction::List => store.list(),
        PrefsAction::Dismiss { id } => {
            let preferences = store.dismiss(&id)?;
            if RecommendationCatalog::get(id.trim()).is_none() {
                match RecommendationCatalog::closest_id(id.trim()) {
                    Some(closest) => eprintln!(
                        "Note: '{}' is not a known recommendation. Did you mean '{}'?",
                        id.trim(),
                        closest
                    ),
                    None => eprintln!("Note: '{}' is not a known recommendation.", id.trim()),
                }
            }
            preferences
        }
        PrefsAction::Undismiss { id } => store.undismiss(&id)?,
        PrefsAction::Alternative { from, to } => store.alternative(&from, &to)?,
        PrefsAction::Clear => store.clear()?,
    };

    print_json(&preferences)
}

async fn handle_improve(
    dir: Option<PathBuf>,
    json: bool,
    category: Option<Category>,
    config: Config,
) -> anyhow::Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not read the current directory")?,
    };

    let report = Analyzer::new(config)
        .with_category(category)
        .analyze(dir)
        .await?;

    if json {
        return print_json(&report.results);
    }

    write_report(&mut io::stdout().lock(), &report)?;
    Ok(())
}

fn write_report<W: Write>(out: &mut W, report: &AnalysisReport) -> io::Result<()> {
    let installed = &report.facts.installed;
    writeln!(
        out,
        "Machine: {} ({} CLI tools, {} MCP servers, {} apps, {} plugins)",
        report.facts.operating_system,
        installed.cli_tools.len(),
        installed.mcps.len(),
        installed.applications.len(),
        installed.plugins.len()
    )?;

    let context = &report.context;
    if context.frameworks().is_empty() {
        writeln!(out, "Project: {}", context.project_type())?;
    } else {
        let frameworks: Vec<&str> = context.frameworks().iter().map(String::as_str).collect();
        writeln!(
            out,
            "Project: {} ({})",
            context.project_type(),
            frameworks.join(", ")
        )?;
    }

    if !context.gaps().is_empty() {
        let gaps: Vec<&str> = context.gaps().iter().map(|gap| gap.id()).collect();
        writeln!(out, "Gaps:    {}", gaps.join(", "))?;
    }

    if !report.preferences.alternatives.is_empty() {
        let alternatives: Vec<String> = report
            .preferences
            .alternatives
            .iter()
            .map(|(from, to)| format!("{} -> {}", from, to))
            .collect();
        writeln!(out, "Using:   {}", alternatives.join(", "))?;
    }

    if report.results.is_empty() {
        writeln!(
            out,
            "\nNothing to recommend. Your setup already covers everything we know about."
        )?;
    }

    for (category, rows) in report.grouped() {
        writeln!(out, "\n{}", category)?;
        for row in rows {
            if row.substituted {
                writeln!(
                    out,
                    "  {:<28} {} (your alternative)",
                    row.recommendation_id, row.suggested_tool
                )?;
            } else {
                writeln!(out, "  {:<28} {}", row.recommendation_id, row.suggested_tool)?;
            }
        }
    }

    if !report.skipped.is_empty() {
        writeln!(out, "\nSkipped")?;
        for skipped in &report.skipped {
            writeln!(out, "  {:<28} {}", skipped.recommendation_id, skipped.reason)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value).map_err(FluxError::Serialization)?;
    println!("{}", output);
    Ok(())
}
