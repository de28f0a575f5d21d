//! Fabmaster CLI - import Allegro FABMASTER ASCII exports from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fabmaster::parser::{detect_sections, tokenize};
use fabmaster::{
    Board, Diagnostic, FabmasterImporter, FabmasterParser, ImportOptions, ImportResult, Severity,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fabmaster")]
#[command(about = "Allegro FABMASTER ASCII board importer", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a FABMASTER file and report what was built
    Import {
        /// Path to the FABMASTER .txt/.fab export
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Write the synthesized board as JSON to this path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Exit with error code if diagnostics at this severity or higher were reported
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// JSON file with import options
        #[arg(long, value_name = "JSON")]
        config: Option<PathBuf>,

        /// Keep unnetted zone outlines as they are
        #[arg(long)]
        no_zone_nets: bool,
    },

    /// List the sections detected in a file
    Sections {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show how source layers map onto board layers
    Layers {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

impl FailOnSeverity {
    fn severity(&self) -> Severity {
        match self {
            FailOnSeverity::Error => Severity::Error,
            FailOnSeverity::Warning => Severity::Warning,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Import {
            file,
            format,
            output,
            fail_on,
            config,
            no_zone_nets,
        } => handle_import(&file, format, output.as_deref(), fail_on, config.as_deref(), no_zone_nets),
        Commands::Sections { file } => handle_sections(&file),
        Commands::Layers { file } => handle_layers(&file),
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_options(config: Option<&Path>, no_zone_nets: bool) -> anyhow::Result<ImportOptions> {
    let mut options = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ImportOptions::default(),
    };
    if no_zone_nets {
        options.assign_zone_nets = false;
    }
    Ok(options)
}

fn handle_import(
    file: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    fail_on: Option<FailOnSeverity>,
    config: Option<&Path>,
    no_zone_nets: bool,
) -> i32 {
    let options = match load_options(config, no_zone_nets) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };

    let result = match FabmasterImporter::load(file, None, &options, None) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    output_result(file, &result, &format);

    if let Some(path) = output {
        if let Err(e) = write_board(path, &result.board) {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    }

    match fail_on {
        Some(severity) if result.has_at_least(severity.severity()) => 1,
        _ => 0,
    }
}

fn write_board(path: &Path, board: &Board) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(board).context("cannot serialize board")?;
    std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))
}

fn output_result(file: &Path, result: &ImportResult, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(file, result),
        OutputFormat::Json => output_json(file, result),
        OutputFormat::Github => output_github(file, result),
    }
}

fn output_human(file: &Path, result: &ImportResult) {
    let stats = &result.stats;
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));
    println!("  Footprints:     {}", stats.footprints);
    println!("  Pads:           {}", stats.pads);
    println!("  Tracks:         {}", stats.tracks);
    println!("  Arcs:           {}", stats.arcs);
    println!("  Vias:           {}", stats.vias);
    println!("  Zones:          {}", stats.zones);
    println!("  Shapes:         {}", stats.shapes);
    println!("  Texts:          {}", stats.texts);
    println!("  Nets:           {}", stats.nets);
    println!("  Enabled layers: {}", stats.enabled_layers);

    if result.diagnostics.is_empty() {
        println!("\n  No diagnostics");
        return;
    }

    for (title, severity) in [
        ("ERRORS", Severity::Error),
        ("WARNINGS", Severity::Warning),
        ("INFO", Severity::Info),
    ] {
        let entries: Vec<&Diagnostic> = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect();
        if entries.is_empty() {
            continue;
        }
        println!("\n  {}:", title);
        for diag in entries {
            match diag.row {
                Some(row) => println!("    - row {}: {}", row, diag.message),
                None => println!("    - {}", diag.message),
            }
        }
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", stats.errors);
    println!("    Warnings: {}", stats.warnings);
    println!("    Info:     {}", stats.infos);
}

fn output_json(file: &Path, result: &ImportResult) {
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "stats": result.stats,
        "diagnostics": result.diagnostics,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: cannot serialize result: {}", e),
    }
}

fn severity_to_github(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    }
}

fn output_github(file: &Path, result: &ImportResult) {
    for diag in &result.diagnostics {
        let location = match diag.row {
            Some(row) => format!("file={},line={}", file.display(), row),
            None => format!("file={}", file.display()),
        };
        println!(
            "::{} {}::{}",
            severity_to_github(diag.severity),
            location,
            diag.message.replace('\n', " ")
        );
    }
}

fn read_file(file: &Path) -> Result<String, i32> {
    std::fs::read(file)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| {
            eprintln!("Error: cannot read {}: {}", file.display(), e);
            1
        })
}

fn handle_sections(file: &Path) -> i32 {
    let text = match read_file(file) {
        Ok(text) => text,
        Err(code) => return code,
    };

    let sections = detect_sections(&tokenize(&text));
    if sections.is_empty() {
        println!("No FABMASTER sections found in {}", file.display());
        return 0;
    }
    for (row, kind) in sections {
        println!("  {:>6}  {}", row, kind);
    }
    0
}

fn handle_layers(file: &Path) -> i32 {
    let text = match read_file(file) {
        Ok(text) => text,
        Err(code) => return code,
    };

    let ctx = FabmasterParser::parse_str(&text);
    let mut layers: Vec<_> = ctx.db.layers.values().collect();
    layers.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.name.cmp(&b.name)));

    println!("  {:<28} {:<10} {}", "SOURCE", "COPPER", "BOARD LAYER");
    for layer in layers {
        let target = match (layer.disabled, layer.target) {
            (true, _) => "(disabled)".to_string(),
            (false, Some(target)) => target.name(),
            (false, None) => "(unmapped)".to_string(),
        };
        let copper = if layer.conductive { "yes" } else { "no" };
        println!("  {:<28} {:<10} {}", layer.name, copper, target);
    }
    0
}
