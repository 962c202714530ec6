//! refolio - EPUB restructurer

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, debug, warn};

use refolio::error::ResultExt;
use refolio::{
    Config, ConsolidationConfig, Report, Stage, analyze, compare, default_output_path, validate,
};

#[derive(Parser)]
#[command(name = "refolio")]
#[command(version, about = "Restructure fragmented EPUB files into clean packages", long_about = None)]
#[command(after_help = "EXAMPLES:
    refolio book.epub                    Write book-fixed.epub
    refolio book.epub -o clean.epub      Choose the output file
    refolio book.epub --label Chương     Localize generated chapter titles
    refolio book.epub --analyze --json   Print archive statistics as JSON")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (default: <INPUT stem>-fixed.epub)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Directory with the stylesheet, font, logo and page templates
    #[arg(short = 'f', long, value_name = "FORMAT_DIR", default_value = "format")]
    format_dir: PathBuf,

    /// Verbose logging; also compares input and output statistics
    #[arg(long)]
    debug: bool,

    /// Only report errors
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,

    /// Keep every source document as its own chapter
    #[arg(long)]
    no_consolidate: bool,

    /// Word used for generated chapter titles
    #[arg(long, value_name = "LABEL")]
    label: Option<String>,

    /// Print archive statistics and exit
    #[arg(long)]
    analyze: bool,

    /// Check the archive structure and exit
    #[arg(long)]
    validate: bool,

    /// Compare statistics with another EPUB and exit
    #[arg(long, value_name = "OTHER")]
    compare: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = if let Some(other) = &cli.compare {
        show_comparison(&cli.input, other, cli.json)
    } else if cli.analyze {
        show_stats(&cli.input, cli.json)
    } else if cli.validate {
        show_validation(&cli.input, cli.json)
    } else {
        restructure(&cli)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn config_from(cli: &Cli) -> Config {
    let consolidation = ConsolidationConfig {
        enabled: !cli.no_consolidate,
        ..Default::default()
    };
    let mut config = Config::default()
        .with_format_dir(&cli.format_dir)
        .with_consolidation(consolidation);
    if let Some(label) = &cli.label {
        config = config.with_chapter_label(label.as_str());
    }
    config
}

fn restructure(cli: &Cli) -> Result<ExitCode, String> {
    let validation = validate(&cli.input)
        .stage(Stage::Extract)
        .map_err(|e| e.to_string())?;
    for message in &validation.warnings {
        warn!("{}: {message}", cli.input.display());
    }
    if !validation.is_valid() {
        return Err(format!(
            "{} failed: {} is not a valid EPUB: {}",
            Stage::Extract,
            cli.input.display(),
            validation.errors.join("; ")
        ));
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    let config = config_from(cli);

    if cli.debug
        && let Ok(stats) = analyze(&cli.input)
    {
        debug!("input statistics:\n{stats}");
    }

    let report = refolio::process(&cli.input, &output, &config).map_err(|e| e.to_string())?;

    if cli.debug
        && let Ok(comparison) = compare(&cli.input, &output)
    {
        debug!("input vs output:\n{comparison}");
    }

    if cli.json {
        println!("{}", to_json(&report)?);
    } else if !cli.quiet {
        print_report(&report);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &Report) {
    println!("Title: {}", report.title);
    println!("Output: {}", report.output.display());
    println!("Documents: {}", report.documents);
    println!("Chapters: {}", report.chapters);
    println!("Images: {}", report.images);
    println!("Cover: {}", if report.has_cover { "yes" } else { "no" });
    if report.fallback_sanitized > 0 {
        println!("Pattern-cleaned chapters: {}", report.fallback_sanitized);
    }
    if !report.warnings.is_empty() {
        println!("Warnings: {}", report.warnings.len());
    }
}

fn show_stats(path: &Path, json: bool) -> Result<ExitCode, String> {
    let stats = analyze(path).map_err(|e| e.to_string())?;
    if json {
        println!("{}", to_json(&stats)?);
    } else {
        println!("{stats}");
    }
    Ok(ExitCode::SUCCESS)
}

fn show_validation(path: &Path, json: bool) -> Result<ExitCode, String> {
    let validation = validate(path).map_err(|e| e.to_string())?;
    if json {
        println!("{}", to_json(&validation)?);
    } else {
        for error in &validation.errors {
            println!("error: {error}");
        }
        for warning in &validation.warnings {
            println!("warning: {warning}");
        }
        if validation.is_valid() {
            println!("{}: OK", path.display());
        }
    }
    Ok(if validation.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_comparison(path: &Path, other: &Path, json: bool) -> Result<ExitCode, String> {
    let comparison = compare(path, other).map_err(|e| e.to_string())?;
    if json {
        println!("{}", to_json(&comparison)?);
    } else {
        println!("{comparison}");
    }
    Ok(ExitCode::SUCCESS)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}
