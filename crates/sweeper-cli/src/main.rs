mod commands;
mod logging;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{ClassifyArgs, Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use sweeper_core::classifier::{LifecycleDecision, Recommendation, Summary};
use sweeper_core::config::Policy;
use sweeper_core::generator::{Generator, LocalGenerator};
use sweeper_core::report::ClassificationReport;
use sweeper_core::{AppConfig, ClassifyEngine};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match sweeper_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan { check }) => {
            if let Err(err) = run_scan(&config, check) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::Classify(classify_args)) => {
            if let Err(err) = run_classify(config, classify_args) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::Inspect { verbose, input }) => {
            let path = input.unwrap_or_else(|| PathBuf::from(&config.output.recommendations_path));
            if let Err(err) = run_inspect(&path, verbose) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            let rendered =
                toml::to_string_pretty(&config).context("Could not render configuration")?;
            println!("{}", rendered);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_scan(config: &AppConfig, check: bool) -> Result<()> {
    config.validate()?;
    let reporter = CliReporter::new();
    let index = sweeper_core::scanner::scan_repository(&config.scan, &reporter)?;

    info!(
        "{} files indexed under {}",
        format!("{}", index.files.len()).green(),
        config.scan.root.cyan(),
    );

    let index_path = Path::new(&config.output.index_path);
    if check {
        println!("Would write to {}", index_path.display());
        return Ok(());
    }

    index
        .save(index_path)
        .with_context(|| format!("Could not write index to {}", index_path.display()))?;
    info!("Index written to {}", index_path.display());
    Ok(())
}

fn run_classify(mut config: AppConfig, args: ClassifyArgs) -> Result<()> {
    if let Some(policy) = args.policy {
        config.classifier.policy = policy.into();
    }
    if let Some(limit) = args.limit {
        config.classifier.max_generation_calls = Some(limit);
        if config.classifier.policy != Policy::Selective {
            warn!("--limit only applies to the selective policy");
        }
    }
    if let Some(days) = args.deprecation_days {
        config.classifier.deprecation_days = days;
    }
    if args.generator {
        config.classifier.use_generator = true;
    }
    config.validate()?;

    let index_path = args
        .index
        .unwrap_or_else(|| PathBuf::from(&config.output.index_path));
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.recommendations_path));

    let generator = if config.classifier.use_generator {
        match LocalGenerator::connect(config.generator.clone()) {
            Ok(generator) => Some(generator),
            Err(err) => {
                warn!("Generator setup failed, continuing with rules: {}", err);
                None
            }
        }
    } else {
        None
    };

    let engine = ClassifyEngine::new(config.classifier.clone());
    let reporter = CliReporter::new();
    let report = engine.run(
        &index_path,
        generator.as_ref().map(|g| g as &dyn Generator),
        &reporter,
    )?;

    print_summary(&report);

    if args.preview {
        println!("Would write to {}", output_path.display());
        return Ok(());
    }

    report
        .save(&output_path)
        .with_context(|| format!("Could not write recommendations to {}", output_path.display()))?;
    info!("Recommendations written to {}", output_path.display());
    Ok(())
}

fn print_summary(report: &ClassificationReport) {
    let Summary {
        total_files,
        by_decision,
        confidence_distribution,
    } = &report.summary;

    println!();
    println!(
        "{} files classified ({})",
        format!("{}", total_files).bold(),
        report.metadata.classification_method.as_str(),
    );
    println!(
        "  keep: {}  archive: {}  delete: {}  review: {}",
        format!("{}", by_decision.keep).green(),
        format!("{}", by_decision.archive).yellow(),
        format!("{}", by_decision.delete).red(),
        format!("{}", by_decision.review).cyan(),
    );
    println!(
        "  confidence high: {}  medium: {}  low: {}",
        confidence_distribution.high, confidence_distribution.medium, confidence_distribution.low,
    );
    if let Some(stats) = &report.metadata.generation_stats {
        println!(
            "  generator: {} attempts, {} successes, {} fallbacks",
            stats.attempts, stats.successes, stats.fallbacks,
        );
    }
}

fn run_inspect(path: &Path, verbose: bool) -> Result<()> {
    let report = ClassificationReport::load(path)
        .with_context(|| format!("Could not read recommendations from {}", path.display()))?;
    let meta = &report.metadata;

    println!(
        "Classification method: {}",
        meta.classification_method.as_str().bold()
    );
    if let Some(calls) = meta.generation_calls {
        let budget = meta
            .max_generation_calls
            .map_or_else(|| "unbounded".to_string(), |max| max.to_string());
        let policy = meta.policy.map_or("n/a", |p| p.as_str());
        println!("  policy: {}, generator calls: {} / {}", policy, calls, budget);
    }
    if let Some(stats) = &meta.generation_stats {
        if let Some(rate) = stats.parse_success_rate() {
            println!(
                "  parse: {} attempts, {} ok ({:.1}%), {} failed",
                stats.parse_attempts,
                stats.parse_successes,
                rate * 100.0,
                stats.parse_failures,
            );
        }
        if let Some(rate) = stats.fallback_rate() {
            println!(
                "  fallbacks: {} of {} attempts ({:.1}%)",
                stats.fallbacks,
                stats.attempts,
                rate * 100.0,
            );
        }
    }

    println!();
    println!("Recommendations ({} files):", report.summary.total_files);
    for (decision, count, percent) in report.decision_shares() {
        println!("  {:8} {:>5} ({:5.1}%)", decision.as_str(), count, percent);
    }

    let review = report.files_with(LifecycleDecision::Review);
    println!();
    if review.is_empty() {
        println!("{}", "No files require review".green());
    } else {
        println!("Files requiring review ({}):", format!("{}", review.len()).cyan());
        print_recommendations(&review);
    }

    if verbose {
        for decision in [LifecycleDecision::Archive, LifecycleDecision::Delete] {
            let files = report.files_with(decision);
            if !files.is_empty() {
                println!();
                println!(
                    "Files marked for {} ({}):",
                    decision.as_str(),
                    format!("{}", files.len()).yellow()
                );
                print_recommendations(&files);
            }
        }
    }

    Ok(())
}

fn print_recommendations(recommendations: &[&Recommendation]) {
    for rec in recommendations {
        println!("  {} ({:.2})", rec.path.bold(), rec.confidence);
        for reason in &rec.reasons {
            println!("      - {}", reason);
        }
        if let Some(action) = &rec.suggested_action {
            println!("      action: {}", action);
        }
    }
}
