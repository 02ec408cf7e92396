//! Schema Validator CLI
//!
//! Checks that every schema's examples survive a parse/assemble round trip.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eo_naming::{ExampleReport, ExampleStatus, NamingConfig, SchemaDocument, Transcoder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Validate filename schemas against their own examples")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Additional schema directory (repeatable)
    #[arg(short = 'd', long = "schema-dir")]
    schema_dirs: Vec<PathBuf>,

    /// Do not load the bundled schemas
    #[arg(long)]
    no_bundled: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Round-trip every example of every schema (or of one family)
    Examples {
        /// Only this family
        #[arg(short, long)]
        family: Option<String>,

        /// Write a JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when examples are shadowed by another schema
        #[arg(long)]
        strict: bool,
    },

    /// Check a single schema file without registering it
    File {
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = NamingConfig::load_from(cli.config.as_deref())?;
    config.registry.schema_dirs.extend(cli.schema_dirs);
    if cli.no_bundled {
        config.registry.include_bundled = false;
    }

    match cli.command {
        Commands::Examples { family, output, strict } => {
            let strict = strict || config.validation.fail_on_warnings;
            let (registry, load_report) = config.build_registry()?;

            for failure in &load_report.failures {
                println!("❌ {} - {}", failure.path, failure.error);
            }

            let transcoder = Transcoder::new(registry);
            let reports: Vec<ExampleReport> = match &family {
                Some(name) => transcoder
                    .registry()
                    .versions(name)?
                    .into_iter()
                    .map(|doc| transcoder.validate_examples(doc))
                    .collect(),
                None => transcoder.validate_all(),
            };

            println!("🔍 Validating examples of {} schema(s)...", reports.len());
            let mut failed = !load_report.is_clean() && strict;
            let mut warned = false;

            for report in &reports {
                let total = report.outcomes.len();
                let passed = report.passed();
                if passed == total {
                    println!("  ✅ {}@{} - {}/{} examples", report.schema_id, report.version, passed, total);
                } else {
                    failed = true;
                    println!("  ❌ {}@{} - {}/{} examples", report.schema_id, report.version, passed, total);
                }
                for outcome in report.failures() {
                    match &outcome.status {
                        ExampleStatus::ParseFailed { error } | ExampleStatus::AssembleFailed { error } => {
                            println!("     └─ {}: {}", outcome.example, error);
                        }
                        ExampleStatus::Mismatch { assembled } => {
                            println!("     └─ {}: assembled as {}", outcome.example, assembled);
                        }
                        ExampleStatus::Passed => {}
                    }
                }
                for warning in &report.warnings {
                    warned = true;
                    println!("     ⚠️  {}", warning);
                }
            }

            if let Some(path) = output {
                let report = serde_json::json!({
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "schemas": reports.len(),
                    "load_failures": load_report.failures,
                    "reports": reports,
                });
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
                println!("✅ Report written to {:?}", path);
            }

            println!();
            if failed || (strict && warned) {
                println!("❌ Example validation failed");
                std::process::exit(1);
            }
            println!("✅ All examples round-trip");
            Ok(())
        }

        Commands::File { path } => {
            let doc = SchemaDocument::from_path(&path)?;
            let compiled = doc.compiled()?;
            println!("✅ {} is a valid schema ({})", path.display(), doc.key());
            println!("   template: {}", doc.template());
            println!("   matcher:  {}", compiled.matcher().as_str());

            let (registry, _) = config.build_registry()?;
            let report = Transcoder::new(registry).validate_examples(&doc);
            for outcome in &report.outcomes {
                match &outcome.status {
                    ExampleStatus::Passed => println!("   ✅ {}", outcome.example),
                    other => println!("   ❌ {} - {:?}", outcome.example, other),
                }
            }
            if report.failures().next().is_some() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
