//! EO Naming CLI
//!
//! Parse product filenames into fields and assemble filenames from fields.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eo_naming::{FieldMap, NamingConfig, Scope, Transcoder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eo-naming")]
#[command(about = "Parse and assemble Earth-observation product filenames")]
struct Cli {
    #[command(flatten)]
    sources: Sources,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// Configuration file (layered over naming.toml and EO_NAMING__* variables)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Additional schema directory (repeatable)
    #[arg(short = 'd', long = "schema-dir", global = true)]
    schema_dirs: Vec<PathBuf>,

    /// Do not load the bundled schemas
    #[arg(long, global = true)]
    no_bundled: bool,
}

#[derive(Args)]
struct Target {
    /// Restrict to one schema family
    #[arg(short, long)]
    family: Option<String>,

    /// Exact schema version within the family
    #[arg(short = 'V', long, requires = "family")]
    version: Option<String>,
}

impl Target {
    fn scope(&self) -> Scope<'_> {
        match &self.family {
            Some(name) => Scope::Family {
                name: name.as_str(),
                version: self.version.as_deref(),
            },
            None => Scope::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a filename and print its fields as JSON
    Parse {
        filename: String,

        #[command(flatten)]
        target: Target,
    },

    /// Assemble a filename from KEY=VALUE fields
    Assemble {
        /// Fields as KEY=VALUE
        fields: Vec<String>,

        /// Read fields from a JSON object file ("-" for stdin)
        #[arg(long)]
        from_json: Option<PathBuf>,

        #[command(flatten)]
        target: Target,
    },

    /// List known schema families and versions
    ListSchemas,

    /// Show a schema's template, fields and examples
    Describe {
        family: String,

        #[arg(short = 'V', long)]
        version: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = NamingConfig::load_from(cli.sources.config.as_deref())?;
    config.registry.schema_dirs.extend(cli.sources.schema_dirs);
    if cli.sources.no_bundled {
        config.registry.include_bundled = false;
    }

    let (registry, report) = config.build_registry()?;
    for failure in &report.failures {
        eprintln!("⚠️  {}: {}", failure.path, failure.error);
    }
    let transcoder = Transcoder::new(registry);

    match cli.command {
        Commands::Parse { filename, target } => {
            let parsed = transcoder.parse(&filename, target.scope())?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }

        Commands::Assemble {
            fields,
            from_json,
            target,
        } => {
            let mut supplied = match from_json {
                Some(path) => read_json_fields(&path)?,
                None => FieldMap::new(),
            };
            for pair in fields {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", pair))?;
                supplied.insert(key.trim().to_string(), value.to_string());
            }

            let filename = transcoder.assemble(&supplied, target.scope())?;
            println!("{}", filename);
            Ok(())
        }

        Commands::ListSchemas => {
            let registry = transcoder.registry();
            if registry.is_empty() {
                println!("No schemas loaded");
                return Ok(());
            }
            for family in registry.families() {
                let default = registry.resolve(family, None).ok().map(|d| d.key());
                println!("{}", family);
                for doc in registry.versions(family)?.into_iter().rev() {
                    let marker = if default.as_deref() == Some(doc.key().as_str()) { "*" } else { " " };
                    println!("  {} {} {} [{}]", marker, doc.version(), doc.schema_id(), doc.status());
                }
            }
            Ok(())
        }

        Commands::Describe { family, version } => {
            let doc = transcoder.registry().resolve(&family, version.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&doc.describe())?);
            Ok(())
        }
    }
}

/// Read a flat JSON object; non-string scalars are stringified
fn read_json_fields(path: &Path) -> Result<FieldMap, Box<dyn std::error::Error>> {
    let content = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let object = value.as_object().ok_or("field JSON must be an object")?;

    let mut fields = FieldMap::new();
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => continue,
            other => other.to_string(),
        };
        fields.insert(key.clone(), text);
    }
    Ok(fields)
}
