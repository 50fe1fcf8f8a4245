//! schema-bootstrap - edit the authorization schema of a bootstrap document
//!
//! ```text
//! schema-bootstrap new [--output bootstrap.yaml]
//! schema-bootstrap add-permissions --res <service>/<resource> [--input ..] [--output ..] <verb>...
//! schema-bootstrap import-service --rbac-config <dir> --svc <name> [--wildcards grant|skip]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bootstrap_schema::{ErrorKind, ImportOptions, MutationSummary, SchemaError, WildcardPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "schema-bootstrap")]
#[command(about = "Grow the authorization schema of a bootstrap document")]
#[command(version)]
struct Cli {
    /// Print the mutation summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty bootstrap file
    New {
        /// The location to store the empty bootstrap file
        #[arg(long, env = "SCHEMA_BOOTSTRAP_OUTPUT", default_value = "bootstrap.yaml")]
        output: PathBuf,
    },
    /// Add permissions to a resource type, creating it if not present
    AddPermissions {
        /// Resource type in the form <service_name>/<resource_type>
        #[arg(long = "res", value_name = "SERVICE/RESOURCE")]
        resource: String,

        #[command(flatten)]
        files: DocumentArgs,

        /// Verbs to expose on the resource type
        #[arg(value_name = "VERB")]
        verbs: Vec<String>,
    },
    /// Import every resource of a service from an RBAC configuration directory
    ImportService {
        /// Directory of service-specific JSON files
        #[arg(long = "rbac-config", env = "RBAC_CONFIG_DIR", value_name = "DIR")]
        rbac_config: PathBuf,

        /// Service to import; must match a JSON file name in the directory
        #[arg(long)]
        svc: String,

        /// Treatment of the service's `*` resource
        #[arg(long, value_enum, default_value_t = Wildcards::Grant)]
        wildcards: Wildcards,

        #[command(flatten)]
        files: DocumentArgs,
    },
}

#[derive(Args)]
struct DocumentArgs {
    /// The bootstrap yaml file to load for editing
    #[arg(long, env = "SCHEMA_BOOTSTRAP_INPUT", default_value = "bootstrap.yaml")]
    input: PathBuf,

    /// Where to store the modified bootstrap yaml
    #[arg(long, env = "SCHEMA_BOOTSTRAP_OUTPUT", default_value = "bootstrap.yaml")]
    output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Wildcards {
    /// Grant service-wide verb wildcards
    Grant,
    /// Ignore the `*` resource
    Skip,
}

impl From<Wildcards> for WildcardPolicy {
    fn from(value: Wildcards) -> Self {
        match value {
            Wildcards::Grant => WildcardPolicy::Grant,
            Wildcards::Skip => WildcardPolicy::Skip,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::New { output } => {
            let created = bootstrap_schema::create_bootstrap_file(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            if !created {
                println!(
                    "Bootstrap file '{}' already exists. Use --output=<path/to/filename> to create a new bootstrap file elsewhere.",
                    output.display()
                );
            }
        }
        Commands::AddPermissions { resource, files, verbs } => {
            let summary =
                bootstrap_schema::add_resource_permissions(&files.input, &files.output, &resource, &verbs)
                    .with_context(|| format!("Failed to add permissions to {resource}"))?;
            report(&summary, cli.json)?;
        }
        Commands::ImportService {
            rbac_config,
            svc,
            wildcards,
            files,
        } => {
            info!(service = %svc, dir = %rbac_config.display(), "importing service");
            let options = ImportOptions {
                wildcard: wildcards.into(),
            };
            let summary =
                bootstrap_schema::import_rbac_service(&files.input, &files.output, &rbac_config, &svc, &options)
                    .with_context(|| format!("Failed to import service {svc}"))?;
            report(&summary, cli.json)?;
        }
    }

    Ok(())
}

fn report(summary: &MutationSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("Schema already up to date");
    }
    for definition in &summary.created_definitions {
        println!("created definition {definition}");
    }
    for permission in &summary.granted_permissions {
        println!("granted permission {permission}");
    }
    Ok(())
}

/// 1 I/O, 2 malformed input, 3 malformed argument.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SchemaError>().map(SchemaError::kind) {
        Some(ErrorKind::Io) | None => 1,
        Some(ErrorKind::MalformedInput) => 2,
        Some(ErrorKind::MalformedArgument) => 3,
    }
}
