use anyhow::Context;
use clap::{Parser, Subcommand};
use lap_logger as logger;
use lap_slotgen::commands::{
    config::{self, ConfigAction},
    generate::{self, GenerateCommand},
    identity::{self, IdentityCommand},
    inspect::{self, InspectCommand},
};
use lap_slotgen::common::GlobalOpts;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "lap-slotgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "LightAP service registry slot generator",
    long_about = "lap-slotgen reads AUTOSAR Adaptive service manifests (ARXML) and generates \
                  the slot configuration used by the LightAP service registry."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a slot configuration from service manifests
    Generate(GenerateCommand),
    /// Summarize and audit a generated slot configuration
    Inspect(InspectCommand),
    /// Print the derived identity of service names
    Identity(IdentityCommand),
    /// Configure lap-slotgen defaults
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.quiet) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing(&cli.global);

    if let Err(e) = run(cli) {
        logger::error(&format!("{:#}", e));
        if logger::get_verbosity() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(cmd) => {
            generate::handle_generate(&cmd, &cli.global).context("Generate command failed")?;
        }
        Commands::Inspect(cmd) => {
            inspect::handle_inspect(&cmd, &cli.global).context("Inspect command failed")?;
        }
        Commands::Identity(cmd) => identity::handle_identity(&cmd),
        Commands::Config { action } => {
            config::handle_config(action, &cli.global).context("Config command failed")?;
        }
    }
    Ok(())
}

fn init_tracing(opts: &GlobalOpts) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(opts.tracing_directive()));

    let (compact, json) = if opts.log_json {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .init();
}
