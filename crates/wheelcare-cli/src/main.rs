#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "wheelcare: wheelchair inventory and beneficiary registry",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON envelopes instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Message language (en or ar). Overrides WHEELCARE_LOCALE and config.
    #[arg(long, global = true, value_name = "LOCALE")]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a wheelcare project",
        long_about = "Create .wheelcare/ with a default config.toml in the current directory.",
        after_help = "EXAMPLES:\n    # SQLite-backed project (default)\n    wheelcare init\n\n    # One JSON file per collection\n    wheelcare init --backend json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Registry",
        about = "Manage wheelchair inventory",
        after_help = "EXAMPLES:\n    # Register a donated chair\n    wheelcare wheelchair create --type standard --condition excellent --source donation\n\n    # List available chairs\n    wheelcare wheelchair list --status available"
    )]
    Wheelchair {
        #[command(subcommand)]
        command: cmd::wheelchair::WheelchairCommand,
    },

    #[command(
        next_help_heading = "Registry",
        about = "Manage beneficiaries and their lifecycle",
        after_help = "EXAMPLES:\n    # Register an applicant\n    wheelcare beneficiary create --first-name Aisha --last-name K\n\n    # Assign a wheelchair, then record the delivery\n    wheelcare beneficiary assign ben-1f3a9c0b whc-0a1b2c3d\n    wheelcare beneficiary deliver ben-1f3a9c0b --date 2024-03-01 --location \"Community Hall\""
    )]
    Beneficiary {
        #[command(subcommand)]
        command: cmd::beneficiary::BeneficiaryCommand,
    },

    #[command(
        next_help_heading = "Project",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    wheelcare completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("WHEELCARE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "wheelcare=debug,info"
        } else {
            "wheelcare=info,warn"
        })
    });

    let format = env::var("WHEELCARE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir()?;
    let settings = cmd::Settings {
        json: cli.json,
        locale: cli.locale.clone(),
    };

    let succeeded = match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &settings, &cwd)?,
        Commands::Wheelchair { ref command } => {
            let mut session = cmd::Session::open(&cwd, &settings)?;
            cmd::wheelchair::run(command, &mut session)?
        }
        Commands::Beneficiary { ref command } => {
            let mut session = cmd::Session::open(&cwd, &settings)?;
            cmd::beneficiary::run(command, &mut session)?
        }
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())?;
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
