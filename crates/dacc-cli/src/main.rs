use clap::Parser;
use tracing_subscriber::EnvFilter;

use dacc_cli::cli::{Cli, Commands};

mod commands;

use commands::run::RunArgs;

fn init_tracing(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Completions { shell, out } => commands::completions::handle(*shell, out.as_deref()),
        Commands::Config { command } => commands::config::handle(config_path, command),
        Commands::Hours {
            date,
            timezone,
            version,
        } => {
            let config = commands::load_config(config_path)?;
            commands::hours::handle(&config, *date, timezone.as_deref(), *version)
        }
        Commands::Name { command } => {
            let config = commands::load_config(config_path)?;
            commands::name::handle(&config, command)
        }
        Commands::Run {
            request,
            constraints,
            outcomes,
            out,
        } => {
            let config = commands::load_config(config_path)?;
            commands::run::handle(
                &config,
                RunArgs {
                    request,
                    constraints,
                    outcomes,
                    out: out.as_deref(),
                },
            )
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
