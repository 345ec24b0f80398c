use ciphercell::cli::{commands, output, Cli, Commands};
use ciphercell::config::Settings;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` or else the configured level.
fn init_tracing() {
    let fallback = std::env::current_dir()
        .ok()
        .and_then(|cwd| Settings::load(&cwd).ok())
        .map(|settings| settings.log_level)
        .unwrap_or_else(|| Settings::default().log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { ref email } => commands::init::execute(&cli, email.as_deref()).await,
        Commands::Status => commands::status::execute(&cli).await,
        Commands::List { ref search } => commands::list::execute(&cli, search.as_deref()).await,
        Commands::Add {
            ref title,
            ref username,
            ref category,
            ref notes,
        } => {
            commands::add::execute(
                &cli,
                title,
                username.as_deref(),
                category,
                notes.as_deref(),
            )
            .await
        }
        Commands::Delete { ref id, force } => commands::delete::execute(&cli, id, force).await,
        Commands::Copy { ref id } => commands::copy::execute(&cli, id).await,
        Commands::Shell => commands::shell::execute(&cli).await,
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
