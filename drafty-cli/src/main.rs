use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "drafty")]
#[command(about = "Share unpublished documents through expiring links")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true)]
    json: bool,

    /// Principal id acting on the registry
    #[arg(long, global = true, env = "DRAFTY_USER")]
    user: Option<u64>,

    /// Act with administrative rights (bypasses ownership checks)
    #[arg(long, global = true)]
    privileged: bool,

    /// Config file path
    #[arg(long, global = true, env = "DRAFTY_CONFIG")]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a share link for a subject
    Create(commands::share::CreateArgs),
    /// List shares on a subject
    List(commands::share::ListArgs),
    /// Check whether a token grants access to a subject
    Check(commands::access::CheckArgs),
    /// Extend a share
    Extend(commands::share::ExtendArgs),
    /// Delete a share
    Delete(commands::share::DeleteArgs),
    /// Overwrite a share's expiry (privileged)
    SetExpiry(commands::share::SetExpiryArgs),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "drafty_cli=debug,drafty_share=debug"
    } else {
        "drafty_cli=info,drafty_share=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::load(cli.config.as_deref())?;
    let ctx = commands::Context::new(
        &config,
        cli.user.map(Into::into),
        cli.privileged,
        cli.json,
    )
    .await?;

    let succeeded = match cli.command {
        Commands::Create(args) => commands::share::create(args, &ctx).await,
        Commands::List(args) => commands::share::list(args, &ctx).await,
        Commands::Check(args) => commands::access::check(args, &ctx).await,
        Commands::Extend(args) => commands::share::extend(args, &ctx).await,
        Commands::Delete(args) => commands::share::delete(args, &ctx).await,
        Commands::SetExpiry(args) => commands::share::set_expiry(args, &ctx).await,
    }?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
