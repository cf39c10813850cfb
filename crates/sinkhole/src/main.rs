mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the appliance
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sinkhole", &mut std::io::stdout());
            Ok(())
        }

        Command::Login => {
            let mut cfg = sinkhole_config::load_config()?;
            if cli.global.server.is_none() && cfg.server.is_none() {
                cfg.server = Some(commands::login::prompt_server()?);
            }
            let ctx = Context::resolve(&cli.global, &cfg)?;
            commands::login::handle(&ctx).await
        }

        cmd => {
            let cfg = sinkhole_config::load_config()?;
            let ctx = Context::resolve(&cli.global, &cfg)?;

            tracing::debug!(command = ?cmd, server = %ctx.server, "dispatching command");
            commands::dispatch(cmd, &ctx).await
        }
    }
}
