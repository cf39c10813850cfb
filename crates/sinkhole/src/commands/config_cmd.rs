//! Config subcommand handlers. These never contact the appliance.

use std::fmt::Write;

use sinkhole_config::{self as config, Config, PASSWORD_ENV};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Format config for display. The password never lives in the file;
/// only whether the environment override is set is shown.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();
    match cfg.server {
        Some(ref server) => {
            let _ = writeln!(out, "server = \"{server}\"");
        }
        None => {
            let _ = writeln!(out, "# server = (not set)");
        }
    }
    let _ = writeln!(out, "output = \"{}\"", cfg.output);
    let _ = writeln!(out, "insecure = {}", cfg.insecure);
    if let Some(ref ca) = cfg.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }
    let _ = write!(out, "timeout = {}", cfg.timeout);
    if std::env::var_os(PASSWORD_ENV).is_some() {
        let _ = write!(out, "\n# password from {PASSWORD_ENV}");
    }
    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let rendered = match global.output {
                Some(format) => output::render(format, &cfg, format_config)?,
                None => format_config(&cfg),
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetServer { url } => {
            let parsed = config::parse_server(&url)?;
            let path = config::config_path();
            let mut cfg = config::load_config_from(&path)?;
            cfg.server = Some(parsed.to_string());
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Server set to {parsed} in {}", path.display());
            }
            Ok(())
        }
    }
}
