//! Output formatting: plain text or JSON.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use sinkhole_core::{BlockingStatus, DomainList, HostIdentity, StatusSource};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render `data` as pretty JSON, or through `plain_fn` for text output.
pub fn render<T>(
    format: OutputFormat,
    data: &T,
    plain_fn: impl FnOnce(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Plain => Ok(plain_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Views ────────────────────────────────────────────────────────────

/// What `status`, `pause` and `watch` report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub blocking: bool,
    pub source: StatusSource,
    pub as_of: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl StatusView {
    pub fn new(status: BlockingStatus, host: Option<HostIdentity>) -> Self {
        Self {
            blocking: status.active,
            source: status.source,
            as_of: status.as_of,
            hostname: host.map(|h| h.hostname),
        }
    }

    pub fn plain(&self, color: bool) -> String {
        let state = blocking_label(self.blocking, color);
        match self.hostname {
            Some(ref host) => format!("Blocking {state} on {host}"),
            None => format!("Blocking {state}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainAction {
    Added,
    Removed,
}

/// Outcome of an allow/deny list edit.
#[derive(Debug, Serialize)]
pub struct DomainView {
    pub domain: String,
    pub list: DomainList,
    pub action: DomainAction,
}

impl DomainView {
    pub fn plain(&self) -> String {
        match self.action {
            DomainAction::Added => format!("Added {} to the {} list", self.domain, self.list),
            DomainAction::Removed => {
                format!("Removed {} from the {} list", self.domain, self.list)
            }
        }
    }
}

pub fn blocking_label(active: bool, color: bool) -> String {
    match (active, color) {
        (true, true) => "enabled".green().bold().to_string(),
        (false, true) => "disabled".red().bold().to_string(),
        (true, false) => "enabled".into(),
        (false, false) => "disabled".into(),
    }
}
