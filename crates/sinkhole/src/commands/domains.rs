//! `sinkhole allow|deny add|remove <domain>`

use sinkhole_core::{DomainList, validate_domain};

use super::Context;
use crate::cli::{DomainArgs, DomainCommand};
use crate::error::CliError;
use crate::output::{self, DomainAction, DomainView};

pub async fn handle(ctx: &Context, list: DomainList, args: DomainArgs) -> Result<(), CliError> {
    let (domain, action) = match args.command {
        DomainCommand::Add { domain } => (domain, DomainAction::Added),
        DomainCommand::Remove { domain } => (domain, DomainAction::Removed),
    };

    // Reject bad input before signing in.
    validate_domain(&domain)?;

    let name = domain.clone();
    ctx.oneshot(|remote| async move {
        match action {
            DomainAction::Added => remote.add_domain(&name, list).await,
            DomainAction::Removed => remote.remove_domain(&name, list).await,
        }
    })
    .await?;

    let view = DomainView {
        domain,
        list,
        action,
    };
    let rendered = output::render(ctx.format, &view, DomainView::plain)?;
    ctx.print(&rendered);
    Ok(())
}
