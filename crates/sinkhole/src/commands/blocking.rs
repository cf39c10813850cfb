//! `sinkhole status`, `sinkhole pause` and `sinkhole watch`.

use chrono::Local;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::StreamExt;
use tracing::debug;

use sinkhole_core::{BlockingStatus, CoreError, Remote, SessionEvent};

use super::Context;
use crate::cli::{OutputFormat, PauseArgs};
use crate::error::CliError;
use crate::output::{self, StatusView};

pub async fn status(ctx: &Context) -> Result<(), CliError> {
    let (status, host) = ctx
        .oneshot(|remote| async move {
            let status = remote.refresh().await?;
            Ok::<_, CoreError>((status, remote.host()))
        })
        .await?;

    let view = StatusView::new(status, host);
    let rendered = output::render(ctx.format, &view, |v| v.plain(ctx.color))?;
    ctx.print(&rendered);
    Ok(())
}

pub async fn pause(ctx: &Context, args: PauseArgs) -> Result<(), CliError> {
    let seconds = args.seconds;
    let (status, host) = ctx
        .oneshot(|remote| async move {
            let status = remote.pause_blocking(seconds).await?;
            Ok::<_, CoreError>((status, remote.host()))
        })
        .await?;

    let view = StatusView::new(status, host);
    let rendered = output::render(ctx.format, &view, |v| {
        format!("{} for {seconds}s", v.plain(ctx.color))
    })?;
    ctx.print(&rendered);
    Ok(())
}

/// Stay signed in and print each change of the blocking state until
/// Ctrl-C or the session is lost.
pub async fn watch(ctx: &Context) -> Result<(), CliError> {
    let remote = Remote::new(ctx.remote.clone(), ctx.credentials());
    let mut events = remote.events();
    if let Err(e) = remote.resume().await {
        remote.shutdown().await;
        return Err(e.into());
    }

    let result = follow(ctx, &remote, &mut events).await;
    remote.shutdown().await;
    result
}

async fn follow(
    ctx: &Context,
    remote: &Remote,
    events: &mut broadcast::Receiver<SessionEvent>,
) -> Result<(), CliError> {
    // Yields the cached value first, then every change.
    let mut updates = remote.status().into_stream();
    let mut last_shown = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                return Ok(());
            }
            update = updates.next() => match update {
                Some(Some(current)) => show(ctx, remote, current, &mut last_shown)?,
                Some(None) => {}
                None => return Ok(()),
            },
            event = events.recv() => match event {
                Ok(SessionEvent::AuthenticationFailed { message }) => {
                    return Err(CliError::AuthFailed { message });
                }
                Ok(SessionEvent::SignedOut) | Err(RecvError::Closed) => return Ok(()),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            },
        }
    }
}

/// Print only when the blocking flag actually flips.
fn show(
    ctx: &Context,
    remote: &Remote,
    status: BlockingStatus,
    last_shown: &mut Option<bool>,
) -> Result<(), CliError> {
    if *last_shown == Some(status.active) {
        return Ok(());
    }
    *last_shown = Some(status.active);

    let view = StatusView::new(status, remote.host());
    let rendered = match ctx.format {
        OutputFormat::Json => serde_json::to_string(&view)?,
        OutputFormat::Plain => {
            let at = status.as_of.with_timezone(&Local);
            format!("{}  {}", at.format("%H:%M:%S"), view.plain(ctx.color))
        }
    };
    ctx.print(&rendered);
    Ok(())
}
