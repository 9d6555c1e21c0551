use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use revloop_core::QuickReview;
use revloop_logging::LogEvent;
use revloop_roles::ProjectProfile;
use revloop_watch::{ConversationEvent, ConversationLog, ConversationWatcher, WatchSession};

use crate::setup::{current_dir, GlobalOptions, Runtime};

pub async fn handle_watch_command(options: &GlobalOptions, file: PathBuf) -> Result<u8> {
    if ConversationLog::initialize(&file)? {
        eprintln!("Created conversation file: {}", file.display());
    }

    let runtime = Runtime::prepare(options, &current_dir()?, false).await?;
    let registry = runtime.config.registry(None)?;
    let reviewer = QuickReview::new(runtime.oracle.clone(), &registry, runtime.logger.clone())?;
    let project = runtime.config.project.as_ref();

    let watcher = ConversationWatcher::new(&file)?;
    let mut rx = watcher.subscribe();
    let mut session = WatchSession::new(watcher.file());

    runtime.logger.log(&LogEvent::WatchStarted {
        file: watcher.file().to_path_buf(),
    });
    eprintln!("Press Ctrl+C to stop");

    // One listener for the whole watch, so Ctrl+C during a review is not lost.
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // A submission may already be waiting.
    let mut running = until_shutdown(
        &mut shutdown,
        respond(&mut session, &reviewer, project, &runtime),
    )
    .await
    .is_some();

    while running {
        let Some(event) = until_shutdown(&mut shutdown, rx.recv()).await else {
            break;
        };
        match event {
            Ok(ConversationEvent::Modified { .. }) | Err(RecvError::Lagged(_)) => {
                running = until_shutdown(
                    &mut shutdown,
                    respond(&mut session, &reviewer, project, &runtime),
                )
                .await
                .is_some();
            }
            Ok(ConversationEvent::Removed { path }) => {
                warn!(path = %path.display(), "Conversation file removed");
            }
            Err(RecvError::Closed) => return Ok(0),
        }
    }

    eprintln!("\nStopped watching.");
    Ok(0)
}

/// Run `work` unless `shutdown` resolves first, in which case `work` is dropped
/// and `None` comes back. `shutdown` stays armed across calls.
async fn until_shutdown<S, F>(shutdown: &mut Pin<&mut S>, work: F) -> Option<F::Output>
where
    S: Future,
    F: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = shutdown.as_mut() => None,
    }
}

/// Review the pending submission, if any. Failures are logged and the watch goes on.
async fn respond(
    session: &mut WatchSession,
    reviewer: &QuickReview,
    project: Option<&ProjectProfile>,
    runtime: &Runtime,
) {
    let submission = match session.poll() {
        Ok(Some(submission)) => submission,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "Failed to read conversation file");
            return;
        }
    };

    runtime.logger.log(&LogEvent::SubmissionDetected {
        preview: submission.chars().take(100).collect(),
    });

    let outcome = match reviewer.review(&submission, None, project).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Review failed; waiting for the next change");
            return;
        }
    };

    match session.record_review(&outcome.text) {
        Ok(()) => runtime.logger.log(&LogEvent::ReviewAppended {
            approved: outcome.approved,
        }),
        Err(e) => warn!(error = %e, "Failed to append review"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_shutdown_interrupts_work_in_flight() {
        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = rx;
        tokio::pin!(shutdown);

        // First round finishes normally and leaves the listener armed.
        assert_eq!(until_shutdown(&mut shutdown, async { 7 }).await, Some(7));

        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        // A long review is cut short by the signal that arrives while it runs.
        let interrupted = timeout(
            Duration::from_secs(2),
            until_shutdown(&mut shutdown, sleep(Duration::from_secs(30))),
        )
        .await
        .unwrap();
        assert_eq!(interrupted, None);
    }

    #[tokio::test]
    async fn test_signal_between_rounds_is_not_lost() {
        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = rx;
        tokio::pin!(shutdown);

        assert_eq!(until_shutdown(&mut shutdown, async {}).await, Some(()));
        tx.send(()).unwrap();

        let next = timeout(
            Duration::from_secs(2),
            until_shutdown(&mut shutdown, std::future::pending::<()>()),
        )
        .await
        .unwrap();
        assert_eq!(next, None);
    }
}
