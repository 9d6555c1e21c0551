use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted when the conversation file changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversationEvent {
    Modified { path: PathBuf },
    Removed { path: PathBuf },
}

/// Watches one conversation file and emits ConversationEvents.
///
/// The parent directory is watched so editors that save by replacing the
/// file are still seen.
pub struct ConversationWatcher {
    tx: broadcast::Sender<ConversationEvent>,
    file: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ConversationWatcher {
    pub fn new(file: &Path) -> Result<Self> {
        let file = file
            .canonicalize()
            .with_context(|| format!("Conversation file not found: {:?}", file))?;
        let dir = file
            .parent()
            .with_context(|| format!("Conversation file has no parent directory: {:?}", file))?
            .to_path_buf();

        let (tx, _) = broadcast::channel(64);
        let tx_clone = tx.clone();
        let target = file.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                Self::handle_event(&tx_clone, &target, &event);
            }
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(file = ?file, "Watching conversation file");

        Ok(Self {
            tx,
            file,
            _watcher: watcher,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Subscribe to conversation events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.tx.subscribe()
    }

    fn handle_event(tx: &broadcast::Sender<ConversationEvent>, target: &Path, event: &Event) {
        if !event.paths.iter().any(|p| p.file_name() == target.file_name()) {
            return;
        }

        let path = target.to_path_buf();
        let conversation_event = match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => ConversationEvent::Modified { path },
            EventKind::Remove(_) => ConversationEvent::Removed { path },
            _ => return,
        };
        let _ = tx.send(conversation_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use tempfile::TempDir;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    #[test]
    fn test_events_for_other_files_are_ignored() {
        let (tx, mut rx) = broadcast::channel(8);
        let target = PathBuf::from("/tmp/convo.md");

        ConversationWatcher::handle_event(
            &tx,
            &target,
            &event(EventKind::Modify(ModifyKind::Any), "/tmp/other.md".into()),
        );
        ConversationWatcher::handle_event(
            &tx,
            &target,
            &event(EventKind::Create(CreateKind::File), "/tmp/convo.md".into()),
        );
        ConversationWatcher::handle_event(
            &tx,
            &target,
            &event(EventKind::Remove(RemoveKind::File), "/tmp/convo.md".into()),
        );

        assert_eq!(
            rx.try_recv().unwrap(),
            ConversationEvent::Modified {
                path: target.clone()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ConversationEvent::Removed { path: target }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(ConversationWatcher::new(&dir.path().join("missing.md")).is_err());
    }
}
