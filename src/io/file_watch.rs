//! Directory/file watching (§4.6), grounded on
//! `original_source/core_io/file_monitor/watcher.h`'s `DirectoryMonitor`:
//! that class polls a path on an interval timer and reports added/
//! modified/removed entries through a callback. `notify`'s OS-native
//! watcher delivers events through an mpsc channel instead of a poll loop,
//! but mio has no way to wait on that channel directly, so this drains it
//! on the same interval-timer rhythm as the original — "falls back to a
//! polling scan" in spirit even though the underlying notifier is
//! event-driven.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::actor::{Actor, ActorContext};
use crate::event::CoreOps;
use crate::id::ActorId;

/// What happened to a watched path, grounded on
/// `original_source/core_io/file_monitor/events.h`'s `FileEventType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Removed,
    /// Metadata changed (permissions, timestamps, ownership) with the
    /// file's contents untouched — kept distinct from `Modified` since a
    /// watcher reacting to content changes has no reason to wake for these.
    AttributesChanged,
}

#[derive(Debug, Clone)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

fn classify(event: &NotifyEvent) -> Option<FileEventKind> {
    match event.kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(FileEventKind::AttributesChanged),
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        EventKind::Remove(_) => Some(FileEventKind::Removed),
        _ => None,
    }
}

/// Watch `path` (recursively), delivering every create/modify/remove to
/// `on_event` no more often than once per `poll_interval`. The watcher and
/// its channel stay alive for as long as the returned source is installed;
/// dropping the core (or it being removed) stops the watch.
pub(crate) fn watch<F>(
    core: &mut dyn CoreOps,
    owner: ActorId,
    path: impl AsRef<Path>,
    poll_interval: Duration,
    mut on_event: F,
) -> notify::Result<()>
where
    F: FnMut(&mut dyn CoreOps, FileEvent) + 'static,
{
    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<NotifyEvent>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(path.as_ref(), RecursiveMode::Recursive)?;

    schedule_poll(core, owner, poll_interval, watcher, rx, move |core, event| {
        if let Some(kind) = classify(&event) {
            for path in event.paths {
                on_event(core, FileEvent { path, kind });
            }
        }
    });
    Ok(())
}

/// Re-arms itself via `schedule_after` each time it runs, so the watcher and
/// receiver stay alive across polls without needing a dedicated reactor
/// source type.
fn schedule_poll<F>(
    core: &mut dyn CoreOps,
    owner: ActorId,
    interval: Duration,
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<NotifyEvent>,
    mut on_event: F,
) where
    F: FnMut(&mut dyn CoreOps, NotifyEvent) + 'static,
{
    let callback = Box::new(move |core: &mut dyn CoreOps| {
        while let Ok(event) = rx.try_recv() {
            on_event(core, event);
        }
        // `watcher` must outlive every poll; re-scheduling from inside its
        // own callback keeps it alive without a separate storage slot.
        schedule_poll(core, owner, interval, watcher, rx, on_event);
    });
    core.schedule_after(owner, interval, callback);
}

impl<'a, A: Actor> ActorContext<'a, A> {
    /// Watch `path` from this actor's core, delivering every change to
    /// `on_event(actor, ctx, event)`.
    pub fn watch_path<F>(&mut self, path: impl AsRef<Path>, poll_interval: Duration, mut on_event: F) -> notify::Result<()>
    where
        F: FnMut(&mut A, &mut ActorContext<'_, A>, FileEvent) + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        watch(self.raw_core(), id, path, poll_interval, move |core, event| {
            let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
            let mut actor = handle.borrow_mut();
            on_event(&mut actor, &mut ctx, event);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind as MK, RemoveKind};

    fn event(kind: EventKind) -> NotifyEvent {
        NotifyEvent::new(kind)
    }

    #[test]
    fn classifies_create_as_created() {
        assert_eq!(
            classify(&event(EventKind::Create(CreateKind::File))),
            Some(FileEventKind::Created)
        );
    }

    #[test]
    fn classifies_data_modify_as_modified() {
        assert_eq!(
            classify(&event(EventKind::Modify(MK::Data(DataChange::Content)))),
            Some(FileEventKind::Modified)
        );
    }

    #[test]
    fn classifies_metadata_modify_as_attributes_changed() {
        assert_eq!(
            classify(&event(EventKind::Modify(MK::Metadata(MetadataKind::Any)))),
            Some(FileEventKind::AttributesChanged)
        );
    }

    #[test]
    fn classifies_remove_as_removed() {
        assert_eq!(
            classify(&event(EventKind::Remove(RemoveKind::File))),
            Some(FileEventKind::Removed)
        );
    }

    #[test]
    fn classifies_access_as_none() {
        assert_eq!(classify(&event(EventKind::Access(notify::event::AccessKind::Any))), None);
    }
}
