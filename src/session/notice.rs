//! Session notices delivered to subscribers

use crate::errors::{CameraError, ErrorKind};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoticeKind {
    Opening {
        logical_id: String,
        physical_id: Option<String>,
    },
    DeviceOpened {
        logical_id: String,
    },
    PreviewStarted {
        zoom_ratio: Option<f32>,
        physical: bool,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
    Stopped,
}

/// A notice tagged with the session generation it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionNotice {
    pub generation: u64,
    pub kind: NoticeKind,
}

impl SessionNotice {
    pub fn failed(generation: u64, error: &CameraError) -> Self {
        Self {
            generation,
            kind: NoticeKind::Failed {
                kind: error.kind(),
                message: error.message().to_string(),
            },
        }
    }
}

/// Fan-out of notices to any number of subscribers
///
/// Each subscriber gets an unbounded channel. A receiver that is held but
/// never drained keeps every notice (a handful per start), so drop receivers
/// you stop reading.
#[derive(Default)]
pub struct NoticeBoard {
    subscribers: Mutex<Vec<Sender<SessionNotice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Sender<SessionNotice>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Receiver<SessionNotice> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers().push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones that hung up
    pub fn publish(&self, notice: SessionNotice) {
        self.subscribers().retain(|tx| tx.send(notice.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}
