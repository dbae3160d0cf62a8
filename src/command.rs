use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// An intent to show or hide one named layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityCommand {
    name: Arc<str>,
    visible: bool,
}

impl VisibilityCommand {
    pub fn new<N: Into<Arc<str>>>(name: N, visible: bool) -> Self {
        Self {
            name: name.into(),
            visible,
        }
    }

    pub fn show<N: Into<Arc<str>>>(name: N) -> Self {
        Self::new(name, true)
    }

    pub fn hide<N: Into<Arc<str>>>(name: N) -> Self {
        Self::new(name, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

/// The producer end of a [`CommandChannel`]. Cheap to clone.
///
/// [`CommandChannel`]: struct.CommandChannel.html
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<VisibilityCommand>,
}

impl CommandSender {
    /// Queues `cmd`. Never blocks.
    pub fn push(&self, cmd: VisibilityCommand) {
        if let Err(err) = self.tx.send(cmd) {
            log::trace!("dropping {:?}: command channel is closed", err.into_inner());
        }
    }
}

/// Unbounded FIFO queue of [`VisibilityCommand`]s between the worker and the
/// render loop.
///
/// Any number of [`CommandSender`]s may push concurrently. The channel itself
/// is the single consumer.
///
/// [`VisibilityCommand`]: struct.VisibilityCommand.html
/// [`CommandSender`]: struct.CommandSender.html
#[derive(Debug)]
pub struct CommandChannel {
    tx: Sender<VisibilityCommand>,
    rx: Receiver<VisibilityCommand>,
}

impl CommandChannel {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    pub fn push(&self, cmd: VisibilityCommand) {
        // The channel holds its own receiver, so this cannot fail.
        let _ = self.tx.send(cmd);
    }

    /// Removes and returns every command queued at the time of the call,
    /// oldest first. Never blocks.
    ///
    /// Commands pushed while draining are left for the next call.
    pub fn drain(&self) -> Vec<VisibilityCommand> {
        let pending = self.rx.len();
        if pending == 0 {
            return Vec::new();
        }

        let mut batch = Vec::with_capacity(pending);
        batch.extend(self.rx.try_iter().take(pending));
        batch
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}
