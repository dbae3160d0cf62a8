//! Ready-made [`Work`] behaviours.
//!
//! [`Work`]: ../trait.Work.html

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::handle::{VisibilityHandle, VisibilityHandles};
use crate::worker::Work;

/// Hides a layer, waits, shows it, waits. Forever.
#[derive(Debug)]
pub struct Blink {
    handle: VisibilityHandle,
    period: Duration,
}

impl Blink {
    pub fn new(handle: VisibilityHandle, period: Duration) -> Self {
        Self { handle, period }
    }
}

impl Work for Blink {
    fn run_once(&mut self) -> anyhow::Result<()> {
        self.handle.hide();
        thread::sleep(self.period);
        self.handle.show();
        thread::sleep(self.period);
        Ok(())
    }
}

/// Plays back a fixed list of visibility changes, one per iteration, then
/// finishes.
#[derive(Debug)]
pub struct Scripted {
    handles: VisibilityHandles,
    steps: VecDeque<(String, bool)>,
    pause: Duration,
}

impl Scripted {
    pub fn new<I, N>(handles: VisibilityHandles, steps: I) -> Self
    where
        I: IntoIterator<Item = (N, bool)>,
        N: Into<String>,
    {
        Self {
            handles,
            steps: steps
                .into_iter()
                .map(|(name, visible)| (name.into(), visible))
                .collect(),
            pause: Duration::ZERO,
        }
    }

    /// Waits `pause` after every step.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Work for Scripted {
    fn run_once(&mut self) -> anyhow::Result<()> {
        if let Some((name, visible)) = self.steps.pop_front() {
            if !self.handles.set(&name, visible) {
                log::debug!("script step for unknown layer {} skipped", name);
            }
            if !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }
        Ok(())
    }

    fn should_continue(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Does nothing but sleep.
#[derive(Debug, Clone, Copy)]
pub struct Idle {
    period: Duration,
}

impl Idle {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Work for Idle {
    fn run_once(&mut self) -> anyhow::Result<()> {
        thread::sleep(self.period);
        Ok(())
    }
}
