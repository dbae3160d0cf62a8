use anyhow::Context;

use crate::command::CommandChannel;
use crate::error::{LoadError, ShutdownError};
use crate::handle::VisibilityHandles;
use crate::layer::LayerStore;
use crate::render_loop::{RenderLoop, RenderStats};
use crate::settings::Settings;
use crate::surface::DisplaySurface;
use crate::worker::{Work, Worker, WorkerState};

/// Owns every part of a running simulation.
///
/// Built once, run once. The worker is started only after the first frame
/// is on screen, and it is always stopped before [`run`] returns.
///
/// [`run`]: #method.run
#[derive(Debug)]
pub struct Application {
    settings: Settings,
    render_loop: RenderLoop,
    worker: Worker,
}

impl Application {
    /// Loads the layers in `settings.layer_dir` and hands a handle for each
    /// of them to `make_work`.
    pub fn new<W, F>(settings: Settings, make_work: F) -> Result<Self, LoadError>
    where
        W: Work,
        F: FnOnce(VisibilityHandles) -> W,
    {
        let store = LayerStore::load(&settings.layer_dir)?;
        let (width, height) = store.dimensions();
        log::info!(
            "loaded {} layers of {}x{} from {:?}",
            store.len(),
            width,
            height,
            settings.layer_dir
        );

        Ok(Self::with_store(settings, store, make_work))
    }

    /// Same as [`new`] with layers that are already loaded.
    ///
    /// [`new`]: #method.new
    pub fn with_store<W, F>(settings: Settings, store: LayerStore, make_work: F) -> Self
    where
        W: Work,
        F: FnOnce(VisibilityHandles) -> W,
    {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(store.names(), &channel.sender());

        let worker = Worker::new("panel-worker", make_work(handles), settings.error_policy);
        let render_loop = RenderLoop::new(store, channel, &settings);

        Self {
            settings,
            render_loop,
            worker,
        }
    }

    /// Shows the composite on `surface` and redraws it until the surface
    /// closes, then stops the worker and releases the surface.
    pub fn run<S: DisplaySurface>(mut self, mut surface: S) -> anyhow::Result<RenderStats> {
        let rendered = self.render(&mut surface);
        let stopped = self.shutdown();
        drop(surface);

        match (rendered, stopped) {
            (Err(err), stopped) => {
                if let Err(shutdown_err) = stopped {
                    log::error!("{}", shutdown_err);
                }
                Err(err)
            }
            (Ok(()), Err(err)) => Err(err).context("could not shut down cleanly"),
            (Ok(()), Ok(())) => Ok(self.render_loop.stats()),
        }
    }

    fn render<S: DisplaySurface>(&mut self, surface: &mut S) -> anyhow::Result<()> {
        let view = self
            .render_loop
            .present(surface)
            .context("could not show the first frame")?;

        self.worker.start()?;

        self.render_loop
            .run_presented(surface, view)
            .context("render loop failed")
    }

    fn shutdown(&mut self) -> Result<(), ShutdownError> {
        match self.settings.shutdown_timeout {
            Some(timeout) => self.worker.stop_timeout(timeout),
            None => self.worker.stop(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layers(&self) -> &LayerStore {
        self.render_loop.store()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }
}
