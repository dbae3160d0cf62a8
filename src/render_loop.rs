use std::time::Duration;

use crate::command::{CommandChannel, CommandSender};
use crate::compositor::{compose, CompositeImage};
use crate::error::{CompositeError, RenderError};
use crate::layer::LayerStore;
use crate::settings::Settings;
use crate::surface::{DisplaySurface, ViewId, Wake};

/// Running totals kept by a [`RenderLoop`].
///
/// [`RenderLoop`]: struct.RenderLoop.html
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub ticks: u64,
    pub frames: u64,
    pub applied: u64,
    pub ignored: u64,
}

/// The outcome of one render tick.
#[derive(Debug)]
pub struct Tick {
    /// Commands that changed a known layer.
    pub applied: usize,
    /// Commands naming a layer that does not exist.
    pub ignored: usize,
    /// The new composite, or `None` if no layer changed and idle redraws
    /// are skipped.
    pub frame: Option<CompositeImage>,
}

/// Applies queued visibility commands and recomposites, once per tick.
///
/// The render loop is the only thing that touches the [`LayerStore`] after
/// it is loaded, and it only runs on the thread that owns the display
/// surface.
///
/// [`LayerStore`]: struct.LayerStore.html
#[derive(Debug)]
pub struct RenderLoop {
    store: LayerStore,
    channel: CommandChannel,
    update_interval: Duration,
    skip_idle_redraw: bool,
    presented: bool,
    stats: RenderStats,
}

impl RenderLoop {
    pub fn new(store: LayerStore, channel: CommandChannel, settings: &Settings) -> Self {
        Self {
            store,
            channel,
            update_interval: settings.update_interval,
            skip_idle_redraw: settings.skip_idle_redraw,
            presented: false,
            stats: RenderStats::default(),
        }
    }

    /// Drains the command channel, applies every command in order and
    /// recomposites the layers.
    pub fn tick(&mut self) -> Result<Tick, CompositeError> {
        let (applied, ignored) = self.apply_pending();

        // Commands for unknown layers change nothing on screen.
        let idle = applied == 0;
        let frame = if idle && self.skip_idle_redraw && self.presented {
            None
        } else {
            Some(self.recompose()?)
        };

        Ok(Tick {
            applied,
            ignored,
            frame,
        })
    }

    /// Runs the first tick and shows its composite in a new image view.
    pub fn present<S: DisplaySurface>(&mut self, surface: &mut S) -> Result<ViewId, RenderError> {
        self.apply_pending();
        let frame = self.recompose()?;

        surface
            .create_image_view(&frame)
            .map_err(RenderError::Surface)
    }

    /// Ticks every `update_interval` until the surface closes, publishing
    /// each new composite to `view`.
    pub fn run_presented<S: DisplaySurface>(
        &mut self,
        surface: &mut S,
        view: ViewId,
    ) -> Result<(), RenderError> {
        loop {
            match surface.schedule_after(self.update_interval) {
                Wake::Closed => return Ok(()),
                Wake::Fire => {
                    if let Some(frame) = self.tick()?.frame {
                        surface
                            .update_image_view(view, &frame)
                            .map_err(RenderError::Surface)?;
                    }
                }
            }
        }
    }

    /// [`present`] followed by [`run_presented`].
    ///
    /// [`present`]: #method.present
    /// [`run_presented`]: #method.run_presented
    pub fn run<S: DisplaySurface>(&mut self, surface: &mut S) -> Result<(), RenderError> {
        let view = self.present(surface)?;
        self.run_presented(surface, view)
    }

    fn apply_pending(&mut self) -> (usize, usize) {
        let batch = self.channel.drain();
        self.stats.ticks += 1;

        let mut applied = 0;
        let mut ignored = 0;
        for cmd in &batch {
            if self.store.set_visible(cmd.name(), cmd.visible()) {
                applied += 1;
            } else {
                log::debug!("ignoring command for unknown layer {}", cmd.name());
                ignored += 1;
            }
        }

        if !batch.is_empty() {
            log::trace!("applied {} of {} commands", applied, batch.len());
        }

        self.stats.applied += applied as u64;
        self.stats.ignored += ignored as u64;
        (applied, ignored)
    }

    fn recompose(&mut self) -> Result<CompositeImage, CompositeError> {
        let frame = compose(self.store.ordered_layers())?;
        self.presented = true;
        self.stats.frames += 1;
        Ok(frame)
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// A producer end for the channel this loop drains.
    pub fn sender(&self) -> CommandSender {
        self.channel.sender()
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::VisibilityCommand;
    use crate::layer::Layer;
    use crate::surface::HeadlessSurface;
    use crate::test_util::{dot, solid, BLUE, GREEN, RED};

    fn panel(channel: CommandChannel, settings: &Settings) -> RenderLoop {
        let store = LayerStore::from_layers(vec![
            Layer::new("base", solid(2, 2, RED)),
            Layer::with_visibility("seg1", dot(2, 2, 0, 0, GREEN), false),
            Layer::new("seg2", dot(2, 2, 1, 1, BLUE)),
        ])
        .unwrap();

        RenderLoop::new(store, channel, settings)
    }

    fn base_with_seg1() -> CompositeImage {
        let mut expected = solid(2, 2, RED);
        expected.put_pixel(0, 0, GREEN);
        expected
    }

    #[test]
    fn tick_applies_commands_then_composites() {
        let channel = CommandChannel::new();
        channel.push(VisibilityCommand::show("seg1"));
        channel.push(VisibilityCommand::hide("seg2"));
        let mut render_loop = panel(channel, &Settings::default());

        let tick = render_loop.tick().unwrap();

        assert_eq!(tick.applied, 2);
        assert_eq!(tick.ignored, 0);
        assert_eq!(render_loop.store().visible_names(), vec!["base", "seg1"]);
        assert_eq!(tick.frame.unwrap(), base_with_seg1());
    }

    #[test]
    fn unknown_layers_are_ignored() {
        let channel = CommandChannel::new();
        channel.push(VisibilityCommand::show("seg7"));
        let mut render_loop = panel(channel, &Settings::default());

        let tick = render_loop.tick().unwrap();

        assert_eq!((tick.applied, tick.ignored), (0, 1));
        assert_eq!(render_loop.store().visible_names(), vec!["base", "seg2"]);
        assert_eq!(render_loop.stats().ignored, 1);
    }

    #[test]
    fn commands_replay_in_order_across_ticks() {
        let channel = CommandChannel::new();
        let sender = channel.sender();
        let mut render_loop = panel(channel, &Settings::default());

        sender.push(VisibilityCommand::show("seg1"));
        sender.push(VisibilityCommand::hide("seg1"));
        sender.push(VisibilityCommand::show("seg1"));
        render_loop.tick().unwrap();
        assert_eq!(render_loop.store().is_visible("seg1"), Some(true));

        sender.push(VisibilityCommand::hide("seg1"));
        render_loop.tick().unwrap();
        assert_eq!(render_loop.store().is_visible("seg1"), Some(false));

        assert_eq!(render_loop.stats().applied, 4);
    }

    #[test]
    fn empty_batches_still_redraw() {
        let mut render_loop = panel(CommandChannel::new(), &Settings::default());

        let first = render_loop.tick().unwrap().frame.unwrap();
        let second = render_loop.tick().unwrap().frame.unwrap();

        assert_eq!(first, second);
        assert_eq!(render_loop.stats().frames, 2);
    }

    #[test]
    fn idle_ticks_can_be_skipped() {
        let settings = Settings::default().with_skip_idle_redraw(true);
        let channel = CommandChannel::new();
        let sender = channel.sender();
        let mut render_loop = panel(channel, &settings);

        assert!(render_loop.tick().unwrap().frame.is_some());
        assert!(render_loop.tick().unwrap().frame.is_none());

        sender.push(VisibilityCommand::show("seg1"));
        assert!(render_loop.tick().unwrap().frame.is_some());
        assert_eq!(render_loop.stats().frames, 2);
    }

    #[test]
    fn unknown_names_alone_do_not_force_a_redraw() {
        let settings = Settings::default()
            .with_update_interval(Duration::from_millis(20))
            .with_skip_idle_redraw(true);
        let mut render_loop = panel(CommandChannel::new(), &settings);
        let sender = render_loop.sender();
        assert_eq!(render_loop.update_interval(), Duration::from_millis(20));

        assert!(render_loop.tick().unwrap().frame.is_some());

        sender.push(VisibilityCommand::show("seg7"));
        let tick = render_loop.tick().unwrap();
        assert_eq!((tick.applied, tick.ignored), (0, 1));
        assert!(tick.frame.is_none());

        sender.push(VisibilityCommand::show("seg7"));
        sender.push(VisibilityCommand::show("seg1"));
        assert!(render_loop.tick().unwrap().frame.is_some());
        assert_eq!(render_loop.stats().frames, 2);
    }

    #[test]
    fn run_publishes_until_the_surface_closes() {
        let channel = CommandChannel::new();
        let sender = channel.sender();
        let mut render_loop = panel(channel, &Settings::default());
        let mut surface = HeadlessSurface::new().with_max_wakes(3);

        let view = render_loop.present(&mut surface).unwrap();
        let mut initial = solid(2, 2, RED);
        initial.put_pixel(1, 1, BLUE);
        assert_eq!(surface.frame(view), Some(&initial));

        sender.push(VisibilityCommand::show("seg1"));
        sender.push(VisibilityCommand::hide("seg2"));
        render_loop.run_presented(&mut surface, view).unwrap();

        assert_eq!(surface.wakes(), 3);
        assert_eq!(surface.updates(), 3);
        assert_eq!(surface.frame(view), Some(&base_with_seg1()));
        assert_eq!(render_loop.stats().ticks, 4);
    }
}
