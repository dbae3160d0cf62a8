use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use minifb::{Key, Window, WindowOptions};

use super::{to_0rgb, DisplaySurface, ViewId, Wake};
use crate::compositor::CompositeImage;
use crate::settings::WindowSettings;

/// Longest stretch between two event pumps while waiting for the next tick.
const EVENT_POLL: Duration = Duration::from_millis(8);

/// A native window showing a single image view, sized to the image.
///
/// Closing the window or pressing Escape closes the surface.
pub struct WindowSurface {
    title: String,
    background: [u8; 3],
    window: Option<Window>,
    buffer: Vec<u32>,
    size: (usize, usize),
}

impl WindowSurface {
    pub fn new(settings: &WindowSettings) -> Self {
        Self {
            title: settings.title.clone(),
            background: settings.background,
            window: None,
            buffer: Vec::new(),
            size: (0, 0),
        }
    }
}

impl DisplaySurface for WindowSurface {
    fn create_image_view(&mut self, image: &CompositeImage) -> anyhow::Result<ViewId> {
        if self.window.is_some() {
            bail!("a window surface holds a single image view");
        }

        let (width, height) = image.dimensions();
        let window = Window::new(
            &self.title,
            width as usize,
            height as usize,
            WindowOptions::default(),
        )
        .with_context(|| format!("could not open a {}x{} window", width, height))?;

        self.window = Some(window);
        self.size = (width as usize, height as usize);

        let view = ViewId(0);
        self.update_image_view(view, image)?;
        Ok(view)
    }

    fn update_image_view(&mut self, view: ViewId, image: &CompositeImage) -> anyhow::Result<()> {
        if view != ViewId(0) {
            bail!("no image view with id {}", view.0);
        }
        let window = self
            .window
            .as_mut()
            .context("the image view has not been created")?;

        let (width, height) = image.dimensions();
        if (width as usize, height as usize) != self.size {
            bail!(
                "image is {}x{} but the window is {}x{}",
                width,
                height,
                self.size.0,
                self.size.1
            );
        }

        self.buffer = to_0rgb(image, self.background);
        window
            .update_with_buffer(&self.buffer, self.size.0, self.size.1)
            .context("could not update the window")
    }

    fn schedule_after(&mut self, delay: Duration) -> Wake {
        let deadline = Instant::now() + delay;

        loop {
            if let Some(window) = &self.window {
                if !window.is_open() || window.is_key_down(Key::Escape) {
                    return Wake::Closed;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Wake::Fire;
            }
            thread::sleep((deadline - now).min(EVENT_POLL));

            if let Some(window) = &mut self.window {
                window.update();
            }
        }
    }
}
