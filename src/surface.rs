use std::thread;
use std::time::Duration;

use anyhow::bail;
use image::Rgba;

use crate::compositor::{blend_over, CompositeImage};

#[cfg(feature = "window")]
mod window;
#[cfg(feature = "window")]
pub use window::WindowSurface;

/// Identifies an image view created on a [`DisplaySurface`].
///
/// [`DisplaySurface`]: trait.DisplaySurface.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// Returned by [`DisplaySurface::schedule_after`].
///
/// [`DisplaySurface::schedule_after`]: trait.DisplaySurface.html#tymethod.schedule_after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The delay has elapsed; run the scheduled callback.
    Fire,
    /// The surface has gone away; stop rescheduling.
    Closed,
}

/// Something that can show a composite image.
///
/// All methods are called from the one thread that owns the surface.
pub trait DisplaySurface {
    fn create_image_view(&mut self, image: &CompositeImage) -> anyhow::Result<ViewId>;

    fn update_image_view(&mut self, view: ViewId, image: &CompositeImage) -> anyhow::Result<()>;

    /// Services the surface until `delay` has passed, then says whether the
    /// scheduled callback should run.
    fn schedule_after(&mut self, delay: Duration) -> Wake;
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for &mut S {
    fn create_image_view(&mut self, image: &CompositeImage) -> anyhow::Result<ViewId> {
        (**self).create_image_view(image)
    }

    fn update_image_view(&mut self, view: ViewId, image: &CompositeImage) -> anyhow::Result<()> {
        (**self).update_image_view(view, image)
    }

    fn schedule_after(&mut self, delay: Duration) -> Wake {
        (**self).schedule_after(delay)
    }
}

/// A surface with no window. Keeps the latest image of every view.
///
/// By default it fires immediately instead of sleeping and never closes.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    views: Vec<CompositeImage>,
    updates: usize,
    wakes: usize,
    max_wakes: Option<usize>,
    realtime: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close after `max_wakes` scheduled callbacks have fired.
    pub fn with_max_wakes(mut self, max_wakes: usize) -> Self {
        self.max_wakes = Some(max_wakes);
        self
    }

    /// Actually wait out each scheduled delay.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn frame(&self, view: ViewId) -> Option<&CompositeImage> {
        self.views.get(view.0 as usize)
    }

    /// Number of `update_image_view` calls so far.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Number of scheduled callbacks fired so far.
    pub fn wakes(&self) -> usize {
        self.wakes
    }
}

impl DisplaySurface for HeadlessSurface {
    fn create_image_view(&mut self, image: &CompositeImage) -> anyhow::Result<ViewId> {
        self.views.push(image.clone());
        Ok(ViewId(self.views.len() as u64 - 1))
    }

    fn update_image_view(&mut self, view: ViewId, image: &CompositeImage) -> anyhow::Result<()> {
        match self.views.get_mut(view.0 as usize) {
            Some(frame) => {
                frame.clone_from(image);
                self.updates += 1;
                Ok(())
            }
            None => bail!("no image view with id {}", view.0),
        }
    }

    fn schedule_after(&mut self, delay: Duration) -> Wake {
        if let Some(max_wakes) = self.max_wakes {
            if self.wakes >= max_wakes {
                return Wake::Closed;
            }
        }

        if self.realtime {
            thread::sleep(delay);
        }
        self.wakes += 1;
        Wake::Fire
    }
}

/// Flattens `image` onto an opaque `background` and packs each pixel as
/// `0x00RRGGBB`, row by row.
pub fn to_0rgb(image: &CompositeImage, background: [u8; 3]) -> Vec<u32> {
    let background = Rgba([background[0], background[1], background[2], 255]);

    image
        .pixels()
        .map(|pixel| {
            let mut out = background;
            blend_over(&mut out, pixel);
            (u32::from(out[0]) << 16) | (u32::from(out[1]) << 8) | u32::from(out[2])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{solid, GREEN, RED, TRANSPARENT};

    #[test]
    fn headless_keeps_latest_frame() {
        let mut surface = HeadlessSurface::new();

        let view = surface.create_image_view(&solid(2, 2, RED)).unwrap();
        assert_eq!(surface.frame(view), Some(&solid(2, 2, RED)));

        surface.update_image_view(view, &solid(2, 2, GREEN)).unwrap();
        assert_eq!(surface.frame(view), Some(&solid(2, 2, GREEN)));
        assert_eq!(surface.updates(), 1);

        assert!(surface.update_image_view(ViewId(7), &solid(2, 2, GREEN)).is_err());
    }

    #[test]
    fn headless_closes_after_max_wakes() {
        let mut surface = HeadlessSurface::new().with_max_wakes(2);
        let delay = Duration::from_millis(10);

        assert_eq!(surface.schedule_after(delay), Wake::Fire);
        assert_eq!(surface.schedule_after(delay), Wake::Fire);
        assert_eq!(surface.schedule_after(delay), Wake::Closed);
        assert_eq!(surface.wakes(), 2);
    }

    #[test]
    fn packs_pixels_over_background() {
        let mut image = solid(2, 1, RED);
        image.put_pixel(1, 0, TRANSPARENT);

        assert_eq!(to_0rgb(&image, [0x10, 0x20, 0x30]), vec![0x00ff_0000, 0x0010_2030]);
    }
}
