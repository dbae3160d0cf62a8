use image::{Rgba, RgbaImage};

use crate::error::{CompositeError, DimensionMismatch};
use crate::layer::Layer;

/// The result of one composite, bottom layer first.
pub type CompositeImage = RgbaImage;

/// Merges `layers` into a single image, bottom to top.
///
/// The first layer is the base and is always drawn, whatever its own
/// visibility flag says. Every following layer is blended over the result
/// only while it is visible.
pub fn compose(layers: &[Layer]) -> Result<CompositeImage, CompositeError> {
    let (base, rest) = layers.split_first().ok_or(CompositeError::NoLayers)?;
    let expected = base.dimensions();

    let mut composite = base.pixels().clone();

    for layer in rest {
        if layer.dimensions() != expected {
            return Err(DimensionMismatch {
                layer: layer.name().to_string(),
                expected,
                found: layer.dimensions(),
            }
            .into());
        }

        if layer.is_visible() {
            overlay(&mut composite, layer.pixels());
        }
    }

    Ok(composite)
}

/// Blends `top` over `bottom` in place. Both must have the same dimensions.
pub(crate) fn overlay(bottom: &mut RgbaImage, top: &RgbaImage) {
    debug_assert_eq!(bottom.dimensions(), top.dimensions());

    for (dst, src) in bottom.pixels_mut().zip(top.pixels()) {
        blend_over(dst, src);
    }
}

/// Straight alpha "over": `src` on top of `dst`.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    match src[3] {
        0 => return,
        255 => {
            *dst = *src;
            return;
        }
        _ => {}
    }

    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let dst_weight = dst_a * (1.0 - src_a);
    let out_a = src_a + dst_weight;

    for c in 0..3 {
        let value = (f32::from(src[c]) * src_a + f32::from(dst[c]) * dst_weight) / out_a;
        dst[c] = to_channel(value);
    }
    dst[3] = to_channel(out_a * 255.0);
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{dot, solid, BLUE, GREEN, RED, TRANSPARENT};

    #[test]
    fn base_layer_is_always_drawn() {
        let base = solid(3, 2, RED);
        let layers = vec![
            Layer::with_visibility("base", base.clone(), false),
            Layer::with_visibility("seg1", solid(3, 2, GREEN), false),
            Layer::with_visibility("seg2", solid(3, 2, BLUE), false),
        ];

        assert_eq!(compose(&layers).unwrap(), base);
    }

    #[test]
    fn opaque_layer_covers_base() {
        let layers = vec![
            Layer::new("base", solid(3, 2, RED)),
            Layer::new("cover", solid(3, 2, GREEN)),
        ];

        assert_eq!(compose(&layers).unwrap(), solid(3, 2, GREEN));
    }

    #[test]
    fn transparent_layer_leaves_base() {
        let base = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 40, y as u8 * 90, 7, 255]));
        let layers = vec![
            Layer::new("base", base.clone()),
            Layer::new("glass", solid(3, 2, TRANSPARENT)),
        ];

        assert_eq!(compose(&layers).unwrap(), base);
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let layers = vec![
            Layer::new("base", solid(2, 2, RED)),
            Layer::new("seg1", dot(2, 2, 0, 0, GREEN)),
            Layer::with_visibility("seg2", dot(2, 2, 1, 1, BLUE), false),
        ];

        let composite = compose(&layers).unwrap();

        assert_eq!(composite.get_pixel(0, 0), &GREEN);
        assert_eq!(composite.get_pixel(1, 0), &RED);
        assert_eq!(composite.get_pixel(1, 1), &RED);
    }

    #[test]
    fn later_layers_are_on_top() {
        let layers = vec![
            Layer::new("base", solid(1, 1, RED)),
            Layer::new("seg1", solid(1, 1, GREEN)),
            Layer::new("seg2", solid(1, 1, BLUE)),
        ];

        assert_eq!(compose(&layers).unwrap().get_pixel(0, 0), &BLUE);
    }

    #[test]
    fn half_alpha_blend() {
        let mut dst = Rgba([0, 0, 255, 255]);
        blend_over(&mut dst, &Rgba([255, 0, 0, 128]));
        assert_eq!(dst, Rgba([128, 0, 127, 255]));

        let mut dst = TRANSPARENT;
        blend_over(&mut dst, &Rgba([10, 20, 30, 100]));
        assert_eq!(dst, Rgba([10, 20, 30, 100]));
    }

    #[test]
    fn compose_is_idempotent() {
        let layers = vec![
            Layer::new("base", solid(4, 4, Rgba([30, 60, 90, 200]))),
            Layer::new("seg1", RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 60, 5, y as u8 * 60, 77]))),
        ];

        let first = compose(&layers).unwrap();
        let second = compose(&layers).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_dimensions() {
        let layers = vec![
            Layer::new("base", solid(2, 2, RED)),
            Layer::with_visibility("wide", solid(3, 2, RED), false),
        ];

        assert_eq!(
            compose(&layers),
            Err(CompositeError::DimensionMismatch(DimensionMismatch {
                layer: "wide".into(),
                expected: (2, 2),
                found: (3, 2),
            }))
        );
        assert_eq!(compose(&[]), Err(CompositeError::NoLayers));
    }
}
