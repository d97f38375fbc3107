//! CPU rasterisation of a [`Composition`] into a viewport-sized RGBA buffer.
//!
//! Sampling is nearest-neighbour at pixel centres. Areas no layer covers stay
//! fully transparent.

use image::{Rgba, RgbaImage};

use super::{Composition, Rect, Transform, Viewport};
use crate::decoded::DecodedImage;

/// Render `composition` at `viewport` size.
pub fn render(composition: &Composition, viewport: Viewport) -> RgbaImage {
    let mut canvas = RgbaImage::new(viewport.width, viewport.height);
    match composition {
        Composition::Empty => {}
        Composition::NewFile { current, placement } => {
            draw(&mut canvas, current, *placement, Paint::default());
        }
        Composition::Deleted {
            previous,
            placement,
        } => {
            let paint = Paint {
                grayscale: true,
                ..Paint::default()
            };
            draw(&mut canvas, previous, *placement, paint);
        }
        Composition::OnionSkin(o) => {
            draw(
                &mut canvas,
                &o.previous,
                o.base,
                Paint {
                    transform: o.transform,
                    ..Paint::default()
                },
            );
            draw(
                &mut canvas,
                &o.current,
                o.overlay,
                Paint {
                    transform: o.transform,
                    alpha: o.alpha,
                    grayscale: false,
                },
            );
        }
        Composition::SideBySide(s) => {
            draw(&mut canvas, &s.previous, s.left.image, Paint::default());
            draw(&mut canvas, &s.current, s.right.image, Paint::default());
        }
        Composition::Diff(d) => {
            draw(&mut canvas, &d.result.image, d.placement, Paint::default());
        }
    }
    canvas
}

#[derive(Clone, Copy)]
struct Paint {
    transform: Transform,
    alpha: f64,
    grayscale: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            alpha: 1.0,
            grayscale: false,
        }
    }
}

/// Composite `img`, placed at `rect` in layer space, over `canvas`.
fn draw(canvas: &mut RgbaImage, img: &DecodedImage, rect: Rect, paint: Paint) {
    if paint.alpha <= 0.0 || rect.w <= 0.0 || rect.h <= 0.0 {
        return;
    }
    for (x, y, dst) in canvas.enumerate_pixels_mut() {
        let (lx, ly) = paint
            .transform
            .invert(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let Some(mut src) = sample(img, rect, lx, ly) else {
            continue;
        };
        if paint.grayscale {
            let l = luma(src);
            src = [l, l, l, src[3]];
        }
        *dst = Rgba(source_over(dst.0, src, paint.alpha));
    }
}

/// Nearest source pixel for layer-space point `(x, y)`, if inside `rect`.
fn sample(img: &DecodedImage, rect: Rect, x: f64, y: f64) -> Option<[u8; 4]> {
    if !rect.contains(x, y) {
        return None;
    }
    let (w, h) = img.dimensions();
    let u = (((x - rect.x) / rect.w) * f64::from(w)).floor() as u32;
    let v = (((y - rect.y) / rect.h) * f64::from(h)).floor() as u32;
    Some(img.pixel(u.min(w - 1), v.min(h - 1)))
}

fn luma(px: [u8; 4]) -> u8 {
    (0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Non-premultiplied source-over with an extra layer opacity.
fn source_over(dst: [u8; 4], src: [u8; 4], opacity: f64) -> [u8; 4] {
    let sa = f64::from(src[3]) / 255.0 * opacity.clamp(0.0, 1.0);
    let da = f64::from(dst[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mix = |s: u8, d: u8| {
        ((f64::from(s) * sa + f64::from(d) * da * (1.0 - sa)) / oa)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (oa * 255.0).round() as u8,
    ]
}
