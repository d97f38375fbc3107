use std::str::FromStr;

use serde::Serialize;

use crate::session::Pan;

/// Size of the area the presentation layer draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width: u32 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
        let height: u32 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
        if width == 0 || height == 0 {
            return Err(format!("viewport must be non-empty, got {width}x{height}"));
        }
        Ok(Self { width, height })
    }
}

/// Axis-aligned rectangle in view space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.w && py < self.y + self.h
    }
}

/// Largest rect with the image's aspect ratio that fits inside `outer`,
/// centred in it.
pub fn fit_contain(image_w: u32, image_h: u32, outer: Rect) -> Rect {
    if image_w == 0 || image_h == 0 || outer.w <= 0.0 || outer.h <= 0.0 {
        return Rect::new(outer.x, outer.y, 0.0, 0.0);
    }
    let scale = (outer.w / f64::from(image_w)).min(outer.h / f64::from(image_h));
    let w = f64::from(image_w) * scale;
    let h = f64::from(image_h) * scale;
    Rect::new(outer.x + (outer.w - w) / 2.0, outer.y + (outer.h - h) / 2.0, w, h)
}

/// Uniform scale about a centre point followed by a translation.
///
/// `p' = center + (p - center) * scale + pan`
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f64,
    pub center: (f64, f64),
    pub translate: (f64, f64),
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        center: (0.0, 0.0),
        translate: (0.0, 0.0),
    };

    /// The shared onion-skin transform for `zoom` percent and `pan`.
    pub fn for_view(zoom: u16, pan: Pan, viewport: Viewport) -> Self {
        Self {
            scale: f64::from(zoom) / 100.0,
            center: viewport.center(),
            translate: (pan.x, pan.y),
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center;
        (
            cx + (x - cx) * self.scale + self.translate.0,
            cy + (y - cy) * self.scale + self.translate.1,
        )
    }

    /// Map a view-space point back to layer space.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center;
        (
            cx + (x - cx - self.translate.0) / self.scale,
            cy + (y - cy - self.translate.1) / self.scale,
        )
    }
}
