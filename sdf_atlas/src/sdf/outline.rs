// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distance fields computed from glyph outlines.

use peniko::kurbo::{self, BezPath, Line, PathEl, Point};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, MetadataProvider};

use super::{SdfBitmap, SdfParams, SdfRasterizer};

/// Maximum distance between a curve and its flattened line segments, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Rasterizes distance fields from `glyf`/`CFF` outlines using `skrifa`.
///
/// The glyph is scaled so that the font's ascender-to-descender distance
/// matches [`SdfParams::pixel_height`], mirroring the usual "scale for pixel
/// height" convention.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutlineRasterizer {
    /// Index of the font within a collection file.
    pub font_index: u32,
}

impl SdfRasterizer for OutlineRasterizer {
    fn rasterize(&self, font: &[u8], codepoint: u32, params: &SdfParams) -> SdfBitmap {
        let font = match FontRef::from_index(font, self.font_index) {
            Ok(font) => font,
            Err(err) => {
                log::warn!("unable to parse font for codepoint {codepoint:#x}: {err}");
                return SdfBitmap::empty();
            }
        };
        let Some(glyph_id) = font.charmap().map(codepoint) else {
            log::debug!("codepoint {codepoint:#x} is not mapped by the font");
            return SdfBitmap::empty();
        };
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let extent = metrics.ascent - metrics.descent;
        if extent <= 0.0 {
            return SdfBitmap::empty();
        }
        let ppem = params.pixel_height * f32::from(metrics.units_per_em) / extent;

        let outlines = font.outline_glyphs();
        let Some(glyph) = outlines.get(glyph_id) else {
            return SdfBitmap::empty();
        };
        let mut pen = FlippedPath::default();
        let settings = DrawSettings::unhinted(Size::new(ppem), LocationRef::default());
        if let Err(err) = glyph.draw(settings, &mut pen) {
            log::warn!("unable to draw outline for codepoint {codepoint:#x}: {err}");
            return SdfBitmap::empty();
        }
        sdf_from_path(&pen.0, params)
    }
}

/// Collects an outline into a [`BezPath`] with the y axis pointing down.
#[derive(Default)]
struct FlippedPath(BezPath);

impl OutlinePen for FlippedPath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to((f64::from(x), f64::from(-y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to((f64::from(x), f64::from(-y)));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.0.quad_to(
            (f64::from(cx0), f64::from(-cy0)),
            (f64::from(x), f64::from(-y)),
        );
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.0.curve_to(
            (f64::from(cx0), f64::from(-cy0)),
            (f64::from(cx1), f64::from(-cy1)),
            (f64::from(x), f64::from(-y)),
        );
    }

    fn close(&mut self) {
        self.0.close_path();
    }
}

/// Computes a distance field for a filled path in pixel coordinates (y down).
///
/// The bitmap covers the path's integer bounding box grown by
/// [`SdfParams::padding`] on every side. Each pixel stores
/// `on_edge_value + distance_scale * d`, clamped to `0..=255`, where `d` is
/// the distance from the pixel centre to the outline, positive inside and
/// negative outside (nonzero winding). Empty paths give an empty bitmap.
#[expect(
    clippy::cast_possible_truncation,
    reason = "glyph bounds are small pixel coordinates"
)]
pub fn sdf_from_path(path: &BezPath, params: &SdfParams) -> SdfBitmap {
    let segments = flatten_to_segments(path);
    let Some((x0, y0, x1, y1)) = segment_bounds(&segments) else {
        return SdfBitmap::empty();
    };
    let (ix0, iy0) = (x0.floor() as i32, y0.floor() as i32);
    let (ix1, iy1) = (x1.ceil() as i32, y1.ceil() as i32);
    if ix0 == ix1 || iy0 == iy1 {
        return SdfBitmap::empty();
    }
    let padding = params.padding as i32;
    let (left, top) = (ix0 - padding, iy0 - padding);
    let width = (ix1 + padding - left) as u32;
    let height = (iy1 + padding - top) as u32;

    let on_edge = f64::from(params.on_edge_value);
    let scale = f64::from(params.distance_scale);
    let mut data = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let p = Point::new(
                f64::from(left) + f64::from(x) + 0.5,
                f64::from(top) + f64::from(y) + 0.5,
            );
            let distance = segments
                .iter()
                .map(|segment| distance_sq(p, segment))
                .fold(f64::INFINITY, f64::min)
                .sqrt();
            let signed = if winding(p, &segments) != 0 {
                distance
            } else {
                -distance
            };
            data.push(to_byte(on_edge + scale * signed));
        }
    }

    SdfBitmap {
        width,
        height,
        x_offset: left,
        y_offset: top,
        data,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to the u8 range first"
)]
#[inline]
fn to_byte(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Flattens curves into line segments, closing every contour.
fn flatten_to_segments(path: &BezPath) -> Vec<Line> {
    let mut segments = Vec::new();
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            close_contour(&mut segments, last, start);
            start = p;
            last = p;
        }
        PathEl::LineTo(p) => {
            if p != last {
                segments.push(Line::new(last, p));
            }
            last = p;
        }
        PathEl::ClosePath => {
            close_contour(&mut segments, last, start);
            last = start;
        }
        // `flatten` only emits the elements above.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    close_contour(&mut segments, last, start);
    segments
}

fn close_contour(segments: &mut Vec<Line>, last: Point, start: Point) {
    if last != start {
        segments.push(Line::new(last, start));
    }
}

fn segment_bounds(segments: &[Line]) -> Option<(f64, f64, f64, f64)> {
    let first = segments.first()?;
    let init = (first.p0.x, first.p0.y, first.p0.x, first.p0.y);
    Some(segments.iter().fold(init, |(x0, y0, x1, y1), line| {
        (
            x0.min(line.p0.x).min(line.p1.x),
            y0.min(line.p0.y).min(line.p1.y),
            x1.max(line.p0.x).max(line.p1.x),
            y1.max(line.p0.y).max(line.p1.y),
        )
    }))
}

/// Squared distance from `p` to the closest point of `segment`.
fn distance_sq(p: Point, segment: &Line) -> f64 {
    let ab = segment.p1 - segment.p0;
    let len_sq = ab.hypot2();
    let t = if len_sq > 0.0 {
        ((p - segment.p0).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (segment.p0 + ab * t)).hypot2()
}

/// Nonzero winding number of the closed polyline `segments` around `p`.
fn winding(p: Point, segments: &[Line]) -> i32 {
    let mut winding = 0;
    for segment in segments {
        let (a, b) = (segment.p0, segment.p1);
        let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && cross > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && cross < 0.0 {
            winding -= 1;
        }
    }
    winding
}
