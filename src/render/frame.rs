use image::RgbImage;

use super::draw::{draw_panel, draw_radial};
use super::style::{Mirror, PanelStyle, Style, StyleParams};
use crate::audio::bins::FrameBins;

/// One rendered RGB8 frame.
pub type Frame = RgbImage;

/// Turns a frame's bin vectors into pixels.
///
/// Holds only immutable style parameters, so a single renderer is shared by
/// all workers.
#[derive(Clone, Debug)]
pub struct FrameRenderer {
    params: StyleParams,
}

impl FrameRenderer {
    pub fn new(params: StyleParams) -> Self {
        Self { params }
    }

    /// Always returns a `width x height` frame, whatever the bin values.
    pub fn render(&self, bins: FrameBins<'_>) -> Frame {
        let p = &self.params;
        let style = match p.style {
            Style::Radial { inner_radius } => return draw_radial(p, bins.left, inner_radius),
            Style::Bars => PanelStyle::Bars,
            Style::Points { shape, width } => PanelStyle::Points { shape, width },
            Style::Line { thickness } => PanelStyle::Line { thickness },
            Style::Fill => PanelStyle::Fill,
        };

        let h = p.height;
        let upper = h.div_ceil(2);
        let lower = h - upper;
        let mut frame = RgbImage::from_pixel(p.width, h, p.background);

        match (bins.right, p.mirror) {
            (None, Mirror::Off) => return draw_panel(p, style, bins.left, h),
            (None, Mirror::Center) => {
                let top = draw_panel(p, style, bins.left, upper);
                copy_rows(&top, &mut frame, 0..upper, |r| r);
                mirror_lower_half(&mut frame, upper);
            }
            (None, Mirror::Edges) => {
                let top = draw_panel(p, style, bins.left, upper);
                copy_rows(&top, &mut frame, 0..upper, |r| upper - 1 - r);
                mirror_lower_half(&mut frame, upper);
            }
            (Some(right), Mirror::Off) => {
                let top = draw_panel(p, style, bins.left, upper);
                let bottom = draw_panel(p, style, right, lower);
                copy_rows(&top, &mut frame, 0..upper, |r| r);
                copy_rows(&bottom, &mut frame, upper..h, |r| r - upper);
            }
            (Some(right), Mirror::Center) => {
                let top = draw_panel(p, style, bins.left, upper);
                let bottom = draw_panel(p, style, right, upper);
                copy_rows(&top, &mut frame, 0..upper, |r| r);
                copy_rows(&bottom, &mut frame, upper..h, |r| h - 1 - r);
            }
            (Some(right), Mirror::Edges) => {
                let top = draw_panel(p, style, bins.left, upper);
                let bottom = draw_panel(p, style, right, lower);
                copy_rows(&top, &mut frame, 0..upper, |r| upper - 1 - r);
                copy_rows(&bottom, &mut frame, upper..h, |r| r - upper);
            }
        }
        frame
    }
}

fn row_bytes(img: &RgbImage) -> usize {
    img.width() as usize * 3
}

/// Fill destination rows `rows` from the source row chosen by `source_row`.
fn copy_rows(src: &RgbImage, dst: &mut RgbImage, rows: std::ops::Range<u32>, source_row: impl Fn(u32) -> u32) {
    let stride = row_bytes(dst);
    let src: &[u8] = src;
    let dst: &mut [u8] = dst;
    for r in rows {
        let s = source_row(r) as usize * stride;
        let d = r as usize * stride;
        dst[d..d + stride].copy_from_slice(&src[s..s + stride]);
    }
}

/// Rows below `upper` become the vertical mirror of the rows above.
fn mirror_lower_half(frame: &mut RgbImage, upper: u32) {
    let h = frame.height();
    let stride = row_bytes(frame);
    for r in upper..h {
        let s = (h - 1 - r) as usize * stride;
        let d = r as usize * stride;
        frame.copy_within(s..s + stride, d);
    }
}
