use image::{Rgb, RgbImage};

use super::style::{PanelStyle, PointShape, StyleParams};

/// Render one channel's bins upright into a panel of the given height.
pub fn draw_panel(params: &StyleParams, style: PanelStyle, bins: &[f32], height: u32) -> RgbImage {
    let mut panel = RgbImage::from_pixel(params.width, height, params.background);
    if height == 0 || params.width == 0 {
        return panel;
    }

    match style {
        PanelStyle::Bars => draw_bars(&mut panel, params, bins),
        PanelStyle::Points { shape, width } => draw_points(&mut panel, params, bins, shape, width),
        PanelStyle::Line { thickness } => draw_line(&mut panel, params, bins, thickness),
        PanelStyle::Fill => draw_fill(&mut panel, params, bins),
    }
    panel
}

fn fill_rect(panel: &mut RgbImage, x0: u32, x1: u32, y0: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(panel.height()) {
        for x in x0..x1.min(panel.width()) {
            panel.put_pixel(x, y, color);
        }
    }
}

/// Number of rows a normalized value covers in a panel of `height` rows.
fn covered_rows(value: f32, height: u32) -> u32 {
    ((value.clamp(0.0, 1.0) as f64 * height as f64).ceil() as u32).min(height)
}

fn draw_bars(panel: &mut RgbImage, params: &StyleParams, bins: &[f32]) {
    let h = panel.height();
    for (k, &value) in bins.iter().enumerate() {
        let (x0, x1) = params.bin_span(k);
        let rows = covered_rows(value, h);
        fill_rect(panel, x0, x1, h - rows, h, params.color);
    }
}

fn draw_points(
    panel: &mut RgbImage,
    params: &StyleParams,
    bins: &[f32],
    shape: PointShape,
    point_width: f64,
) {
    let h = panel.height();
    let pw = (point_width as u32).max(1);
    let ph = match shape {
        PointShape::Slab => (pw / 2).max(1),
        _ => pw,
    };
    let travel = h.saturating_sub(ph);
    let inset = ((params.bin_width - pw as f64) / 2.0).max(0.0) as u32;

    for (k, &value) in bins.iter().enumerate() {
        let (x0, _) = params.bin_span(k);
        let lift = covered_rows(value, travel);
        let top = h.saturating_sub(lift + ph) as i64;
        for dy in 0..ph {
            for dx in 0..pw {
                if !point_mask(shape, pw, ph, dx, dy) {
                    continue;
                }
                let x = x0 + inset + dx;
                let y = top + dy as i64;
                if x < panel.width() && y >= 0 && (y as u32) < h {
                    panel.put_pixel(x, y as u32, params.color);
                }
            }
        }
    }
}

fn point_mask(shape: PointShape, w: u32, h: u32, dx: u32, dy: u32) -> bool {
    match shape {
        PointShape::Block | PointShape::Slab => true,
        PointShape::Circle | PointShape::Donut => {
            let r = w.min(h) as f64 / 2.0;
            let cx = dx as f64 + 0.5 - w as f64 / 2.0;
            let cy = dy as f64 + 0.5 - h as f64 / 2.0;
            let d = (cx * cx + cy * cy).sqrt();
            match shape {
                PointShape::Donut => d <= r && d > r / 2.0,
                _ => d <= r,
            }
        }
    }
}

/// Value at every pixel column, linearly interpolated between bin centers
/// and held flat beyond the first and last center.
fn column_values(params: &StyleParams, bins: &[f32]) -> Vec<f32> {
    let width = params.width as usize;
    if bins.is_empty() {
        return vec![0.0; width];
    }

    let mut out = Vec::with_capacity(width);
    let mut k = 0;
    for x in 0..width {
        let px = x as f64 + 0.5;
        while k + 1 < bins.len() && params.bin_center(k + 1) <= px {
            k += 1;
        }
        let c0 = params.bin_center(k);
        let value = if px <= c0 || k + 1 == bins.len() {
            bins[k]
        } else {
            let c1 = params.bin_center(k + 1);
            let t = ((px - c0) / (c1 - c0)) as f32;
            bins[k] + (bins[k + 1] - bins[k]) * t
        };
        out.push(value.clamp(0.0, 1.0));
    }
    out
}

fn draw_line(panel: &mut RgbImage, params: &StyleParams, bins: &[f32], thickness: f64) {
    let h = panel.height();
    let top_level = (h - 1) as f64;
    let half = (thickness.max(1.0) - 1.0) / 2.0;
    let levels: Vec<f64> = column_values(params, bins)
        .into_iter()
        .map(|v| v as f64 * top_level)
        .collect();

    for (x, &level) in levels.iter().enumerate() {
        let next = levels.get(x + 1).copied().unwrap_or(level);
        let lo = (level.min(next) - half).floor().clamp(0.0, top_level) as u32;
        let hi = (level.max(next) + half).floor().clamp(0.0, top_level) as u32;
        for l in lo..=hi {
            panel.put_pixel(x as u32, h - 1 - l, params.color);
        }
    }
}

fn draw_fill(panel: &mut RgbImage, params: &StyleParams, bins: &[f32]) {
    let h = panel.height();
    for (x, value) in column_values(params, bins).into_iter().enumerate() {
        let rows = covered_rows(value, h);
        fill_rect(panel, x as u32, x as u32 + 1, h - rows, h, params.color);
    }
}

/// Bars radiating from the frame center, bin `k` occupying the `k`-th sector
/// of a full clockwise turn starting at twelve o'clock.
pub fn draw_radial(params: &StyleParams, bins: &[f32], inner_radius: f64) -> RgbImage {
    let (w, h) = (params.width, params.height);
    let mut frame = RgbImage::from_pixel(w, h, params.background);
    if bins.is_empty() {
        return frame;
    }

    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;
    let r_max = w.min(h) as f64 / 2.0;
    let r_in = inner_radius.clamp(0.0, 1.0) * r_max;
    let pitch = params.bin_width + params.bin_spacing;
    let circumference = pitch * bins.len() as f64;

    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 + 0.5 - cx;
            let dy = cy - (y as f64 + 0.5);
            let d = (dx * dx + dy * dy).sqrt();
            if d < r_in || d > r_max {
                continue;
            }

            let angle = dx.atan2(dy).rem_euclid(std::f64::consts::TAU);
            let along = angle / std::f64::consts::TAU * circumference;
            let k = ((along / pitch) as usize).min(bins.len() - 1);
            if along - k as f64 * pitch >= params.bin_width {
                continue;
            }

            let length = bins[k].clamp(0.0, 1.0) as f64 * (r_max - r_in);
            if length > 0.0 && d - r_in <= length {
                frame.put_pixel(x, y, params.color);
            }
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style::{Mirror, Style};

    const FG: Rgb<u8> = Rgb([255, 255, 255]);
    const BG: Rgb<u8> = Rgb([0, 0, 0]);

    fn params(width: u32, height: u32, bins: usize) -> StyleParams {
        let pitch = width as f64 / bins as f64;
        StyleParams {
            width,
            height,
            bin_width: pitch * 5.0 / 6.0,
            bin_spacing: pitch / 6.0,
            style: Style::Bars,
            color: FG,
            background: BG,
            mirror: Mirror::Off,
        }
    }

    fn column_height(img: &RgbImage, x: u32) -> u32 {
        (0..img.height()).filter(|&y| *img.get_pixel(x, y) == FG).count() as u32
    }

    #[test]
    fn bars_cover_ceil_of_value_times_height() {
        let p = params(60, 10, 2);
        let panel = draw_panel(&p, PanelStyle::Bars, &[0.25, 1.0], 10);
        assert_eq!(column_height(&panel, 0), 3);
        assert_eq!(column_height(&panel, 30), 10);
        // spacing column stays background
        assert_eq!(column_height(&panel, 27), 0);
        // bars start at the bottom row
        assert_eq!(*panel.get_pixel(0, 9), FG);
        assert_eq!(*panel.get_pixel(0, 6), BG);
    }

    #[test]
    fn zero_bins_draw_nothing() {
        let p = params(32, 8, 4);
        let panel = draw_panel(&p, PanelStyle::Bars, &[0.0; 4], 8);
        assert!(panel.pixels().all(|px| *px == BG));
    }

    #[test]
    fn points_sit_at_value_height() {
        let style = PanelStyle::Points {
            shape: PointShape::Block,
            width: 4.0,
        };
        let panel = draw_panel(&params(12, 20, 2), style, &[0.0, 1.0], 20);
        // bottom point rests on the last row, top point touches the first
        assert_eq!(*panel.get_pixel(0, 19), FG);
        assert_eq!(*panel.get_pixel(6, 0), FG);
        assert_eq!(column_height(&panel, 0), 4);
    }

    #[test]
    fn slab_is_half_as_tall() {
        let style = PanelStyle::Points {
            shape: PointShape::Slab,
            width: 4.0,
        };
        let panel = draw_panel(&params(12, 20, 2), style, &[0.5, 0.5], 20);
        assert_eq!(column_height(&panel, 0), 2);
    }

    #[test]
    fn donut_has_a_hole() {
        assert!(point_mask(PointShape::Donut, 10, 10, 0, 5));
        assert!(!point_mask(PointShape::Donut, 10, 10, 5, 5));
        assert!(point_mask(PointShape::Circle, 10, 10, 5, 5));
        assert!(!point_mask(PointShape::Circle, 10, 10, 0, 0));
    }

    #[test]
    fn line_draws_one_pixel_per_flat_column() {
        let style = PanelStyle::Line { thickness: 1.0 };
        let panel = draw_panel(&params(40, 11, 4), style, &[0.5; 4], 11);
        for x in 0..40 {
            assert_eq!(column_height(&panel, x), 1);
            assert_eq!(*panel.get_pixel(x, 5), FG);
        }
    }

    #[test]
    fn thick_line_spans_thickness() {
        let style = PanelStyle::Line { thickness: 3.0 };
        let panel = draw_panel(&params(40, 11, 4), style, &[0.5; 4], 11);
        assert_eq!(column_height(&panel, 20), 3);
    }

    #[test]
    fn fill_interpolates_between_centers() {
        let panel = draw_panel(&params(20, 10, 2), PanelStyle::Fill, &[0.0, 1.0], 10);
        assert_eq!(column_height(&panel, 0), 0);
        assert_eq!(column_height(&panel, 19), 10);
        let mid = column_height(&panel, 10);
        assert!(mid > 0 && mid < 10);
    }

    #[test]
    fn radial_stays_inside_frame_and_leaves_center_empty() {
        let p = params(64, 48, 8);
        let frame = draw_radial(&p, &[1.0; 8], 0.5);
        assert_eq!(frame.dimensions(), (64, 48));
        assert_eq!(*frame.get_pixel(32, 24), BG);
        assert!(frame.pixels().any(|px| *px == FG));
        // corners lie outside the largest circle
        assert_eq!(*frame.get_pixel(0, 0), BG);
    }

    #[test]
    fn radial_first_bin_points_up() {
        let p = params(40, 40, 4);
        let mut bins = [0.0; 4];
        bins[0] = 1.0;
        let frame = draw_radial(&p, &bins, 0.0);
        // just right of twelve o'clock lies inside sector 0
        assert_eq!(*frame.get_pixel(21, 2), FG);
        // left half belongs to sectors 2 and 3
        assert!((0..20).all(|x| (0..40).all(|y| *frame.get_pixel(x, y) == BG)));
    }
}
