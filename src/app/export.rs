use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use eframe::egui::{Color32, Vec2};

use super::WorkingSet;

const MAX_CONTENT_DIMENSION: f32 = 1600.0;
const MARGIN: f32 = 48.0;
const BACKGROUND: Color32 = Color32::from_rgb(21, 24, 30);
const EDGE_ALPHA: f32 = 0.55;

/// Rasterizes the current working set into a PNG next to the working
/// directory and returns the written path. Runs on the UI thread; the
/// canvas is bounded so a large graph cannot stall a frame for long.
pub(in crate::app) fn export_working_set_png(working_set: &WorkingSet) -> Result<PathBuf> {
    if working_set.nodes.is_empty() {
        bail!("nothing to export: no nodes are visible");
    }

    let frame = ExportFrame::fit(working_set);
    let mut canvas = Canvas::new(frame.width, frame.height, BACKGROUND);

    for edge in &working_set.edges {
        let start = frame.project(working_set.nodes[edge.source].pos);
        let end = frame.project(working_set.nodes[edge.target].pos);
        let width = (edge.weight.sqrt() * frame.scale).clamp(1.0, 6.0);
        canvas.line(start, end, width, edge.color, EDGE_ALPHA);
    }
    for node in &working_set.nodes {
        let center = frame.project(node.pos);
        canvas.circle(center, (node.radius * frame.scale).max(2.0), node.color);
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs();
    let path = std::env::current_dir()
        .context("resolving working directory for export")?
        .join(format!("graphlens-{stamp}.png"));

    image::save_buffer(
        &path,
        &canvas.pixels,
        canvas.width,
        canvas.height,
        image::ExtendedColorType::Rgb8,
    )
    .with_context(|| format!("writing {}", path.display()))?;

    Ok(path)
}

/// Maps simulation coordinates onto the export canvas.
struct ExportFrame {
    origin: Vec2,
    scale: f32,
    width: u32,
    height: u32,
}

impl ExportFrame {
    fn fit(working_set: &WorkingSet) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for node in &working_set.nodes {
            let extent = Vec2::splat(node.radius);
            min = min.min(node.pos - extent);
            max = max.max(node.pos + extent);
        }

        let span = (max - min).max(Vec2::splat(1.0));
        let scale = (MAX_CONTENT_DIMENSION / span.x.max(span.y)).min(2.0);
        Self {
            origin: min,
            scale,
            width: (span.x * scale + 2.0 * MARGIN).ceil() as u32,
            height: (span.y * scale + 2.0 * MARGIN).ceil() as u32,
        }
    }

    fn project(&self, sim_pos: Vec2) -> Vec2 {
        (sim_pos - self.origin) * self.scale + Vec2::splat(MARGIN)
    }
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Color32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[background.r(), background.g(), background.b()]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn blend(&mut self, x: i32, y: i32, color: Color32, opacity: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let index = ((y as u32 * self.width + x as u32) * 3) as usize;
        for (offset, channel) in [color.r(), color.g(), color.b()].into_iter().enumerate() {
            let base = self.pixels[index + offset] as f32;
            self.pixels[index + offset] =
                (base + (channel as f32 - base) * opacity).round().clamp(0.0, 255.0) as u8;
        }
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Color32) {
        let reach = radius.ceil() as i32;
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                if distance <= radius {
                    self.blend(cx + dx, cy + dy, color, 1.0);
                } else if distance <= radius + 1.0 {
                    // One pixel of edge feathering.
                    self.blend(cx + dx, cy + dy, color, radius + 1.0 - distance);
                }
            }
        }
    }

    fn line(&mut self, start: Vec2, end: Vec2, width: f32, color: Color32, opacity: f32) {
        let length = (end - start).length();
        let steps = (length.ceil() as usize).max(1);
        let half = (width / 2.0).ceil() as i32;
        for step in 0..=steps {
            let point = start + (end - start) * (step as f32 / steps as f32);
            let px = point.x.round() as i32;
            let py = point.y.round() as i32;
            for dy in -half..=half {
                for dx in -half..=half {
                    if ((dx * dx + dy * dy) as f32).sqrt() <= width / 2.0 + 0.5 {
                        self.blend(px + dx, py + dy, color, opacity);
                    }
                }
            }
        }
    }
}
