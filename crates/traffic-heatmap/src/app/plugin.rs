//! Walkers plugin rendering the congestion heat layer over the map
//!
//! Each heat point is painted as a stack of translucent discs: a solid core of
//! `radius` pixels fading out over a `blur` pixel rim. Color runs from green
//! (free flow) through orange to red (heavy congestion).

use crate::app::state::UiSettings;
use egui::{Color32, Pos2};
use traffic_heatmap_lib::HeatPoint;
use walkers::{Plugin, Projector};

/// Number of discs used to approximate the blurred rim
const BLUR_STEPS: usize = 6;

/// Plugin for rendering heat points on the map
pub struct HeatmapPlugin {
    points: Vec<HeatPoint>,
    radius: f32,
    blur: f32,
    max_zoom: f64,
}

impl HeatmapPlugin {
    pub fn new(points: Vec<HeatPoint>, settings: &UiSettings) -> Self {
        Self {
            points,
            radius: settings.heat_radius,
            blur: settings.heat_blur,
            max_zoom: settings.heat_max_zoom,
        }
    }

    /// Render a single heat point
    fn render_point(&self, center: Pos2, intensity: f32, zoom_weight: f32, painter: &egui::Painter) {
        let strength = (intensity * zoom_weight).clamp(0.0, 1.0);
        let color = heat_color(intensity);

        // Outer rim first so the core is painted on top
        for step in (0..BLUR_STEPS).rev() {
            let f = (step + 1) as f32 / BLUR_STEPS as f32;
            let radius = self.radius + self.blur * f;
            let alpha = strength * 0.18 * (1.0 - f * 0.8);
            painter.circle_filled(center, radius, with_alpha(color, alpha));
        }
        painter.circle_filled(center, self.radius, with_alpha(color, 0.35 + 0.4 * strength));
    }
}

impl Plugin for HeatmapPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("HeatmapPlugin::run");

        let painter = ui.painter();
        let zoom_weight = zoom_weight(map_memory.zoom(), self.max_zoom);

        // Low intensities first so heavy congestion stays visible where points overlap
        let mut order: Vec<usize> = (0..self.points.len()).collect();
        order.sort_by(|&a, &b| {
            self.points[a]
                .intensity
                .total_cmp(&self.points[b].intensity)
        });

        for index in order {
            let point = &self.points[index];
            let screen = projector.project(walkers::lat_lon(point.lat, point.lon));
            self.render_point(
                Pos2::new(screen.x, screen.y),
                point.intensity as f32,
                zoom_weight,
                painter,
            );
        }
    }
}

/// Strength multiplier for the current zoom: full at `max_zoom` and above,
/// halving for every level below it.
pub fn zoom_weight(zoom: f64, max_zoom: f64) -> f32 {
    let levels_below = (max_zoom - zoom).max(0.0);
    // Keep points visible when zoomed far out
    (0.5f64.powf(levels_below)).max(0.35) as f32
}

/// Color for an intensity in [0, 1]: green -> orange -> red
pub fn heat_color(intensity: f32) -> Color32 {
    const GREEN: [f32; 3] = [46.0, 204.0, 64.0];
    const ORANGE: [f32; 3] = [255.0, 140.0, 0.0];
    const RED: [f32; 3] = [220.0, 20.0, 20.0];

    let t = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (a, b, k) = if t < 0.5 {
        (GREEN, ORANGE, t * 2.0)
    } else {
        (ORANGE, RED, (t - 0.5) * 2.0)
    };
    let mix = |i: usize| (a[i] + (b[i] - a[i]) * k).round() as u8;
    Color32::from_rgb(mix(0), mix(1), mix(2))
}

fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
