//! Application module
//!
//! This module provides the main application structure:
//! - City search bar on top
//! - Full-screen map with the congestion heat layer
//! - Toggleable sidebar with statistics and layer settings
//! - Notices for failed searches

mod camera;
mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::camera::{FlyTo, fit_to_points, flight_origin};
use crate::app::plugin::HeatmapPlugin;
use crate::app::settings::Settings;
use crate::app::state::AppState;
use eframe::egui;
use std::time::Duration;
use traffic_heatmap_lib::{Coordinates, HttpViewController};
use walkers::{HttpTiles, Map, MapMemory, sources::OpenStreetMap};

/// Idle repaint period so the freshness status keeps ticking
const STATUS_REPAINT: Duration = Duration::from_secs(1);

/// Main application structure
pub struct TrafficHeatmapApp {
    /// Controller and UI settings
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Running recenter animation, if any
    fly: Option<FlyTo>,

    /// Where the app last centered the map, used while the map still follows
    /// its default position
    last_center: Coordinates,
}

impl TrafficHeatmapApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> traffic_heatmap_lib::Result<Self> {
        let cli_args = Settings::from_cli();
        let config = cli_args.to_config()?;
        let start = config.default_coordinates;

        let ctx = cc.egui_ctx.clone();
        let mut controller =
            HttpViewController::from_config(config)?.with_notifier(move || ctx.request_repaint());
        controller.activate();

        let tiles = HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone());

        let mut map_memory = MapMemory::default();
        if map_memory.set_zoom(cli_args.zoom).is_err() {
            tracing::warn!("Zoom level {} is out of range, keeping default", cli_args.zoom);
        }

        tracing::info!(
            "Initialized at {} ({})",
            start,
            controller.city_text()
        );

        let mut state = AppState::new(controller);
        state.ui_settings.fit_to_samples = cli_args.fit_to_samples;

        Ok(Self {
            state,
            tiles,
            map_memory,
            fly: None,
            last_center: start,
        })
    }

    /// Move the view over the current samples, replacing any running flight
    fn fit_view_to_samples(&mut self) {
        let Some((center, zoom)) = fit_to_points(&self.state.controller.heat_points()) else {
            return;
        };
        self.fly = None;
        self.map_memory
            .center_at(walkers::lat_lon(center.lat(), center.lon()));
        let _ = self.map_memory.set_zoom(zoom);
        self.last_center = center;
        tracing::trace!("Fitted view to samples: {} at zoom {:.1}", center, zoom);
    }

    /// Start or advance the recenter animation
    fn update_camera(&mut self, ctx: &egui::Context) {
        if let Some(target) = self.state.controller.take_recenter() {
            let from = flight_origin(self.map_memory.detached(), self.last_center);
            tracing::debug!("Flying from {} to {}", from, target);
            self.fly = Some(FlyTo::new(from, target));
        }

        if let Some(fly) = &self.fly {
            let (position, done) = fly.current();
            self.map_memory.center_at(position);
            if done {
                self.last_center = fly.target();
                self.fly = None;
            } else {
                ctx.request_repaint();
            }
        }
    }
}

#[profiling::all_functions]
impl eframe::App for TrafficHeatmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let changed = self.state.controller.process_events();
        self.update_camera(ctx);
        if changed {
            if self.state.ui_settings.fit_to_samples {
                self.fit_view_to_samples();
            }
            ctx.request_repaint();
        }

        ui_panels::search_bar(ctx, &mut self.state);
        ui_panels::notice_window(ctx, &mut self.state);
        ui_panels::render_sidebar(ctx, &mut self.state);

        let coordinates = self.state.controller.coordinates();
        let show_legend = self.state.ui_settings.show_legend;

        // Central panel: Map view
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let mut map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.map_memory,
                    walkers::lat_lon(coordinates.lat(), coordinates.lon()),
                );
                if !self.state.controller.is_empty() {
                    map = map.with_plugin(HeatmapPlugin::new(
                        self.state.controller.heat_points(),
                        &self.state.ui_settings,
                    ));
                }
                ui.add(map);

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                if self.state.controller.is_empty() {
                    ui_panels::no_data_notice(ui);
                }
                if show_legend {
                    ui_panels::legend_overlay(ui);
                }
                ui_panels::attribution(ui);
            });

        ctx.request_repaint_after(STATUS_REPAINT);
    }
}
