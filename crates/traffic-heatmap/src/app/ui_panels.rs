//! UI panels for the application
//!
//! Search bar on top, a toggleable sidebar with statistics and heat layer
//! settings, plus overlays drawn over the map.

use crate::app::plugin::heat_color;
use crate::app::state::AppState;
use egui::{Color32, RichText, Ui};
use traffic_heatmap_lib::TrafficLevel;

/// Shown over the map when the last fetch produced no samples
pub const NO_DATA_MESSAGE: &str = "⚠️ No traffic data available for this city or area.";

/// Render the search bar across the top of the window
pub fn search_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("search_bar").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading("🚦 Live Traffic Heatmap");
            ui.add_space(16.0);

            let searching = state.controller.is_searching();
            let label = state.search_button_label();

            let response = ui.add_enabled(
                !searching,
                egui::TextEdit::singleline(state.controller.city_text_mut())
                    .hint_text("Enter a city (e.g., Delhi, Mumbai)")
                    .desired_width(260.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let clicked = ui
                .add_enabled(!searching, egui::Button::new(label))
                .clicked();

            if (submitted || clicked) && state.controller.submit_search() {
                tracing::debug!("Search submitted for {:?}", state.controller.city_text());
            }

            if searching {
                ui.spinner();
            }
        });
        ui.add_space(4.0);
    });
}

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());
    if response.clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if state.ui_settings.sidebar_open {
        "✕"
    } else {
        "☰"
    };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the sidebar with traffic statistics and layer settings
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    egui::SidePanel::right("main_sidebar")
        .default_width(280.0)
        .min_width(240.0)
        .max_width(420.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    render_traffic_section(ui, state);
                    ui.separator();
                    render_layer_section(ui, state);
                    ui.separator();
                    render_about_section(ui);
                });
        });
}

fn render_traffic_section(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("📊 Traffic").strong());
    ui.add_space(4.0);

    let summary = state.controller.summary();
    egui::Grid::new("traffic_summary")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            if let Some(place) = state.controller.place_name() {
                ui.label("Place:");
                ui.label(RichText::new(place).strong());
                ui.end_row();
            }

            ui.label("Center:");
            ui.label(RichText::new(state.controller.coordinates().to_string()).strong());
            ui.end_row();

            ui.label("Samples:");
            ui.label(RichText::new(summary.count.to_string()).strong());
            ui.end_row();

            if summary.count > 0 {
                ui.label("Mean congestion:");
                ui.label(RichText::new(format!("{:.0}%", summary.mean_percent)).strong());
                ui.end_row();

                ui.label("Worst:");
                ui.label(RichText::new(format!("{:.0}%", summary.max_percent)).strong());
                ui.end_row();

                if let Some(speed) = summary.mean_speed {
                    ui.label("Mean speed:");
                    let text = match summary.mean_free_flow_speed {
                        Some(free) => format!("{:.0} km/h (free flow {:.0})", speed, free),
                        None => format!("{:.0} km/h", speed),
                    };
                    ui.label(RichText::new(text).strong());
                    ui.end_row();
                }

                for level in TrafficLevel::all() {
                    level_dot(ui, *level);
                    ui.label(summary.count_for(*level).to_string());
                    ui.end_row();
                }
            }
        });

    ui.add_space(6.0);
    ui.label(
        RichText::new(format!(
            "{} · auto-refresh every {:.1} s",
            state.refresh_status(),
            state.controller.config().refresh_interval().as_secs_f64()
        ))
        .small()
        .weak(),
    );
    if let Some(diagnostic) = state.controller.last_diagnostic() {
        ui.label(
            RichText::new(format!("Last update failed: {}", diagnostic))
                .small()
                .color(ui.visuals().warn_fg_color),
        );
    }

    ui.add_space(4.0);
    if ui.button("🔄 Refresh now").clicked() {
        state.controller.fetch_samples(None);
    }
}

fn render_layer_section(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🎨 Heat Layer").strong());
    ui.add_space(4.0);

    let settings = &mut state.ui_settings;
    ui.add(egui::Slider::new(&mut settings.heat_radius, 5.0..=60.0).text("Radius"));
    ui.add(egui::Slider::new(&mut settings.heat_blur, 0.0..=50.0).text("Blur"));
    ui.add(
        egui::Slider::new(&mut settings.heat_max_zoom, 1.0..=19.0)
            .step_by(1.0)
            .text("Full strength zoom"),
    );
    ui.checkbox(&mut settings.show_legend, "Show legend");
    ui.checkbox(&mut settings.fit_to_samples, "Fit view to samples");
}

fn render_about_section(ui: &mut Ui) {
    ui.label(RichText::new("ℹ About").strong());
    ui.add_space(4.0);
    ui.label(
        RichText::new("Congestion around the searched city, refreshed periodically")
            .small()
            .weak(),
    );
    ui.hyperlink_to(
        RichText::new("© OpenStreetMap contributors").small(),
        "https://www.openstreetmap.org/copyright",
    );
}

/// Colored dot followed by the level label
fn level_dot(ui: &mut Ui, level: TrafficLevel) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
        let color = heat_color((level.representative_percent() / 100.0) as f32);
        ui.painter().circle_filled(rect.center(), 6.0, color);
        ui.label(level.label());
    });
}

/// Legend in the bottom-left corner of the map
pub fn legend_overlay(ui: &mut Ui) {
    let rect = ui.max_rect();
    let pos = rect.left_bottom() + egui::vec2(10.0, -10.0);

    egui::Area::new(egui::Id::new("heat_legend"))
        .fixed_pos(pos)
        .pivot(egui::Align2::LEFT_BOTTOM)
        .order(egui::Order::Foreground)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(RichText::new("Traffic Intensity").strong());
                for level in TrafficLevel::all() {
                    level_dot(ui, *level);
                }
            });
        });
}

/// Muted message centered over the map when there is nothing to draw
pub fn no_data_notice(ui: &mut Ui) {
    let rect = ui.max_rect();
    let size = egui::vec2(420.0, 40.0);
    let bg_rect = egui::Rect::from_center_size(rect.center_top() + egui::vec2(0.0, 40.0), size);

    ui.painter()
        .rect_filled(bg_rect, 8.0, Color32::from_black_alpha(150));
    ui.painter().text(
        bg_rect.center(),
        egui::Align2::CENTER_CENTER,
        NO_DATA_MESSAGE,
        egui::FontId::proportional(15.0),
        Color32::from_gray(220),
    );
}

/// Modal-style window for search notices, dismissed with OK
pub fn notice_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(message) = state.controller.notice().map(ToString::to_string) else {
        return;
    };

    let mut dismissed = false;
    egui::Window::new("Notice")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

    if dismissed {
        state.controller.dismiss_notice();
    }
}

/// Tile attribution at the bottom of the map
pub fn attribution(ui: &mut Ui) {
    let rect = ui.max_rect();
    ui.painter().text(
        rect.center_bottom() + egui::vec2(0.0, -5.0),
        egui::Align2::CENTER_BOTTOM,
        "© OpenStreetMap contributors",
        egui::FontId::proportional(10.0),
        Color32::from_black_alpha(180),
    );
}
