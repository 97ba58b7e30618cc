//! Application state management
//!
//! This module holds the view controller together with the UI-only settings
//! that the panels adjust at runtime.

use std::time::Duration;
use traffic_heatmap_lib::HttpViewController;

/// Main application state
pub struct AppState {
    /// Owner of coordinates, search and samples
    pub controller: HttpViewController,

    /// Current UI settings
    pub ui_settings: UiSettings,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone, Debug, PartialEq)]
pub struct UiSettings {
    /// Whether sidebar is open
    pub sidebar_open: bool,

    /// Heat point core radius in pixels
    pub heat_radius: f32,

    /// Extra blurred rim around each heat point in pixels
    pub heat_blur: f32,

    /// Zoom level at which points are drawn at full strength
    pub heat_max_zoom: f64,

    /// Whether to show the legend over the map
    pub show_legend: bool,

    /// Fit the view to the samples whenever new ones arrive
    pub fit_to_samples: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            heat_radius: 25.0,
            heat_blur: 20.0,
            heat_max_zoom: 17.0,
            show_legend: true,
            fit_to_samples: false,
        }
    }
}

impl AppState {
    pub fn new(controller: HttpViewController) -> Self {
        Self {
            controller,
            ui_settings: UiSettings::default(),
        }
    }

    /// Label of the search button, reflecting whether a search is running
    pub fn search_button_label(&self) -> &'static str {
        if self.controller.is_searching() {
            "Searching..."
        } else {
            "Search City"
        }
    }

    /// Status line describing the freshness of the data
    pub fn refresh_status(&self) -> String {
        match self.controller.since_last_refresh() {
            Some(age) => format!("Updated {}", format_age(age)),
            None => "Waiting for first update...".to_string(),
        }
    }
}

/// Human-readable age, e.g. "just now", "12 s ago", "3 min ago"
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 2 {
        "just now".to_string()
    } else if secs < 60 {
        format!("{} s ago", secs)
    } else if secs < 3600 {
        format!("{} min ago", secs / 60)
    } else {
        format!("{} h ago", secs / 3600)
    }
}
