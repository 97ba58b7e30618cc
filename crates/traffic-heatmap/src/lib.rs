//! Live Traffic Heatmap - Application Library
//!
//! Desktop front end that searches for a city, fetches congestion samples
//! around it and renders them as a heat layer over an OpenStreetMap view.

mod app;

pub use app::TrafficHeatmapApp;

eframe_entrypoints::eframe_app!("Live Traffic Heatmap", |cc| Ok(Box::new(
    TrafficHeatmapApp::new(cc)?
)));
