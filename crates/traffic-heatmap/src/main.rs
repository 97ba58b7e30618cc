#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

fn main() {
    if let Err(e) = traffic_heatmap::run_native() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
