mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::PedonApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional horizon table to open on startup.
    let initial: Option<PathBuf> = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Pedon – Soil Profile Viewer",
        options,
        Box::new(move |_cc| {
            let mut app = PedonApp::default();
            if let Some(path) = initial {
                app.state.load_path(&path);
            }
            Ok(Box::new(app))
        }),
    )
}
