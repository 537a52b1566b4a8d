use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct PedonApp {
    pub state: AppState,
}

impl eframe::App for PedonApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: colour + site filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: glom ----
        if self.state.collection.is_some() {
            egui::TopBottomPanel::bottom("glom_panel")
                .resizable(true)
                .default_height(200.0)
                .show(ctx, |ui| {
                    panels::glom_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: profile sketches ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::profile_plot(ui, &self.state);
        });
    }
}
