use eframe::egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{Plot, PlotPoint, PlotPoints, Polygon, Text};

use rusty_pedon::color::Rgb8;

use crate::state::AppState;

/// Half the width of one profile column, in plot units.
const HALF_WIDTH: f64 = 0.3;

pub fn to_color32(c: Rgb8) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Profile sketch plot (central panel)
// ---------------------------------------------------------------------------

/// Render side-by-side profile sketches, depth increasing downwards.
pub fn profile_plot(ui: &mut Ui, state: &AppState) {
    if state.collection.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a horizon table to view profiles  (File → Open…)");
        });
        return;
    }

    Plot::new("profile_plot")
        .x_axis_label("Profile")
        .y_axis_label("Depth")
        .show_grid([false, true])
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, sketch) in state.sketches.iter().enumerate() {
                let x = i as f64;

                for span in &sketch.spans {
                    // Depth is plotted negative so the surface sits on top.
                    let outline: PlotPoints = [
                        [x - HALF_WIDTH, -span.top],
                        [x + HALF_WIDTH, -span.top],
                        [x + HALF_WIDTH, -span.bottom],
                        [x - HALF_WIDTH, -span.bottom],
                    ]
                    .into_iter()
                    .collect();

                    plot_ui.polygon(
                        Polygon::new(outline)
                            .fill_color(to_color32(span.color))
                            .stroke(Stroke::new(1.0, Color32::BLACK)),
                    );

                    if let Some(label) = &span.label {
                        let mid = -(span.top + span.bottom) / 2.0;
                        plot_ui.text(
                            Text::new(PlotPoint::new(x + HALF_WIDTH + 0.03, mid), label.clone())
                                .anchor(Align2::LEFT_CENTER),
                        );
                    }
                }

                plot_ui.text(
                    Text::new(
                        PlotPoint::new(x, 2.0),
                        RichText::new(&sketch.profile_id).strong(),
                    )
                    .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}
