use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_pedon::Table;

use crate::state::AppState;
use crate::ui::plot::to_color32;

// ---------------------------------------------------------------------------
// Left side panel – colour and site filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Profiles");
    ui.separator();

    let Some(collection) = &state.collection else {
        ui.label("No collection loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let horizon_columns = collection.horizon_columns().to_vec();
    let site_columns = collection.site_columns().to_vec();
    let unique = state.site_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color_col = state.color_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(&current_color_col)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &horizon_columns {
                        if ui
                            .selectable_label(current_color_col == *col, col)
                            .clicked()
                        {
                            state.set_color_column(col.clone());
                        }
                    }
                });

            for (value, color) in &state.legend {
                ui.horizontal(|ui: &mut Ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, to_color32(*color));
                    ui.label(value);
                });
            }

            let mut label_hz = state.label_hz;
            if ui.checkbox(&mut label_hz, "Label horizons").changed() {
                state.set_label_hz(label_hz);
            }
            ui.separator();

            // ---- Per-site-column filter widgets (collapsible) ----
            ui.strong("Site filters");
            if site_columns.is_empty() {
                ui.label("No site attributes.");
            }
            for col in &site_columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let n_selected = state.filters.get(col).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .filters
                                .get(col)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(all), Some(visible)) = (&state.collection, &state.visible) {
            ui.label(format!(
                "{} profiles loaded, {} visible",
                all.len(),
                visible.len()
            ));
            if let Some(crs) = all.crs() {
                ui.separator();
                ui.label(format!("CRS: {crs}"));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom panel – glom
// ---------------------------------------------------------------------------

/// Glom controls and the resulting interval × profile table.
pub fn glom_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(collection) = &state.collection else {
        return;
    };
    let mut variables: Vec<String> = collection.config().hzdesgncol.iter().cloned().collect();
    variables.extend(collection.horizon_columns().iter().cloned());

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Glom");
        ui.label("Breakpoints");
        ui.text_edit_singleline(&mut state.glom_breaks);

        let current = state.glom_variable.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("glom_variable")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for var in &variables {
                    if ui.selectable_label(current == *var, var).clicked() {
                        state.glom_variable = Some(var.clone());
                    }
                }
            });

        ui.checkbox(&mut state.glom_fill, "Fill");
        if ui.button("Run (dominant)").clicked() {
            state.run_glom();
        }
    });

    let Some(frame) = &state.glom_result else {
        return;
    };
    let Some(var) = frame.variables.first() else {
        return;
    };
    match frame.pivot(var) {
        Ok(table) => table_view(ui, &table),
        Err(e) => {
            ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
        }
    }
}

fn table_view(ui: &mut Ui, table: &Table) {
    let mut builder = TableBuilder::new(ui).striped(true).resizable(true);
    for _ in table.columns() {
        builder = builder.column(Column::auto().at_least(60.0));
    }
    builder
        .header(20.0, |mut header| {
            for c in table.columns() {
                header.col(|ui| {
                    ui.strong(c);
                });
            }
        })
        .body(|mut body| {
            for i in 0..table.len() {
                body.row(18.0, |mut row| {
                    for c in table.columns() {
                        row.col(|ui| {
                            ui.label(table.value(i, c).to_string());
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open horizon data")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
