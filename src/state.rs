use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use rusty_pedon::data::filter::{filtered_collection, init_filter_state, site_unique_values, FilterState};
use rusty_pedon::color::Rgb8;
use rusty_pedon::render::{color_legend, sketch_profiles, ColorSpec, ProfileSketch};
use rusty_pedon::{load_collection, AttrValue, GlomFrame, GlomOptions, ProfileCollection, SchemaTemplate};

/// Breakpoints pre-filled in the glom panel.
const DEFAULT_BREAKS: &str = "0, 15, 30, 60, 100";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded collection (None until user loads a file).
    pub collection: Option<ProfileCollection>,

    /// Per-site-column filter selections.
    pub filters: FilterState,

    /// Distinct values of every site column, for the filter widgets.
    pub site_values: FilterState,

    /// Profiles passing the current filters (cached).
    pub visible: Option<ProfileCollection>,

    /// Which horizon column is used for colouring.
    pub color_column: Option<String>,

    /// Sketches of the visible profiles, rebuilt on filter/colour change.
    pub sketches: Vec<ProfileSketch>,

    /// Category → colour entries for the current colour column.
    pub legend: Vec<(String, Rgb8)>,

    /// Draw horizon designations next to the sketches.
    pub label_hz: bool,

    pub glom_breaks: String,
    pub glom_variable: Option<String>,
    pub glom_fill: bool,
    pub glom_result: Option<GlomFrame>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            collection: None,
            filters: FilterState::default(),
            site_values: FilterState::default(),
            visible: None,
            color_column: None,
            sketches: Vec::new(),
            legend: Vec::new(),
            label_hz: true,
            glom_breaks: DEFAULT_BREAKS.to_string(),
            glom_variable: None,
            glom_fill: true,
            glom_result: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Load a horizon table from disk, moving per-profile constants to the site table.
    pub fn load_path(&mut self, path: &Path) {
        self.loading = true;
        let template = SchemaTemplate::new().infer_site_columns(true);
        match load_collection(path, &template) {
            Ok(collection) => {
                log::info!(
                    "Loaded {} profiles with horizon columns {:?}",
                    collection.len(),
                    collection.horizon_columns()
                );
                self.set_collection(collection);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
                self.loading = false;
            }
        }
    }

    /// Ingest a newly loaded collection, initialise filters and colour.
    pub fn set_collection(&mut self, collection: ProfileCollection) {
        self.filters = init_filter_state(&collection);
        self.site_values = site_unique_values(&collection);

        // Default colour column: a literal colour column if there is one,
        // else the designation, else the first attribute.
        let columns = collection.horizon_columns();
        self.color_column = columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case("color") || c.eq_ignore_ascii_case("colour"))
            .or(collection.config().hzdesgncol.as_ref())
            .or(columns.first())
            .cloned();
        self.glom_variable = collection
            .config()
            .hzdesgncol
            .clone()
            .or_else(|| columns.first().cloned());
        self.glom_result = None;

        self.visible = Some(collection.clone());
        self.collection = Some(collection);
        self.status_message = None;
        self.loading = false;
        self.rebuild_sketches();
    }

    /// Rebuild the sketches of the visible profiles from the current colour column.
    pub fn rebuild_sketches(&mut self) {
        let Some(visible) = &self.visible else {
            self.sketches.clear();
            self.legend.clear();
            return;
        };
        let color = match &self.color_column {
            Some(col) => ColorSpec::Column(col.clone()),
            None => ColorSpec::Fixed(rusty_pedon::color::MISSING_COLOR),
        };
        let built = sketch_profiles(visible, &color, self.label_hz)
            .and_then(|sketches| Ok((sketches, color_legend(visible, &color)?)));
        match built {
            Ok((sketches, legend)) => {
                self.sketches = sketches;
                self.legend = legend;
            }
            Err(e) => {
                log::error!("Failed to sketch profiles: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.sketches.clear();
                self.legend.clear();
            }
        }
    }

    /// Recompute the visible subset after a filter change.
    pub fn refilter(&mut self) {
        if let Some(spc) = &self.collection {
            self.visible = Some(filtered_collection(spc, &self.filters));
            self.rebuild_sketches();
        }
    }

    /// Set colour column and rebuild the sketches.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        self.rebuild_sketches();
    }

    pub fn set_label_hz(&mut self, label_hz: bool) {
        self.label_hz = label_hz;
        self.rebuild_sketches();
    }

    /// Toggle a single site value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &AttrValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self.site_values.get(column) {
            self.filters.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    /// Glom the visible profiles with the panel's settings.
    pub fn run_glom(&mut self) {
        let result = self.try_glom();
        match result {
            Ok(frame) => {
                log::info!("glom produced {} rows", frame.len());
                self.glom_result = Some(frame);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("glom failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.glom_result = None;
            }
        }
    }

    fn try_glom(&self) -> Result<GlomFrame> {
        let visible = self.visible.as_ref().context("no collection loaded")?;
        let breaks = parse_breakpoints(&self.glom_breaks)?;
        let mut options = GlomOptions::new(breaks).fill(self.glom_fill);
        if let Some(var) = &self.glom_variable {
            options = options.var(var.clone());
        }
        Ok(visible.glom(&options)?)
    }
}

/// Parse comma- or whitespace-separated depth breakpoints.
pub fn parse_breakpoints(text: &str) -> Result<Vec<f64>> {
    let breaks = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>()
                .with_context(|| format!("'{tok}' is not a depth"))
        })
        .collect::<Result<Vec<f64>>>()?;
    if breaks.len() < 2 {
        bail!("enter at least two breakpoints");
    }
    Ok(breaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_accept_commas_and_spaces() {
        assert_eq!(parse_breakpoints("0, 15 30,60").unwrap(), vec![0.0, 15.0, 30.0, 60.0]);
        assert!(parse_breakpoints("0, x").is_err());
        assert!(parse_breakpoints("10").is_err());
    }

    #[test]
    fn load_path_infers_site_columns_and_runs_glom() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,hzid,top,bottom,hzname,clay,landform").unwrap();
        writeln!(file, "P1,1,0,10,A,15,ridge").unwrap();
        writeln!(file, "P1,2,10,40,Bt,35,ridge").unwrap();
        writeln!(file, "P2,3,0,25,Ap,20,valley").unwrap();
        file.flush().unwrap();

        let mut state = AppState::default();
        state.load_path(file.path());
        assert!(state.status_message.is_none());

        let collection = state.collection.as_ref().unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.site_columns(), &["landform".to_string()]);
        assert_eq!(state.sketches.len(), 2);
        assert_eq!(state.glom_variable.as_deref(), Some("hzname"));

        state.glom_breaks = "0, 30".into();
        state.run_glom();
        let frame = state.glom_result.as_ref().unwrap();
        assert_eq!(frame.value("P1", 0.0, "hzname"), Some(&AttrValue::from("Bt")));
        assert_eq!(frame.value("P2", 0.0, "hzname"), Some(&AttrValue::from("Ap")));

        state.select_none("landform");
        assert_eq!(state.visible.as_ref().map(ProfileCollection::len), Some(0));
    }

    #[test]
    fn load_path_reports_bad_files() {
        let mut state = AppState::default();
        state.load_path(Path::new("does-not-exist.csv"));
        assert!(state.collection.is_none());
        assert!(state.status_message.is_some());
    }
}
