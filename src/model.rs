use std::path::PathBuf;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{info, trace, warn};

use crate::aggregate;
use crate::chart::{self, Series};
use crate::domain::{CMDMode, HELP_TEXT, Message, Selections};
use crate::inputter::{InputResult, Inputter};
use crate::store::RowStore;

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

// The three chart states plus the two modal overlays.
#[derive(Debug, Clone, Copy)]
enum Modus {
    CHART,
    RELATION,
    POPUP,
    CMDINPUT,
}

// Chart content as recomputed by the last aggregation. Discarded and
// rebuilt on every control change, never updated in place.
struct ChartView {
    title: String,
    series: Vec<Series>,
    total: usize,
    stats: String,
}

impl ChartView {
    fn empty() -> Self {
        ChartView {
            title: "Data Dashboard".to_string(),
            series: Vec::new(),
            total: 0,
            stats: "Total: 0".to_string(),
        }
    }
}

/// Render snapshot handed to the UI each frame.
pub struct UIData {
    pub name: String,
    pub title: String,
    pub series: Vec<Series>,
    pub total: usize,
    pub stats: String,
    pub controls: String,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            title: String::new(),
            series: Vec::new(),
            total: 0,
            stats: String::new(),
            controls: String::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    store: Option<RowStore>,
    selections: Selections,
    chart: ChartView,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init() -> Self {
        let mut model = Self {
            status: Status::EMPTY,
            modus: Modus::CHART,
            previous_modus: Modus::CHART,
            store: None,
            selections: Selections::default(),
            chart: ChartView::empty(),
            uidata: UIData::empty(),
            // Headless terminals have no clipboard; copying then just
            // reports a status message.
            clipboard: Clipboard::new().ok(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: "Started fv! <o> opens a spreadsheet, <?> shows the keys.".to_string(),
        };
        model.update_uidata();
        model
    }

    /// Loads a spreadsheet and replaces the row store wholesale. All
    /// failures degrade to a status message; the previous store (or the
    /// empty state) stays on display.
    pub fn open(&mut self, raw_path: &str) {
        let path = match shellexpand::full(raw_path) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(e) => {
                self.set_status_message(format!("Bad path: {e}"));
                self.update_uidata();
                return;
            }
        };

        match RowStore::load(&path) {
            Ok(store) => self.install_store(store),
            Err(e) => {
                warn!("Loading {:?} failed: {:?}", path, e);
                self.set_status_message(format!("Error loading file: {e}"));
            }
        }
        self.update_uidata();
    }

    fn install_store(&mut self, store: RowStore) {
        self.selections.column = 0;
        self.selections.relation_column = if store.headers().len() > 1 { 1 } else { 0 };
        self.set_status_message(format!("Loaded {} ({} records)", store.name(), store.len()));
        self.store = Some(store);
        self.status = Status::READY;
        self.rebuild_chart();
        self.update_uidata();
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Every failure inside ends in a status message, so updating never
    /// errors and never tears down the application.
    pub fn update(&mut self, message: Message) {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::CHART | Modus::RELATION => match message {
                Message::Quit => self.quit(),
                Message::NextColumn => self.shift_column(1),
                Message::PrevColumn => self.shift_column(-1),
                Message::NextRelationColumn => self.shift_relation_column(1),
                Message::PrevRelationColumn => self.shift_relation_column(-1),
                Message::ToggleShowAll => {
                    self.selections.show_all = !self.selections.show_all;
                    self.rebuild_chart();
                }
                Message::TogglePercentage => {
                    self.selections.show_percentage = !self.selections.show_percentage;
                    self.rebuild_chart();
                }
                Message::Filter => self.enter_cmd_mode(CMDMode::Filter),
                Message::Open => self.enter_cmd_mode(CMDMode::Open),
                Message::Relate => self.relate(),
                Message::CopyChart => self.copy_chart(),
                Message::Help => self.show_help(),
                Message::Exit => self.leave_relation(),
                Message::RawKey(_) => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key);
                }
            }
        }
        self.update_uidata();
    }

    // -------------------- Control handling functions ---------------------- //

    fn shift_column(&mut self, step: i64) {
        let Some(store) = &self.store else { return };
        let ncols = store.headers().len() as i64;
        if ncols == 0 {
            return;
        }
        self.selections.column =
            (self.selections.column as i64 + step).rem_euclid(ncols) as usize;
        self.rebuild_chart();
    }

    // The relation column only matters once the relate action runs, so
    // changing it does not recompute anything.
    fn shift_relation_column(&mut self, step: i64) {
        let Some(store) = &self.store else { return };
        let ncols = store.headers().len() as i64;
        if ncols == 0 {
            return;
        }
        self.selections.relation_column =
            (self.selections.relation_column as i64 + step).rem_euclid(ncols) as usize;
    }

    // Recomputes the single-column frequency chart from the current
    // store and selections.
    fn rebuild_chart(&mut self) {
        self.modus = Modus::CHART;
        self.chart = match &self.store {
            None => ChartView::empty(),
            Some(store) => {
                let column = store
                    .headers()
                    .get(self.selections.column)
                    .cloned()
                    .unwrap_or_default();
                let frequency = aggregate::aggregate(store, &column, &self.selections.filter);
                let ranked = aggregate::rank(&frequency);
                let series = chart::single_series(&ranked, frequency.total, &self.selections);
                let series = if series.points.is_empty() {
                    Vec::new()
                } else {
                    vec![series]
                };
                ChartView {
                    title: "Data Dashboard".to_string(),
                    series,
                    total: frequency.total,
                    stats: format!("Total: {}", frequency.total),
                }
            }
        };
    }

    fn relate(&mut self) {
        let Some(store) = &self.store else {
            self.set_status_message("No data loaded");
            return;
        };
        let headers = store.headers();
        let column_a = headers.get(self.selections.column).cloned();
        let column_b = headers.get(self.selections.relation_column).cloned();
        let (Some(column_a), Some(column_b)) = (column_a, column_b) else {
            self.set_status_message("Select two different columns to relate");
            return;
        };

        match aggregate::cross_tab(store, &column_a, &column_b) {
            Ok(xtab) => {
                let series = chart::relation_series(&xtab, &self.selections);
                self.chart = ChartView {
                    title: format!(
                        "Relation between '{column_a}' (colors) and '{column_b}' (categories)"
                    ),
                    series,
                    total: xtab.total_relations,
                    stats: format!(
                        "Total relations: {} | Unique '{}': {} | Unique '{}': {}",
                        xtab.total_relations,
                        column_a,
                        xtab.unique_a.len(),
                        column_b,
                        xtab.unique_b.len()
                    ),
                };
                self.modus = Modus::RELATION;
            }
            // Advisory only, the chart state stays untouched.
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn leave_relation(&mut self) {
        if matches!(self.modus, Modus::RELATION) {
            self.rebuild_chart();
        }
    }

    fn copy_chart(&mut self) {
        if self.chart.series.is_empty() {
            self.set_status_message("Nothing to copy");
            return;
        }
        let mut lines = Vec::new();
        for series in &self.chart.series {
            for point in &series.points {
                lines.push(format!("{},{},{}", series.name, point.label, point.value));
            }
        }
        let nlines = lines.len();

        let result = self
            .clipboard
            .as_mut()
            .map(|clipboard| clipboard.set_text(lines.join("\n")));
        match result {
            Some(Ok(())) => {
                info!("Copied {} chart lines to clipboard", nlines);
                self.set_status_message(format!("Copied {nlines} chart lines"));
            }
            Some(Err(e)) => self.set_status_message(format!("Error copying to clipboard: {e}")),
            None => self.set_status_message("Clipboard unavailable"),
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn close_popup(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?} ...", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;

        self.input.clear();
        if mode == CMDMode::Filter {
            self.input.prefill(&self.selections.filter);
        }
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let result = self.last_input.clone();
        match self.cmd_mode {
            Some(CMDMode::Filter) => {
                if !result.canceled {
                    self.selections.filter = result.input;
                    self.rebuild_chart();
                }
            }
            Some(CMDMode::Open) => {
                if !result.canceled && !result.input.is_empty() {
                    self.open(&result.input);
                }
            }
            None => info!("Cmd mode is none!"),
        }
        self.cmd_mode = None;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn controls_line(&self) -> String {
        match &self.store {
            None => "No data loaded.".to_string(),
            Some(store) => {
                let headers = store.headers();
                let column = headers
                    .get(self.selections.column)
                    .map(String::as_str)
                    .unwrap_or("-");
                let relation = headers
                    .get(self.selections.relation_column)
                    .map(String::as_str)
                    .unwrap_or("-");
                let on_off = |flag: bool| if flag { "on" } else { "off" };
                format!(
                    "Column: {} | Relation: {} | Filter: \"{}\" | All: {} | Percent: {}",
                    column,
                    relation,
                    self.selections.filter,
                    on_off(self.selections.show_all),
                    on_off(self.selections.show_percentage),
                )
            }
        }
    }

    fn update_uidata(&mut self) {
        self.uidata = UIData {
            name: self
                .store
                .as_ref()
                .map(|store| store.name().to_string())
                .unwrap_or_else(|| "no file".to_string()),
            title: self.chart.title.clone(),
            series: self.chart.series.clone(),
            total: self.chart.total,
            stats: self.chart.stats.clone(),
            controls: self.controls_line(),
            show_popup: matches!(self.modus, Modus::POPUP),
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_store;
    use ratatui::crossterm::event::KeyCode;

    fn city_model() -> Model {
        let mut model = Model::init();
        model.install_store(test_store(
            &["City", "Dept"],
            &[&["NYC", "Eng"], &["NYC", "Eng"], &["LA", "Sales"]],
        ));
        model
    }

    fn press(model: &mut Model, code: KeyCode) {
        model.update(Message::RawKey(KeyEvent::from(code)));
    }

    #[test]
    fn init_starts_empty_with_zero_total() {
        let model = Model::init();

        assert_eq!(model.status, Status::EMPTY);
        assert!(model.get_uidata().series.is_empty());
        assert_eq!(model.get_uidata().total, 0);
        assert_eq!(model.get_uidata().stats, "Total: 0");
    }

    #[test]
    fn loading_computes_the_default_single_column_chart() {
        let model = city_model();
        let uidata = model.get_uidata();

        assert_eq!(model.status, Status::READY);
        assert_eq!(uidata.total, 3);
        assert_eq!(uidata.series.len(), 1);
        assert_eq!(uidata.series[0].points[0].label, "NYC");
        assert_eq!(uidata.series[0].points[0].value, 2);
        assert!(uidata.controls.contains("Column: City"));
        assert!(uidata.controls.contains("Relation: Dept"));
        assert!(uidata.status_message.contains("3 records"));
    }

    #[test]
    fn column_change_recomputes_the_chart() {
        let mut model = city_model();
        model.update(Message::NextColumn);

        let uidata = model.get_uidata();
        assert!(uidata.controls.contains("Column: Dept"));
        assert_eq!(uidata.series[0].points[0].label, "Eng");
        assert_eq!(uidata.series[0].points[0].value, 2);

        // Wraps around at both ends.
        model.update(Message::NextColumn);
        assert!(model.get_uidata().controls.contains("Column: City"));
        model.update(Message::PrevColumn);
        assert!(model.get_uidata().controls.contains("Column: Dept"));
    }

    #[test]
    fn percentage_toggle_changes_labels() {
        let mut model = city_model();
        model.update(Message::TogglePercentage);

        let uidata = model.get_uidata();
        assert_eq!(uidata.series[0].points[0].label, "NYC (66.7%)");
        assert!(uidata.controls.contains("Percent: on"));
    }

    #[test]
    fn relate_builds_and_exit_leaves_the_relation_view() {
        let mut model = city_model();
        model.update(Message::Relate);

        let uidata = model.get_uidata();
        assert!(uidata.title.contains("Relation between 'City'"));
        assert_eq!(uidata.series.len(), 2);
        assert_eq!(uidata.total, 3);
        assert!(uidata.stats.contains("Total relations: 3"));
        assert!(uidata.stats.contains("Unique 'City': 2"));

        model.update(Message::Exit);
        let uidata = model.get_uidata();
        assert_eq!(uidata.title, "Data Dashboard");
        assert_eq!(uidata.series.len(), 1);
        assert_eq!(uidata.stats, "Total: 3");
    }

    #[test]
    fn relate_with_identical_columns_is_an_advisory_only() {
        let mut model = Model::init();
        model.install_store(test_store(&["City"], &[&["NYC"], &["LA"]]));

        model.update(Message::Relate);
        let uidata = model.get_uidata();
        assert_eq!(
            uidata.status_message,
            "Select two different columns to relate"
        );
        // Chart state unchanged.
        assert_eq!(uidata.title, "Data Dashboard");
        assert_eq!(uidata.total, 2);
    }

    #[test]
    fn filter_input_flow_recomputes_and_cancel_keeps_the_old_filter() {
        let mut model = city_model();
        model.update(Message::Filter);
        assert!(model.raw_keyevents());

        press(&mut model, KeyCode::Char('l'));
        press(&mut model, KeyCode::Char('a'));
        press(&mut model, KeyCode::Enter);

        assert!(!model.raw_keyevents());
        let uidata = model.get_uidata();
        assert_eq!(uidata.total, 1);
        assert_eq!(uidata.series[0].points[0].label, "LA");
        assert!(uidata.controls.contains("Filter: \"la\""));

        // Escaping an edit leaves the previous filter in place.
        model.update(Message::Filter);
        press(&mut model, KeyCode::Char('x'));
        press(&mut model, KeyCode::Esc);
        assert!(model.get_uidata().controls.contains("Filter: \"la\""));
        assert_eq!(model.get_uidata().total, 1);
    }

    #[test]
    fn open_failure_keeps_the_previous_store() {
        let mut model = city_model();
        model.open("tests/fixtures/absent.csv");

        let uidata = model.get_uidata();
        assert!(uidata.status_message.contains("Error loading file"));
        assert_eq!(uidata.total, 3);
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn open_loads_the_csv_fixture() {
        let mut model = Model::init();
        model.open("tests/fixtures/cities.csv");

        let uidata = model.get_uidata();
        assert_eq!(model.status, Status::READY);
        assert_eq!(uidata.name, "cities.csv");
        assert_eq!(uidata.total, 4);
        assert!(uidata.controls.contains("Column: City"));
    }

    #[test]
    fn messages_are_safe_on_an_empty_model() {
        let mut model = Model::init();
        for message in [
            Message::NextColumn,
            Message::PrevColumn,
            Message::NextRelationColumn,
            Message::ToggleShowAll,
            Message::TogglePercentage,
            Message::CopyChart,
            Message::Exit,
        ] {
            model.update(message);
        }
        assert_eq!(model.status, Status::EMPTY);

        model.update(Message::Relate);
        assert_eq!(model.get_uidata().status_message, "No data loaded");
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = city_model();
        model.update(Message::Help);
        assert!(model.get_uidata().show_popup);

        model.update(Message::Exit);
        assert!(!model.get_uidata().show_popup);
        // The chart is still there.
        assert_eq!(model.get_uidata().series.len(), 1);
    }

    #[test]
    fn quit_message_sets_quitting() {
        let mut model = city_model();
        model.update(Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }
}
