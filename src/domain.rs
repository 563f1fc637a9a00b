use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub struct FVConfig {
    pub event_poll_time: u64,
}

/// Current user selections driving the aggregation contracts.
/// Column fields index into the row store's header list.
#[derive(Debug, Clone, Default, Setters)]
pub struct Selections {
    pub column: usize,
    pub relation_column: usize,
    pub filter: String,
    pub show_all: bool,
    pub show_percentage: bool,
}

#[derive(Debug)]
pub enum Message {
    Quit,
    NextColumn,
    PrevColumn,
    NextRelationColumn,
    PrevRelationColumn,
    ToggleShowAll,
    TogglePercentage,
    Relate,
    Filter,
    Open,
    CopyChart,
    Help,
    Exit,
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter,
    Open,
}

pub const HELP_TEXT: &str = "\
 Frequency dashboard

 <Left>/<Right>  select the primary column
 <Up>/<Down>     select the relation column
 </>             edit the value filter
 <a>             toggle showing all entries
 <p>             toggle percentage labels
 <r>             relate primary and relation column
 <o>             open a spreadsheet (xlsx, csv)
 <y>             copy chart data to the clipboard
 <Esc>           leave relation view / close popup
 <?>             this help
 <q>             quit
";

#[derive(Debug)]
pub enum FVError {
    IoError(Error),
    PolarsError(PolarsError),
    XlsxError(calamine::XlsxError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidSelection(String),
}

impl From<Error> for FVError {
    fn from(err: Error) -> Self {
        FVError::IoError(err)
    }
}

impl From<PolarsError> for FVError {
    fn from(err: PolarsError) -> Self {
        FVError::PolarsError(err)
    }
}

impl From<calamine::XlsxError> for FVError {
    fn from(err: calamine::XlsxError) -> Self {
        FVError::XlsxError(err)
    }
}

// Errors end up in the status line, so they need a readable rendering.
impl fmt::Display for FVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FVError::IoError(e) => write!(f, "io error: {e}"),
            FVError::PolarsError(e) => write!(f, "csv error: {e}"),
            FVError::XlsxError(e) => write!(f, "xlsx error: {e}"),
            FVError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            FVError::FileNotFound => write!(f, "file not found"),
            FVError::PermissionDenied => write!(f, "permission denied"),
            FVError::UnknownFileType => write!(f, "unknown file type"),
            FVError::InvalidSelection(msg) => write!(f, "{msg}"),
        }
    }
}
