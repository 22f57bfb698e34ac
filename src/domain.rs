use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SEED_COUNT: usize = 100;
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DirError {
    #[error("i/o error: {0}")]
    IoError(#[from] Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("unknown file type: {0}")]
    UnknownFileType(PathBuf),
    #[error("missing column \"{0}\"")]
    MissingColumn(String),
    #[error("unknown {kind} \"{label}\"")]
    UnknownLabel { kind: &'static str, label: String },
    #[error("row {index} is out of range ({len} records)")]
    OutOfRange { index: usize, len: usize },
    #[error("photo rejected: {0}")]
    PhotoRejected(String),
    #[error("invalid location \"{0}\"")]
    InvalidLocation(String),
}

/// Runtime settings, filled from the command line.
#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct DirConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub seed_count: usize,
    pub seed: Option<u64>,
    pub max_photo_bytes: u64,
    pub import: Option<PathBuf>,
    pub location: String,
    pub log_file: Option<PathBuf>,
}

impl Default for DirConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: DEFAULT_PAGE_SIZE,
            seed_count: DEFAULT_SEED_COUNT,
            seed: None,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
            import: None,
            location: "/people".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    Enter,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    Search,
    CycleRoleFilter,
    CycleTeamFilter,
    ClearFilters,
    ToggleSort,
    Edit,
    Delete,
    Add,
    CopyEmail,
    GotoDashboard,
    GotoDirectory,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Navigation
  1 / 2            dashboard / directory
  j k / Up Down    move row
  h l / Left Right select column header
  n p / PgDn PgUp  next / previous page
  Enter            open profile panel
  Esc              close panel / popup
  q                quit

Directory
  /                search
  r                cycle role filter
  t                cycle team filter
  c                clear search and filters
  s                toggle sort on selected column
  a                add member
  e                edit member
  d                delete member
  y                copy e-mail to clipboard

Editor
  Tab / Shift-Tab  next / previous field
  Left Right       move through options
  Space            pick option
  Enter            load photo from path (photo field)
  Ctrl-R           remove photo
  Ctrl-S           save
  Esc              cancel";
