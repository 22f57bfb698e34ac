//! Loading people from CSV, Parquet or Arrow files instead of generating them.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::DirError;
use crate::editor::{Draft, validate};
use crate::generator::Generator;
use crate::record::{ImageRef, PersonRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

const REQUIRED_COLUMNS: [&str; 3] = ["name", "email", "role"];
const OPTIONAL_COLUMNS: [&str; 7] = [
    "status",
    "teams",
    "profile_image",
    "date_of_birth",
    "gender",
    "nationality",
    "contact_no",
];

type ColumnData = Vec<Option<String>>;

fn detect_file_type(path: &Path) -> Result<FileType, DirError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(DirError::UnknownFileType(path.to_path_buf())),
    }
}

fn check_file(path: &Path) -> Result<FileType, DirError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DirError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => DirError::PermissionDenied(path.to_path_buf()),
        _ => DirError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DirError::LoadingFailed(format!(
            "{} is not a file",
            path.display()
        )));
    }
    detect_file_type(path)
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

/// All values of a column as trimmed strings; empty cells become `None`.
fn load_column(df: &DataFrame, name: &str) -> Result<ColumnData, PolarsError> {
    let col = df.column(name)?.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn split_teams(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads `path` into validated people. Display fields missing from the file
/// are filled in by the generator.
pub fn import_people(path: &Path, generator: &mut Generator) -> Result<Vec<PersonRecord>, DirError> {
    let file_type = check_file(path)?;
    let frame = match file_type {
        FileType::Csv => load_csv(path)?,
        FileType::Parquet => load_parquet(path)?,
        FileType::Arrow => load_arrow(path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !present.iter().any(|c| c == required) {
            return Err(DirError::MissingColumn(required.to_string()));
        }
    }

    let wanted: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .chain(OPTIONAL_COLUMNS.iter())
        .copied()
        .filter(|c| present.iter().any(|p| p == c))
        .collect();
    let loaded: Result<Vec<(&str, ColumnData)>, PolarsError> = wanted
        .par_iter()
        .map(|&name| load_column(&df, name).map(|data| (name, data)))
        .collect();
    let columns: HashMap<&str, ColumnData> = loaded?.into_iter().collect();
    let cell = |name: &str, row: usize| -> Option<String> {
        columns.get(name).and_then(|c| c.get(row).cloned().flatten())
    };

    let mut people = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let draft = Draft {
            name: cell("name", row).unwrap_or_default(),
            email: cell("email", row).unwrap_or_default(),
            role: cell("role", row).unwrap_or_default(),
            status: cell("status", row).unwrap_or_else(|| "Active".to_string()),
            teams: cell("teams", row).map(|t| split_teams(&t)).unwrap_or_default(),
            photo: cell("profile_image", row)
                .map(ImageRef::new)
                .unwrap_or_default(),
        };
        let valid = validate(&draft)
            .map_err(|e| DirError::LoadingFailed(format!("row {}: {e}", row + 1)))?;
        let mut person = generator.enrich(valid);
        if let Some(v) = cell("date_of_birth", row) {
            person.date_of_birth = v;
        }
        if let Some(v) = cell("gender", row) {
            person.gender = v;
        }
        if let Some(v) = cell("nationality", row) {
            person.nationality = v;
        }
        if let Some(v) = cell("contact_no", row) {
            person.contact_no = v;
        }
        people.push(person);
    }

    info!(
        "Imported {} people from {} in {}ms",
        people.len(),
        path.display(),
        start_time.elapsed().as_millis()
    );
    debug!("Columns used: {:?}", wanted);
    Ok(people)
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, DirError> {
    shellexpand::full(raw)
        .map(|p| PathBuf::from(p.into_owned()))
        .map_err(|e| DirError::LoadingFailed(e.to_string()))
}
