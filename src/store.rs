use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use calamine::{Data, Reader, Xlsx, open_workbook};
use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::FVError;

#[derive(Debug)]
enum FileType {
    CSV,
    XLSX,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One data row, keyed by column name. Missing or blank cells hold the
/// empty string, never an absent key.
pub type Record = HashMap<String, String>;

/// Ordered records plus the ordered column names of one loaded sheet.
/// Built once per file load and replaced wholesale on the next load.
pub struct RowStore {
    name: String,
    headers: Vec<String>,
    records: Vec<Record>,
}

impl RowStore {
    pub fn load(path: &Path) -> Result<Self, FVError> {
        let file_info = Self::get_file_info(path.to_path_buf())?;
        let start_time = Instant::now();

        let (headers, rows) = match file_info.file_type {
            FileType::CSV => Self::load_csv(&file_info.path)?,
            FileType::XLSX => Self::load_xlsx(&file_info.path)?,
        };

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        let store = Self::build(name, headers, rows);

        info!(
            "Loaded {} records x {} columns from {:?} ({} bytes) in {}ms",
            store.records.len(),
            store.headers.len(),
            file_info.path,
            file_info.file_size,
            start_time.elapsed().as_millis()
        );
        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    // Assembles records from a header row and raw cell rows. Columns with a
    // blank header are dropped together with their data; rows whose cells
    // all coerce to empty are skipped.
    fn build(name: String, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let keep: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(idx, _)| idx)
            .collect();
        let headers: Vec<String> = keep.iter().map(|&idx| headers[idx].clone()).collect();

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Record::new();
            let mut all_empty = true;
            for (key, &cidx) in headers.iter().zip(keep.iter()) {
                let value = row.get(cidx).cloned().unwrap_or_default();
                if !value.trim().is_empty() {
                    all_empty = false;
                }
                record.insert(key.clone(), value);
            }
            if !all_empty {
                records.push(record);
            }
        }
        debug!("Built row store \"{}\" with columns {:?}", name, headers);

        Self {
            name,
            headers,
            records,
        }
    }

    fn detect_file_type(path: &Path) -> Result<FileType, FVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("XLSX") | Some("XLSM") => Ok(FileType::XLSX),
            _ => Err(FVError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, FVError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FVError::FileNotFound,
            ErrorKind::PermissionDenied => FVError::PermissionDenied,
            _ => FVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(FVError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Self::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &PathBuf) -> Result<(Vec<String>, Vec<Vec<String>>), FVError> {
        let frame = LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()?;
        let df = frame.collect()?;

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let columns: Vec<Vec<String>> = headers
            .iter()
            .map(|name| Self::coerce_series(&df, name))
            .collect::<Result<_, PolarsError>>()?;

        let rows = (0..df.height())
            .map(|ridx| columns.iter().map(|column| column[ridx].clone()).collect())
            .collect();
        Ok((headers, rows))
    }

    // Numeric columns render with exactly two decimal places, string
    // columns pass through, every other dtype coerces to empty strings.
    fn coerce_series(df: &DataFrame, name: &str) -> Result<Vec<String>, PolarsError> {
        let column = df.column(name)?;
        if Self::is_numeric_type(column.dtype()) {
            let floats = column.cast(&DataType::Float64)?;
            Ok(floats
                .f64()?
                .into_iter()
                .map(|value| value.map(|f| format!("{f:.2}")).unwrap_or_default())
                .collect())
        } else if matches!(column.dtype(), DataType::String) {
            Ok(column
                .str()?
                .into_iter()
                .map(|value| value.unwrap_or("").to_string())
                .collect())
        } else {
            Ok(vec![String::new(); column.len()])
        }
    }

    fn is_numeric_type(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    fn load_xlsx(path: &PathBuf) -> Result<(Vec<String>, Vec<Vec<String>>), FVError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FVError::LoadingFailed("Workbook has no sheets!".into()))?;
        let range = workbook.worksheet_range(&sheet)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let data = rows
            .map(|row| row.iter().map(Self::coerce_cell).collect())
            .collect();
        Ok((headers, data))
    }

    fn coerce_cell(cell: &Data) -> String {
        match cell {
            Data::Int(i) => format!("{:.2}", *i as f64),
            Data::Float(f) => format!("{f:.2}"),
            Data::String(s) => s.clone(),
            _ => String::new(),
        }
    }
}

// Shortcut for building an in-memory store in the test modules.
#[cfg(test)]
pub fn test_store(headers: &[&str], rows: &[&[&str]]) -> RowStore {
    RowStore::build(
        "test".into(),
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}
