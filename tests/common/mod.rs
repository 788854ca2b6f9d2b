#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dq_charts::data::{Column, Table, Value};
use dq_charts::error::RenderError;
use dq_charts::render::{ChartWriter, Figure};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn ints(name: &str, values: &[Option<i64>]) -> Column {
    Column::new(name, values.iter().map(|v| v.map(Value::Integer)).collect())
}

pub fn floats(name: &str, values: &[Option<f64>]) -> Column {
    Column::from_f64(name, values.to_vec())
}

pub fn text(name: &str, values: &[Option<&str>]) -> Column {
    Column::new(
        name,
        values
            .iter()
            .map(|v| v.map(|s| Value::String(s.to_string())))
            .collect(),
    )
}

pub fn table(columns: Vec<Column>) -> Table {
    Table::from_columns(columns).expect("valid table")
}

/// Writer that keeps planned figures instead of rasterizing them.
#[derive(Default)]
pub struct RecordingWriter {
    pub written: RefCell<Vec<(PathBuf, Figure)>>,
    failing: HashSet<String>,
}

impl RecordingWriter {
    /// Fails every write whose file name is in `names`.
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            written: RefCell::default(),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.written
            .borrow()
            .iter()
            .filter_map(|(path, _)| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    pub fn figure(&self, filename: &str) -> Option<Figure> {
        self.written
            .borrow()
            .iter()
            .find(|(path, _)| path.file_name().is_some_and(|n| n == filename))
            .map(|(_, figure)| figure.clone())
    }
}

impl ChartWriter for RecordingWriter {
    fn write(&self, figure: &Figure, path: &Path) -> Result<(), RenderError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing.contains(&name) {
            return Err(RenderError::Draw(format!("refusing to draw {name}")));
        }
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), figure.clone()));
        Ok(())
    }
}
