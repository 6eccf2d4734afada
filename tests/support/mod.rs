#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use umya_spreadsheet::Spreadsheet;
use wardboard::{DashboardConfig, DashboardState};

/// Temporary workspace laid out like the file-serving collaborator: one
/// subdirectory per department code, spreadsheet exports inside.
pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_workbook<F>(&self, department: &str, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.root.join(department).join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        let mut book = umya_spreadsheet::new_file();
        f(&mut book);
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }

    pub fn write_raw(&self, department: &str, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root.join(department).join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        std::fs::write(&path, bytes).expect("write raw file");
        path
    }

    pub fn config(&self) -> DashboardConfig {
        self.config_with(|_| {})
    }

    pub fn config_with<F>(&self, tweak: F) -> DashboardConfig
    where
        F: FnOnce(&mut DashboardConfig),
    {
        let mut config = DashboardConfig {
            data_service_url: None,
            workspace_root: Some(self.root.clone()),
            cache_capacity: 8,
            cache_ttl_secs: 300,
            fetch_concurrency: 2,
            supported_extensions: vec!["xlsx".to_string(), "xlsm".to_string()],
        };
        tweak(&mut config);
        config
    }

    pub fn state(&self) -> DashboardState {
        DashboardState::new(Arc::new(self.config()))
    }

    pub fn state_with<F>(&self, tweak: F) -> DashboardState
    where
        F: FnOnce(&mut DashboardConfig),
    {
        DashboardState::new(Arc::new(self.config_with(tweak)))
    }
}

/// Fill one sheet of a new book with numeric cells. The default "Sheet1"
/// stays in front, which also exercises the locator's pattern matching.
pub fn numeric_sheet(book: &mut Spreadsheet, sheet_name: &str, cells: &[(&str, f64)]) {
    let sheet = book
        .new_sheet(sheet_name)
        .expect("sheet name is unique in fixture");
    for (address, value) in cells {
        sheet.get_cell_mut(*address).set_value_number(*value);
    }
}
