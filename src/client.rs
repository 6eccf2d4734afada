//! Data source behind the dashboard: either the remote file-serving
//! collaborator (`GET /data/{department}` for the listing, `GET
//! /data/{department}/{file}` for raw bytes) or a local workspace directory
//! laid out the same way. All fetches are cancellable so a superseded
//! selection aborts cleanly instead of racing a newer one.

use crate::error::DashboardError;
use crate::model::Department;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub enum DataSource {
    Remote {
        http: reqwest::Client,
        base_url: String,
    },
    Local {
        root: PathBuf,
    },
}

impl DataSource {
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self::Remote {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local { root: root.into() }
    }

    /// File names available for one department, as the collaborator reports
    /// them. Extension filtering and period sorting happen in the caller.
    pub async fn list_files(
        &self,
        department: Department,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, DashboardError> {
        match self {
            DataSource::Remote { http, base_url } => {
                let url = format!("{}/data/{}", base_url, department.code());
                let request = async {
                    http.get(&url)
                        .send()
                        .await?
                        .error_for_status()?
                        .json::<Vec<String>>()
                        .await
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DashboardError::Cancelled),
                    result = request => result.map_err(|err| DashboardError::Listing {
                        department: department.code().to_string(),
                        message: err.to_string(),
                    }),
                }
            }
            DataSource::Local { root } => {
                let dir = root.join(department.code());
                if !dir.is_dir() {
                    return Ok(Vec::new());
                }
                let mut names = Vec::new();
                for entry in WalkDir::new(&dir).max_depth(1) {
                    let entry = entry.map_err(|err| DashboardError::Listing {
                        department: department.code().to_string(),
                        message: err.to_string(),
                    })?;
                    if entry.file_type().is_file() {
                        names.push(entry.file_name().to_string_lossy().to_string());
                    }
                }
                names.sort();
                Ok(names)
            }
        }
    }

    /// Raw workbook bytes for one advertised file.
    pub async fn fetch_file(
        &self,
        department: Department,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, DashboardError> {
        match self {
            DataSource::Remote { http, base_url } => {
                let url = format!("{}/data/{}/{}", base_url, department.code(), file_name);
                let request = async {
                    http.get(&url)
                        .send()
                        .await?
                        .error_for_status()?
                        .bytes()
                        .await
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DashboardError::Cancelled),
                    result = request => result
                        .map(|bytes| bytes.to_vec())
                        .map_err(|err| DashboardError::Fetch {
                            department: department.code().to_string(),
                            file: file_name.to_string(),
                            message: err.to_string(),
                        }),
                }
            }
            DataSource::Local { root } => {
                let path = root.join(department.code()).join(file_name);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DashboardError::Cancelled),
                    result = tokio::fs::read(&path) => {
                        result.map_err(|err| DashboardError::Fetch {
                            department: department.code().to_string(),
                            file: file_name.to_string(),
                            message: err.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Byte size of a file when the source can know it without a fetch.
    pub fn file_size(&self, department: Department, file_name: &str) -> Option<u64> {
        match self {
            DataSource::Remote { .. } => None,
            DataSource::Local { root } => {
                std::fs::metadata(root.join(department.code()).join(file_name))
                    .map(|meta| meta.len())
                    .ok()
            }
        }
    }
}
