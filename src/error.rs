//! Error taxonomy for the dashboard engine.
//!
//! Data absence (missing cells, undated file names, short series) never
//! appears here: those outcomes travel as sentinel values through the normal
//! result types. This module only covers transport and parse failures, plus
//! cancellation, which is a non-error abort that must never set error state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to list files for {department}: {message}")]
    Listing { department: String, message: String },

    #[error("failed to fetch {file} for {department}: {message}")]
    Fetch {
        department: String,
        file: String,
        message: String,
    },

    #[error("failed to parse workbook {file}: {message}")]
    Parse { file: String, message: String },

    #[error("no files available for {department}")]
    NoFiles { department: String },

    #[error("unknown KPI id {kpi_id} for {department}")]
    UnknownKpi { department: String, kpi_id: String },

    #[error("load cancelled")]
    Cancelled,

    #[error("load superseded by a newer selection")]
    Superseded,

    #[error("{0}")]
    Internal(String),
}

impl DashboardError {
    /// Superseded/cancelled loads are aborts, not failures; callers must not
    /// surface them as error banners.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DashboardError::Cancelled | DashboardError::Superseded)
    }

    /// Transport failures are worth retrying on explicit user action; parse
    /// failures and bad ids are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashboardError::Listing { .. }
                | DashboardError::Fetch { .. }
                | DashboardError::Internal(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            DashboardError::Listing { .. } | DashboardError::Fetch { .. } => "transport",
            DashboardError::Parse { .. } => "parse",
            DashboardError::NoFiles { .. } | DashboardError::UnknownKpi { .. } => "not_found",
            DashboardError::Cancelled | DashboardError::Superseded => "cancelled",
            DashboardError::Internal(_) => "internal",
        }
    }
}

impl From<tokio::task::JoinError> for DashboardError {
    fn from(err: tokio::task::JoinError) -> Self {
        DashboardError::Internal(format!("background task failed: {err}"))
    }
}
