use thiserror::Error;

/// Failures the pipeline recognizes and turns into an empty dashboard.
///
/// Anything else (unreadable or malformed dataset files) is fatal and travels
/// as `anyhow::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("File '{filename}' not found!")]
    DatasetNotFound { filename: String },

    #[error("Missing Data!")]
    SchemaInvalid { missing: Vec<String> },
}

impl DashboardError {
    /// Title shown in place of the chart.
    pub fn diagnostic_title(&self) -> String {
        self.to_string()
    }

    /// Whether the "updating" note stays visible for this failure.
    pub fn updating_note_visible(&self) -> bool {
        matches!(self, DashboardError::SchemaInvalid { .. })
    }
}
