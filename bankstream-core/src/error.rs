use thiserror::Error;

/// Failures that end a pipeline run.
///
/// Messages stay generic; the underlying cause is only available through
/// [`std::error::Error::source`] for logging.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input stream could not be read.
    #[error("the uploaded document could not be read")]
    Input(#[source] std::io::Error),

    /// The document bytes could not be opened. Nothing was written.
    #[error("the document could not be opened as a statement")]
    Parse(#[source] anyhow::Error),

    /// The destination rejected a write. Rows before `rows_written` stay.
    #[error("transfer to the destination failed after {rows_written} rows")]
    Transfer {
        rows_written: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Data rows durably written before the failure.
    pub fn rows_written(&self) -> usize {
        match self {
            PipelineError::Transfer { rows_written, .. } => *rows_written,
            PipelineError::Input(_) | PipelineError::Parse(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cell reference '{0}'")]
pub struct InvalidCellRef(pub String);
