//! Decode errors and the catch-all guard shared by every parser.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Decoded, ReportFormat};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty {format} report provided")]
    EmptyInput { format: ReportFormat },

    #[error("Report has no station identifier")]
    MissingStation,

    #[error("Invalid TAF format - missing header")]
    MissingForecastHeader,

    #[error("Invalid TAF header: bad {field} '{value}'")]
    InvalidForecastHeader { field: &'static str, value: String },

    #[error("No valid pilot reports found")]
    NoPilotReports,

    #[error("Failed to parse {format} report: {message}")]
    Internal {
        format: ReportFormat,
        message: String,
    },
}

impl DecodeError {
    pub fn empty(format: ReportFormat) -> Self {
        Self::EmptyInput { format }
    }

    pub fn invalid_header(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidForecastHeader {
            field,
            value: value.into(),
        }
    }
}

/// Run a decoder body, turning both returned errors and panics into a
/// `Decoded::Failed` that carries the raw text.
pub(crate) fn guard<T>(
    format: ReportFormat,
    raw: &str,
    body: impl FnOnce() -> Result<T, DecodeError>,
) -> Decoded<T> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(report = %format, %message, "decoder fault recovered");
        Err(DecodeError::Internal { format, message })
    });

    match outcome {
        Ok(report) => {
            debug!(report = %format, "decoded report");
            Decoded::Report(report)
        }
        Err(err) => {
            debug!(report = %format, error = %err, "report rejected");
            Decoded::failed(&err, raw)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
