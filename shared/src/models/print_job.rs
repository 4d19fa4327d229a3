//! Print Job Model
//!
//! The job source answers with a [`JobDescriptor`] whose message field carries
//! a JSON-serialized [`PrintJob`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::serde_helpers::null_default;
use super::{OrderSession, PrinterProfile};

/// Raw response of the job source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    /// Serialized [`PrintJob`] payload
    #[serde(default)]
    pub sqs_message: Option<String>,
}

/// Parsed job payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    #[serde(default)]
    pub printer_info: Option<Vec<PrinterProfile>>,
    #[serde(default)]
    pub order_session: Option<OrderSession>,
    #[serde(default, deserialize_with = "null_default")]
    pub is_preview: bool,
}

/// An actionable job: one order session fanned out to printers
#[derive(Debug, Clone, PartialEq)]
pub struct PrintTask {
    pub order_session: OrderSession,
    pub printers: Vec<PrinterProfile>,
    pub is_preview: bool,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Malformed job payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Job payload has printers but no order session")]
    MissingOrderSession,
}

impl PrintJob {
    /// Parse the payload embedded in a descriptor
    ///
    /// Returns `Ok(None)` when there is nothing to print: no message, or a
    /// payload without a printer list.
    pub fn from_descriptor(descriptor: &JobDescriptor) -> Result<Option<PrintTask>, PayloadError> {
        let Some(message) = descriptor
            .sqs_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        else {
            return Ok(None);
        };

        let job: PrintJob = serde_json::from_str(message)?;
        job.into_task()
    }

    fn into_task(self) -> Result<Option<PrintTask>, PayloadError> {
        let Some(printers) = self.printer_info else {
            return Ok(None);
        };
        let order_session = self
            .order_session
            .ok_or(PayloadError::MissingOrderSession)?;

        Ok(Some(PrintTask {
            order_session,
            printers,
            is_preview: self.is_preview,
        }))
    }
}
