//! Job source
//!
//! Polls the restaurant API for the next print job.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use shared::models::{JobDescriptor, PrintJob, PrintTask};
use tracing::{debug, instrument};

use crate::core::{Config, JobSourceError};

/// Source of print jobs
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch the raw job descriptor
    async fn fetch(&self) -> Result<JobDescriptor, JobSourceError>;

    /// Fetch and decode the next job, `None` when there is nothing to print
    async fn next_job(&self) -> Result<Option<PrintTask>, JobSourceError> {
        let descriptor = self.fetch().await?;
        Ok(PrintJob::from_descriptor(&descriptor)?)
    }
}

/// HTTP job source (`GET {base}/restaurants/{id}/getPrinterJob`)
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: Client,
    url: String,
    app_id: String,
    token: String,
}

impl HttpJobSource {
    pub fn new(config: &Config) -> Result<Self, JobSourceError> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            client,
            url: config.job_url(),
            app_id: config.job_source_app_id.clone(),
            token: config.job_source_token.clone(),
        })
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<JobDescriptor, JobSourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header("appid", &self.app_id)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let descriptor: JobDescriptor = response.json().await?;
        debug!(has_message = descriptor.sqs_message.is_some(), "Job descriptor received");
        Ok(descriptor)
    }
}
