//! REST client for the Mii mining job service.
//!
//! Wraps every endpoint the client page and the operator console use.
//! Responses are decoded through the shared `{result, message, data}`
//! envelope; see [`miimine_core::envelope::interpret`].

use std::time::Duration;

use miimine_core::endpoints;
use miimine_core::envelope::{self, EnvelopeError, NetworkStats, StatusData, SubmitData};
use miimine_core::jobs_table::JobListing;
use miimine_core::submission::{
    ResolvedSubmission, FIELD_ID0, FIELD_MII_FILE, FIELD_MODEL, FIELD_YEAR,
};
use miimine_core::types::{JobIdentity, JobStatus};
use miimine_core::workers::{WorkerKind, WorkerRecord};
use serde::de::{DeserializeOwned, IgnoredAny};

/// MIME type of the uploaded Mii part.
const MII_CONTENT_TYPE: &str = "application/octet-stream";

/// Basic-auth credentials for the admin endpoints.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

/// HTTP client for one job service instance.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MiningApi {
    client: reqwest::Client,
    base_url: String,
    admin: Option<AdminCredentials>,
}

/// Errors from the service API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response could not be read as an envelope, or a plain fetch
    /// got a non-2xx status. Displays the HTTP status line.
    #[error("{status} - {reason}")]
    HttpStatus {
        status: u16,
        reason: String,
    },

    /// The service answered with `result: error` (or a non-2xx status).
    /// Displays the service message verbatim.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
    },

    /// The envelope was fine but `data` had the wrong shape.
    #[error("Unexpected response data: {0}")]
    UnexpectedData(String),
}

impl MiningApi {
    /// Create a client for the service at `base_url`, e.g. `http://host:7799`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            admin: None,
        }
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Attach basic-auth credentials used for admin endpoints.
    pub fn with_admin_credentials(mut self, credentials: Option<AdminCredentials>) -> Self {
        self.admin = credentials;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- client endpoints ----

    /// Download raw bytes from an arbitrary URL (a remote Mii source).
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(url, "Fetching remote Mii data");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Submit a job as a multipart form. Returns the identity the service
    /// tracks it under.
    pub async fn submit_job(
        &self,
        submission: &ResolvedSubmission,
    ) -> Result<JobIdentity, ApiError> {
        let mii = reqwest::multipart::Part::bytes(submission.mii.clone())
            .file_name(submission.file_name.clone())
            .mime_str(MII_CONTENT_TYPE)?;

        let form = reqwest::multipart::Form::new()
            .text(FIELD_ID0, submission.id0.clone())
            .text(FIELD_MODEL, submission.model.clone())
            .text(FIELD_YEAR, submission.year.clone().unwrap_or_default())
            .part(FIELD_MII_FILE, mii);

        let response = self
            .client
            .post(endpoints::url(&self.base_url, endpoints::SUBMIT_JOB))
            .multipart(form)
            .send()
            .await?;

        let data: SubmitData = Self::read_envelope(response).await?;
        JobIdentity::new(data.id0)
            .ok_or_else(|| ApiError::UnexpectedData("empty id0 in submission response".into()))
    }

    /// Current status of a job. `None` when the service reports a status
    /// this client does not know.
    pub async fn job_status(&self, id0: &JobIdentity) -> Result<Option<JobStatus>, ApiError> {
        let url =
            endpoints::url_with_segment(&self.base_url, endpoints::CHECK_JOB_STATUS, id0.as_str());
        let response = self.client.get(url).send().await?;
        let data: StatusData = Self::read_envelope(response).await?;
        Ok(data.status.as_deref().and_then(JobStatus::parse))
    }

    /// Cancel a job by client identity or admin key.
    pub async fn cancel_job(&self, id0_or_key: &str) -> Result<(), ApiError> {
        let url = endpoints::url_with_segment(&self.base_url, endpoints::CANCEL_JOB, id0_or_key);
        let response = self.with_admin_auth(self.client.get(url)).send().await?;
        let _: IgnoredAny = Self::read_envelope(response).await?;
        Ok(())
    }

    /// Service-wide queue and miner counters.
    pub async fn network_stats(&self) -> Result<NetworkStats, ApiError> {
        let response = self
            .client
            .get(endpoints::url(&self.base_url, endpoints::NETWORK_STATS))
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    // ---- admin endpoints ----

    /// Reset a canceled job.
    pub async fn reset_job(&self, key: &str) -> Result<(), ApiError> {
        let url = endpoints::url_with_segment(&self.base_url, endpoints::RESET_JOB, key);
        let response = self.with_admin_auth(self.client.get(url)).send().await?;
        let _: IgnoredAny = Self::read_envelope(response).await?;
        Ok(())
    }

    /// Every job plus the pending queue, in one call.
    pub async fn list_jobs(&self) -> Result<JobListing, ApiError> {
        let url = endpoints::url(&self.base_url, endpoints::LIST_JOBS);
        let response = self.with_admin_auth(self.client.get(url)).send().await?;
        Self::read_envelope(response).await
    }

    /// One worker collection.
    pub async fn list_workers(&self, kind: WorkerKind) -> Result<Vec<WorkerRecord>, ApiError> {
        let path = match kind {
            WorkerKind::Miners => endpoints::LIST_MINERS,
            WorkerKind::Friendbots => endpoints::LIST_FRIENDBOTS,
        };
        let response = self
            .with_admin_auth(self.client.get(endpoints::url(&self.base_url, path)))
            .send()
            .await?;
        let mut data: serde_json::Map<String, serde_json::Value> =
            Self::read_envelope(response).await?;
        let workers = data
            .remove(kind.data_field())
            .ok_or_else(|| ApiError::UnexpectedData(format!("missing `{kind}` collection")))?;
        serde_json::from_value(workers).map_err(|e| ApiError::UnexpectedData(e.to_string()))
    }

    // ---- private helpers ----

    fn with_admin_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin {
            Some(creds) => request.basic_auth(&creds.user, Some(&creds.password)),
            None => request,
        }
    }

    /// Read the body and decode it through the envelope.
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        envelope::interpret(status.is_success(), &body).map_err(|e| match e {
            EnvelopeError::NotJson => ApiError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            },
            EnvelopeError::Rejected(message) => ApiError::Rejected {
                status: status.as_u16(),
                message,
            },
            EnvelopeError::UnexpectedData(detail) => ApiError::UnexpectedData(detail),
        })
    }
}
