// keep in sync with api.rs of backend
use futures::stream::{self, LocalBoxStream, StreamExt};
use reqwest::{header::ACCEPT, Response, StatusCode};
use std::time::Duration;

use crate::{
    bucket::TimeBucketKey,
    poller::ReadingSource,
    req::{CredentialCheck, Credentials, Doctor, DoctorFields, Incubator, IncubatorFields, Reading, Role},
};

/// How long the store holds one watch request open before answering "not yet".
pub const LONG_POLL: Duration = Duration::from_secs(25);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store answered {status}: {message}")]
    Status { status: u16, message: String },
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Http(err) => err.status().map(|s| s.as_u16()),
            StoreError::Status { status, .. } => Some(*status),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("").to_string(),
    };
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Handle on one document store deployment.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    long_poll: Duration,
}

impl StoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            long_poll: LONG_POLL,
        }
    }

    pub fn with_long_poll(mut self, wait: Duration) -> Self {
        self.long_poll = wait;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    pub async fn reading(&self, key: &TimeBucketKey) -> Result<Option<Reading>> {
        let resp = self
            .http
            .get(self.api_url(&format!("api/values/{key}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(ensure_success(resp).await?.json::<Reading>().await?))
    }

    /// One long-poll snapshot: the reading once it exists, `None` if it did not
    /// appear within `wait`.
    pub async fn wait_for_reading(&self, key: &TimeBucketKey, wait: Duration) -> Result<Option<Reading>> {
        let resp = self
            .http
            .get(self.api_url(&format!("api/values/{key}/watch")))
            .query(&[("wait_ms", wait.as_millis() as u64)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(ensure_success(resp).await?.json::<Reading>().await?))
    }

    pub async fn put_reading(&self, key: &TimeBucketKey, reading: &Reading) -> Result<()> {
        let resp = self
            .http
            .put(self.api_url(&format!("api/values/{key}")))
            .json(reading)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    /// Whether a record of `role` matches both username and password.
    pub async fn check_credentials(&self, role: Role, credentials: &Credentials) -> Result<bool> {
        let resp = self
            .http
            .post(self.api_url(&format!("api/auth/{role}")))
            .header(ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<CredentialCheck>().await?.valid)
    }

    pub async fn doctors(&self) -> Result<Vec<Doctor>> {
        let resp = self
            .http
            .get(self.api_url("api/doctors"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Vec<Doctor>>().await?)
    }

    pub async fn create_doctor(&self, fields: &DoctorFields) -> Result<Doctor> {
        let resp = self.http.post(self.api_url("api/doctors")).json(fields).send().await?;
        Ok(ensure_success(resp).await?.json::<Doctor>().await?)
    }

    pub async fn update_doctor(&self, id: &str, fields: &DoctorFields) -> Result<Doctor> {
        let resp = self
            .http
            .put(self.api_url(&format!("api/doctors/{id}")))
            .json(fields)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Doctor>().await?)
    }

    pub async fn delete_doctor(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.api_url(&format!("api/doctors/{id}")))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    pub async fn incubators(&self) -> Result<Vec<Incubator>> {
        let resp = self
            .http
            .get(self.api_url("api/incubators"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Vec<Incubator>>().await?)
    }

    pub async fn create_incubator(&self, fields: &IncubatorFields) -> Result<Incubator> {
        let resp = self
            .http
            .post(self.api_url("api/incubators"))
            .json(fields)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Incubator>().await?)
    }

    pub async fn update_incubator(&self, id: &str, fields: &IncubatorFields) -> Result<Incubator> {
        let resp = self
            .http
            .put(self.api_url(&format!("api/incubators/{id}")))
            .json(fields)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Incubator>().await?)
    }

    pub async fn delete_incubator(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.api_url(&format!("api/incubators/{id}")))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

impl ReadingSource for StoreClient {
    fn watch(&self, key: &TimeBucketKey) -> LocalBoxStream<'static, Result<Option<Reading>>> {
        stream::unfold((self.clone(), key.clone()), |(client, key)| async move {
            let snapshot = client.wait_for_reading(&key, client.long_poll).await;
            Some((snapshot, (client, key)))
        })
        .boxed_local()
    }
}
