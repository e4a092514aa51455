//! HTTP implementation of the directory gateway.
//!
//! Doctors and token introspection come from the account service, hospitals
//! and their rooms from the hospital service. The caller's bearer token is
//! forwarded on every request.

use async_trait::async_trait;
use clinic_schedule_core::{
    directory::{DirectoryGateway, DoctorRecord, HospitalRecord, TokenInfo},
    errors::{ScheduleError, ScheduleResult},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub mod config;

use config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    config: DirectoryConfig,
}

impl HttpDirectory {
    pub fn new(config: DirectoryConfig) -> eyre::Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> ScheduleResult<Response> {
        request.send().await.map_err(|e| {
            warn!("{} request failed: {}", what, e);
            ScheduleError::Upstream(format!("{} request failed: {}", what, e))
        })
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        url: String,
        token: &str,
        what: &str,
    ) -> ScheduleResult<Option<T>> {
        debug!("Resolving {} at {}", what, url);

        let response = self.send(self.client.get(&url).bearer_auth(token), what).await?;

        match response.status() {
            status if status.is_success() => decode(response, what).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(unexpected_status(what, status, response).await),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> ScheduleResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ScheduleError::Upstream(format!("Malformed {} response: {}", what, e)))
}

async fn unexpected_status(what: &str, status: StatusCode, response: Response) -> ScheduleError {
    let body = response.text().await.unwrap_or_default();
    warn!("{} lookup answered {}: {}", what, status, body);
    ScheduleError::Upstream(format!("{} lookup answered {}", what, status))
}

#[async_trait]
impl DirectoryGateway for HttpDirectory {
    async fn resolve_doctor(&self, doctor_id: i64, token: &str) -> ScheduleResult<Option<DoctorRecord>> {
        let url = format!("{}/api/Doctors/{}", self.config.account_service_url, doctor_id);
        let doctor: Option<DoctorRecord> = self.lookup(url, token, "doctor").await?;

        // The account service does not echo the id back.
        Ok(doctor.map(|record| DoctorRecord {
            id: record.id.or(Some(doctor_id)),
            ..record
        }))
    }

    async fn resolve_hospital(
        &self,
        hospital_id: i64,
        token: &str,
    ) -> ScheduleResult<Option<HospitalRecord>> {
        let url = format!("{}/api/Hospitals/{}", self.config.hospital_service_url, hospital_id);
        self.lookup(url, token, "hospital").await
    }

    async fn introspect_token(&self, token: &str) -> ScheduleResult<Option<TokenInfo>> {
        let url = format!("{}/api/Authentication/Validate", self.config.account_service_url);

        let request = self
            .client
            .get(&url)
            .query(&[("accessToken", token)])
            .bearer_auth(token);
        let response = self.send(request, "token").await?;

        match response.status() {
            status if status.is_success() => decode(response, "token").await.map(Some),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Account service rejected a token");
                Ok(None)
            }
            status => Err(unexpected_status("token", status, response).await),
        }
    }
}
