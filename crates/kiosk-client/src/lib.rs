//! # kiosk-client -- Typed Rust client for the parcel-locker backend
//!
//! Wraps the backend's JSON API behind [`LockerBackend`]:
//! - **Deposit** via `/api/deposit/open` and `/api/deposit/close`
//! - **Withdrawal** via `/api/withdraw/open` and `/api/withdraw/close`
//! - **Status** via `/api/lockers/status`
//! - **Health** via `/api/ping`
//!
//! ## Retry Policy
//!
//! Status and health reads retry transport failures with exponential
//! backoff. Open and close calls are sent exactly once; a failure goes back
//! to the user, who re-invokes the action.

pub mod backend;
pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod wire;

pub use backend::LockerBackend;
pub use config::{ConfigError, LockerApiConfig};
pub use error::LockerApiError;
pub use wire::{CloseReceipt, HealthStatus, OpenReceipt};

use std::time::Duration;

use kiosk_core::{ClosetId, LockerId, Secret, StatusMap};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::wire::{
    DepositCloseBody, DepositOpenBody, StatusPayload, WithdrawCloseBody, WithdrawOpenBody,
};

/// HTTP implementation of [`LockerBackend`].
#[derive(Debug, Clone)]
pub struct LockerClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl LockerClient {
    /// Create a client from configuration.
    pub fn new(config: LockerApiConfig) -> Result<Self, LockerApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| LockerApiError::Http {
            endpoint: "client_init".into(),
            source: e,
        })?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, LockerApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = format!("POST {path}");
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| LockerApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        decode(endpoint, resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LockerApiError> {
        let endpoint = format!("GET {path}");
        let request = self.http.get(self.url(path));
        let resp = retry::send_read(request, &endpoint, retry::Backoff::READS)
            .await
            .map_err(|e| LockerApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        decode(endpoint, resp).await
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: String,
    resp: reqwest::Response,
) -> Result<T, LockerApiError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(LockerApiError::Api {
            endpoint,
            status,
            message: wire::error_message(&body),
            body,
        });
    }

    resp.json()
        .await
        .map_err(|e| LockerApiError::Deserialization {
            endpoint,
            source: e,
        })
}

impl LockerBackend for LockerClient {
    async fn open_deposit(
        &self,
        tracking_code: &str,
        locker_id: LockerId,
    ) -> Result<OpenReceipt, LockerApiError> {
        tracing::debug!(%locker_id, "requesting deposit open");
        self.post(
            "/api/deposit/open",
            &DepositOpenBody {
                tracking_code,
                locker_id,
            },
        )
        .await
    }

    async fn close_deposit(
        &self,
        locker_id: LockerId,
        closet_id: &ClosetId,
        tracking_code: &str,
    ) -> Result<CloseReceipt, LockerApiError> {
        tracing::debug!(%locker_id, %closet_id, "requesting deposit close");
        self.post(
            "/api/deposit/close",
            &DepositCloseBody {
                locker_id,
                closet_id,
                tracking_code,
            },
        )
        .await
    }

    async fn open_withdrawal(
        &self,
        password: &Secret,
        locker_id: LockerId,
    ) -> Result<OpenReceipt, LockerApiError> {
        tracing::debug!(%locker_id, "requesting withdrawal open");
        self.post(
            "/api/withdraw/open",
            &WithdrawOpenBody {
                password,
                locker_id,
            },
        )
        .await
    }

    async fn close_withdrawal(
        &self,
        locker_id: LockerId,
        closet_id: &ClosetId,
    ) -> Result<CloseReceipt, LockerApiError> {
        tracing::debug!(%locker_id, %closet_id, "requesting withdrawal close");
        self.post(
            "/api/withdraw/close",
            &WithdrawCloseBody {
                locker_id,
                closet_id,
            },
        )
        .await
    }

    async fn locker_statuses(&self) -> Result<StatusMap, LockerApiError> {
        let payload: StatusPayload = self.get("/api/lockers/status").await?;
        Ok(payload.into_map())
    }

    async fn health_check(&self) -> Result<HealthStatus, LockerApiError> {
        self.get("/api/ping").await
    }
}
