//! Boundary to the remote crypto service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Ciphertext, PublicKeyMaterial},
    error::{ServiceErrorBody, ServiceException},
    protocol::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, PublicKeyResponse},
};
use tracing::debug;
use url::Url;

/// The three service operations. Every call is single-shot; retrying is left to callers.
#[async_trait]
pub trait ServiceGateway: Send + Sync {
    async fn fetch_public_key(&self) -> Result<PublicKeyMaterial>;
    async fn encrypt(&self, plaintext: &str) -> Result<Ciphertext>;
    async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String>;
}

pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &Url) -> Self {
        Self {
            http: Client::new(),
            base_url: trim_base(base_url),
        }
    }

    pub fn with_timeout(base_url: &Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client for crypto service")?;
        Ok(Self {
            http,
            base_url: trim_base(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn trim_base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Turns a non-2xx response into an error carrying the service's `{ error }` detail when present.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ServiceErrorBody>(&raw)
        .map(|body| body.error)
        .unwrap_or(raw);
    Err(ServiceException::new(status.as_u16(), detail).into())
}

#[async_trait]
impl ServiceGateway for HttpGateway {
    async fn fetch_public_key(&self) -> Result<PublicKeyMaterial> {
        let res = self
            .http
            .get(format!("{}/public-key", self.base_url))
            .send()
            .await?;
        let body: PublicKeyResponse = ensure_success(res).await?.json().await?;
        debug!(key_len = body.public_key.as_str().len(), "gateway: public key fetched");
        Ok(body.public_key)
    }

    async fn encrypt(&self, plaintext: &str) -> Result<Ciphertext> {
        let res = self
            .http
            .post(format!("{}/encrypt", self.base_url))
            .json(&EncryptRequest {
                message: plaintext.to_string(),
            })
            .send()
            .await?;
        let body: EncryptResponse = ensure_success(res).await?.json().await?;
        Ok(body.encrypted)
    }

    async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String> {
        let res = self
            .http
            .post(format!("{}/decrypt", self.base_url))
            .json(&DecryptRequest {
                encrypted: ciphertext.clone(),
            })
            .send()
            .await?;
        let body: DecryptResponse = ensure_success(res).await?.json().await?;
        Ok(body.decrypted)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
