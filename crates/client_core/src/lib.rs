use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Item, ItemId},
    protocol::{
        CheckEmailRequest, CheckEmailResponse, ItemResponse, RegisterUserRequest, ResponseStatus,
        TransactionRequest,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod driver;
pub mod error;
pub mod form;
pub mod validation;

pub use config::Settings;
pub use driver::{drive, perform, FormEffect, FormOutcome};
pub use error::ClientError;
pub use form::{EmailStatus, ReservationForm};

/// Result of a `/check-email` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailLookup {
    Known {
        first_name: String,
        last_name: String,
    },
    Unknown,
}

/// Seam between the form workflow and the reservation backend.
#[async_trait]
pub trait ReservationApi: Send + Sync {
    async fn fetch_item(&self, id: &ItemId) -> Result<Item, ClientError>;
    async fn check_email(&self, email: &str) -> Result<EmailLookup, ClientError>;
    async fn register_user(&self, request: &RegisterUserRequest) -> Result<(), ClientError>;
    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<(), ClientError>;
}

pub struct HttpReservationClient {
    http: Client,
    base_url: Url,
}

impl HttpReservationClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(server_url, Client::new())
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Self::with_http_client(&settings.server_url, http)
    }

    pub fn with_http_client(server_url: &str, http: Client) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(server_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        // Strip a trailing slash so path segments append cleanly.
        if base_url.path().ends_with('/') {
            let trimmed = base_url.path().trim_end_matches('/').to_string();
            base_url.set_path(&trimmed);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segment: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(&[segment]);
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        read_envelope(response).await
    }
}

/// Decodes a `{success, message?, ...}` envelope into `T`.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(err) if status.is_success() => return Err(ClientError::Malformed(err.to_string())),
        Err(_) => return Err(ClientError::Status(status.as_u16())),
    };

    let envelope: ResponseStatus = match serde_json::from_value(body.clone()) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(ClientError::Status(status.as_u16())),
        Err(err) => return Err(ClientError::Malformed(err.to_string())),
    };
    if !status.is_success() || !envelope.success {
        warn!(
            status = status.as_u16(),
            message = envelope.message.as_deref().unwrap_or_default(),
            "backend rejected request"
        );
        return Err(ClientError::Rejected {
            message: envelope.message,
        });
    }

    serde_json::from_value(body).map_err(|err| ClientError::Malformed(err.to_string()))
}

#[async_trait]
impl ReservationApi for HttpReservationClient {
    async fn fetch_item(&self, id: &ItemId) -> Result<Item, ClientError> {
        let url = self.endpoint(&["item", id.as_str()]);
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let body: ItemResponse = read_envelope(response).await?;
        info!(item_id = %id, name = %body.name, quantity = body.quantity, "item loaded");
        Ok(Item {
            id: id.clone(),
            name: body.name,
            location: body.location,
            remaining_quantity: body.quantity,
        })
    }

    async fn check_email(&self, email: &str) -> Result<EmailLookup, ClientError> {
        let body: CheckEmailResponse = self
            .post_json(
                "check-email",
                &CheckEmailRequest {
                    email: email.to_string(),
                },
            )
            .await?;
        info!(email, exists = body.exists, "email checked");
        if body.exists {
            Ok(EmailLookup::Known {
                first_name: body.first_name.unwrap_or_default(),
                last_name: body.last_name.unwrap_or_default(),
            })
        } else {
            Ok(EmailLookup::Unknown)
        }
    }

    async fn register_user(&self, request: &RegisterUserRequest) -> Result<(), ClientError> {
        let _: ResponseStatus = self.post_json("register-user", request).await?;
        info!(email = %request.email, "user registered");
        Ok(())
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<(), ClientError> {
        let _: ResponseStatus = self.post_json("transaction", request).await?;
        info!(
            item_id = %request.id,
            action = request.action.as_str(),
            quantity = request.quantity,
            "transaction accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
