//! Boxoffice REST client implementation

use crate::backend::{
    EventBackend, LocationBackend, TokenBackend, UploadBackend, UserBackend, VenueBackend,
};
use crate::error::{ApiError, Result};
use crate::model::{
    Country, EventEnvelope, EventId, LocalImage, TokenGrant, UserRecord, VenueId, VenueRecord,
};
use crate::normalize;
use crate::session::{SessionExpiryGate, SharedToken};
use crate::wire::{CompositeEvent, ForgotPassword, VenuePayload};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Where the client sends requests
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// Base URL of the event/venue/location/upload service
    pub event_api: String,
    /// Base URL of the user service
    pub user_api: String,
    /// Full URL of the OAuth token endpoint
    pub token_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: Option<String>,
}

/// Boxoffice REST client
///
/// Attaches the current bearer token to every service call and reports 401
/// answers to the [`SessionExpiryGate`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    token: SharedToken,
    gate: SessionExpiryGate,
}

impl ApiClient {
    /// Create a client
    #[must_use]
    pub fn new(endpoints: Endpoints, token: SharedToken, gate: SessionExpiryGate) -> Self {
        let endpoints = Endpoints {
            event_api: endpoints.event_api.trim_end_matches('/').to_string(),
            user_api: endpoints.user_api.trim_end_matches('/').to_string(),
            ..endpoints
        };
        Self {
            client: Client::new(),
            endpoints,
            token,
            gate,
        }
    }

    /// The token source this client reads
    #[must_use]
    pub const fn token(&self) -> &SharedToken {
        &self.token
    }

    fn event_url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoints.event_api)
    }

    fn user_url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoints.user_api)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and map the answer to JSON
    ///
    /// An empty success body becomes `Value::Null`.
    async fn execute(&self, builder: RequestBuilder, url: &str) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        self.read(response, url).await
    }

    async fn read(&self, response: Response, url: &str) -> Result<Value> {
        match response.status() {
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                if body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
            },
            StatusCode::UNAUTHORIZED => {
                self.gate.unauthorized(url);
                Err(ApiError::Unauthorized)
            },
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(url, status = status.as_u16(), "Service rejected request");
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                })
            },
        }
    }

    async fn get(&self, url: String) -> Result<Value> {
        let builder = self.request(Method::GET, &url);
        self.execute(builder, &url).await
    }

    async fn send_json<B: Serialize + Sync>(&self, method: Method, url: String, body: &B) -> Result<Value> {
        let builder = self.request(method, &url).json(body);
        self.execute(builder, &url).await
    }

    /// Post a form to the token endpoint
    ///
    /// Token errors carry `error_description` when the endpoint sends one.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let url = &self.endpoints.token_url;
        let mut fields: Vec<(&str, &str)> = form.to_vec();
        fields.push(("client_id", self.endpoints.client_id.as_str()));
        if let Some(secret) = &self.endpoints.client_secret {
            fields.push(("client_secret", secret.as_str()));
        }

        let response = self
            .client
            .post(url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = json
                .get("error_description")
                .and_then(Value::as_str)
                .map_or(body, str::to_string);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let access_token = json
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingToken)?;

        Ok(TokenGrant {
            access_token: access_token.to_string(),
            refresh_token: json
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_string),
            expires_in: json.get("expires_in").and_then(Value::as_u64),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("event_api", &self.endpoints.event_api)
            .field("user_api", &self.endpoints.user_api)
            .finish_non_exhaustive()
    }
}

/// Normalize a composite answer; an empty body echoes what was sent
fn envelope_or_echo(value: &Value, payload: &CompositeEvent) -> Result<EventEnvelope> {
    if value.is_null() {
        return Ok(EventEnvelope::from(payload));
    }
    normalize::event_envelope(value)
}

impl EventBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<EventEnvelope>> {
        let value = self.get(self.event_url("/api/event")).await?;
        Ok(normalize::event_list(&value))
    }

    #[tracing::instrument(skip(self), fields(event_id = %id))]
    async fn get_event(&self, id: &EventId) -> Result<EventEnvelope> {
        let value = self.get(self.event_url(&format!("/api/event/{id}"))).await?;
        normalize::event_envelope(&value)
    }

    #[tracing::instrument(skip(self, payload))]
    async fn create_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope> {
        let value = self
            .send_json(Method::POST, self.event_url("/api/event/create-full"), payload)
            .await?;
        envelope_or_echo(&value, payload)
    }

    #[tracing::instrument(skip(self, payload))]
    async fn update_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope> {
        let value = self
            .send_json(Method::PUT, self.event_url("/api/event/update-full"), payload)
            .await?;
        envelope_or_echo(&value, payload)
    }
}

impl VenueBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn list_venues(&self) -> Result<Vec<VenueRecord>> {
        let value = self.get(self.event_url("/api/venue")).await?;
        Ok(normalize::venue_list(&value))
    }

    #[tracing::instrument(skip(self, payload))]
    async fn create_venue(&self, payload: &VenuePayload) -> Result<VenueRecord> {
        let value = self
            .send_json(Method::POST, self.event_url("/api/venue"), payload)
            .await?;
        normalize::venue(&value)
            .ok_or_else(|| ApiError::Decode("venue response carried no id".to_string()))
    }

    #[tracing::instrument(skip(self, payload), fields(venue_id = %id))]
    async fn update_venue(&self, id: &VenueId, payload: &VenuePayload) -> Result<VenueRecord> {
        let value = self
            .send_json(Method::PUT, self.event_url(&format!("/api/venue/{id}")), payload)
            .await?;
        // Some deployments answer an update with an empty body
        Ok(normalize::venue(&value).unwrap_or_else(|| VenueRecord {
            id: id.clone(),
            name: payload.name.clone(),
            capacity: payload.capacity,
            address: payload.address.clone(),
            location: crate::model::Location::default(),
        }))
    }
}

impl LocationBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn countries(&self) -> Result<Vec<Country>> {
        let value = self.get(self.event_url("/api/location")).await?;
        Ok(normalize::countries(&value))
    }

    #[tracing::instrument(skip(self))]
    async fn cities(&self, country_code: &str) -> Result<Vec<String>> {
        let value = self
            .get(self.event_url(&format!("/api/location/{country_code}/cities")))
            .await?;
        Ok(normalize::cities(&value))
    }
}

impl UploadBackend for ApiClient {
    #[tracing::instrument(skip(self, image), fields(file = %image.file_name))]
    async fn upload_image(&self, image: &LocalImage) -> Result<String> {
        let url = self.event_url("/api/upload");
        let part = reqwest::multipart::Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let builder = self.request(Method::POST, &url).multipart(form);
        let value = self.execute(builder, &url).await?;
        normalize::upload_url(&value)
    }
}

impl UserBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let value = self.get(self.user_url("/users/GetAllUsers")).await?;
        Ok(normalize::user_list(&value))
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self, id: &str) -> Result<UserRecord> {
        let url = self.user_url("/users/GetUserById");
        let builder = self.request(Method::GET, &url).query(&[("usersId", id)]);
        let value = self.execute(builder, &url).await?;
        normalize::user(&value)
    }

    #[tracing::instrument(skip(self, user))]
    async fn create_user(&self, user: &UserRecord) -> Result<UserRecord> {
        let value = self
            .send_json(Method::POST, self.user_url("/users/CreateUser"), user)
            .await?;
        normalize::user(&value).or_else(|_| Ok(user.clone()))
    }

    #[tracing::instrument(skip(self, user))]
    async fn update_user(&self, user: &UserRecord) -> Result<UserRecord> {
        let value = self
            .send_json(Method::PUT, self.user_url("/users/UpdateUser"), user)
            .await?;
        normalize::user(&value).or_else(|_| Ok(user.clone()))
    }

    #[tracing::instrument(skip(self))]
    async fn forgot_password(&self, email: &str) -> Result<()> {
        let body = ForgotPassword {
            user_email: email.to_string(),
        };
        self.send_json(Method::POST, self.user_url("/users/ForgotPassword"), &body)
            .await?;
        Ok(())
    }
}

impl TokenBackend for ApiClient {
    #[tracing::instrument(skip(self, password))]
    async fn password_grant(&self, username: &str, password: &str) -> Result<TokenGrant> {
        self.token_request(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn client_credentials_grant(&self) -> Result<TokenGrant> {
        self.token_request(&[("grant_type", "client_credentials")]).await
    }

    #[tracing::instrument(skip(self, refresh_token))]
    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}
