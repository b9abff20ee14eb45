//! Backend traits.
//!
//! Reducers never hold an [`ApiClient`](crate::ApiClient) directly: their
//! environments are generic over these traits, so tests substitute an
//! in-memory backend.

use crate::error::Result;
use crate::model::{
    Country, EventEnvelope, EventId, LocalImage, TokenGrant, UserRecord, VenueId, VenueRecord,
};
use crate::wire::{CompositeEvent, VenuePayload};
use std::future::Future;

/// Event service
pub trait EventBackend: Send + Sync {
    /// `GET /api/event`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn list_events(&self) -> impl Future<Output = Result<Vec<EventEnvelope>>> + Send;

    /// `GET /api/event/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn get_event(&self, id: &EventId) -> impl Future<Output = Result<EventEnvelope>> + Send;

    /// `POST /api/event/create-full`
    ///
    /// # Errors
    ///
    /// Returns the service's answer verbatim in [`ApiError::Status`](crate::ApiError::Status).
    fn create_full(
        &self,
        payload: &CompositeEvent,
    ) -> impl Future<Output = Result<EventEnvelope>> + Send;

    /// `PUT /api/event/update-full`
    ///
    /// # Errors
    ///
    /// Returns the service's answer verbatim in [`ApiError::Status`](crate::ApiError::Status).
    fn update_full(
        &self,
        payload: &CompositeEvent,
    ) -> impl Future<Output = Result<EventEnvelope>> + Send;
}

/// Venue service
pub trait VenueBackend: Send + Sync {
    /// `GET /api/venue`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn list_venues(&self) -> impl Future<Output = Result<Vec<VenueRecord>>> + Send;

    /// `POST /api/venue`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn create_venue(
        &self,
        payload: &VenuePayload,
    ) -> impl Future<Output = Result<VenueRecord>> + Send;

    /// `PUT /api/venue/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn update_venue(
        &self,
        id: &VenueId,
        payload: &VenuePayload,
    ) -> impl Future<Output = Result<VenueRecord>> + Send;
}

/// Location service
pub trait LocationBackend: Send + Sync {
    /// `GET /api/location`, countries only
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn countries(&self) -> impl Future<Output = Result<Vec<Country>>> + Send;

    /// `GET /api/location/{code}/cities`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn cities(&self, country_code: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Image upload service
pub trait UploadBackend: Send + Sync {
    /// `POST /api/upload` (multipart field `file`), returns the public URL
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the answer has no URL.
    fn upload_image(&self, image: &LocalImage) -> impl Future<Output = Result<String>> + Send;
}

/// User service
pub trait UserBackend: Send + Sync {
    /// `GET /users/GetAllUsers`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserRecord>>> + Send;

    /// `GET /users/GetUserById?usersId=`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn get_user(&self, id: &str) -> impl Future<Output = Result<UserRecord>> + Send;

    /// `POST /users/CreateUser`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn create_user(&self, user: &UserRecord) -> impl Future<Output = Result<UserRecord>> + Send;

    /// `PUT /users/UpdateUser`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn update_user(&self, user: &UserRecord) -> impl Future<Output = Result<UserRecord>> + Send;

    /// `POST /users/ForgotPassword`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn forgot_password(&self, email: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Token endpoint
pub trait TokenBackend: Send + Sync {
    /// Resource-owner password grant
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`](crate::ApiError::Status) with the
    /// `error_description` when the credentials are rejected.
    fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Client-credentials grant for service access
    ///
    /// # Errors
    ///
    /// Returns an error if the grant is rejected.
    fn client_credentials_grant(&self) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Refresh-token grant
    ///
    /// # Errors
    ///
    /// Returns an error if the grant is rejected.
    fn refresh_grant(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant>> + Send;
}

/// Everything the back-office talks to
pub trait Backend:
    EventBackend
    + VenueBackend
    + LocationBackend
    + UploadBackend
    + UserBackend
    + TokenBackend
    + Clone
    + 'static
{
}

impl<T> Backend for T where
    T: EventBackend
        + VenueBackend
        + LocationBackend
        + UploadBackend
        + UserBackend
        + TokenBackend
        + Clone
        + 'static
{
}
