//! Submission gateway: the composite create/update endpoints and the image
//! upload that precedes them.
//!
//! No retries. Backend error bodies travel back untouched inside
//! [`ApiError::Status`].

use crate::composer::payload::{SubmissionPlan, SubmitMode, ValidationError};
use boxoffice_client::{ApiError, CompositeEvent, EventBackend, EventEnvelope, LocalImage, UploadBackend};

/// Why a submission did not go through
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The draft was rejected before any request
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The image upload failed; the composite request was not sent
    #[error("image upload failed: {0}")]
    Upload(ApiError),

    /// The composite request failed
    #[error("submission failed: {0}")]
    Submission(ApiError),
}

impl SubmitError {
    /// Detail for the operator: the backend body when there is one
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Upload(error) | Self::Submission(error) => error.display_message(),
        }
    }
}

/// Maps submissions onto backend calls
#[derive(Clone, Debug)]
pub struct SubmissionGateway<B> {
    backend: B,
}

impl<B> SubmissionGateway<B>
where
    B: EventBackend + UploadBackend,
{
    /// Gateway over `backend`
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Create an event with its functions and zones
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ApiError`] unchanged.
    pub async fn create_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope, ApiError> {
        self.backend.create_full(payload).await
    }

    /// Replace an event with its functions and zones
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ApiError`] unchanged.
    pub async fn update_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope, ApiError> {
        self.backend.update_full(payload).await
    }

    /// Upload an image and return its public URL
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ApiError`] unchanged.
    pub async fn upload(&self, image: &LocalImage) -> Result<String, ApiError> {
        self.backend.upload_image(image).await
    }

    /// Upload the pending image, if any, then send the composite request
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Upload`]: the upload failed and nothing else was sent
    /// - [`SubmitError::Submission`]: the composite request failed
    pub async fn submit(&self, plan: SubmissionPlan) -> Result<EventEnvelope, SubmitError> {
        let SubmissionPlan {
            mode,
            mut payload,
            upload,
        } = plan;

        if let Some(image) = upload {
            let url = self.upload(&image).await.map_err(|error| {
                tracing::warn!(%error, file = %image.file_name, "Image upload failed");
                SubmitError::Upload(error)
            })?;
            tracing::debug!(%url, "Image uploaded");
            payload.event.image = Some(url);
        }

        let result = match mode {
            SubmitMode::Create => self.create_full(&payload).await,
            SubmitMode::Update => self.update_full(&payload).await,
        };

        result.map_err(SubmitError::Submission)
    }
}
