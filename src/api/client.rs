//! REST command client

use std::future::Future;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::CommandError;
use crate::store::CameraId;

use super::auth::TokenProvider;
use super::config::ApiConfig;
use super::types::{CameraRecord, CameraSettings, ErrorBody, MessageResponse, NewCamera};

/// Camera commands served by the REST collaborator
///
/// Every call is addressed by camera id and resolves to success or a
/// structured [`CommandError`].
pub trait CommandApi: Send + Sync + 'static {
    /// List registered cameras
    fn list_cameras(&self) -> impl Future<Output = Result<Vec<CameraRecord>, CommandError>> + Send;

    /// Register a camera
    fn add_camera(
        &self,
        camera: &NewCamera,
    ) -> impl Future<Output = Result<CameraRecord, CommandError>> + Send;

    /// Delete a camera
    fn delete_camera(&self, id: &CameraId) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Start streaming a camera
    fn start_camera(&self, id: &CameraId) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Stop streaming a camera
    fn stop_camera(&self, id: &CameraId) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Switch detection on or off
    fn set_detection(
        &self,
        id: &CameraId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Fetch a camera's settings
    fn get_settings(
        &self,
        id: &CameraId,
    ) -> impl Future<Output = Result<CameraSettings, CommandError>> + Send;

    /// Persist a camera's settings, returning what the server stored
    fn update_settings(
        &self,
        id: &CameraId,
        settings: &CameraSettings,
    ) -> impl Future<Output = Result<CameraSettings, CommandError>> + Send;
}

/// [`CommandApi`] over HTTP with bearer authentication
pub struct HttpCommandApi<T> {
    http: Client,
    config: ApiConfig,
    tokens: T,
}

impl<T: TokenProvider> HttpCommandApi<T> {
    /// Build a client with the configured timeouts
    pub fn new(config: ApiConfig, tokens: T) -> Result<Self, CommandError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CommandError::Network(e.to_string()))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CommandError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .ok_or(CommandError::Unauthenticated)?;

        Ok(self
            .http
            .request(method, self.config.url(path))
            .bearer_auth(token))
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        camera: Option<&CameraId>,
    ) -> Result<Response, CommandError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(rejection(status, &body, camera))
    }

    async fn json<R: DeserializeOwned>(response: Response) -> Result<R, CommandError> {
        response
            .json::<R>()
            .await
            .map_err(|e| CommandError::InvalidResponse(e.to_string()))
    }

    async fn camera_command(&self, id: &CameraId, path: String) -> Result<(), CommandError> {
        let request = self.request(Method::POST, &path).await?;
        let response = self.execute(request, Some(id)).await?;

        // Body is informational only
        match Self::json::<MessageResponse>(response).await {
            Ok(body) => tracing::debug!(camera = %id, message = %body.message, "Command accepted"),
            Err(e) => tracing::debug!(camera = %id, error = %e, "Command accepted without message"),
        }
        Ok(())
    }
}

/// Map a non-success response to a command error
fn rejection(status: StatusCode, body: &str, camera: Option<&CameraId>) -> CommandError {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = camera {
            return CommandError::NotFound(id.clone());
        }
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    CommandError::Rejected {
        status: status.as_u16(),
        message,
    }
}

impl<T: TokenProvider> CommandApi for HttpCommandApi<T> {
    async fn list_cameras(&self) -> Result<Vec<CameraRecord>, CommandError> {
        let request = self.request(Method::GET, "cameras").await?;
        let response = self.execute(request, None).await?;
        Self::json(response).await
    }

    async fn add_camera(&self, camera: &NewCamera) -> Result<CameraRecord, CommandError> {
        let request = self.request(Method::POST, "cameras").await?.json(camera);
        let response = self.execute(request, None).await?;
        let record: CameraRecord = Self::json(response).await?;

        tracing::info!(camera = %record.id, name = %record.name, "Camera registered");
        Ok(record)
    }

    async fn delete_camera(&self, id: &CameraId) -> Result<(), CommandError> {
        let request = self
            .request(Method::DELETE, &format!("cameras/{}", id))
            .await?;
        self.execute(request, Some(id)).await?;
        Ok(())
    }

    async fn start_camera(&self, id: &CameraId) -> Result<(), CommandError> {
        self.camera_command(id, format!("cameras/{}/start", id)).await
    }

    async fn stop_camera(&self, id: &CameraId) -> Result<(), CommandError> {
        self.camera_command(id, format!("cameras/{}/stop", id)).await
    }

    async fn set_detection(&self, id: &CameraId, enabled: bool) -> Result<(), CommandError> {
        self.camera_command(id, format!("cameras/{}/detection/{}", id, enabled))
            .await
    }

    async fn get_settings(&self, id: &CameraId) -> Result<CameraSettings, CommandError> {
        let request = self
            .request(Method::GET, &format!("cameras/{}/settings", id))
            .await?;
        let response = self.execute(request, Some(id)).await?;
        Self::json(response).await
    }

    async fn update_settings(
        &self,
        id: &CameraId,
        settings: &CameraSettings,
    ) -> Result<CameraSettings, CommandError> {
        let request = self
            .request(Method::PUT, &format!("cameras/{}/settings", id))
            .await?
            .json(settings);
        let response = self.execute(request, Some(id)).await?;

        // Some servers answer with a bare message; keep what was sent then
        let text = response
            .text()
            .await
            .map_err(|e| CommandError::InvalidResponse(e.to_string()))?;
        let echoed = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .filter(|v| v.get("show_boxes").is_some() || v.get("enabled_classes").is_some())
            .and_then(|v| serde_json::from_value::<CameraSettings>(v).ok());

        Ok(echoed.unwrap_or_else(|| settings.clone()))
    }
}
