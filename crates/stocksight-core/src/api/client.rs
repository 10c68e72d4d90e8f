//! Request gateway for the Stocksight REST API.
//!
//! Every outbound call goes through [`ApiClient::dispatch`], which attaches
//! the bearer token from the [`CredentialStore`] and inspects the response.
//! A 401 on an authenticated call ends the session globally: the credential
//! is cleared, registered [`UnauthorizedHandler`]s run, and the navigator is
//! sent to the login route before the error reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::models::{Identity, RegisterData, Role, TokenResponse};
use crate::navigation::{Navigator, Route};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Hook run when the gateway observes a 401 on an authenticated call.
///
/// Runs after the credential store has been cleared and before the redirect.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// How the inbound stage interprets a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    /// Trades user-supplied secrets for a token. A 401 means the secrets
    /// were wrong, not that the session expired.
    Exchange,
    /// Confirms a token that has not been committed yet. A 401 rejects that
    /// token only; the stored session is left alone.
    Verification,
    /// Relies on the bearer token.
    Authenticated,
}

/// API client for Stocksight.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    unauthorized_handlers: Vec<Arc<dyn UnauthorizedHandler>>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            navigator,
            unauthorized_handlers: Vec::new(),
        })
    }

    /// Register a hook for gateway-detected session expiry.
    pub fn on_unauthorized(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized_handlers.push(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Auth endpoints
    // ========================================================================

    /// Exchange a username and password for a token (`POST /auth/login`).
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .form(&[("username", username), ("password", password)]);
        let response = self.dispatch(request, RequestKind::Exchange, None).await?;
        Self::parse(response, "/auth/login").await
    }

    /// Create an account and receive a token (`POST /auth/register`).
    pub async fn register(&self, data: &RegisterData) -> Result<TokenResponse, ApiError> {
        let request = self.client.post(self.url("/auth/register")).json(data);
        let response = self.dispatch(request, RequestKind::Exchange, None).await?;
        Self::parse(response, "/auth/register").await
    }

    /// Receive a token for one of the preset demo accounts (`POST /auth/demo/{role}`).
    pub async fn demo_login(&self, role: Role) -> Result<TokenResponse, ApiError> {
        let path = format!("/auth/demo/{}", role.as_str());
        let request = self.client.post(self.url(&path));
        let response = self.dispatch(request, RequestKind::Exchange, None).await?;
        Self::parse(response, &path).await
    }

    /// Fetch the identity behind the stored token (`GET /auth/me`).
    pub async fn me(&self) -> Result<Identity, ApiError> {
        self.get("/auth/me", &[]).await
    }

    /// Fetch the identity behind `token`, regardless of what is stored.
    ///
    /// Used right after a credential exchange so the lookup cannot pick up a
    /// token written by a concurrent flow. A 401 here returns
    /// `ApiError::Unauthorized` without ending the stored session.
    pub async fn me_with_token(&self, token: &str) -> Result<Identity, ApiError> {
        let request = self.client.get(self.url("/auth/me"));
        let response = self
            .dispatch(request, RequestKind::Verification, Some(token))
            .await?;
        Self::parse(response, "/auth/me").await
    }

    /// Tell the server the session is over (`POST /auth/logout`).
    ///
    /// The response body is ignored.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.client.post(self.url("/auth/logout"));
        self.dispatch(request, RequestKind::Authenticated, None)
            .await
            .map(|_| ())
    }

    // ========================================================================
    // Generic request helpers
    // ========================================================================

    /// Authenticated GET with query parameters, decoding a JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.client.request(Method::GET, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.dispatch(request, RequestKind::Authenticated, None).await?;
        Self::parse(response, path).await
    }

    /// Authenticated GET of `prefix` followed by one caller-supplied path
    /// segment. The segment is percent-encoded, so `/` or `..` inside it
    /// cannot reach another route.
    pub async fn get_item<T: DeserializeOwned>(
        &self,
        prefix: &str,
        segment: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.item_url(prefix, segment)?;
        let path = url.path().to_string();
        let mut request = self.client.request(Method::GET, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.dispatch(request, RequestKind::Authenticated, None).await?;
        Self::parse(response, &path).await
    }

    fn item_url(&self, prefix: &str, segment: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(prefix))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("API URL cannot take path segments".to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Authenticated POST with a JSON body, decoding a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.dispatch(request, RequestKind::Authenticated, None).await?;
        Self::parse(response, path).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    // ========================================================================
    // Gateway stages
    // ========================================================================

    fn auth_headers(&self, bearer: Option<&str>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let token = match bearer {
            Some(token) => Some(token.to_string()),
            None => self.credentials.get(),
        };
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Bearer token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send `request` through the outbound and inbound stages.
    ///
    /// Failures are never retried here.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        kind: RequestKind,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let (client, request) = request.headers(self.auth_headers(bearer)?).build_split();
        let request = request?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, path = %path, authenticated = request.headers().contains_key(header::AUTHORIZATION), "Sending request");

        let response = client.execute(request).await.map_err(|e| {
            debug!(%method, path = %path, error = %e, "Request failed before a response");
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%method, path = %path, status = status.as_u16(), "Request rejected");

        if status == StatusCode::UNAUTHORIZED {
            return Err(match kind {
                RequestKind::Exchange => ApiError::InvalidCredentials(Self::rejection_message(&body)),
                RequestKind::Verification => ApiError::Unauthorized,
                RequestKind::Authenticated => {
                    self.expire_session(&path);
                    ApiError::Unauthorized
                }
            });
        }
        Err(ApiError::from_status(status, &body))
    }

    fn rejection_message(body: &str) -> String {
        let detail = ApiError::detail(body);
        if detail.trim().is_empty() {
            "Incorrect username or password".to_string()
        } else {
            detail
        }
    }

    /// Forget the credential and send the user to the login route.
    fn expire_session(&self, path: &str) {
        warn!(path = %path, "Authenticated request returned 401, ending session");
        self.credentials.clear();
        for handler in &self.unauthorized_handlers {
            handler.on_unauthorized();
        }
        self.navigator.navigate(Route::Login);
    }
}
