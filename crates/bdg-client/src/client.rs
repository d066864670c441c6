//! Async REST client for the inventory backend.
//!
//! Every request carries `Authorization: Bearer <access>` when the session
//! has an access token. A 401 triggers at most one refresh through
//! `POST token/refresh/` followed by a single retry; a failed refresh
//! expires the session and surfaces [`ClientError::SessionExpired`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bdg_config::AppConfig;
use bdg_schemas::{
    ArticleRecord, InventorySnapshot, MotiveRecord, MovementRecord, NewMovementPayload,
    PersonnelRecord, TokenRefreshRequest, TokenRefreshResponse,
};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{flatten_error_body, ClientError};
use crate::session::{Session, SessionState};

const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Mutex<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url,
            session: Mutex::new(session),
        })
    }

    pub fn from_config(cfg: &AppConfig, session: Session) -> Result<Self, ClientError> {
        Self::new(&cfg.api_base_url, Duration::from_secs(cfg.timeout_secs), session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_state(&self) -> SessionState {
        self.session().state()
    }

    pub fn logout(&self) {
        self.session().logout();
    }

    pub async fn fetch_movements(&self) -> Result<Vec<MovementRecord>, ClientError> {
        self.get_json("movimientos/").await
    }

    pub async fn fetch_articles(&self) -> Result<Vec<ArticleRecord>, ClientError> {
        self.get_json("articulos/").await
    }

    pub async fn fetch_personnel(&self) -> Result<Vec<PersonnelRecord>, ClientError> {
        self.get_json("personal/").await
    }

    pub async fn fetch_motives(&self) -> Result<Vec<MotiveRecord>, ClientError> {
        self.get_json("motivos/").await
    }

    /// All four collections, requested concurrently. Fails as a whole if
    /// any one request fails.
    pub async fn fetch_snapshot(&self) -> Result<InventorySnapshot, ClientError> {
        let (movimientos, articulos, personal, motivos) = tokio::try_join!(
            self.fetch_movements(),
            self.fetch_articles(),
            self.fetch_personnel(),
            self.fetch_motives(),
        )?;
        debug!(
            movimientos = movimientos.len(),
            articulos = articulos.len(),
            personal = personal.len(),
            motivos = motivos.len(),
            "snapshot fetched"
        );
        Ok(InventorySnapshot {
            movimientos,
            articulos,
            personal,
            motivos,
        })
    }

    /// Create a movement; returns the row as stored by the backend.
    pub async fn submit_movement(
        &self,
        payload: &NewMovementPayload,
    ) -> Result<MovementRecord, ClientError> {
        let body =
            serde_json::to_value(payload).map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self.execute(Method::POST, "movimientos/", Some(&body)).await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.execute(Method::GET, path, None).await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let token = {
            let session = self.session();
            if !session.is_active() {
                return Err(ClientError::SessionExpired);
            }
            session.access_token().map(str::to_string)
        };

        let resp = self
            .send_once(method.clone(), path, body, token.as_deref())
            .await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!(path, "401 from backend, refreshing access token");
        let fresh = self.refresh_access(token.as_deref()).await?;
        let resp = self.send_once(method, path, body, Some(&fresh)).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ClientError::SessionExpired);
        }
        Ok(resp)
    }

    /// `used` is the token that got the 401. If another request already
    /// replaced it, the newer token is returned without a second refresh.
    async fn refresh_access(&self, used: Option<&str>) -> Result<String, ClientError> {
        let refresh = {
            let session = self.session();
            if !session.is_active() {
                return Err(ClientError::SessionExpired);
            }
            if let Some(current) = session.access_token() {
                if Some(current) != used {
                    return Ok(current.to_string());
                }
            }
            session.refresh_token().map(str::to_string)
        };

        let Some(refresh) = refresh else {
            self.expire_session();
            return Err(ClientError::SessionExpired);
        };

        let access = match self.request_refresh(refresh).await {
            Ok(access) => access,
            Err(e) => {
                debug!(error = %e, "token refresh failed");
                None
            }
        };

        match access {
            Some(access) => {
                self.session().replace_access(access.clone());
                Ok(access)
            }
            None => {
                self.expire_session();
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: String) -> Result<Option<String>, ClientError> {
        let resp = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&TokenRefreshRequest { refresh })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let body: TokenRefreshResponse = resp.json().await?;
        Ok(body.access.filter(|a| !a.is_empty()))
    }

    fn expire_session(&self) {
        if self.session().expire() {
            warn!("session expired; log in again to obtain new tokens");
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let mut message = flatten_error_body(&body);
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
