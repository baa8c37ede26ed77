// Sybil admin backend HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, bearer auth from the
// session store, and uniform error normalization. Endpoint groups (chat,
// whitelist, pipeline, ...) are inherent methods in `endpoints/*`.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::session::{Session, SessionStore};
use crate::transport::TransportConfig;

/// Default backend location when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Error body shape: `{"detail": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP client for the Sybil admin API.
///
/// Every authenticated call reads the token from the shared
/// [`SessionStore`]. Without a session the call fails locally with
/// [`Error::NotAuthenticated`] and nothing is sent. A 401 clears the
/// store and surfaces as [`Error::SessionExpired`].
#[derive(Clone)]
pub struct SybilClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl SybilClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        session: SessionStore,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: SessionStore) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}{path}`; `path` starts with `/`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// `{base}{path}?k=v&...`
    pub(crate) fn url_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, Error> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        self.send(Method::GET, url, None::<&()>).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, Error> {
        self.send(Method::POST, url, body).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.send(Method::PUT, url, Some(body)).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        self.send(Method::PATCH, url, None::<&()>).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        self.send(Method::DELETE, url, None::<&()>).await
    }

    /// Authenticated request: attach the bearer token, send, normalize.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, Error> {
        let Some(session) = self.session.current() else {
            debug!(%method, %url, "no session; refusing to send");
            return Err(Error::NotAuthenticated);
        };

        debug!("{method} {url}");
        let builder = self
            .request(method, url, body)
            .bearer_auth(session.token.expose_secret());
        let resp = builder.send().await?;

        self.parse_response(resp, &session).await
    }

    /// Build a request with the JSON content type and optional body.
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Normalize a response from an authenticated call.
    ///
    /// 401 clears `sent_with` from the session store before returning,
    /// unless a newer login already replaced it; any other non-2xx becomes
    /// [`Error::Api`] with the backend's `detail` when it has one.
    async fn parse_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        sent_with: &Arc<Session>,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            if self.session.expire(sent_with) {
                warn!("backend rejected the session token; session cleared");
            }
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        decode_body(&body)
    }
}

impl std::fmt::Debug for SybilClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SybilClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

// ── Body helpers ─────────────────────────────────────────────────────

/// `detail` verbatim when the body carries a string one, else `HTTP <status>`.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| match b.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

pub(crate) fn error_from_body(status: StatusCode, body: &str) -> Error {
    Error::Api {
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

/// Decode a success body. An empty body decodes as JSON `null`, so unit
/// and `Option` responses work for endpoints that answer with nothing.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| {
        let preview = body.chars().take(200).collect::<String>();
        trace!(body = %preview, "failed to decode response");
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn detail_string_is_used_verbatim() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"detail":"Invalid phone"}"#);
        assert_eq!(msg, "Invalid phone");
    }

    #[test]
    fn missing_or_structured_detail_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "HTTP 500"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(
            error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#
            ),
            "HTTP 422"
        );
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        decode_body::<()>("").unwrap();
        assert_eq!(decode_body::<Option<u32>>("  ").unwrap(), None);
    }

    #[test]
    fn bad_body_keeps_raw_text() {
        let err = decode_body::<Vec<u32>>("{not json").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "{not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = SybilClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/").unwrap(),
            SessionStore::in_memory(),
        );
        assert_eq!(
            client.url("/admin/whitelist").unwrap().as_str(),
            "http://localhost:8000/admin/whitelist"
        );
        let url = client
            .url_with_query("/admin/otter/runs", &[("limit", "100".into())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/admin/otter/runs?limit=100");
    }
}
