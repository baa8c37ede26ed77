// Admin authentication
//
// Credential exchange for a bearer token. This is the one call that runs
// without a session, and its 401 means "wrong credentials", not expiry.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{SybilClient, decode_body, error_message};
use crate::error::Error;
use crate::types::LoginResponse;

const LOGIN_REJECTED: &str = "Login failed. Please check your credentials.";

impl SybilClient {
    /// Exchange credentials for `{access_token, user}`.
    ///
    /// `POST /admin/auth/login`
    ///
    /// Does not touch the session store: storing the returned token is
    /// the caller's decision. `username` may also be an email address.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, Error> {
        let url = self.url("/admin/auth/login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let resp = self.request(Method::POST, url, Some(&body)).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let message = match error_message(status, &text) {
                m if m.starts_with("HTTP ") => LOGIN_REJECTED.to_owned(),
                m => m,
            };
            return Err(Error::Authentication { message });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        decode_body(&text)
    }
}
