use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::Method;
use tracing::{debug, trace, warn};

use crate::auth::AuthBuilder;
use crate::config::{AuthMode, ConnectionConfig, LoginMethod};
use crate::protocol::Body;
use crate::{Error, Result};

/// HTTP access to one controller: timeouts, auth injection, cookie login.
pub(crate) struct Transport {
    http: reqwest::Client,
    auth: AuthBuilder,
    login_method: LoginMethod,
}

impl Transport {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(config.auth == AuthMode::Cookie)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            auth: AuthBuilder::new(config),
            login_method: config.login_method,
        })
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.execute(Method::GET, path, query, &Body::Empty).await
    }

    pub async fn post(&self, path: &str, body: Body) -> Result<String> {
        self.execute(Method::POST, path, &[], &body).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: &Body,
    ) -> Result<String> {
        let cookie = self.auth.mode() == AuthMode::Cookie;
        if cookie {
            self.login().await?;
        }

        let original = match self.send(method.clone(), path, query, body).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };
        if !(cookie && original.is_auth_rejection()) {
            return Err(original);
        }

        warn!(path, error = %original, "session rejected, logging in again");
        self.login().await?;
        match self.send(method, path, query, body).await {
            Ok(text) => Ok(text),
            Err(retry) => {
                debug!(path, error = %retry, "retry after re-login failed");
                Err(original)
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: &Body,
    ) -> Result<String> {
        // The URL may carry credentials in query mode, so only the path is logged.
        let url = self.auth.url(path, query)?;
        trace!(%method, path, "device request");

        let is_post = method == Method::POST;
        let mut req = self.http.request(method, url);
        if let Some((user, pass)) = self.auth.basic() {
            req = req.basic_auth(user, pass);
        }
        req = match body {
            Body::Empty if is_post => req.form(&self.auth.form(Vec::new())),
            Body::Empty => req,
            Body::Form(fields) => req.form(&self.auth.form(fields.clone())),
            Body::Raw(text) => req
                .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
                .body(text.clone()),
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(path, status = status.as_u16(), "device returned error status");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Establish a session. The response body is discarded.
    async fn login(&self) -> Result<()> {
        let url = self.auth.login_url()?;
        let fields = self.auth.login_fields();
        let req = match self.login_method {
            LoginMethod::Get => self.http.get(url).query(&fields[..]),
            LoginMethod::Post => self.http.post(url).form(&fields[..]),
        };

        let resp = req
            .send()
            .await
            .map_err(|e| Error::AuthenticationFailed(format!("login request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::AuthenticationFailed(format!(
                "login returned HTTP {}",
                status.as_u16()
            )));
        }
        trace!(method = %self.login_method, "logged in");
        Ok(())
    }
}
