use reqwest::Url;

use crate::config::{AuthMode, ConnectionConfig};
use crate::{Error, Result};

/// Builds request URLs and form bodies according to the configured auth mode.
#[derive(Debug, Clone)]
pub(crate) struct AuthBuilder {
    base: String,
    mode: AuthMode,
    username: Option<String>,
    password: Option<String>,
    user_field: String,
    pass_field: String,
    login_path: String,
}

impl AuthBuilder {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            base: config.base_url(),
            mode: config.auth,
            username: config.username.clone(),
            password: config.password.clone(),
            user_field: config.user_field.clone(),
            pass_field: config.pass_field.clone(),
            login_path: config.login_path.clone(),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Credentials to inject into URLs and forms, only in query mode with both set.
    fn query_credentials(&self) -> Option<[(String, String); 2]> {
        if self.mode != AuthMode::Query {
            return None;
        }
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some([
                (self.user_field.clone(), user.clone()),
                (self.pass_field.clone(), pass.clone()),
            ]),
            _ => None,
        }
    }

    /// Request URL for `path`. Any query string already on `path` is kept and
    /// `query` plus query-mode credentials are appended after it.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base, path))
            .map_err(|e| Error::InvalidConfig(format!("bad request URL for {path}: {e}")))?;

        let credentials = self.query_credentials();
        if !query.is_empty() || credentials.is_some() {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(query);
            if let Some(creds) = &credentials {
                pairs.extend_pairs(creds.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }
        Ok(url)
    }

    /// Form fields for a POST body, with query-mode credentials added.
    pub fn form(&self, mut fields: Vec<(String, String)>) -> Vec<(String, String)> {
        if let Some(creds) = self.query_credentials() {
            fields.extend(creds);
        }
        fields
    }

    /// Basic credentials, when basic mode has a username.
    pub fn basic(&self) -> Option<(&str, Option<&str>)> {
        if self.mode != AuthMode::Basic {
            return None;
        }
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref()))
    }

    pub fn login_url(&self) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base, self.login_path))
            .map_err(|e| Error::InvalidConfig(format!("bad login URL: {e}")))
    }

    pub fn login_fields(&self) -> [(String, String); 2] {
        [
            (
                self.user_field.clone(),
                self.username.clone().unwrap_or_default(),
            ),
            (
                self.pass_field.clone(),
                self.password.clone().unwrap_or_default(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: AuthMode) -> ConnectionConfig {
        let mut cfg = ConnectionConfig::new("10.0.0.2");
        cfg.auth = mode;
        cfg.username = Some("admin".into());
        cfg.password = Some("s3cr&t".into());
        cfg
    }

    #[test]
    fn none_mode_leaves_url_alone() {
        let auth = AuthBuilder::new(&config(AuthMode::None));
        let url = auth.url("/super.cgi", &[]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2/super.cgi");
        assert!(auth.basic().is_none());
        assert!(auth.form(Vec::new()).is_empty());
    }

    #[test]
    fn query_mode_appends_credentials() {
        let auth = AuthBuilder::new(&config(AuthMode::Query));
        let url = auth.url("/super.cgi", &[]).unwrap();
        assert_eq!(url.query(), Some("user=admin&pass=s3cr%26t"));
    }

    #[test]
    fn query_mode_preserves_existing_query() {
        let auth = AuthBuilder::new(&config(AuthMode::Query));
        let url = auth.url("/getReg.cgi?x=1", &[("y", "2")]).unwrap();
        assert_eq!(url.query(), Some("x=1&y=2&user=admin&pass=s3cr%26t"));
    }

    #[test]
    fn query_mode_requires_both_credentials() {
        let mut cfg = config(AuthMode::Query);
        cfg.password = None;
        let auth = AuthBuilder::new(&cfg);
        assert_eq!(auth.url("/super.cgi", &[]).unwrap().query(), None);
        assert!(auth.form(Vec::new()).is_empty());
    }

    #[test]
    fn query_mode_adds_form_fields() {
        let mut cfg = config(AuthMode::Query);
        cfg.user_field = "login".into();
        let auth = AuthBuilder::new(&cfg);
        let form = auth.form(vec![("mode".into(), "CHAUD".into())]);
        assert_eq!(
            form,
            vec![
                ("mode".to_string(), "CHAUD".to_string()),
                ("login".to_string(), "admin".to_string()),
                ("pass".to_string(), "s3cr&t".to_string()),
            ]
        );
    }

    #[test]
    fn basic_mode_keeps_credentials_out_of_url() {
        let auth = AuthBuilder::new(&config(AuthMode::Basic));
        assert_eq!(auth.url("/super.cgi", &[]).unwrap().query(), None);
        assert_eq!(auth.basic(), Some(("admin", Some("s3cr&t"))));
    }

    #[test]
    fn cookie_mode_login_fields() {
        let mut cfg = config(AuthMode::Cookie);
        cfg.password = None;
        let auth = AuthBuilder::new(&cfg);
        assert!(auth.basic().is_none());
        assert_eq!(auth.url("/super.cgi", &[]).unwrap().query(), None);
        assert_eq!(
            auth.login_fields(),
            [
                ("user".to_string(), "admin".to_string()),
                ("pass".to_string(), String::new()),
            ]
        );
        assert_eq!(auth.login_url().unwrap().path(), "/login.cgi");
    }
}
