use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Network failure, timeout or truncated body.
    Unreachable(reqwest::Error),
    HttpStatus { status: u16 },
    AuthenticationFailed(String),
    InvalidConfig(String),
    Io(std::io::Error),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Unreachable(e) if e.is_timeout())
    }

    /// 401 or 403 from the device, i.e. the session or credentials were refused.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Error::HttpStatus { status: 401 | 403 })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unreachable(e) => write!(f, "device unreachable: {e}"),
            Error::HttpStatus { status } => write!(f, "device returned HTTP {status}"),
            Error::AuthenticationFailed(msg) => write!(f, "authentication failed: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Unreachable(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::HttpStatus {
                status: status.as_u16(),
            },
            None => Error::Unreachable(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejection_covers_401_and_403_only() {
        assert!(Error::HttpStatus { status: 401 }.is_auth_rejection());
        assert!(Error::HttpStatus { status: 403 }.is_auth_rejection());
        assert!(!Error::HttpStatus { status: 500 }.is_auth_rejection());
        assert!(!Error::AuthenticationFailed("x".into()).is_auth_rejection());
    }

    #[test]
    fn display_includes_status() {
        let err = Error::HttpStatus { status: 503 };
        assert_eq!(err.to_string(), "device returned HTTP 503");
    }
}
