//! Bearer credentials for the remote store.
//!
//! Tokens are produced by an external OAuth flow and stored as the JSON
//! object the token endpoint returned. Only `access_token` is used here;
//! refreshing is left to whoever wrote the file.

use camino::Utf8Path;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("cannot read token file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("token file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("token file {0} has an empty access_token")]
    Empty(String),
}

#[derive(Clone, Deserialize)]
pub struct AccessToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
        }
    }

    pub fn load(path: &Utf8Path) -> Result<Self, AuthError> {
        let data = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
            path: path.to_string(),
            source,
        })?;
        let token: AccessToken =
            serde_json::from_str(&data).map_err(|source| AuthError::Parse {
                path: path.to_string(),
                source,
            })?;
        if token.access_token.trim().is_empty() {
            return Err(AuthError::Empty(path.to_string()));
        }
        Ok(token)
    }

    pub fn secret(&self) -> &str {
        &self.access_token
    }
}
