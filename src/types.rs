use crate::error::{AuthErrorOr, Error};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The credential obtained from the token endpoint.
///
/// It is produced by the installed flow and cached on disk as JSON. The expiry is stored
/// as an absolute time.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct TokenInfo {
    /// Sent as the bearer credential.
    pub access_token: String,
    /// Long-lived token for obtaining new access tokens. Stored, never used here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always `Bearer` for tokens built from a server response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// The time when the token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// OpenID Connect identity token, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// The scopes the server actually granted, space separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenInfo {
    pub(crate) fn from_json(json_data: &[u8]) -> Result<TokenInfo, Error> {
        #[derive(Deserialize)]
        struct RawToken {
            access_token: String,
            refresh_token: Option<String>,
            token_type: String,
            expires_in: Option<i64>,
            id_token: Option<String>,
            scope: Option<String>,
        }

        let RawToken {
            access_token,
            refresh_token,
            token_type,
            expires_in,
            id_token,
            scope,
        } = serde_json::from_slice::<AuthErrorOr<RawToken>>(json_data)?.into_result()?;

        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err(Error::BadServerResponse(format!(
                r#"Server responded with token_type of "{}". Only "Bearer" is supported."#,
                token_type
            )));
        }

        let expires_at = match expires_in {
            Some(seconds) => Some(
                Duration::try_seconds(seconds)
                    .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        Error::BadServerResponse(format!(
                            "Server responded with an unusable expires_in of {}",
                            seconds
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(TokenInfo {
            access_token,
            refresh_token,
            token_type: Some(token_type),
            expires_at,
            id_token,
            scope,
        })
    }

    /// True once the expiry is less than a minute away. Tokens without an expiry never
    /// expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expiration_time| expiration_time - Duration::minutes(1) <= Utc::now())
            .unwrap_or(false)
    }
}

/// One OAuth client registration, as found under the `installed` or `web` key of a
/// client secret file. Unknown keys in the file are ignored.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct ApplicationSecret {
    /// Identifies the application to the authorization server.
    pub client_id: String,
    /// Sent along with the authorization code when it is exchanged.
    pub client_secret: String,
    /// Where authorization codes are exchanged for tokens.
    pub token_uri: String,
    /// The consent page the user is sent to.
    pub auth_uri: String,
    /// Redirect targets registered for the client; the first one is used.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// The developer console project owning the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// The layout of a client secret file downloaded from the
/// [developer console](https://console.developers.google.com/apis/credentials).
#[derive(Deserialize, Serialize, Default, Debug)]
pub struct ConsoleApplicationSecret {
    /// Registration of a web application.
    pub web: Option<ApplicationSecret>,
    /// Registration of an installed (desktop) application.
    pub installed: Option<ApplicationSecret>,
}
