// Copyright (c) 2016 Google Inc (lewinb@google.com).
//
// Refer to the project root for licensing information.
//
use crate::authenticator_delegate::{DefaultInstalledFlowDelegate, InstalledFlowDelegate};
use crate::client::HttpClient;
use crate::error::Error;
use crate::types::{ApplicationSecret, TokenInfo};

use http::header;
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::Connect;
use url::{form_urlencoded, Url};

const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// The consent page URL for `client_id`. Parameters are appended to whatever query
/// `auth_uri` already has.
fn consent_url<T>(
    auth_uri: &str,
    client_id: &str,
    scopes: &[T],
    redirect_uri: &str,
) -> Result<Url, Error>
where
    T: AsRef<str>,
{
    let mut url = Url::parse(auth_uri)
        .map_err(|e| Error::UserError(format!("invalid auth_uri {:?}: {}", auth_uri, e)))?;
    url.query_pairs_mut()
        .append_pair("scope", &crate::helper::join(scopes, " "))
        .append_pair("access_type", "offline")
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id);
    Ok(url)
}

/// The installed-application flow: the user approves access in a browser and pastes the
/// resulting code, which is exchanged for a token.
/// (<https://developers.google.com/identity/protocols/OAuth2InstalledApp>)
pub struct InstalledFlow {
    pub(crate) app_secret: ApplicationSecret,
    pub(crate) flow_delegate: Box<dyn InstalledFlowDelegate>,
}

impl InstalledFlow {
    pub(crate) fn new(app_secret: ApplicationSecret) -> InstalledFlow {
        InstalledFlow {
            app_secret,
            flow_delegate: Box::new(DefaultInstalledFlowDelegate),
        }
    }

    /// The delegate's redirect uri, else the first one registered in the secret, else
    /// the out-of-band uri.
    fn redirect_uri(&self) -> &str {
        self.flow_delegate
            .redirect_uri()
            .or_else(|| self.app_secret.redirect_uris.first().map(String::as_str))
            .unwrap_or(OOB_REDIRECT_URI)
    }

    /// Ask the user for a code and trade it for a token.
    pub(crate) async fn token<C, T>(
        &self,
        hyper_client: &HttpClient<C>,
        scopes: &[T],
    ) -> Result<TokenInfo, Error>
    where
        T: AsRef<str>,
        C: Connect + Clone + Send + Sync + 'static,
    {
        let url = consent_url(
            &self.app_secret.auth_uri,
            &self.app_secret.client_id,
            scopes,
            self.redirect_uri(),
        )?;
        log::debug!("Asking user to visit {}", url);
        let code = self
            .flow_delegate
            .present_user_url(url.as_str())
            .await
            .map_err(Error::UserError)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::UserError(
                "No authorization code was entered".to_owned(),
            ));
        }

        let request = self.code_exchange_request(code)?;
        let (head, body) = hyper_client.send(request).await?.into_parts();
        let body = body.collect().await?.to_bytes();
        log::debug!("Token endpoint answered {}", head.status);
        if !head.status.is_success() {
            return Err(match TokenInfo::from_json(&body) {
                Err(err @ Error::AuthError(_)) => err,
                _ => Error::BadServerResponse(format!(
                    "Token endpoint answered {}",
                    head.status
                )),
            });
        }
        TokenInfo::from_json(&body)
    }

    /// The form POST to the token endpoint carrying `code`.
    fn code_exchange_request(&self, code: &str) -> Result<http::Request<String>, Error> {
        let secret = &self.app_secret;
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("code", code)
            .append_pair("client_id", &secret.client_id)
            .append_pair("client_secret", &secret.client_secret)
            .append_pair("redirect_uri", self.redirect_uri())
            .append_pair("grant_type", "authorization_code")
            .finish();

        http::Request::post(secret.token_uri.as_str())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .map_err(|e| {
                Error::UserError(format!("invalid token_uri {:?}: {}", secret.token_uri, e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_url() {
        let url = consent_url(
            "https://accounts.google.com/o/oauth2/auth",
            "812741506391-h38jh0j4fv0ce1krdkiq0hfvt6n5amrf.apps.googleusercontent.com",
            &["email", "profile"],
            OOB_REDIRECT_URI,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://accounts.google.com/o/oauth2/auth?scope=email+profile&access_type=offline\
             &redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob&response_type=code\
             &client_id=812741506391-h38jh0j4fv0ce1krdkiq0hfvt6n5amrf.apps.googleusercontent.com"
        );
    }

    #[test]
    fn test_consent_url_keeps_existing_query() {
        let url = consent_url(
            "https://accounts.google.com/o/oauth2/auth?hd=example.com",
            "id",
            &["https://www.googleapis.com/auth/drive.readonly"],
            "http://localhost",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://accounts.google.com/o/oauth2/auth?hd=example.com&scope=https%3A%2F%2Fwww.\
             googleapis.com%2Fauth%2Fdrive.readonly&access_type=offline\
             &redirect_uri=http%3A%2F%2Flocalhost&response_type=code&client_id=id"
        );
    }

    #[test]
    fn test_consent_url_rejects_garbage() {
        assert!(matches!(
            consent_url("not a url", "id", &["email"], OOB_REDIRECT_URI),
            Err(Error::UserError(_))
        ));
    }

    #[test]
    fn test_redirect_uri_selection() {
        let mut flow = InstalledFlow::new(ApplicationSecret::default());
        assert_eq!(flow.redirect_uri(), OOB_REDIRECT_URI);

        flow.app_secret.redirect_uris = vec!["http://localhost".to_owned(), "oob".to_owned()];
        assert_eq!(flow.redirect_uri(), "http://localhost");

        struct Custom;
        impl InstalledFlowDelegate for Custom {
            fn redirect_uri(&self) -> Option<&str> {
                Some("http://127.0.0.1:9000")
            }
        }
        flow.flow_delegate = Box::new(Custom);
        assert_eq!(flow.redirect_uri(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_code_exchange_request() {
        let secret = ApplicationSecret {
            client_id: "id".to_owned(),
            client_secret: "secret".to_owned(),
            token_uri: "https://oauth2.googleapis.com/token".to_owned(),
            ..Default::default()
        };
        let flow = InstalledFlow::new(secret);

        let request = flow.code_exchange_request("4/code").unwrap();
        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(request.uri(), "https://oauth2.googleapis.com/token");
        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            request.body(),
            "code=4%2Fcode&client_id=id&client_secret=secret\
             &redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob&grant_type=authorization_code"
        );
    }
}
