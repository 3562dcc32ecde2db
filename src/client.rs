//! The HTTP client shared by the token exchange and the sheet download.
use std::io;
use std::time::{Duration, Instant};

use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::{Connect, HttpConnector};
use hyper_util::client::legacy::{Client, Error as LegacyHyperError};
use hyper_util::rt::TokioExecutor;
use rustls::crypto::ring::default_provider as default_crypto_provider;
use thiserror::Error as ThisError;

use crate::Error;

pub(crate) type HyperResponse = http::Response<hyper::body::Incoming>;

/// Why a request produced no response.
#[derive(Debug, ThisError)]
pub enum SendError {
    /// No response head arrived within the configured timeout.
    #[error("No response before the timeout elapsed")]
    Timeout,
    /// Connecting, the TLS handshake or the HTTP exchange failed.
    #[error("Request failed: {0}")]
    Hyper(#[source] LegacyHyperError),
}

/// Produces the [`HttpClient`] an authenticator is built with. Implemented by
/// [`DefaultHyperClientBuilder`] and by `HttpClient` itself, so a client can be shared
/// between the authenticator and the exporter.
pub trait HyperClientBuilder {
    /// Connector of the resulting client.
    type Connector: Connect + Clone + Send + Sync + 'static;

    /// Give up on requests whose response head takes longer than `timeout`.
    fn with_timeout(self, timeout: Duration) -> Self;

    /// Build the client.
    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error>;
}

/// A hyper client with an optional per-request timeout.
#[derive(Clone)]
pub struct HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    inner: Client<C, String>,
    timeout: Option<Duration>,
}

impl<C> HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub(crate) fn from_connector(connector: C, timeout: Option<Duration>) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);
        HttpClient { inner, timeout }
    }

    /// The timeout applied to every request, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Send `request` and wait for the response head. The body is left for the caller
    /// to consume and is not covered by the timeout.
    pub(crate) async fn send(
        &self,
        request: http::Request<String>,
    ) -> Result<HyperResponse, SendError> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let started = Instant::now();

        let pending = self.inner.request(request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result.map_err(SendError::Hyper),
                Err(_) => Err(SendError::Timeout),
            },
            None => pending.await.map_err(SendError::Hyper),
        };

        match &result {
            Ok(response) => log::debug!(
                "{} {} -> {} in {:?}",
                method,
                uri,
                response.status(),
                started.elapsed()
            ),
            Err(e) => log::debug!(
                "{} {} failed after {:?}: {}",
                method,
                uri,
                started.elapsed(),
                e
            ),
        }
        result
    }
}

impl<C> HyperClientBuilder for HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    type Connector = C;

    fn with_timeout(self, timeout: Duration) -> Self {
        HttpClient {
            timeout: Some(timeout),
            ..self
        }
    }

    fn build_hyper_client(self) -> Result<HttpClient<C>, Error> {
        Ok(self)
    }
}

/// Builds a client speaking HTTPS (rustls, webpki roots) and plain HTTP.
#[derive(Debug, Default)]
pub struct DefaultHyperClientBuilder {
    timeout: Option<Duration>,
}

impl HyperClientBuilder for DefaultHyperClientBuilder {
    type Connector = HttpsConnector<HttpConnector>;

    fn with_timeout(self, timeout: Duration) -> Self {
        DefaultHyperClientBuilder {
            timeout: Some(timeout),
        }
    }

    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error> {
        Ok(HttpClient::from_connector(https_connector()?, self.timeout))
    }
}

fn https_connector() -> Result<HttpsConnector<HttpConnector>, Error> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(default_crypto_provider())
        .map_err(|e| Error::LowLevelError(io::Error::new(io::ErrorKind::Other, e)))?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(connector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_is_carried_to_client() {
        let client = DefaultHyperClientBuilder::default()
            .with_timeout(Duration::from_secs(3))
            .build_hyper_client()
            .unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(3)));

        let client = client.with_timeout(Duration::from_secs(5));
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_no_timeout_by_default() {
        let client = DefaultHyperClientBuilder::default()
            .build_hyper_client()
            .unwrap();
        assert_eq!(client.timeout(), None);
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = DefaultHyperClientBuilder::default()
            .build_hyper_client()
            .unwrap();
        let request = http::Request::get(format!("http://127.0.0.1:{}/", port))
            .body(String::new())
            .unwrap();
        assert!(matches!(
            client.send(request).await,
            Err(SendError::Hyper(_))
        ));
    }
}
