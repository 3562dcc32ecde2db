//! Module containing the core functionality for OAuth2 Authentication.
use std::io;
use std::path::PathBuf;

use hyper_util::client::legacy::connect::Connect;

use crate::authenticator_delegate::InstalledFlowDelegate;
use crate::client::{DefaultHyperClientBuilder, HttpClient, HyperClientBuilder};
use crate::error::Error;
use crate::installed::InstalledFlow;
use crate::storage::{DiskStorage, MemoryStorage, TokenStorage};
use crate::types::{ApplicationSecret, TokenInfo};

/// Read-only access to the metadata of files in Google Drive.
pub const DRIVE_METADATA_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/drive.metadata.readonly";
/// Read-only access to the content of files in Google Drive.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Authenticator produces the credential used for the export. It tries the token storage
/// first and only asks the user when nothing usable is stored.
pub struct Authenticator<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    hyper_client: HttpClient<C>,
    storage: Box<dyn TokenStorage>,
    flow: InstalledFlow,
    scopes: Vec<String>,
}

impl<C> Authenticator<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    /// Return the stored credential, or run the interactive flow and store its result.
    ///
    /// A stored credential is returned without looking at its expiry. A stored value that
    /// cannot be decoded is treated like a missing one. Failing to store a fresh credential
    /// is logged and otherwise ignored.
    pub async fn acquire(&self) -> Result<TokenInfo, Error> {
        match self.storage.get() {
            Ok(Some(token)) => {
                if token.is_expired() {
                    log::debug!(
                        "Cached token expired at {:?}; using it anyway",
                        token.expires_at
                    );
                }
                return Ok(token);
            }
            Ok(None) => log::debug!("No cached token, starting installed flow"),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("Ignoring unreadable cached token ({})", e);
            }
            Err(e) => return Err(Error::LowLevelError(e)),
        }

        let token = self.flow.token(&self.hyper_client, &self.scopes).await?;
        if let Err(e) = self.storage.set(&token) {
            log::warn!("Failed to store token ({})", e);
        }
        Ok(token)
    }

    /// The client used for the token exchange. It can be reused for the API calls
    /// the token authorizes.
    pub fn hyper_client(&self) -> &HttpClient<C> {
        &self.hyper_client
    }

    /// The scopes requested when the interactive flow runs.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Create an authenticator that uses the installed flow.
/// ```
/// # async fn foo() {
/// # let app_secret = sheet_export::ApplicationSecret::default();
/// let authenticator = sheet_export::InstalledFlowAuthenticator::builder(app_secret)
///     .persist_tokens_to_disk("/tmp/.sheet-export-drive-auth")
///     .build()
///     .expect("failed to create authenticator");
/// # }
/// ```
pub struct InstalledFlowAuthenticator;
impl InstalledFlowAuthenticator {
    /// Use the builder pattern to create an Authenticator that uses the installed flow.
    pub fn builder(
        app_secret: ApplicationSecret,
    ) -> AuthenticatorBuilder<DefaultHyperClientBuilder> {
        Self::with_client(app_secret, DefaultHyperClientBuilder::default())
    }

    /// Construct a new Authenticator that uses the installed flow and the provided http client.
    pub fn with_client<C>(app_secret: ApplicationSecret, client: C) -> AuthenticatorBuilder<C>
    where
        C: HyperClientBuilder,
    {
        AuthenticatorBuilder {
            hyper_client_builder: client,
            storage_type: StorageType::Memory,
            flow: InstalledFlow::new(app_secret),
            scopes: vec![
                DRIVE_METADATA_READONLY_SCOPE.to_owned(),
                DRIVE_READONLY_SCOPE.to_owned(),
            ],
        }
    }
}

enum StorageType {
    Memory,
    Disk(PathBuf),
    Custom(Box<dyn TokenStorage>),
}

/// Configure an Authenticator using the builder pattern.
pub struct AuthenticatorBuilder<C> {
    hyper_client_builder: C,
    storage_type: StorageType,
    flow: InstalledFlow,
    scopes: Vec<String>,
}

impl<C> AuthenticatorBuilder<C>
where
    C: HyperClientBuilder,
{
    /// Persist tokens to disk in the provided filename.
    pub fn persist_tokens_to_disk<P: Into<PathBuf>>(self, path: P) -> AuthenticatorBuilder<C> {
        AuthenticatorBuilder {
            storage_type: StorageType::Disk(path.into()),
            ..self
        }
    }

    /// Use the provided token storage mechanism.
    pub fn with_storage(self, storage: Box<dyn TokenStorage>) -> AuthenticatorBuilder<C> {
        AuthenticatorBuilder {
            storage_type: StorageType::Custom(storage),
            ..self
        }
    }

    /// Use the provided InstalledFlowDelegate.
    pub fn flow_delegate(self, flow_delegate: Box<dyn InstalledFlowDelegate>) -> Self {
        AuthenticatorBuilder {
            flow: InstalledFlow {
                flow_delegate,
                ..self.flow
            },
            ..self
        }
    }

    /// Request the given scopes instead of the read-only Drive scopes.
    pub fn scopes<T: AsRef<str>>(self, scopes: &[T]) -> Self {
        AuthenticatorBuilder {
            scopes: scopes.iter().map(|s| s.as_ref().to_owned()).collect(),
            ..self
        }
    }

    /// Create the authenticator.
    pub fn build(self) -> Result<Authenticator<C::Connector>, Error> {
        let hyper_client = self.hyper_client_builder.build_hyper_client()?;
        let storage: Box<dyn TokenStorage> = match self.storage_type {
            StorageType::Memory => Box::new(MemoryStorage::new()),
            StorageType::Disk(path) => Box::new(DiskStorage::new(path)),
            StorageType::Custom(storage) => storage,
        };

        Ok(Authenticator {
            hyper_client,
            storage,
            flow: self.flow,
            scopes: self.scopes,
        })
    }
}
