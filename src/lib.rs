//! Export a worksheet of a Google spreadsheet as delimited text.
//!
//! The credential is obtained with the OAuth2 flow for installed applications: the user
//! opens a URL in a browser, grants read-only Drive access and pastes the code shown
//! there back into the terminal. The resulting token is cached on disk and reused on
//! later runs without asking again.
//!
//! # Usage
//! Obtain a client secret for an "installed" application from the
//! [developer console](https://console.developers.google.com/apis/credentials), then:
//!
//! ```test_harness,no_run
//! use sheet_export::{InstalledFlowAuthenticator, SheetExport, SheetExporter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret = sheet_export::read_application_secret(".client_secret.json")
//!         .await
//!         .expect(".client_secret.json");
//!
//!     // The token is read from tokencache.json if present; otherwise the user is
//!     // asked to authorize and the result is written there.
//!     let auth = InstalledFlowAuthenticator::builder(secret)
//!         .persist_tokens_to_disk("tokencache.json")
//!         .build()
//!         .unwrap();
//!     let token = auth.acquire().await.expect("no credential");
//!
//!     let exporter = SheetExporter::new(auth.hyper_client().clone());
//!     let export = SheetExport::new("1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms", "0");
//!     let mut stdout = tokio::io::stdout();
//!     exporter
//!         .export(&token, &export, &mut stdout)
//!         .await
//!         .expect("export failed");
//! }
//! ```
//!
#![deny(missing_docs)]

pub mod authenticator;
pub mod authenticator_delegate;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
mod helper;
mod installed;
/// Where the credential is kept between runs: a JSON file, process memory, or any other
/// `TokenStorage` implementation.
pub mod storage;

mod types;

#[doc(inline)]
pub use crate::authenticator::{Authenticator, InstalledFlowAuthenticator};

pub use crate::helper::*;

#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::export::{ExportError, ExportFormat, SheetExport, SheetExporter};
pub use crate::types::{ApplicationSecret, ConsoleApplicationSecret, TokenInfo};
