//! Module containing types related to delegates.
use std::future::Future;
use std::pin::Pin;

use tokio::io::{self as tio, AsyncBufReadExt};

/// InstalledFlowDelegate methods are called when the installed flow needs to ask the
/// user for the authorization code.
pub trait InstalledFlowDelegate: Send + Sync {
    /// Configure a custom redirect uri if needed. When `None`, the first redirect uri of
    /// the application secret is used.
    fn redirect_uri(&self) -> Option<&str> {
        None
    }

    /// We need the user to navigate to a URL using their browser and paste back the code
    /// shown there.
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(present_user_url(url))
    }
}

async fn present_user_url(url: &str) -> Result<String, String> {
    // stdout is reserved for the export.
    eprintln!("Open this: {}", url);
    eprint!("Enter the code from that page here: ");
    let mut user_input = String::new();
    tio::BufReader::new(tio::stdin())
        .read_line(&mut user_input)
        .await
        .map_err(|e| format!("couldn't read code: {}", e))?;
    Ok(user_input.trim().to_owned())
}

/// Uses all default implementations in the InstalledFlowDelegate trait.
#[derive(Copy, Clone)]
pub struct DefaultInstalledFlowDelegate;
impl InstalledFlowDelegate for DefaultInstalledFlowDelegate {}
