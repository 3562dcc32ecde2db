//! Writes one worksheet of a Google spreadsheet to stdout.
//!
//! `sheet-export [options] FILE_ID GID`
//!
//! The first run asks for authorization on the terminal; the credential is then cached
//! in `~/.credentials/.sheet-export-drive-auth`.
use std::env;
use std::io;
use std::process::ExitCode;

use thiserror::Error;

use sheet_export::client::{DefaultHyperClientBuilder, HyperClientBuilder};
use sheet_export::config::{Config, ConfigError};
use sheet_export::{
    read_application_secret, ExportError, InstalledFlowAuthenticator, SheetExporter,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = match Config::from_args(&args, |var| env::var(var).ok()) {
        Ok(config) => config,
        Err(ConfigError::Help(text)) => {
            eprintln!("{}", text);
            return ExitCode::SUCCESS;
        }
        Err(ConfigError::Usage(text)) => {
            eprintln!("{}", text);
            return ExitCode::from(1);
        }
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::from(1);
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        // The exporter logs its own failures.
        Err(RunError::Export(_)) => ExitCode::from(1),
        Err(err) => {
            log::error!("{}", err);
            ExitCode::from(1)
        }
    }
}

/// The step at which a run gave up.
#[derive(Debug, Error)]
enum RunError {
    #[error("Failed to read client secret: {0}")]
    ClientSecret(#[source] io::Error),
    #[error("Failed to set up HTTP client: {0}")]
    HttpClient(#[source] sheet_export::Error),
    #[error("Failed to set up authenticator: {0}")]
    Authenticator(#[source] sheet_export::Error),
    #[error("Failed to obtain credential: {0}")]
    Credential(#[source] sheet_export::Error),
    #[error(transparent)]
    Export(ExportError),
}

async fn run(config: &Config) -> Result<(), RunError> {
    let secret = read_application_secret(&config.client_secret_path)
        .await
        .map_err(RunError::ClientSecret)?;

    let mut client = DefaultHyperClientBuilder::default();
    if let Some(timeout) = config.timeout {
        client = client.with_timeout(timeout);
    }
    let client = client.build_hyper_client().map_err(RunError::HttpClient)?;

    let auth = InstalledFlowAuthenticator::with_client(secret, client.clone())
        .persist_tokens_to_disk(&config.token_path)
        .build()
        .map_err(RunError::Authenticator)?;
    let token = auth.acquire().await.map_err(RunError::Credential)?;

    let mut stdout = tokio::io::stdout();
    let written = SheetExporter::new(client)
        .with_endpoint(config.endpoint.as_str())
        .export(&token, &config.export, &mut stdout)
        .await
        .map_err(RunError::Export)?;
    log::debug!("Exported {} bytes", written);
    Ok(())
}
