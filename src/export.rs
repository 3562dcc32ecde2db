//! Downloads a worksheet through the spreadsheet export endpoint and streams it into a sink.
use std::fmt;
use std::io;
use std::str::FromStr;

use http::{header, StatusCode};
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::Connect;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error as ThisError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::form_urlencoded;

use crate::client::{HttpClient, SendError};
use crate::types::TokenInfo;

/// The host serving the export endpoint.
pub const DEFAULT_EXPORT_ENDPOINT: &str = "https://docs.google.com";

// Characters that may not appear verbatim in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The file formats the export endpoint is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Tab separated values.
    #[default]
    Tsv,
    /// Comma separated values.
    Csv,
}

impl ExportFormat {
    /// The value of the `format` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Tsv => "tsv",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(ExportFormat::Tsv),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

/// Identifies the worksheet to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetExport {
    /// The spreadsheet's file id, as found in its URL.
    pub file_id: String,
    /// The worksheet id (`gid`) within the spreadsheet.
    pub gid: String,
    /// The requested output format.
    pub format: ExportFormat,
}

impl SheetExport {
    /// Export worksheet `gid` of spreadsheet `file_id` as TSV.
    pub fn new(file_id: impl Into<String>, gid: impl Into<String>) -> SheetExport {
        SheetExport {
            file_id: file_id.into(),
            gid: gid.into(),
            format: ExportFormat::default(),
        }
    }

    /// Use another output format.
    pub fn format(self, format: ExportFormat) -> SheetExport {
        SheetExport { format, ..self }
    }

    /// The download URL below `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("format", self.format.as_str())
            .append_pair("gid", &self.gid)
            .finish();
        format!(
            "{}/spreadsheets/d/{}/export?{}",
            endpoint.trim_end_matches('/'),
            utf8_percent_encode(&self.file_id, PATH_SEGMENT),
            query
        )
    }
}

/// Errors that can happen while exporting a worksheet.
#[derive(Debug, ThisError)]
pub enum ExportError {
    /// The request could not be built, e.g. because the token is not a valid header value.
    #[error("Invalid export request: {0}")]
    InvalidRequest(#[source] http::Error),
    /// The request never produced a response.
    #[error("Failed to download file: {0}")]
    Transport(#[source] SendError),
    /// The server answered with something other than 200 OK.
    #[error("Failed to get file, got status {0}")]
    Status(StatusCode),
    /// The connection broke while the body was streamed.
    #[error("Failed to read file body: {0}")]
    Body(#[source] hyper::Error),
    /// The sink refused the data.
    #[error("Failed to write file: {0}")]
    Sink(#[source] io::Error),
}

/// Issues export requests with a bearer token.
#[derive(Clone)]
pub struct SheetExporter<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    client: HttpClient<C>,
    endpoint: String,
}

impl<C> SheetExporter<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    /// An exporter talking to the public export endpoint.
    pub fn new(client: HttpClient<C>) -> Self {
        SheetExporter {
            client,
            endpoint: DEFAULT_EXPORT_ENDPOINT.to_owned(),
        }
    }

    /// Send requests to `endpoint` instead of the public host.
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        SheetExporter {
            endpoint: endpoint.into(),
            ..self
        }
    }

    /// Download `export` and write the body into `sink` as it arrives.
    ///
    /// Nothing is written unless the server answers 200. Returns the number of bytes
    /// written. Failures are logged before they are returned.
    pub async fn export<W>(
        &self,
        token: &TokenInfo,
        export: &SheetExport,
        sink: &mut W,
    ) -> Result<u64, ExportError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let result = self.download(token, export, sink).await;
        if let Err(err) = &result {
            log::error!("{}", err);
        }
        result
    }

    async fn download<W>(
        &self,
        token: &TokenInfo,
        export: &SheetExport,
        sink: &mut W,
    ) -> Result<u64, ExportError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = export.url(&self.endpoint);
        let request = http::Request::get(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.access_token),
            )
            .body(String::new())
            .map_err(ExportError::InvalidRequest)?;

        log::debug!("Requesting {}", url);
        let response = self
            .client
            .send(request)
            .await
            .map_err(ExportError::Transport)?;
        if response.status() != StatusCode::OK {
            return Err(ExportError::Status(response.status()));
        }

        let mut body = response.into_body();
        let mut written = 0u64;
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(ExportError::Body)?;
            if let Ok(data) = frame.into_data() {
                sink.write_all(&data).await.map_err(ExportError::Sink)?;
                written += data.len() as u64;
            }
        }
        sink.flush().await.map_err(ExportError::Sink)?;
        log::debug!("Wrote {} bytes", written);
        Ok(written)
    }
}
