//! Command line and environment configuration, resolved once at startup.
use std::path::{Path, PathBuf};
use std::time::Duration;

use getopts::{Matches, Options};
use thiserror::Error as ThisError;

use crate::export::{ExportFormat, SheetExport, DEFAULT_EXPORT_ENDPOINT};

/// Where the client secret is looked for unless `--client-secret` says otherwise.
pub const DEFAULT_CLIENT_SECRET_FILE: &str = ".client_secret.json";

/// Environment variables consulted for the home directory, in order.
pub const HOME_VARIABLES: [&str; 3] = ["HOME", "HOMEPATH", "USERPROFILE"];

/// Errors that end the program before any credential or network work starts.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// Arguments are missing or malformed; the payload is the usage text to print.
    #[error("{0}")]
    Usage(String),
    /// `--help` was given; the payload is the usage text to print.
    #[error("{0}")]
    Help(String),
    /// None of `HOME`, `HOMEPATH` or `USERPROFILE` is set.
    #[error("Cannot locate the token cache: none of HOME, HOMEPATH or USERPROFILE is set")]
    MissingHomeDirectory,
    /// `--timeout` is not a number of seconds.
    #[error("Invalid timeout {0:?}: expected a number of seconds")]
    InvalidTimeout(String),
    /// `--format` names a format the export endpoint is not asked for.
    #[error("{0}")]
    InvalidFormat(String),
}

/// Everything the program needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The worksheet to download.
    pub export: SheetExport,
    /// The OAuth client registration file.
    pub client_secret_path: PathBuf,
    /// The cached credential.
    pub token_path: PathBuf,
    /// Scheme and host of the export endpoint.
    pub endpoint: String,
    /// Bound on waiting for a response; `None` waits as long as the transport does.
    pub timeout: Option<Duration>,
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt(
        "s",
        "client-secret",
        "OAuth client secret downloaded from the developer console",
        "FILE",
    )
    .optopt(
        "t",
        "token-cache",
        "where the credential is cached (default: ~/.credentials/.sheet-export-drive-auth)",
        "FILE",
    )
    .optopt("f", "format", "export format, tsv or csv (default: tsv)", "FORMAT")
    .optopt("", "timeout", "give up waiting for a response after SECONDS", "SECONDS")
    .optopt(
        "",
        "endpoint",
        "export from this host instead of https://docs.google.com",
        "URL",
    )
    .optflag("h", "help", "print this help");
    opts
}

fn usage(program: &str, opts: &Options) -> String {
    let brief = format!("Usage: {} [options] FILE_ID GID", program);
    opts.usage(&brief)
}

/// The default cache file below `home`.
pub fn default_token_path(home: &str) -> PathBuf {
    PathBuf::from(home)
        .join(".credentials")
        .join(format!(".{}-drive-auth", env!("CARGO_PKG_NAME")))
}

/// Find the home directory with `lookup`, trying `HOME`, `HOMEPATH` and `USERPROFILE` in
/// that order. Empty values count as unset.
pub fn resolve_home_dir<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    HOME_VARIABLES
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty())
        .ok_or(ConfigError::MissingHomeDirectory)
}

impl Config {
    /// Build the configuration from the process arguments (`args[0]` is the program name)
    /// and an environment lookup.
    ///
    /// Missing positional arguments are reported before the environment is consulted.
    pub fn from_args<F>(args: &[String], lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let program = args
            .first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .and_then(|name| name.to_str())
            .unwrap_or(env!("CARGO_PKG_NAME"));
        let opts = options();
        let matches = opts
            .parse(args.iter().skip(1))
            .map_err(|e| ConfigError::Usage(format!("{}\n{}", e, usage(program, &opts))))?;

        if matches.opt_present("h") {
            return Err(ConfigError::Help(usage(program, &opts)));
        }
        if matches.free.len() < 2 {
            return Err(ConfigError::Usage(usage(program, &opts)));
        }
        Self::from_matches(&matches, lookup)
    }

    fn from_matches<F>(matches: &Matches, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match matches.opt_str("f") {
            Some(f) => f.parse::<ExportFormat>().map_err(ConfigError::InvalidFormat)?,
            None => ExportFormat::default(),
        };
        let timeout = match matches.opt_str("timeout") {
            Some(t) => Some(parse_timeout(&t)?),
            None => None,
        };
        let token_path = match matches.opt_str("t") {
            Some(path) => PathBuf::from(path),
            None => default_token_path(&resolve_home_dir(lookup)?),
        };
        let client_secret_path = matches
            .opt_str("s")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_SECRET_FILE));

        Ok(Config {
            export: SheetExport::new(matches.free[0].clone(), matches.free[1].clone())
                .format(format),
            client_secret_path,
            token_path,
            endpoint: matches
                .opt_str("endpoint")
                .unwrap_or_else(|| DEFAULT_EXPORT_ENDPOINT.to_owned()),
            timeout,
        })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(ConfigError::InvalidTimeout(value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_home_dir_order() {
        let lookup = env(&[("HOMEPATH", "/hp"), ("USERPROFILE", "/up")]);
        assert_eq!(resolve_home_dir(lookup).unwrap(), "/hp");

        let lookup = env(&[("HOME", "/h"), ("HOMEPATH", "/hp")]);
        assert_eq!(resolve_home_dir(lookup).unwrap(), "/h");

        let lookup = env(&[("HOME", ""), ("USERPROFILE", "/up")]);
        assert_eq!(resolve_home_dir(lookup).unwrap(), "/up");
    }

    #[test]
    fn test_home_dir_missing() {
        assert!(matches!(
            resolve_home_dir(env(&[])),
            Err(ConfigError::MissingHomeDirectory)
        ));
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_args(&args(&["sheet-export", "abc", "12"]), env(&[("HOME", "/home/u")]))
                .unwrap();
        assert_eq!(config.export, SheetExport::new("abc", "12"));
        assert_eq!(
            config.token_path,
            PathBuf::from("/home/u/.credentials/.sheet-export-drive-auth")
        );
        assert_eq!(
            config.client_secret_path,
            PathBuf::from(DEFAULT_CLIENT_SECRET_FILE)
        );
        assert_eq!(config.endpoint, DEFAULT_EXPORT_ENDPOINT);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_options() {
        let config = Config::from_args(
            &args(&[
                "sheet-export",
                "-s",
                "secret.json",
                "--token-cache",
                "/tmp/token",
                "--format",
                "csv",
                "--timeout",
                "2.5",
                "--endpoint",
                "http://127.0.0.1:9000",
                "abc",
                "12",
            ]),
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.client_secret_path, PathBuf::from("secret.json"));
        assert_eq!(config.token_path, PathBuf::from("/tmp/token"));
        assert_eq!(config.export.format, ExportFormat::Csv);
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.endpoint, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_missing_arguments() {
        for list in [&["sheet-export"][..], &["sheet-export", "abc"][..]] {
            match Config::from_args(&args(list), env(&[("HOME", "/h")])) {
                Err(ConfigError::Usage(text)) => {
                    assert!(text.starts_with("Usage: sheet-export [options] FILE_ID GID"))
                }
                other => panic!("expected usage error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_arguments_win_over_missing_home() {
        assert!(matches!(
            Config::from_args(&args(&["sheet-export"]), env(&[])),
            Err(ConfigError::Usage(_))
        ));
    }

    #[test]
    fn test_help() {
        assert!(matches!(
            Config::from_args(&args(&["sheet-export", "--help"]), env(&[])),
            Err(ConfigError::Help(_))
        ));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            Config::from_args(
                &args(&["sheet-export", "--timeout", "soon", "a", "b"]),
                env(&[("HOME", "/h")])
            ),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(matches!(
            Config::from_args(
                &args(&["sheet-export", "-f", "pdf", "a", "b"]),
                env(&[("HOME", "/h")])
            ),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            Config::from_args(&args(&["sheet-export", "--bogus", "a", "b"]), env(&[])),
            Err(ConfigError::Usage(_))
        ));
    }
}
