//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Retrieve a DICOM object from a PACS/VNA over WADO-URI.
///
/// Sends one `requestType=WADO` HTTP GET for the object addressed by the
/// given UIDs and parameters, and saves the returned DICOM file. Prints the
/// path of the saved file on success.
#[derive(Parser, Debug)]
#[command(name = "wado")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Archive hostname (an http:// or https:// prefix selects the scheme)
    #[arg(long)]
    pub host: Option<String>,

    /// Archive HTTP port (1-65535)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// User name for HTTP Basic authentication
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long)]
    pub password: Option<String>,

    /// Use HTTPS instead of HTTP
    #[arg(long)]
    pub https: bool,

    /// Path of the WADO endpoint on the archive [default: wado]
    #[arg(long)]
    pub path: Option<String>,

    /// Study Instance UID (studyUID)
    #[arg(long)]
    pub study: Option<String>,

    /// Series Instance UID (seriesUID); strict archives require it
    #[arg(long)]
    pub series: Option<String>,

    /// SOP Instance UID (objectUID)
    #[arg(long)]
    pub object: Option<String>,

    /// Extra WADO query parameter, repeatable
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Folder to save the object in [default: current directory]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// File name to save the object under [default: server name or <objectUID>.dcm]
    #[arg(long)]
    pub filename: Option<String>,

    /// Transfer syntax UID to request
    #[arg(long)]
    pub transfer_syntax: Option<String>,

    /// Media type to request (contentType) [default: application/dicom]
    #[arg(long)]
    pub content_type: Option<String>,

    /// Connect and total request timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Submit the credentials to the servlet form login when the archive serves a login page
    #[arg(long)]
    pub form_login: bool,

    /// Config file [default: $XDG_CONFIG_HOME/wado/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter key must not be empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
