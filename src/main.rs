//! CLI entry point for the wado tool.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};
use wado_core::params::{CONTENT_TYPE, OBJECT_UID, SERIES_UID, STUDY_UID, TRANSFER_SYNTAX};
use wado_core::{
    ConnectionProfile, Credentials, ResourceParameters, Scheme, TransportOptions, WadoClient,
};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let config = app_config::load_config(args.config.as_deref())?.unwrap_or_default();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => config.verbosity.map_or("info", |v| v.log_level()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = run(args, config).await?;
    println!("{}", path.display());
    Ok(())
}

async fn run(args: Args, config: FileConfig) -> Result<PathBuf> {
    let profile = build_profile(&args, &config)?;
    let params = build_params(&args);
    let options = transport_options(&args, &config);
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    debug!(%profile, %params, ?options, "CLI arguments resolved");

    let client = WadoClient::with_options(profile.clone(), options)?;
    info!(%profile, "Requesting DICOM object");

    match client
        .download_as(&params, &output_dir, args.filename.as_deref())
        .await
    {
        Ok(path) => {
            info!(path = %path.display(), "Download complete");
            Ok(path)
        }
        Err(error) => {
            let hint = error.hint();
            let message = profile.redact(&format!("{:#}", anyhow::Error::new(error)));
            match hint {
                Some(hint) => bail!("{message}\nhint: {hint}"),
                None => bail!("{message}"),
            }
        }
    }
}

fn build_profile(args: &Args, config: &FileConfig) -> Result<ConnectionProfile> {
    let Some(host) = args.host.clone().or_else(|| config.hostname.clone()) else {
        bail!("No archive host given; pass --host or set `hostname` in the config file");
    };
    let Some(port) = args.port.or(config.port) else {
        bail!("No archive port given; pass --port or set `port` in the config file");
    };
    // Username and password always come from the same source.
    let credentials = if args.username.is_some() || args.password.is_some() {
        Credentials::from_parts(args.username.clone(), args.password.clone())
    } else {
        Credentials::from_parts(config.username.clone(), config.password.clone())
    }
    .context("Incomplete credentials")?;

    let mut builder = ConnectionProfile::builder(host, port)
        .maybe_credentials(credentials)
        .form_login(args.form_login || config.form_login.unwrap_or(false));
    if args.https || config.https.unwrap_or(false) {
        builder = builder.scheme(Scheme::Https);
    }
    if let Some(path) = args.path.clone().or_else(|| config.path.clone()) {
        builder = builder.path(path);
    }
    if let Some(uid) = config.transfer_syntax.clone() {
        builder = builder.transfer_syntax(uid);
    }
    builder.build().context("Invalid archive connection settings")
}

/// Object UIDs first, in study/series/object order, then `-P` pairs, then
/// the dedicated media type and transfer syntax flags.
fn build_params(args: &Args) -> ResourceParameters {
    let mut params = ResourceParameters::new();
    let uids = [
        (STUDY_UID, &args.study),
        (SERIES_UID, &args.series),
        (OBJECT_UID, &args.object),
    ];
    for (key, value) in uids {
        if let Some(value) = value {
            params.insert(key, value.clone());
        }
    }
    for (key, value) in &args.params {
        params.insert(key.clone(), value.clone());
    }
    if let Some(content_type) = &args.content_type {
        params.insert(CONTENT_TYPE, content_type.clone());
    }
    if let Some(uid) = &args.transfer_syntax {
        params.insert(TRANSFER_SYNTAX, uid.clone());
    }
    params
}

fn transport_options(args: &Args, config: &FileConfig) -> TransportOptions {
    let mut options = match args.timeout {
        Some(secs) => TransportOptions::with_timeout(Duration::from_secs(secs)),
        None => {
            let mut options = TransportOptions::default();
            if let Some(secs) = config.connect_timeout_secs {
                options.connect_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = config.timeout_secs {
                options.request_timeout = Duration::from_secs(secs);
            }
            options
        }
    };
    if let Some(limit) = config.max_body_bytes {
        options = options.with_max_body_bytes(limit);
    }
    options
}
