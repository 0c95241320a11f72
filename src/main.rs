use anyhow::{Context, Result};
use cdn_image_url::image::probe_webp_support;
use cdn_image_url::{CdnUrlBuilder, Config, Edits, EncodeOptions, ImageRequest};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cdn-image-url")]
#[command(about = "Build image-processing CDN URLs")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a file reference into a CDN URL.
    Encode {
        /// File reference: a bare object key or an absolute URL.
        reference: String,

        /// Edits as a JSON object, e.g. '{"resize":{"width":800}}'.
        #[arg(long, value_parser = parse_edits, default_value = "{}")]
        edits: Edits,

        /// Bucket for this reference only.
        #[arg(long)]
        bucket: Option<String>,

        /// CDN base URL (defaults to CDN_BASE_URL).
        #[arg(long)]
        base: Option<String>,

        /// Configured bucket name (defaults to CDN_BUCKET).
        #[arg(long)]
        bucket_name: Option<String>,

        /// Skip the unsafe-character warning.
        #[arg(long)]
        no_warnings: bool,
    },
    /// Print the image request carried by a CDN URL or path segment.
    Decode { input: String },
    /// Report whether WebP decodes on this host.
    Probe {
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
}

fn parse_edits(input: &str) -> std::result::Result<Edits, String> {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(serde_json::Value::Object(edits)) => Ok(edits),
        Ok(_) => Err("Edits must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid edits JSON: {}", e)),
    }
}

/// Command-line values win over `lookup`; every other setting still comes
/// from `lookup`.
fn resolve_config<F>(base: Option<String>, bucket_name: Option<String>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    Config::from_lookup(|name| match name {
        "CDN_BASE_URL" if base.is_some() => base.clone(),
        "CDN_BUCKET" if bucket_name.is_some() => bucket_name.clone(),
        _ => lookup(name),
    })
    .context("Failed to load CDN configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdn_image_url=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Encode {
            reference,
            edits,
            bucket,
            base,
            bucket_name,
            no_warnings,
        } => {
            Config::load_dotenv()?;
            let mut config = resolve_config(base, bucket_name, |name| std::env::var(name).ok())?;
            if no_warnings {
                config.warnings = false;
            }
            let builder = CdnUrlBuilder::from_config(&config);
            let options = EncodeOptions { bucket };

            let url = builder.encode_url_with(&reference, edits, &options);
            if url == reference {
                info!("Reference left unchanged");
            }
            println!("{}", url);
        }
        Command::Decode { input } => {
            let request = ImageRequest::from_encoded(&input)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Command::Probe { timeout_ms } => {
            let supported =
                match tokio::time::timeout(Duration::from_millis(timeout_ms), probe_webp_support())
                    .await
                {
                    Ok(supported) => supported,
                    Err(_) => {
                        warn!("WebP probe timed out after {}ms", timeout_ms);
                        false
                    }
                };
            println!("webp: {}", supported);
        }
    }

    Ok(())
}
