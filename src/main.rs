use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prefs_gateway::{config::Config, Gateway, PrefStore, Value, ValueKind};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to config file
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Directory holding the namespace databases (overrides the config)
    #[clap(long)]
    data_dir: Option<PathBuf>,
    /// Keep all namespaces in memory, persisting nothing
    #[clap(long)]
    in_memory: bool,
    /// Authority identifier to register (overrides the config)
    #[clap(long)]
    authority: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read one value by request path, e.g. `integer/app/retry-count/`
    Get {
        /// Request path: `{type}/{namespace}/{key}/[{default}/]`
        path: String,
    },
    /// Write fields into the namespace a path resolves to
    Put {
        /// Request path naming the target namespace
        path: String,
        /// Fields as `key=value` or `key:kind=value`, with kind one of
        /// string, integer, long, float, boolean
        fields: Vec<String>,
    },
    /// Delete one key, e.g. `delete/app/retry-count/`
    Delete {
        /// Request path: `delete/{namespace}/{key}/`
        path: String,
    },
    /// List namespaces, or the keys of one namespace
    Ls {
        /// Namespace to list keys of; omit to list namespaces
        namespace: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = if let Some(path) = &cli.config {
        debug!("loading config from {path:?}");
        Config::load(path)?
    } else {
        debug!("using default config");
        Config::default()
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(authority) = cli.authority {
        config.authority = authority;
    }

    let store = if cli.in_memory {
        PrefStore::in_memory()?
    } else {
        PrefStore::persistent(config.data_dir()?)?
    };
    let gateway = Gateway::new(store, config.authority.clone())?;

    match cli.command {
        Command::Get { path } => match gateway.query(&path)? {
            Some(row) => println!("{}", row.value),
            None => bail!("no value for {path}"),
        },
        Command::Put { path, fields } => {
            let fields = fields
                .iter()
                .map(|f| parse_field(f))
                .collect::<Result<Vec<_>>>()?;
            match gateway.insert(&path, &fields)? {
                Some(ack) => println!("{ack}"),
                None => bail!("path {path} did not resolve"),
            }
        }
        Command::Delete { path } => {
            if gateway.delete(&path)? < 0 {
                bail!("path {path} did not resolve");
            }
        }
        Command::Ls { namespace } => match namespace {
            Some(ns) => {
                for key in gateway.store().keys(&ns)? {
                    println!("{key}");
                }
            }
            None => {
                for ns in gateway.store().namespaces()? {
                    println!("{ns}");
                }
            }
        },
    }
    Ok(())
}

/// Parse a `key=value` / `key:kind=value` argument into a typed field.
/// Without a kind the value is stored as a string.
fn parse_field(input: &str) -> Result<(String, Value)> {
    let Some((head, raw)) = input.split_once('=') else {
        bail!("field {input:?} is not of the form key=value");
    };
    let (key, kind) = match head.split_once(':') {
        Some((key, tag)) => {
            let kind = ValueKind::from_tag(tag)
                .with_context(|| format!("unknown value kind {tag:?}"))?;
            (key, kind)
        }
        None => (head, ValueKind::String),
    };
    let value = match kind {
        ValueKind::String => Value::String(raw.to_string()),
        ValueKind::Int => Value::Int(
            raw.parse()
                .with_context(|| format!("invalid integer {raw:?}"))?,
        ),
        ValueKind::Long => Value::Long(
            raw.parse()
                .with_context(|| format!("invalid long {raw:?}"))?,
        ),
        ValueKind::Float => Value::Float(
            raw.parse()
                .with_context(|| format!("invalid float {raw:?}"))?,
        ),
        ValueKind::Bool => Value::Bool(
            raw.parse()
                .with_context(|| format!("invalid boolean {raw:?}"))?,
        ),
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_kinds() {
        assert_eq!(
            parse_field("name=zlm").unwrap(),
            ("name".to_string(), Value::String("zlm".to_string()))
        );
        assert_eq!(
            parse_field("retries:integer=3").unwrap(),
            ("retries".to_string(), Value::Int(3))
        );
        assert_eq!(
            parse_field("enabled:boolean=true").unwrap(),
            ("enabled".to_string(), Value::Bool(true))
        );
        assert!(parse_field("no-equals").is_err());
        assert!(parse_field("k:double=1").is_err());
    }
}
