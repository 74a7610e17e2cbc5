//! awayd - marks you away on IRC when you stop talking.
//!
//! Usage: `awayd [config.toml] [endpoint...]`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use awayd::config::{Config, validate};
use awayd::control::Control;
use awayd::idle::IdleController;
use awayd::telemetry::{self, spans};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "awayd.toml";

/// Split arguments into a config path (if the first one names a `.toml`
/// file) and extra endpoints.
fn parse_args(mut args: Vec<String>) -> (Option<String>, Vec<String>) {
    if args.first().is_some_and(|first| first.ends_with(".toml")) {
        let path = args.remove(0);
        (Some(path), args)
    } else {
        (None, args)
    }
}

fn load_config(path: Option<String>) -> anyhow::Result<Config> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (DEFAULT_CONFIG_PATH.to_string(), false),
    };

    if !explicit && !Path::new(&path).exists() {
        info!(path = %path, "No config file, using defaults");
        return Ok(Config::default());
    }

    let config = Config::load(&path).map_err(|e| {
        error!(path = %path, error = %e, "Failed to load config");
        e
    })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let (config_path, extra_endpoints) = parse_args(std::env::args().skip(1).collect());
    let mut config = load_config(config_path)?;
    config.endpoints.extend(extra_endpoints);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }
    let endpoints = config.endpoints()?;
    let params = config.idle.backoff_params();

    info!(
        endpoints = endpoints.len(),
        nick = %config.client.nick,
        idle_timeout = ?params.idle_timeout,
        max_exp = params.max_exp,
        "Starting awayd"
    );

    let control = Arc::new(Control::new(config.client.nick.clone()));
    let cancel = CancellationToken::new();

    let idle = IdleController::new(params, control.activity(), control.clone());
    let mut idle_task = tokio::spawn(idle.run(cancel.clone()).instrument(spans::idle()));

    let mut clients = JoinSet::new();
    for endpoint in endpoints {
        let control = control.clone();
        clients.spawn(async move {
            let stream = endpoint
                .connect()
                .await
                .with_context(|| format!("failed to connect to {endpoint}"))?;
            control.serve(endpoint.to_string(), stream).await?;
            anyhow::Ok(())
        });
    }

    let result = loop {
        tokio::select! {
            joined = clients.join_next() => match joined {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => warn!(error = %format!("{e:#}"), "Client ended"),
                Some(Err(e)) => error!(error = %e, "Client task failed"),
                None => {
                    info!("All clients disconnected");
                    break Ok(());
                }
            },
            finished = &mut idle_task => {
                break match finished {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!(error = %e, "Idle controller failed");
                        Err(e.into())
                    }
                    Err(e) => Err(anyhow::Error::new(e).context("idle controller task failed")),
                };
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break Ok(());
            }
        }
    };

    cancel.cancel();
    control.shutdown();
    while clients.join_next().await.is_some() {}

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])), (None, vec![]));
        assert_eq!(
            parse_args(args(&["my.toml", "/run/a.sock"])),
            (Some("my.toml".to_string()), args(&["/run/a.sock"]))
        );
        assert_eq!(
            parse_args(args(&["/run/a.sock", "tcp:localhost:6667"])),
            (None, args(&["/run/a.sock", "tcp:localhost:6667"]))
        );
    }
}
