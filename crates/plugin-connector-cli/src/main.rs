//! Command-line tool for plugin connector modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plugin_connector::{
    CallbackConnector, ModuleConfig, ModuleHandle, ModuleSymbols, PluginConnector, TracingLogger,
};
use plugin_connector_sdk::{Scopes, Signature};

/// Check and exercise plugin connector modules.
#[derive(Parser, Debug)]
#[command(name = "plugin-connector")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a module and run its Init hook without serving anything.
    Check {
        /// Connector configuration file.
        #[arg(required = true)]
        config: PathBuf,
        /// Connector id used in log lines.
        #[arg(long, default_value = "plugin")]
        id: String,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the login URL the module builds for a callback and state.
    LoginUrl {
        /// Connector configuration file.
        #[arg(required = true)]
        config: PathBuf,
        /// Connector id used in log lines.
        #[arg(long, default_value = "plugin")]
        id: String,
        /// Host callback URL.
        #[arg(long)]
        callback: String,
        /// Opaque state value.
        #[arg(long)]
        state: String,
        /// Request the offline_access scope.
        #[arg(long)]
        offline_access: bool,
        /// Request the groups scope.
        #[arg(long)]
        groups: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let json_logging = std::env::var("PLUGIN_CONNECTOR_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("plugin_connector=info"));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    match args.command {
        Command::Check { config, id, json } => run_check(config, id, json).await,
        Command::LoginUrl {
            config,
            id,
            callback,
            state,
            offline_access,
            groups,
        } => {
            let scopes = Scopes {
                offline_access,
                groups,
            };
            run_login_url(config, id, scopes, callback, state).await
        }
    }
}

fn load_config(path: &Path) -> Result<ModuleConfig> {
    ModuleConfig::from_file(path)
        .with_context(|| format!("Failed to load connector configuration {}", path.display()))
}

async fn run_check(path: PathBuf, id: String, json: bool) -> Result<()> {
    let config = load_config(&path)?;
    tracing::info!(
        connector = %id,
        module = %config.path().display(),
        "Checking connector module"
    );

    // Module loading and Init block; keep them off the runtime threads.
    let result = tokio::task::spawn_blocking(move || {
        let module = ModuleHandle::open_verified(config.path(), config.sha256())?;
        let logger = Arc::new(TracingLogger::new(id));
        let connector =
            PluginConnector::from_module(&module, config.plugin_config().to_vec(), logger)?;
        Ok::<_, plugin_connector::OpenError>((module, connector))
    })
    .await?;

    let (module, connector) = match result {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(error = %e, "Connector check failed");
            if json {
                println!("{}", serde_json::json!({ "ok": false, "error": e.to_string() }));
            } else {
                println!("Connector Check: FAILED");
                println!();
                println!("Error: {}", e);
            }
            std::process::exit(1);
        }
    };

    let exported: Vec<&str> = Signature::ALL
        .iter()
        .filter(|signature| module.entry_point(signature.symbol).is_some())
        .map(|signature| signature.symbol)
        .collect();

    if json {
        let report = serde_json::json!({
            "ok": true,
            "path": module.path().display().to_string(),
            "loadedAt": module.loaded_at().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "entryPoints": exported,
            "refresh": connector.supports_refresh(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Connector Check: PASSED");
        println!();
        println!("Module:          {}", module.path().display());
        println!(
            "Loaded at:       {}",
            module.loaded_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("Entry points:    {}", exported.join(", "));
        println!(
            "Refresh:         {}",
            if connector.supports_refresh() {
                "supported"
            } else {
                "not implemented"
            }
        );
    }

    Ok(())
}

async fn run_login_url(
    path: PathBuf,
    id: String,
    scopes: Scopes,
    callback: String,
    state: String,
) -> Result<()> {
    let config = load_config(&path)?;
    tracing::debug!(connector = %id, callback = %callback, "Building login URL");

    let result = tokio::task::spawn_blocking(move || -> Result<String> {
        let connector = config.open(&id, Arc::new(TracingLogger::new(id.clone())))?;
        Ok(connector.login_url(&scopes, &callback, &state)?)
    })
    .await?;

    let url = result.inspect_err(|e| tracing::error!(error = %e, "login-url failed"))?;
    println!("{}", url);
    Ok(())
}
