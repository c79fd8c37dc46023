//! One-shot slice commands: apply, check, delete, render.

use crate::cli::output::{format_delete_table, format_json, format_status_table};
use crate::cli::{ConfigArgs, PassArgs, RenderArgs};
use crate::config::NetsliceConfig;
use crate::device::gateway::GatewayConnector;
use crate::device::{credentials, SessionFactory};
use crate::engine::Reconciler;
use crate::intent::{expand, ServiceIntent};
use crate::payload::{render, PayloadError};
use serde::Serialize;
use std::sync::Arc;

/// Printed output plus whether the command should exit successfully.
#[derive(Debug)]
pub struct CommandReport {
    pub output: String,
    pub success: bool,
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ConfigArgs,
) -> Result<NetsliceConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        NetsliceConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        NetsliceConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Wire the gateway transport and credential source from configuration.
pub fn build_reconciler(config: &NetsliceConfig) -> Result<Reconciler, Box<dyn std::error::Error>> {
    let connector = GatewayConnector::new(&config.device)?;
    let sessions = SessionFactory::new(credentials::from_config(config), Arc::new(connector))
        .with_encoding(config.device.encoding);

    Ok(Reconciler::new(sessions, config.reconcile.clone()))
}

fn prepare(args: &PassArgs) -> Result<(Reconciler, ServiceIntent), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.common)?;
    crate::logging::init_tracing(&config.logging)?;

    let intent = ServiceIntent::load(&args.file)?;
    tracing::debug!(file = %args.file.display(), service = %intent.service_name(), "Loaded intent");

    Ok((build_reconciler(&config)?, intent))
}

/// Handle `netslice apply`
pub async fn run_apply(args: &PassArgs) -> Result<CommandReport, Box<dyn std::error::Error>> {
    let (reconciler, intent) = prepare(args)?;
    let status = reconciler.on_create_or_update(&intent).await;

    let output = if args.json {
        format_json(&status.to_patch())?
    } else {
        format_status_table(&status)
    };

    Ok(CommandReport {
        output,
        success: status.is_ready(),
    })
}

/// Handle `netslice check`
pub async fn run_check(args: &PassArgs) -> Result<CommandReport, Box<dyn std::error::Error>> {
    let (reconciler, intent) = prepare(args)?;
    let status = reconciler.check(&intent).await;

    let output = if args.json {
        format_json(&status.to_patch())?
    } else {
        format_status_table(&status)
    };

    Ok(CommandReport {
        output,
        success: status.is_ready(),
    })
}

/// Handle `netslice delete`
pub async fn run_delete(args: &PassArgs) -> Result<CommandReport, Box<dyn std::error::Error>> {
    let (reconciler, intent) = prepare(args)?;
    let outcome = reconciler.on_delete(&intent).await;

    let output = if args.json {
        format_json(&outcome)?
    } else {
        format_delete_table(&outcome)
    };

    Ok(CommandReport {
        output,
        success: outcome.success,
    })
}

#[derive(Serialize)]
struct RenderedDocument {
    router: String,
    path: String,
    value: serde_json::Value,
}

/// Handle `netslice render`. Never contacts a device.
pub fn run_render(args: &RenderArgs) -> Result<String, Box<dyn std::error::Error>> {
    let intent = ServiceIntent::load(&args.file)?;
    let service_type = intent.validate()?;

    let documents = expand(&intent, service_type)
        .iter()
        .map(|item| -> Result<RenderedDocument, PayloadError> {
            let document = render(item)?;
            Ok(RenderedDocument {
                router: item.router_name.to_string(),
                value: document.to_value()?,
                path: document.path,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format_json(&documents)?)
}
