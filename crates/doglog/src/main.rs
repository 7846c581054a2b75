// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod cli;
mod config;
mod spinner;

use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use doglog_core::http::DatadogLogsClient;
use doglog_core::poll::TokioClock;
use doglog_core::query::build_query;
use doglog_core::{
    FieldMap, NoProgress, Normalizer, Progress, RetrievalLoop, SearchRequest, TemplateRenderer,
    TemplateSet,
};

use crate::cli::{is_relative, Args};
use crate::config::Config;
use crate::spinner::Spinner;

#[tokio::main]
pub async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.debug {
        "debug".to_string()
    } else {
        env::var("DOGLOG_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or("info".to_string())
    };
    let env_filter = match log_filter(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse log level '{log_level}' in DOGLOG_LOG_LEVEL: {e}");
            return ExitCode::FAILURE;
        }
    };

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(args.debug)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    debug!("Logging subsystem enabled");

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Quiets the HTTP stack and applies `log_level` to everything else.
fn log_filter(log_level: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(format!("h2=off,hyper=off,rustls=off,{log_level}"))
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = Config::load(args.config.as_deref())?;

    let field_map = FieldMap::with_overrides(config.fields.iter().map(|(k, v)| (k, v)))?;
    let templates = TemplateSet::new(
        TemplateRenderer::new(config.formats.iter().map(|(k, v)| (k, v)))?,
        TemplateRenderer::new(config.long_formats.iter().map(|(k, v)| (k, v)))?,
    );
    let use_color = !args.no_colors && io::stdout().is_terminal();
    let normalizer = Normalizer::new(field_map, use_color, args.long);

    let client = DatadogLogsClient::new(&config.client_config())?;
    debug!("Searching logs at {}", client.url());

    let query = build_query(args.service.as_deref(), &args.query, config.query_join);
    debug!("Computed query '{query}'");

    let request = SearchRequest {
        query,
        from: args.start.clone(),
        to: args.end.clone(),
        indexes: args.indices.clone(),
        limit: args.page_limit(),
        cursor: None,
    };

    let mut retrieval = RetrievalLoop::new(
        client,
        TokioClock,
        io::stdout(),
        request,
        normalizer,
        templates,
    )
    .with_profile(args.profile())
    .with_json_output(args.json);

    if !args.tail {
        return retrieval
            .run_once()
            .await
            .context("failed to write log output");
    }

    if !is_relative(&args.start) {
        warn!(
            "Tailing with a fixed start '{}' will repeat the same window; use a relative start such as 'now-15m'",
            args.start
        );
    }

    let progress: Arc<dyn Progress> = if io::stderr().is_terminal() {
        Spinner::start()
    } else {
        Arc::new(NoProgress)
    };
    let mut retrieval = retrieval.with_progress(progress.clone());

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    tokio::select! {
        result = retrieval.tail(cancel.clone()) => result.context("failed to write log output")?,
        () = cancel.cancelled() => progress.stop(),
    }
    Ok(true)
}

async fn cancel_on_signal(cancel: CancellationToken) {
    wait_for_signal().await;
    debug!("Received termination signal, stopping");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
        signal(SignalKind::quit()),
    );
    let (mut terminate, mut hangup, mut quit) = match streams {
        (Ok(terminate), Ok(hangup), Ok(quit)) => (terminate, hangup, quit),
        _ => {
            error!("Failed to listen for termination signals");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
        _ = hangup.recv() => {}
        _ = quit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
