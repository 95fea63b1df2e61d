//! Demo server for the stackroute dispatch engine.
//!
//! Serves a small application showing global middleware, a mounted API
//! with path parameters, error routes and redirects. Stops on Ctrl+C.

use std::path::PathBuf;
use std::time::Instant;

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;

use stackroute::config::{load_config, ServerConfig};
use stackroute::lifecycle::{wait_for_signal, Shutdown};
use stackroute::observability::init_logging;
use stackroute::{json as json_response, text, App, HttpError, ListenOptions, MethodHandlers, Mode};

#[derive(Parser)]
#[command(name = "stackroute")]
#[command(about = "Demo server for the stackroute routing engine", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind the exact port instead of probing for a free one.
    #[arg(long)]
    production: bool,
}

/// Per-request state of the demo app.
#[derive(Default)]
struct DemoState {
    started: Option<Instant>,
    user: Option<String>,
}

fn api() -> App<DemoState> {
    let mut api: App<DemoState> = App::new();
    api.use_middleware(|ctx| {
        Box::pin(async move {
            ctx.state.user = ctx
                .request
                .headers()
                .get("x-user")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            ctx.next().await
        })
    })
    .route(
        "/users/:id",
        MethodHandlers::<DemoState>::new()
            .get(|ctx| {
                Box::pin(async move {
                    let id = ctx.param("id").unwrap_or_default();
                    Ok(json_response(&json!({ "id": id, "viewer": ctx.state.user })))
                })
            })
            .delete(|ctx| {
                Box::pin(async move {
                    if ctx.state.user.is_none() {
                        return Err(HttpError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into());
                    }
                    Ok(text("deleted"))
                })
            }),
    )
    .get("/missing", |_ctx| Box::pin(async move { Err(HttpError::not_found().into()) }));
    api
}

fn demo_app(config: &ServerConfig) -> App<DemoState> {
    let mut app: App<DemoState> = App::from_config(&config.app);
    app.use_middleware(|ctx| {
        Box::pin(async move {
            ctx.state.started = Some(Instant::now());
            let response = ctx.next().await;
            if let Some(started) = ctx.state.started {
                tracing::debug!(elapsed_us = started.elapsed().as_micros() as u64, "Request handled");
            }
            response
        })
    })
    .get("/", |_ctx| Box::pin(async move { Ok(text("stackroute demo")) }))
    .get("/old-home", |ctx| Box::pin(async move { ctx.redirect("/") }))
    .mount_app("/api", api())
    .not_found(|ctx| {
        Box::pin(async move {
            let path = ctx.url.path().to_string();
            Ok(stackroute::status_text(StatusCode::NOT_FOUND, format!("Nothing at {path}")))
        })
    })
    .on_error("/api", |ctx| {
        Box::pin(async move {
            let message = ctx.error.as_ref().map(ToString::to_string).unwrap_or_default();
            let status = ctx
                .error
                .as_ref()
                .map_or(StatusCode::INTERNAL_SERVER_ERROR, |e| e.status());
            let mut response = json_response(&json!({ "error": message }));
            *response.status_mut() = status;
            Ok(response)
        })
    });
    app
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if cli.production {
        config.mode = Mode::Production;
    }

    init_logging(&config.observability);
    tracing::info!(mode = ?config.mode, base_path = %config.app.base_path, "stackroute demo starting");

    let app = demo_app(&config);
    let server = app.bind(&ListenOptions::from_config(&config)).await?;
    tracing::info!(address = %server.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let signals = shutdown.clone();
    tokio::spawn(async move { wait_for_signal(&signals).await });

    server.run(receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
