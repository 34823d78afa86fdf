#![warn(clippy::all, clippy::pedantic)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use clap::Parser;
use sitecheck::{CheckerRegistry, ConfigSource, RefreshMode, RegistrySettings, Scheduler};
use tokio::time::MissedTickBehavior;
use tracing::info;

mod cli;
mod error;
mod routes;
mod state;

use cli::Args;
use error::AppError;
use logger::init_tracing;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();
    let args = Args::parse();

    let ip: IpAddr = args.bind.parse()?;
    let addr = SocketAddr::new(ip, args.port);

    let mut settings = RegistrySettings { svn_program: args.svn.clone(), ..RegistrySettings::default() };
    if let Some(dir) = args.docker_cert_path.clone() {
        settings.docker_cert_dir = Some(dir);
    }

    let registry = Arc::new(CheckerRegistry::with_defaults(settings)?);
    info!(kinds = ?registry.kinds(), "checkers registered");

    let scheduler = Scheduler::new(registry, Duration::from_secs(args.debounce));

    // A config that does not load at startup is fatal; later edits that fail
    // to load only keep the previous targets
    let mut config = ConfigSource::new(&args.conf, Duration::from_secs(args.timeout));
    if let Some(targets) = config.reload_if_changed()? {
        scheduler.reload(targets).await;
    }

    let state = web::Data::new(AppState::new(scheduler, config)?);

    if args.refresh_interval > 0 {
        spawn_refresh_timer(state.clone(), Duration::from_secs(args.refresh_interval));
    }

    run_server(addr, state).await
}

/// Periodic non-blocking refresh; the first tick fires immediately
fn spawn_refresh_timer(state: web::Data<AppState>, period: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            state.sync_config().await;
            state.scheduler.refresh(RefreshMode::NoWait).await;
        }
    });
}

async fn run_server(addr: SocketAddr, state: web::Data<AppState>) -> Result<(), AppError> {
    info!(%addr, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Compress::default())
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
