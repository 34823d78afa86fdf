use sitecheck::{ConfigSource, RefreshMode, Scheduler, TargetStatus};
use tera::{Context, Tera};
use tokio::sync::Mutex;
use tracing::error;

use crate::error::AppError;

const STATUS_TEMPLATE: &str = "status.html";

/// Shared by every worker of the HTTP server
pub struct AppState {
    pub scheduler: Scheduler,
    config: Mutex<ConfigSource>,
    tera: Tera,
}

impl AppState {
    pub fn new(scheduler: Scheduler, config: ConfigSource) -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_template(STATUS_TEMPLATE, include_str!("../templates/status.html"))?;
        tera.autoescape_on(vec![".html"]);

        Ok(Self { scheduler, config: Mutex::new(config), tera })
    }

    /// Pick up an edited config file. A file that fails to load is logged and
    /// the current targets stay in place.
    pub async fn sync_config(&self) {
        let mut config = self.config.lock().await;
        match config.reload_if_changed() {
            Ok(Some(targets)) => {
                self.scheduler.reload(targets).await;
            }
            Ok(None) => {}
            Err(e) => {
                error!(path = %config.path().display(), error = %e, "failed to reload config, keeping previous targets");
            }
        }
    }

    /// Sync the config, refresh and return the resulting rows
    pub async fn statuses(&self, wait: bool) -> Vec<TargetStatus> {
        self.sync_config().await;

        let mode = if wait { RefreshMode::Wait } else { RefreshMode::NoWait };
        self.scheduler.refresh(mode).await;

        self.scheduler.snapshot().await
    }

    pub fn render(&self, rows: &[TargetStatus]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("sites", rows);
        context.insert("version", env!("CARGO_PKG_VERSION"));
        self.tera.render(STATUS_TEMPLATE, &context)
    }
}
