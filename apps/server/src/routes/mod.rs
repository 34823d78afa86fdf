mod health;
mod page;
mod status;

macros_utils::routes! {
    route health::health_route,
    route status::status_route,
    route page::index_route,
}

/// Whether a `?wait=` query asks for a blocking refresh
#[derive(Debug, Default, serde::Deserialize)]
pub struct RefreshQuery {
    wait: Option<String>,
}

impl RefreshQuery {
    pub fn wait(&self) -> bool {
        self.wait.as_deref() == Some("true")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use sitecheck::{CheckResult, Checker, CheckerRegistry, ConfigSource, Scheduler, Target};

    use crate::state::AppState;

    /// Healthy unless the URL mentions "down"
    pub struct UrlChecker;

    #[async_trait]
    impl Checker for UrlChecker {
        async fn check(&self, target: &Target) -> CheckResult {
            Ok(!target.url.contains("down"))
        }
    }

    pub const CONFIG: &str = r#"
[[site]]
name = "Web"
type = "fake"
description = "<b>main</b> site"
urls = ["http://up.example.com", "http://down.example.com"]

[[site]]
name = "Mystery"
type = "fumble"
urls = ["http://mystery.example.com"]
"#;

    pub async fn state(config_path: &Path) -> AppState {
        let registry = CheckerRegistry::new().register("fake", UrlChecker);
        let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));
        let source = ConfigSource::new(config_path, Duration::from_secs(5));
        AppState::new(scheduler, source).unwrap()
    }
}
