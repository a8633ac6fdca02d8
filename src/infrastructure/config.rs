use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub server: ServerSettings,
    pub feed: FeedSettings,
    pub launch: LaunchSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    /// Origin the job service and feed are served from, e.g. `http://localhost:8000`
    pub origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LaunchSettings {
    pub path: String,
}

/// Load `config/monitor.*` (optional) with `MONITOR__SECTION__KEY` overrides.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    load_from(config::File::with_name("config/monitor").required(false))
}

fn load_from<S>(source: S) -> anyhow::Result<MonitorConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("feed.origin", "http://localhost:8000")?
        .set_default("launch.path", "/api/start")?
        .add_source(source)
        .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
