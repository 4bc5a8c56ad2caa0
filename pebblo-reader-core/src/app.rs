//! Application discovery payload: who is loading, from where.

use std::sync::OnceLock;

use serde::Serialize;

/// Version reported to the classifier as `plugin_version`.
pub const PLUGIN_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub name: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub load_id: String,
    pub runtime: Runtime,
    pub framework: Framework,
    pub plugin_version: String,
}

impl App {
    pub fn new(name: &str, owner: &str, description: &str, load_id: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            load_id: load_id.to_string(),
            runtime: Runtime::current().clone(),
            framework: Framework::current(),
            plugin_version: PLUGIN_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Framework {
    pub name: String,
    pub version: String,
}

impl Framework {
    pub fn current() -> Self {
        Self {
            name: "pebblo-reader".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Runtime {
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub platform: String,
    pub os: String,
    pub os_version: String,
    pub language: String,
    pub language_version: String,
    pub runtime: String,
}

impl Runtime {
    /// Runtime details of this process, computed once.
    pub fn current() -> &'static Runtime {
        static RUNTIME: OnceLock<Runtime> = OnceLock::new();
        RUNTIME.get_or_init(Runtime::detect)
    }

    fn detect() -> Self {
        let host = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let path = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let runtime = Self {
            kind: "local".to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            os: std::env::consts::OS.to_string(),
            os_version: os_version(),
            language: "rust".to_string(),
            language_version: env!("PEBBLO_RUSTC_VERSION").to_string(),
            runtime: "tokio".to_string(),
            host,
            path,
            ip: None,
        };
        tracing::debug!(?runtime, "Detected runtime details");
        runtime
    }
}

/// IPv4 address of `host`, looked up once per process on the blocking pool.
pub async fn host_ip(host: &str) -> Option<String> {
    static HOST_IP: OnceLock<Option<String>> = OnceLock::new();

    if let Some(ip) = HOST_IP.get() {
        return ip.clone();
    }
    let ip = resolve_ip(host).await;
    HOST_IP.get_or_init(|| ip).clone()
}

/// IPv4 address of `host`, resolved on the blocking pool.
pub async fn resolve_ip(host: &str) -> Option<String> {
    use std::net::ToSocketAddrs;

    if host == "unknown" {
        return None;
    }
    let host = host.to_string();
    tokio::task::spawn_blocking(move || {
        (host.as_str(), 0)
            .to_socket_addrs()
            .ok()?
            .find(|addr| addr.is_ipv4())
            .map(|addr| addr.ip().to_string())
    })
    .await
    .ok()
    .flatten()
}

fn os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_payload_carries_identity_and_version() {
        let app = App::new("my-app", "alice", "", "load-1");
        let json = serde_json::to_value(&app).unwrap();

        assert_eq!(json["name"], "my-app");
        assert_eq!(json["owner"], "alice");
        assert_eq!(json["load_id"], "load-1");
        assert_eq!(json["plugin_version"], PLUGIN_VERSION);
        assert_eq!(json["runtime"]["type"], "local");
        assert_eq!(json["runtime"]["language"], "rust");
        assert!(json.get("description").is_none());
        assert_eq!(
            json["runtime"]["language_version"],
            env!("PEBBLO_RUSTC_VERSION")
        );
        assert!(!env!("PEBBLO_RUSTC_VERSION").is_empty());
    }

    #[test]
    fn app_construction_does_not_resolve_the_host() {
        let app = App::new("my-app", "alice", "", "load-1");
        assert_eq!(app.runtime.ip, None);
        let json = serde_json::to_value(&app).unwrap();
        assert!(json["runtime"].get("ip").is_none());
    }

    #[tokio::test]
    async fn resolve_ip_runs_off_the_async_thread() {
        assert_eq!(resolve_ip("127.0.0.1").await.as_deref(), Some("127.0.0.1"));
        assert_eq!(resolve_ip("unknown").await, None);
    }
}
