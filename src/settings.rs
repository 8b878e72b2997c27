use crate::{
    config::BackendConfig,
    error::{Result, StudioError},
    models::SystemConfig,
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Mutex;

const CONFIG_PATH: &str = "/system/config";

#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn fetch(&self) -> Result<SystemConfig>;
    async fn save(&self, config: &SystemConfig) -> Result<()>;
}

/// HTTP client for the studio backend's `/system/config` resource.
#[derive(Clone)]
pub struct SettingsClient {
    client: Client,
    api_url: String,
}

impl SettingsClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "ngrok-skip-browser-warning",
            reqwest::header::HeaderValue::from_static("true"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn url(&self) -> String {
        format!("{}{}", self.api_url, CONFIG_PATH)
    }
}

#[async_trait]
impl ConfigBackend for SettingsClient {
    async fn fetch(&self) -> Result<SystemConfig> {
        let response = self
            .client
            .get(self.url())
            .headers(self.build_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::ResponseError(format!(
                "API Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        response
            .json::<SystemConfig>()
            .await
            .map_err(|e| StudioError::ResponseError(e.to_string()))
    }

    async fn save(&self, config: &SystemConfig) -> Result<()> {
        let response = self
            .client
            .post(self.url())
            .headers(self.build_headers())
            .json(config)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::ResponseError(format!(
                "API Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }
        Ok(())
    }
}

/// Local view of the storage settings, kept in step with the backend.
pub struct StorageSettings<B: ConfigBackend> {
    backend: B,
    current: Mutex<SystemConfig>,
}

impl<B: ConfigBackend> StorageSettings<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: Mutex::new(SystemConfig::default()),
        }
    }

    pub fn current(&self) -> SystemConfig {
        self.current
            .lock()
            .map(|config| config.clone())
            .unwrap_or_default()
    }

    fn replace(&self, config: SystemConfig) {
        if let Ok(mut current) = self.current.lock() {
            *current = config;
        }
    }

    /// Refreshes from the backend. On failure the local value is left alone.
    pub async fn load(&self) -> SystemConfig {
        match self.backend.fetch().await {
            Ok(config) => {
                self.replace(config.clone());
                config
            }
            Err(e) => {
                log::error!("Failed to load system config: {}", e);
                self.current()
            }
        }
    }

    /// Flips `auto_save_drive` locally, then saves. A failed save reverts the flip.
    pub async fn toggle_auto_save(&self) -> Result<bool> {
        let previous = self.current();
        let updated = SystemConfig {
            auto_save_drive: !previous.auto_save_drive,
        };
        self.replace(updated.clone());

        match self.backend.save(&updated).await {
            Ok(()) => {
                log::info!("Auto-save to drive set to {}", updated.auto_save_drive);
                Ok(updated.auto_save_drive)
            }
            Err(e) => {
                log::error!("Failed to save config: {}", e);
                self.replace(previous);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyBackend {
        fail_saves: AtomicBool,
        saved: Mutex<Vec<SystemConfig>>,
    }

    impl FlakyBackend {
        fn new(fail_saves: bool) -> Self {
            Self {
                fail_saves: AtomicBool::new(fail_saves),
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConfigBackend for FlakyBackend {
        async fn fetch(&self) -> Result<SystemConfig> {
            Err(StudioError::RequestError("offline".into()))
        }

        async fn save(&self, config: &SystemConfig) -> Result<()> {
            self.saved.lock().unwrap().push(config.clone());
            if self.fail_saves.load(Ordering::SeqCst) {
                Err(StudioError::RequestError("offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_toggle_success_keeps_new_value() {
        let settings = StorageSettings::new(FlakyBackend::new(false));
        assert!(settings.toggle_auto_save().await.unwrap());
        assert!(settings.current().auto_save_drive);
    }

    #[tokio::test]
    async fn test_toggle_failure_rolls_back() {
        let settings = StorageSettings::new(FlakyBackend::new(true));
        assert!(settings.toggle_auto_save().await.is_err());
        assert!(!settings.current().auto_save_drive);
        // the optimistic value was what got sent
        assert!(settings.backend.saved.lock().unwrap()[0].auto_save_drive);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_default() {
        let settings = StorageSettings::new(FlakyBackend::new(false));
        assert_eq!(settings.load().await, SystemConfig::default());
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/system/config")
            .match_header("ngrok-skip-browser-warning", "true")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"auto_save_drive": true}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/system/config")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"auto_save_drive": false}),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = SettingsClient::new(&BackendConfig::new().with_api_url(server.url()));
        let settings = StorageSettings::new(client);

        assert!(settings.load().await.auto_save_drive);
        assert!(!settings.toggle_auto_save().await.unwrap());

        get.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_failure_reverts() {
        let mut server = mockito::Server::new_async().await;
        let _post = server
            .mock("POST", "/system/config")
            .with_status(500)
            .create_async()
            .await;

        let client = SettingsClient::new(&BackendConfig::new().with_api_url(server.url()));
        let settings = StorageSettings::new(client);

        let err = settings.toggle_auto_save().await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(!settings.current().auto_save_drive);
    }
}
