//! Construction of the default meta-provider from configuration.

use crate::api::HttpClient;
use crate::error::{MetaError, Result};
use crate::mal::MalClient;
use crate::meta::{MalMeta, MetaServices};
use crate::provider::{ContentProvider, MangaProvider};
use crate::providers::{Enime, MangaKakalot};
use crate::services::{FillerClient, KitsuClient, MalSyncClient};
use shared::Config;
use std::sync::Arc;
use tracing::info;

/// Content provider by name, case-insensitive
pub fn anime_provider(name: &str, http: &HttpClient, config: &Config) -> Result<Arc<dyn ContentProvider>> {
    match name.to_lowercase().as_str() {
        "enime" => Ok(Arc::new(Enime::new(http.clone(), &config.endpoints.enime))),
        _ => Err(MetaError::UnknownProvider(name.to_string())),
    }
}

/// Manga provider by name, case-insensitive
pub fn manga_provider(name: &str, http: &HttpClient, config: &Config) -> Result<Arc<dyn MangaProvider>> {
    match name.to_lowercase().as_str() {
        "mangakakalot" => Ok(Arc::new(MangaKakalot::new(
            http.clone(),
            &config.endpoints.mangakakalot,
            &config.endpoints.manganato,
        ))),
        _ => Err(MetaError::UnknownProvider(name.to_string())),
    }
}

/// Build the meta-provider with the configured content provider and the
/// default lookup services.
pub fn build_default(config: &Config) -> Result<MalMeta> {
    let http = HttpClient::from_config(&config.http)?;
    let endpoints = &config.endpoints;

    let provider = anime_provider(&config.meta.provider, &http, config)?;
    let services = MetaServices {
        mal: Arc::new(MalClient::new(http.clone(), &endpoints.mal)),
        native: Arc::new(Enime::new(http.clone(), &endpoints.enime)),
        sync: Arc::new(MalSyncClient::new(http.clone(), &endpoints.malsync)),
        kitsu: Arc::new(KitsuClient::new(http.clone(), &endpoints.kitsu)),
        fillers: Arc::new(FillerClient::new(http.clone(), &endpoints.filler)),
        links: Arc::new(http),
    };

    info!(provider = provider.name(), "Meta-provider ready");
    Ok(MalMeta::new(provider, services))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LookupStrategy;

    #[test]
    fn test_build_default() {
        let meta = build_default(&Config::default()).unwrap();
        assert_eq!(meta.provider().name(), "Enime");
        assert_eq!(meta.provider().capabilities().lookup, LookupStrategy::NativeMapping);
    }

    #[test]
    fn test_unknown_providers() {
        let config = Config::default();
        let http = HttpClient::from_config(&config.http).unwrap();

        assert!(matches!(
            anime_provider("nyaa", &http, &config),
            Err(MetaError::UnknownProvider(name)) if name == "nyaa"
        ));
        assert!(manga_provider("MangaKakalot", &http, &config).is_ok());
        assert!(manga_provider("mangadex", &http, &config).is_err());
    }

    #[test]
    fn test_build_rejects_unknown_provider() {
        let mut config = Config::default();
        config.meta.provider = "gogoanime".to_string();
        assert!(build_default(&config).is_err());
    }
}
