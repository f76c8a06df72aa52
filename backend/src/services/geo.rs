use async_trait::async_trait;

/// Resolves a client address to a human readable location.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> anyhow::Result<Option<String>>;
}

/// Locator used when no lookup provider is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopGeoLocator;

#[async_trait]
impl GeoLocator for NoopGeoLocator {
    async fn locate(&self, _ip: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}
