//! 外部数据获取抽象 Trait

use async_trait::async_trait;
use cloudkeeper_toolbox::{favicon_url, ToolboxService};

use crate::types::{AiMetadata, DomainStatus, NetworkInfo};

/// Network-facing lookups used by the controller.
///
/// None of these fail: sources that are unreachable degrade to defaults.
#[async_trait]
pub trait DomainInspector: Send + Sync {
    /// Reachability probe; resolves to `Online` or `Offline`.
    async fn check_status(&self, url: &str) -> DomainStatus;

    /// DNS, geolocation and RDAP aggregate.
    async fn network_details(&self, url: &str) -> NetworkInfo;

    /// AI description with hostname fallback.
    async fn ai_metadata(&self, url: &str) -> AiMetadata;

    fn favicon(&self, url: &str) -> String {
        favicon_url(url)
    }
}

#[async_trait]
impl DomainInspector for ToolboxService {
    async fn check_status(&self, url: &str) -> DomainStatus {
        ToolboxService::check_status(self, url).await.into()
    }

    async fn network_details(&self, url: &str) -> NetworkInfo {
        ToolboxService::network_details(self, url).await
    }

    async fn ai_metadata(&self, url: &str) -> AiMetadata {
        ToolboxService::ai_metadata(self, url).await
    }
}
