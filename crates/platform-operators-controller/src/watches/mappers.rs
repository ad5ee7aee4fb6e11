use async_trait::async_trait;
use platform_operators_core::Resource;
use platform_operators_core::api::{BundleDeployment, CatalogSource, PlatformOperator};
use platform_operators_core::events::ResourceEvent;
use platform_operators_storage::{DynStore, ListParams};
use tracing::{debug, warn};

use super::RequestMapper;
use crate::queue::Request;

/// Primary watch: a changed PlatformOperator reconciles itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformOperatorMapper;

#[async_trait]
impl RequestMapper for PlatformOperatorMapper {
    fn name(&self) -> &str {
        "platformoperator"
    }

    fn kind(&self) -> &'static str {
        PlatformOperator::KIND
    }

    async fn map(&self, event: &ResourceEvent) -> Vec<Request> {
        vec![Request::new(event.name.clone())]
    }
}

/// A catalog change may make unresolvable packages resolvable, so every
/// PlatformOperator is reconciled again.
#[derive(Clone)]
pub struct CatalogSourceMapper {
    store: DynStore,
}

impl CatalogSourceMapper {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    async fn all_platform_operators(&self, trigger: &str) -> Vec<Request> {
        match self
            .store
            .list(PlatformOperator::KIND, &ListParams::new())
            .await
        {
            Ok(list) => list.items.into_iter().map(|po| Request::new(po.key.name)).collect(),
            Err(e) => {
                warn!(
                    trigger = %trigger,
                    error = %e,
                    "Failed to list PlatformOperators"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl RequestMapper for CatalogSourceMapper {
    fn name(&self) -> &str {
        "catalogsource"
    }

    fn kind(&self) -> &'static str {
        CatalogSource::KIND
    }

    async fn map(&self, event: &ResourceEvent) -> Vec<Request> {
        self.all_platform_operators(&event.name).await
    }

    async fn resync(&self) -> Vec<Request> {
        self.all_platform_operators("resync").await
    }
}

impl std::fmt::Debug for CatalogSourceMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSourceMapper")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

/// A BundleDeployment change reconciles the PlatformOperator that controls
/// it. BundleDeployments share their owner's name, so only an owner
/// reference that agrees on the name counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleDeploymentMapper;

#[async_trait]
impl RequestMapper for BundleDeploymentMapper {
    fn name(&self) -> &str {
        "bundledeployment"
    }

    fn kind(&self) -> &'static str {
        BundleDeployment::KIND
    }

    async fn map(&self, event: &ResourceEvent) -> Vec<Request> {
        let Some(object) = event.object.clone() else {
            return Vec::new();
        };
        let bd = match BundleDeployment::from_value(object) {
            Ok(bd) => bd,
            Err(e) => {
                warn!(name = %event.name, error = %e, "Ignoring undecodable BundleDeployment");
                return Vec::new();
            }
        };

        let owned = bd.metadata.controller_owner().is_some_and(|owner| {
            owner.kind == PlatformOperator::KIND && owner.name == bd.metadata.name
        });
        if !owned {
            debug!(name = %bd.metadata.name, "BundleDeployment not controlled by a PlatformOperator");
            return Vec::new();
        }
        vec![Request::new(bd.metadata.name)]
    }
}
