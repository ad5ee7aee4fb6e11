//! Seeds configured PlatformOperators and CatalogSources into the store at startup.

use platform_operators_core::api::{CatalogSource, PlatformOperator};
use platform_operators_storage::typed::create_typed;
use platform_operators_storage::{ObjectStore, StorageError};
use tracing::{debug, info};

use crate::config::BootstrapConfig;

/// Statistics about the bootstrap operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapStats {
    pub platform_operators: usize,
    pub catalog_sources: usize,
    /// Objects left alone because they already existed
    pub skipped: usize,
}

impl BootstrapStats {
    pub fn total(&self) -> usize {
        self.platform_operators + self.catalog_sources
    }
}

/// Creates every configured object. Existing objects are kept as they are,
/// so running this twice is harmless.
pub async fn seed_objects(
    store: &dyn ObjectStore,
    config: &BootstrapConfig,
) -> Result<BootstrapStats, StorageError> {
    let mut stats = BootstrapStats::default();

    for cs in &config.catalog_sources {
        let catalog = CatalogSource::grpc(cs.namespace.clone(), cs.name.clone(), cs.image.clone());
        if created(create_typed(store, &catalog).await)? {
            info!(namespace = %cs.namespace, name = %cs.name, "Seeded CatalogSource");
            stats.catalog_sources += 1;
        } else {
            stats.skipped += 1;
        }
    }

    for po in &config.platform_operators {
        let object = PlatformOperator::new(po.name.clone(), po.package.clone());
        if created(create_typed(store, &object).await)? {
            info!(name = %po.name, package = %po.package, "Seeded PlatformOperator");
            stats.platform_operators += 1;
        } else {
            stats.skipped += 1;
        }
    }

    info!(
        platform_operators = stats.platform_operators,
        catalog_sources = stats.catalog_sources,
        skipped = stats.skipped,
        total = stats.total(),
        "Bootstrap completed"
    );
    Ok(stats)
}

fn created<T>(result: Result<T, StorageError>) -> Result<bool, StorageError> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_already_exists() => {
            debug!(error = %e, "Bootstrap object already exists");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
