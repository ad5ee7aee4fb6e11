//! Package resolution.
//!
//! A [`Sourcer`] turns the package a PlatformOperator asks for into a bundle
//! image. How catalogs are searched is up to the implementation; the
//! controller only consumes the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use platform_operators_core::api::PlatformOperator;
use tracing::debug;

use crate::config::SourcesConfig;

/// A bundle resolved for a PlatformOperator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedBundle {
    pub package: String,
    /// Bundle image reference the BundleDeployment will unpack
    pub image: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("package name must be set on PlatformOperator {0}")]
    MissingPackage(String),

    #[error("failed to find the {0} package in any catalog source")]
    PackageNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait Sourcer: Send + Sync {
    async fn source(&self, po: &PlatformOperator) -> Result<SourcedBundle, SourceError>;
}

pub type DynSourcer = Arc<dyn Sourcer>;

/// Resolves packages from a fixed package to image table.
#[derive(Debug, Clone, Default)]
pub struct StaticSourcer {
    packages: BTreeMap<String, String>,
}

impl StaticSourcer {
    pub fn new(packages: BTreeMap<String, String>) -> Self {
        Self { packages }
    }

    pub fn from_config(sources: &SourcesConfig) -> Self {
        Self::new(sources.packages.clone())
    }

    pub fn with_package(mut self, package: impl Into<String>, image: impl Into<String>) -> Self {
        self.packages.insert(package.into(), image.into());
        self
    }
}

#[async_trait]
impl Sourcer for StaticSourcer {
    async fn source(&self, po: &PlatformOperator) -> Result<SourcedBundle, SourceError> {
        let package = po.package_name();
        if package.is_empty() {
            return Err(SourceError::MissingPackage(po.metadata.name.clone()));
        }
        let image = self
            .packages
            .get(package)
            .ok_or_else(|| SourceError::PackageNotFound(package.to_string()))?;
        debug!(package = %package, image = %image, "Sourced bundle");
        Ok(SourcedBundle {
            package: package.to_string(),
            image: image.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_sourcer_resolves_package() {
        let sourcer = StaticSourcer::default().with_package("cert-manager", "quay.io/bundles/cert-manager:v1");
        let bundle = sourcer
            .source(&PlatformOperator::new("cert-manager", "cert-manager"))
            .await
            .unwrap();
        assert_eq!(bundle.image, "quay.io/bundles/cert-manager:v1");
        assert_eq!(bundle.package, "cert-manager");
    }

    #[tokio::test]
    async fn test_static_sourcer_unknown_package() {
        let sourcer = StaticSourcer::default();
        let err = sourcer
            .source(&PlatformOperator::new("a", "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::PackageNotFound(ref p) if p == "missing"));
        assert_eq!(
            err.to_string(),
            "failed to find the missing package in any catalog source"
        );
    }

    #[tokio::test]
    async fn test_static_sourcer_empty_package() {
        let err = StaticSourcer::default()
            .source(&PlatformOperator::new("a", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingPackage(_)));
    }
}
