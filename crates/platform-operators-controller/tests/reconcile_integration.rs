//! Reconcile passes against the in-memory store with injected sourcers and faults.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use platform_operators_controller::reconcile::PlatformOperatorReconciler;
use platform_operators_controller::{ReconcileError, SourceError, SourcedBundle, Sourcer, StaticSourcer};
use platform_operators_core::api::{BundleDeployment, PlatformOperator};
use platform_operators_core::{Condition, ConditionStatus, find_status_condition};
use platform_operators_storage::typed::{create_typed, get_typed, list_typed, patch_status_typed};
use platform_operators_storage::{
    DynStore, ListParams, ListResult, ObjectKey, ObjectStore, PatchParams, StorageError, StoredObject,
};
use platform_operators_store_memory::InMemoryStore;
use serde_json::Value;
use tokio_test::{assert_err, assert_ok};

/// Counts sourcing calls and resolves every package to `img:v1`.
#[derive(Default)]
struct CountingSourcer {
    calls: AtomicUsize,
}

#[async_trait]
impl Sourcer for CountingSourcer {
    async fn source(&self, po: &PlatformOperator) -> Result<SourcedBundle, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SourcedBundle {
            package: po.package_name().to_string(),
            image: "img:v1".to_string(),
        })
    }
}

/// Passes through to an in-memory store, counting writes and failing on request.
#[derive(Default)]
struct FaultyStore {
    inner: InMemoryStore,
    fail_get: AtomicBool,
    fail_bundle_get: AtomicBool,
    fail_create: AtomicBool,
    /// Another writer creates each BundleDeployment just before ours lands.
    preempt_bundle_create: AtomicBool,
    fail_patch: AtomicBool,
    writes: AtomicUsize,
}

impl FaultyStore {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn is_bundle_deployment(object: &Value) -> bool {
    object.get("kind").and_then(Value::as_str) == Some("BundleDeployment")
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn create(&self, object: &Value) -> Result<StoredObject, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StorageError::internal("admission webhook unreachable"));
        }
        if self.preempt_bundle_create.load(Ordering::SeqCst) && is_bundle_deployment(object) {
            self.inner.create(object).await?;
        }
        self.inner.create(object).await
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StorageError::connection_error("store unavailable"));
        }
        if self.fail_bundle_get.load(Ordering::SeqCst) && key.kind == "BundleDeployment" {
            return Err(StorageError::connection_error("bundle store unavailable"));
        }
        self.inner.get(key).await
    }

    async fn list(&self, kind: &str, params: &ListParams) -> Result<ListResult, StorageError> {
        self.inner.list(kind, params).await
    }

    async fn update(&self, object: &Value, if_match: Option<&str>) -> Result<StoredObject, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(object, if_match).await
    }

    async fn patch_status(&self, object: &Value, params: &PatchParams) -> Result<StoredObject, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_patch.load(Ordering::SeqCst) {
            return Err(StorageError::internal("status subresource unavailable"));
        }
        self.inner.patch_status(object, params).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredObject, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

struct Fixture {
    store: Arc<FaultyStore>,
    sourcer: Arc<CountingSourcer>,
    reconciler: PlatformOperatorReconciler,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(FaultyStore::default());
        let sourcer = Arc::new(CountingSourcer::default());
        let dyn_store: DynStore = store.clone();
        let reconciler = PlatformOperatorReconciler::new(dyn_store, sourcer.clone());
        Self {
            store,
            sourcer,
            reconciler,
        }
    }

    async fn create_po(&self, name: &str, package: &str) -> PlatformOperator {
        create_typed(self.store.as_ref(), &PlatformOperator::new(name, package))
            .await
            .unwrap()
    }

    async fn po(&self, name: &str) -> PlatformOperator {
        get_typed(self.store.as_ref(), None, name).await.unwrap().unwrap()
    }

    async fn bundle_deployments(&self) -> Vec<BundleDeployment> {
        list_typed(self.store.as_ref(), &ListParams::new()).await.unwrap()
    }
}

fn installed(po: &PlatformOperator) -> &Condition {
    find_status_condition(&po.status.conditions, "Installed").expect("Installed condition")
}

#[tokio::test]
async fn test_successful_install() {
    let f = Fixture::new();
    let created = f.create_po("cert-manager", "openshift-cert-manager-operator").await;

    assert_ok!(f.reconciler.reconcile("cert-manager").await);

    let bds = f.bundle_deployments().await;
    assert_eq!(bds.len(), 1);
    let bd = &bds[0];
    assert_eq!(bd.metadata.name, "cert-manager");
    assert_eq!(bd.image_ref(), Some("img:v1"));
    let owner = bd.metadata.controller_owner().unwrap();
    assert_eq!(owner.kind, "PlatformOperator");
    assert_eq!(owner.uid, created.metadata.uid.clone().unwrap());

    let po = f.po("cert-manager").await;
    let condition = installed(&po);
    assert_eq!(condition.status, ConditionStatus::True);
    assert_eq!(condition.reason, "InstallSuccessful");
    assert_eq!(
        condition.message,
        "Successfully applied the cert-manager BundleDeployment resource"
    );
    assert_eq!(po.active_bundle_deployment(), Some("cert-manager"));
    assert_eq!(po.metadata.managed_fields.len(), 1);
    assert_eq!(po.metadata.managed_fields[0].manager, "platformoperator");
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;

    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    let first = f.po("cert-manager").await;
    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    let second = f.po("cert-manager").await;

    assert_eq!(f.bundle_deployments().await.len(), 1);
    assert_eq!(f.sourcer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.status, first.status);
    assert_eq!(second.metadata.resource_version, first.metadata.resource_version);
    assert_eq!(
        second
            .status
            .conditions
            .iter()
            .filter(|c| c.type_ == "Installed")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_concurrent_reconciles_create_one_bundle_deployment() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;

    let passes = (0..4).map(|_| f.reconciler.reconcile("cert-manager"));
    let results = futures_util::future::join_all(passes).await;

    assert!(results.iter().any(|r| r.is_ok()));
    assert_eq!(f.bundle_deployments().await.len(), 1);

    // whichever pass lost the race, the next pass converges
    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    assert!(installed(&f.po("cert-manager").await).is_true());
}

#[tokio::test]
async fn test_lost_create_race_reports_install_failure() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    f.store.preempt_bundle_create.store(true, Ordering::SeqCst);

    let err = assert_err!(f.reconciler.reconcile("cert-manager").await);
    let ReconcileError::Install(cause) = &err else {
        panic!("expected an install error, got {err:?}");
    };
    assert!(cause.is_already_exists());

    let po = f.po("cert-manager").await;
    let condition = installed(&po);
    assert_eq!(condition.status, ConditionStatus::False);
    assert_eq!(condition.reason, "InstallFailed");
    assert_eq!(condition.message, "BundleDeployment \"cert-manager\" already exists");
    assert_eq!(po.active_bundle_deployment(), None);
    assert_eq!(f.bundle_deployments().await.len(), 1);

    // the next pass adopts the winner's BundleDeployment
    f.store.preempt_bundle_create.store(false, Ordering::SeqCst);
    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    assert!(installed(&f.po("cert-manager").await).is_true());
    assert_eq!(f.bundle_deployments().await.len(), 1);
}

#[tokio::test]
async fn test_create_failure_reports_install_failure() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    f.store.fail_create.store(true, Ordering::SeqCst);

    let err = assert_err!(f.reconciler.reconcile("cert-manager").await);
    assert!(matches!(err, ReconcileError::Install(_)));
    assert_eq!(err.to_string(), "Internal error: admission webhook unreachable");

    let po = f.po("cert-manager").await;
    let condition = installed(&po);
    assert_eq!(condition.status, ConditionStatus::False);
    assert_eq!(condition.reason, "InstallFailed");
    assert_eq!(condition.message, err.to_string());
    assert!(f.bundle_deployments().await.is_empty());
    assert_eq!(f.sourcer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bundle_read_failure_reports_install_failure() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    f.store.fail_bundle_get.store(true, Ordering::SeqCst);

    let err = assert_err!(f.reconciler.reconcile("cert-manager").await);
    assert!(matches!(err, ReconcileError::Install(_)));

    let po = f.po("cert-manager").await;
    let condition = installed(&po);
    assert_eq!(condition.reason, "InstallFailed");
    assert_eq!(condition.message, "Connection error: bundle store unavailable");
    assert!(f.bundle_deployments().await.is_empty());
    assert_eq!(f.sourcer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_platform_operator_writes_nothing() {
    let f = Fixture::new();

    let result = assert_ok!(f.reconciler.reconcile("ghost").await);
    assert_eq!(result.requeue_after, None);
    assert_eq!(f.store.writes(), 0);
    assert_eq!(f.sourcer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_error_is_returned_without_writes() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    let writes = f.store.writes();
    f.store.fail_get.store(true, Ordering::SeqCst);

    let err = assert_err!(f.reconciler.reconcile("cert-manager").await);
    assert!(matches!(err, ReconcileError::Fetch(_)));
    assert_eq!(f.store.writes(), writes);
}

#[tokio::test]
async fn test_source_failure_is_reported_and_returned() {
    let store: DynStore = Arc::new(InMemoryStore::new());
    let reconciler = PlatformOperatorReconciler::new(store.clone(), Arc::new(StaticSourcer::default()));
    create_typed(store.as_ref(), &PlatformOperator::new("cert-manager", "missing"))
        .await
        .unwrap();

    let err = assert_err!(reconciler.reconcile("cert-manager").await);
    assert!(err.is_source_failure());
    assert_eq!(
        err.to_string(),
        "failed to find the missing package in any catalog source: failed to run sourcing logic"
    );

    let po: PlatformOperator = get_typed(store.as_ref(), None, "cert-manager")
        .await
        .unwrap()
        .unwrap();
    let condition = installed(&po);
    assert_eq!(condition.status, ConditionStatus::False);
    assert_eq!(condition.reason, "SourceFailed");
    assert_eq!(condition.message, err.to_string());
    assert_eq!(po.active_bundle_deployment(), None);

    let bds: Vec<BundleDeployment> = list_typed(store.as_ref(), &ListParams::new()).await.unwrap();
    assert!(bds.is_empty());
}

#[tokio::test]
async fn test_existing_bundle_deployment_skips_sourcing() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    assert_ok!(f.reconciler.reconcile("cert-manager").await);

    for _ in 0..3 {
        assert_ok!(f.reconciler.reconcile("cert-manager").await);
    }
    assert_eq!(f.sourcer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_child_failure_is_mirrored_without_error() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    assert_ok!(f.reconciler.reconcile("cert-manager").await);

    let mut bd: BundleDeployment = get_typed(f.store.as_ref(), None, "cert-manager")
        .await
        .unwrap()
        .unwrap();
    bd.metadata.managed_fields.clear();
    bd.status.conditions = vec![
        Condition::new("Unpacked", ConditionStatus::False, "UnpackFailed", "image pull backoff"),
        Condition::new("Installed", ConditionStatus::False, "InstallFailed", "not reached"),
    ];
    patch_status_typed(f.store.as_ref(), &bd, &PatchParams::apply("rukpak"))
        .await
        .unwrap();

    assert_ok!(f.reconciler.reconcile("cert-manager").await);

    let po = f.po("cert-manager").await;
    let condition = installed(&po);
    assert_eq!(condition.status, ConditionStatus::False);
    assert_eq!(condition.reason, "UnpackFailed");
    assert_eq!(condition.message, "image pull backoff");
    // set by the earlier successful pass and left in place
    assert_eq!(po.active_bundle_deployment(), Some("cert-manager"));
    assert_eq!(po.status.conditions.len(), 1);
}

#[tokio::test]
async fn test_child_failure_without_reason_defaults() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    assert_ok!(f.reconciler.reconcile("cert-manager").await);

    let mut bd: BundleDeployment = get_typed(f.store.as_ref(), None, "cert-manager")
        .await
        .unwrap()
        .unwrap();
    bd.metadata.managed_fields.clear();
    bd.status.conditions = vec![Condition::new("HasValidBundle", ConditionStatus::Unknown, "", "")];
    patch_status_typed(f.store.as_ref(), &bd, &PatchParams::apply("rukpak"))
        .await
        .unwrap();

    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    assert_eq!(installed(&f.po("cert-manager").await).reason, "InstallFailed");
}

#[tokio::test]
async fn test_status_patch_failure_does_not_change_result() {
    let f = Fixture::new();
    f.create_po("cert-manager", "pkg").await;
    f.store.fail_patch.store(true, Ordering::SeqCst);

    assert_ok!(f.reconciler.reconcile("cert-manager").await);
    assert_eq!(f.bundle_deployments().await.len(), 1);
    assert!(f.po("cert-manager").await.status.conditions.is_empty());
}

#[tokio::test]
async fn test_custom_field_manager_recorded() {
    let store: DynStore = Arc::new(InMemoryStore::new());
    let reconciler = PlatformOperatorReconciler::new(
        store.clone(),
        Arc::new(StaticSourcer::default().with_package("pkg", "img:v2")),
    )
    .with_field_manager("po-controller");
    create_typed(store.as_ref(), &PlatformOperator::new("a", "pkg"))
        .await
        .unwrap();

    assert_ok!(reconciler.reconcile("a").await);

    let po: PlatformOperator = get_typed(store.as_ref(), None, "a").await.unwrap().unwrap();
    assert_eq!(po.metadata.managed_fields[0].manager, "po-controller");
    let bd: BundleDeployment = get_typed(store.as_ref(), None, "a").await.unwrap().unwrap();
    assert_eq!(bd.image_ref(), Some("img:v2"));
}
