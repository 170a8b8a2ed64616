//! Record operations with availability fallback.

use std::sync::Arc;

use hdx_records::{Entity, EntityRecordStore, Filters, Record, RecordResult};
use hdx_types::RecordId;
use serde_json::Value;
use tracing::debug;

use crate::attempt::{Attempt, AttemptPolicy};
use crate::error::SdkResult;
use crate::fallback::FallbackStore;
use crate::served::{FallbackReason, Served};

/// An [`EntityRecordStore`] guarded by a timeout, with a [`FallbackStore`]
/// answering whenever the primary backend is unconfigured, too slow, or
/// failing.
///
/// Writes served by the fallback stay in the fallback; they are never
/// replayed against the primary backend.
pub struct ResilientStore<R> {
    primary: Option<EntityRecordStore<R>>,
    fallback: Arc<FallbackStore<R>>,
    policy: Arc<AttemptPolicy>,
}

impl<R> Clone for ResilientStore<R> {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            fallback: self.fallback.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<R: Record> ResilientStore<R> {
    pub(crate) fn new(
        primary: Option<EntityRecordStore<R>>,
        fallback: Arc<FallbackStore<R>>,
        policy: Arc<AttemptPolicy>,
    ) -> Self {
        Self {
            primary,
            fallback,
            policy,
        }
    }

    /// The substitute store, for inspection.
    pub fn fallback(&self) -> &FallbackStore<R> {
        &self.fallback
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    async fn run<T, F, Fut>(
        &self,
        op: &'static str,
        call: F,
        fallback: impl FnOnce(&FallbackStore<R>) -> RecordResult<T>,
    ) -> SdkResult<Served<T>>
    where
        T: Send + 'static,
        F: FnOnce(EntityRecordStore<R>) -> Fut,
        Fut: std::future::Future<Output = RecordResult<T>> + Send + 'static,
    {
        let reason = match &self.primary {
            None => FallbackReason::Unconfigured,
            Some(primary) => match self.policy.attempt(op, R::KIND, call(primary.clone())).await? {
                Attempt::Primary(value) => return Ok(Served::primary(value)),
                Attempt::Degraded(reason) => reason,
            },
        };
        debug!(op, kind = R::KIND, ?reason, "serving from fallback");
        Ok(Served::fallback(fallback(&self.fallback)?, reason))
    }

    pub async fn create(&self, payload: R) -> SdkResult<Served<RecordId>> {
        let local = payload.clone();
        self.run(
            "create",
            move |store| async move { store.create(payload).await },
            move |fallback| Ok(fallback.create(local)),
        )
        .await
    }

    pub async fn get_by_id(&self, id: &RecordId) -> SdkResult<Served<Option<Entity<R>>>> {
        let id = *id;
        self.run(
            "get_by_id",
            move |store| async move { store.get_by_id(&id).await },
            move |fallback| Ok(fallback.get_by_id(&id)),
        )
        .await
    }

    pub async fn update(&self, id: &RecordId, patch: Value) -> SdkResult<Served<bool>> {
        let id = *id;
        let local = patch.clone();
        self.run(
            "update",
            move |store| async move { store.update(&id, &patch).await },
            move |fallback| fallback.update(&id, &local),
        )
        .await
    }

    pub async fn delete(&self, id: &RecordId) -> SdkResult<Served<bool>> {
        let id = *id;
        self.run(
            "delete",
            move |store| async move { store.delete(&id).await },
            move |fallback| Ok(fallback.delete(&id)),
        )
        .await
    }

    pub async fn list(&self) -> SdkResult<Served<Vec<Entity<R>>>> {
        self.run(
            "list",
            |store| async move { store.list().await },
            |fallback| Ok(fallback.list()),
        )
        .await
    }

    pub async fn search(&self, query: &str, filters: &Filters) -> SdkResult<Served<Vec<Entity<R>>>> {
        let (q, f) = (query.to_string(), filters.clone());
        self.run(
            "search",
            move |store| async move { store.search(&q, &f).await },
            |fallback| Ok(fallback.search(query, filters)),
        )
        .await
    }

    /// Naming keys left behind by deleted records. Primary backend only.
    pub async fn orphaned_keys(&self) -> SdkResult<Served<Vec<hdx_types::NamingKey>>> {
        self.run(
            "orphaned_keys",
            |store| async move { store.orphaned_keys().await },
            |_| Ok(Vec::new()),
        )
        .await
    }
}

impl<R> std::fmt::Debug for ResilientStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientStore")
            .field("primary", &self.primary.is_some())
            .field("timeout", &self.policy.timeout())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hdx_index::{IndexOptions, MasterIndexManager};
    use hdx_names::{InMemoryNamingService, KeyManager};
    use hdx_records::{Project, ProjectStatus, RecordError};
    use hdx_store::InMemoryContentStore;
    use serde_json::json;

    use crate::config::FallbackTrigger;
    use crate::error::SdkError;
    use crate::served::ServeMode;

    struct Fixture {
        content: Arc<InMemoryContentStore>,
        naming: Arc<InMemoryNamingService>,
        store: ResilientStore<Project>,
    }

    fn fixture(timeout: Duration, trigger: FallbackTrigger) -> Fixture {
        let content = Arc::new(InMemoryContentStore::new());
        let naming = Arc::new(InMemoryNamingService::new());
        let keys = KeyManager::new(naming.clone());
        let index = Arc::new(MasterIndexManager::new(
            content.clone(),
            keys.clone(),
            IndexOptions::default(),
        ));
        let primary = EntityRecordStore::new(content.clone(), keys, index);
        let store = ResilientStore::new(
            Some(primary),
            Arc::new(FallbackStore::empty()),
            Arc::new(AttemptPolicy::new(timeout, trigger)),
        );
        Fixture {
            content,
            naming,
            store,
        }
    }

    fn project(title: &str) -> Project {
        Project {
            title: title.into(),
            status: ProjectStatus::Draft,
            ..Project::default()
        }
    }

    fn titles(entities: &[Entity<Project>]) -> Vec<&str> {
        entities.iter().map(|e| e.payload().title.as_str()).collect()
    }

    #[tokio::test]
    async fn healthy_backend_is_primary() {
        let fx = fixture(Duration::from_secs(5), FallbackTrigger::Transient);
        let created = fx.store.create(project("alpha")).await.unwrap();
        assert_eq!(created.mode, ServeMode::Primary);

        let got = fx.store.get_by_id(&created.value).await.unwrap();
        assert!(got.mode.is_primary());
        assert_eq!(got.value.unwrap().payload().title, "alpha");
    }

    #[tokio::test]
    async fn unconfigured_store_uses_fixtures() {
        let store: ResilientStore<Project> = ResilientStore::new(
            None,
            Arc::new(FallbackStore::new()),
            Arc::new(AttemptPolicy::new(Duration::from_secs(1), FallbackTrigger::Transient)),
        );
        let listed = store.list().await.unwrap();
        assert_eq!(
            listed.mode,
            ServeMode::Fallback {
                reason: FallbackReason::Unconfigured
            }
        );
        assert_eq!(listed.value.len(), 3);

        let hits = store.search("identity", &Filters::new()).await.unwrap();
        assert_eq!(titles(&hits.value), vec!["Decentralized Identity Verification"]);
    }

    #[tokio::test]
    async fn fallback_writes_stay_isolated() {
        let fx = fixture(Duration::from_secs(5), FallbackTrigger::Transient);
        fx.store.create(project("on primary")).await.unwrap();

        fx.content.faults().set_offline(true);
        fx.naming.faults().set_offline(true);
        let created = fx.store.create(project("while offline")).await.unwrap();
        assert_eq!(
            created.mode,
            ServeMode::Fallback {
                reason: FallbackReason::Error
            }
        );
        let degraded = fx.store.list().await.unwrap();
        assert!(degraded.mode.is_fallback());
        assert_eq!(titles(&degraded.value), vec!["while offline"]);

        fx.content.faults().set_offline(false);
        fx.naming.faults().set_offline(false);
        let restored = fx.store.list().await.unwrap();
        assert!(restored.mode.is_primary());
        assert_eq!(titles(&restored.value), vec!["on primary"]);
    }

    #[tokio::test]
    async fn slow_backend_times_out_then_settles() {
        let fx = fixture(Duration::from_millis(50), FallbackTrigger::Transient);
        fx.store.create(project("warm-up")).await.unwrap();
        fx.naming.faults().set_latency(Duration::from_millis(40));

        let created = fx.store.create(project("late")).await.unwrap();
        assert_eq!(
            created.mode,
            ServeMode::Fallback {
                reason: FallbackReason::Timeout
            }
        );
        assert_eq!(titles(&fx.store.fallback().list()), vec!["late"]);

        // The abandoned attempt still lands in the primary backend.
        let report = fx.store.policy.settle(Duration::from_secs(5)).await;
        assert_eq!(report.settled, 1);
        assert_eq!(report.succeeded, 1);

        fx.naming.faults().set_latency(Duration::ZERO);
        let listed = fx.store.list().await.unwrap();
        assert!(listed.mode.is_primary());
        assert_eq!(titles(&listed.value), vec!["warm-up", "late"]);
    }

    #[tokio::test]
    async fn invalid_patch_is_not_masked() {
        let fx = fixture(Duration::from_secs(5), FallbackTrigger::Transient);
        let id = fx.store.create(project("x")).await.unwrap().value;
        let err = fx.store.update(&id, json!([1])).await.unwrap_err();
        assert!(matches!(err, SdkError::Record(RecordError::InvalidPatch(_))));
    }

    #[tokio::test]
    async fn fallback_update_and_delete() {
        let fx = fixture(Duration::from_secs(5), FallbackTrigger::Transient);
        fx.content.faults().set_offline(true);
        fx.naming.faults().set_offline(true);

        let id = fx.store.create(project("x")).await.unwrap().value;
        let updated = fx
            .store
            .update(&id, json!({"title": "y"}))
            .await
            .unwrap();
        assert!(updated.value && updated.mode.is_fallback());
        assert_eq!(
            fx.store.get_by_id(&id).await.unwrap().value.unwrap().payload().title,
            "y"
        );
        assert!(fx.store.delete(&id).await.unwrap().value);
        assert!(fx.store.get_by_id(&id).await.unwrap().value.is_none());
    }

    #[tokio::test]
    async fn slow_reads_are_served_from_fallback() {
        let fx = fixture(Duration::from_millis(50), FallbackTrigger::Transient);
        let id = fx.store.create(project("on primary")).await.unwrap().value;
        fx.naming.faults().set_latency(Duration::from_millis(80));

        let listed = fx.store.list().await.unwrap();
        assert_eq!(
            listed.mode,
            ServeMode::Fallback {
                reason: FallbackReason::Timeout
            }
        );
        assert!(listed.value.is_empty());

        let got = fx.store.get_by_id(&id).await.unwrap();
        assert!(got.mode.is_fallback());
        assert!(got.value.is_none());

        let report = fx.store.policy.settle(Duration::from_secs(5)).await;
        assert_eq!(report.outstanding, 0);

        fx.naming.faults().set_latency(Duration::ZERO);
        let listed = fx.store.list().await.unwrap();
        assert!(listed.mode.is_primary());
        assert_eq!(titles(&listed.value), vec!["on primary"]);
    }

    #[tokio::test]
    async fn orphans_are_empty_in_fallback() {
        let fx = fixture(Duration::from_secs(5), FallbackTrigger::Transient);
        fx.naming.faults().set_offline(true);
        let orphans = fx.store.orphaned_keys().await.unwrap();
        assert!(orphans.mode.is_fallback());
        assert!(orphans.value.is_empty());
    }
}
