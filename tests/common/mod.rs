#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

use tour_admin::auth::SessionContext;
use tour_admin::controller::{ListController, NoticeLog};
use tour_admin::database::models::{Orderable, Publishable};
use tour_admin::database::{DatabaseError, Gateway, MemoryGateway, PublishGateway};

/// One request as seen by the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Insert { display_order: i32 },
    Update(Uuid),
    UpdateOrder(Uuid, i32),
    UpdatePublished(Uuid, bool),
    Delete(Uuid),
}

type Predicate = Box<dyn Fn(&Call) -> bool + Send + Sync>;

/// Gateway wrapper that records every request, fails the ones matching a
/// predicate, and can park one request until the test releases it.
pub struct ScriptedGateway<T> {
    store: MemoryGateway<T>,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_when: Arc<Mutex<Option<Predicate>>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl<T> Clone for ScriptedGateway<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            calls: Arc::clone(&self.calls),
            fail_when: Arc::clone(&self.fail_when),
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Handle for a parked request
pub struct Hold(Arc<Notify>);

impl Hold {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

impl<T: Orderable> ScriptedGateway<T> {
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            store: MemoryGateway::with_items(items),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn fail_when(&self, predicate: impl Fn(&Call) -> bool + Send + Sync + 'static) {
        *self.fail_when.lock().unwrap() = Some(Box::new(predicate));
    }

    pub fn succeed_always(&self) {
        *self.fail_when.lock().unwrap() = None;
    }

    /// Park the next request until `release` is called
    pub fn hold_next(&self) -> Hold {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        Hold(notify)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Every request except list fetches
    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| *c != Call::List).collect()
    }

    pub async fn stored(&self) -> Vec<T> {
        self.store.snapshot().await
    }

    async fn request(&self, call: Call) -> Result<(), DatabaseError> {
        self.calls.lock().unwrap().push(call.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let fails = self
            .fail_when
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|predicate| predicate(&call));
        if fails {
            return Err(DatabaseError::QueryError(format!("scripted failure on {:?}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Orderable> Gateway<T> for ScriptedGateway<T> {
    async fn insert(&self, tour_id: Uuid, draft: &T::Draft, display_order: i32) -> Result<T, DatabaseError> {
        self.request(Call::Insert { display_order }).await?;
        self.store.insert(tour_id, draft, display_order).await
    }

    async fn update(&self, id: Uuid, patch: &T::Patch) -> Result<(), DatabaseError> {
        self.request(Call::Update(id)).await?;
        self.store.update(id, patch).await
    }

    async fn update_display_order(&self, id: Uuid, display_order: i32) -> Result<(), DatabaseError> {
        self.request(Call::UpdateOrder(id, display_order)).await?;
        self.store.update_display_order(id, display_order).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.request(Call::Delete(id)).await?;
        self.store.delete(id).await
    }

    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<T>, DatabaseError> {
        self.request(Call::List).await?;
        self.store.list_by_tour(tour_id).await
    }
}

#[async_trait]
impl<T: Publishable> PublishGateway<T> for ScriptedGateway<T> {
    async fn update_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError> {
        self.request(Call::UpdatePublished(id, is_published)).await?;
        self.store.update_published(id, is_published).await
    }
}

pub fn admin_session(tour_id: Uuid) -> SessionContext {
    SessionContext::admin(Uuid::new_v4(), "admin@example.com", tour_id)
}

/// Controller over a scripted gateway seeded with `items`, already loaded
pub async fn loaded<T: Orderable>(
    tour_id: Uuid,
    items: Vec<T>,
) -> anyhow::Result<(ListController<T, ScriptedGateway<T>>, ScriptedGateway<T>, NoticeLog)> {
    let gateway = ScriptedGateway::with_items(items);
    let log = NoticeLog::new();
    let controller = ListController::load(
        admin_session(tour_id),
        None,
        gateway.clone(),
        Arc::new(log.clone()),
    )
    .await?;
    Ok((controller, gateway, log))
}
