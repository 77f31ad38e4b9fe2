use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::SessionContext;
use crate::collection::{CollectionError, OrderedCollection};
use crate::controller::notice::{Notice, Notifier};
use crate::database::gateway::{Gateway, PublishGateway};
use crate::database::models::{Orderable, Publishable};
use crate::drag::DragSortSurface;
use crate::error::ListError;
use crate::types::Mutation;

/// Which edit surface is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    Create,
    Edit(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Applied locally and confirmed remotely
    Committed,
    /// Dropped on its origin; nothing to do
    Unchanged,
    /// Another reorder is still confirming; ignored
    InFlight,
}

#[derive(Debug)]
struct ListState<T> {
    items: OrderedCollection<T>,
    editor: Option<Editor>,
    pending_delete: Option<Uuid>,
}

/// Holds a busy flag for the lifetime of one request
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Local-first controller for one tour's sibling set of `T`.
///
/// Local state is never locked across a gateway call. Reorders are applied
/// before the request and rolled back wholesale if it fails; create, update
/// and delete only touch local state once the gateway has answered.
pub struct ListController<T: Orderable, G> {
    session: SessionContext,
    tour_id: Uuid,
    gateway: G,
    notifier: Arc<dyn Notifier>,
    state: RwLock<ListState<T>>,
    reordering: AtomicBool,
    saving: AtomicBool,
    deleting: AtomicBool,
}

impl<T: Orderable, G: Gateway<T>> ListController<T, G> {
    /// Build an empty controller scoped to the session's tour
    pub fn new(
        session: SessionContext,
        requested_tour: Option<Uuid>,
        gateway: G,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ListError> {
        let tour_id = session.resolve_tour(requested_tour)?;
        Ok(Self {
            session,
            tour_id,
            gateway,
            notifier,
            state: RwLock::new(ListState {
                items: OrderedCollection::default(),
                editor: None,
                pending_delete: None,
            }),
            reordering: AtomicBool::new(false),
            saving: AtomicBool::new(false),
            deleting: AtomicBool::new(false),
        })
    }

    /// Build and fetch the initial sibling set
    pub async fn load(
        session: SessionContext,
        requested_tour: Option<Uuid>,
        gateway: G,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ListError> {
        let controller = Self::new(session, requested_tour, gateway, notifier)?;
        controller.refresh().await?;
        Ok(controller)
    }

    pub fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Entities in render order
    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.to_sorted_vec()
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        self.state.read().await.items.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.load(Ordering::Acquire)
    }

    pub fn is_reordering(&self) -> bool {
        self.reordering.load(Ordering::Acquire)
    }

    pub async fn editor(&self) -> Option<Editor> {
        self.state.read().await.editor
    }

    pub async fn open_create(&self) {
        self.state.write().await.editor = Some(Editor::Create);
    }

    pub async fn open_edit(&self, id: Uuid) -> Result<(), ListError> {
        let mut state = self.state.write().await;
        if !state.items.contains(id) {
            return Err(self.not_found(id));
        }
        state.editor = Some(Editor::Edit(id));
        Ok(())
    }

    pub async fn close_editor(&self) {
        self.state.write().await.editor = None;
    }

    /// Replace local state with the store's current sibling set
    pub async fn refresh(&self) -> Result<usize, ListError> {
        match self.gateway.list_by_tour(self.tour_id).await {
            Ok(rows) => {
                let count = rows.len();
                self.state.write().await.items = OrderedCollection::new(rows);
                debug!("Loaded {} {} for tour {}", count, T::PLURAL, self.tour_id);
                Ok(count)
            }
            Err(e) => Err(self.fail(Mutation::Refresh, e.into())),
        }
    }

    /// Validate, insert at the end of the list, then append the stored row
    pub async fn create(&self, draft: T::Draft) -> Result<T, ListError> {
        T::validate_draft(&draft)?;
        let _busy = FlagGuard::acquire(&self.saving).ok_or(ListError::Busy("save"))?;

        let display_order = self.state.read().await.items.next_display_order();

        match self.gateway.insert(self.tour_id, &draft, display_order).await {
            Ok(row) => {
                let mut state = self.state.write().await;
                state.items = state.items.with_upserted(row.clone());
                state.editor = None;
                drop(state);

                info!("Created {} {} at position {}", T::LABEL, row.id(), display_order);
                self.notifier.notify(Notice::succeeded::<T>("created"));
                Ok(row)
            }
            Err(e) => Err(self.fail(Mutation::Create, e.into())),
        }
    }

    /// Send `patch` for `id` and merge it locally once stored
    pub async fn update(&self, id: Uuid, patch: T::Patch) -> Result<(), ListError> {
        T::validate_patch(&patch)?;
        if !self.state.read().await.items.contains(id) {
            return Err(self.not_found(id));
        }
        let _busy = FlagGuard::acquire(&self.saving).ok_or(ListError::Busy("save"))?;

        match self.gateway.update(id, &patch).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                if let Some(next) = state.items.with_updated(id, |entity| entity.apply_patch(&patch)) {
                    state.items = next;
                }
                state.editor = None;
                drop(state);

                info!("Updated {} {}", T::LABEL, id);
                self.notifier.notify(Notice::succeeded::<T>("updated"));
                Ok(())
            }
            Err(e) => Err(self.fail(Mutation::Update, e.into())),
        }
    }

    /// Arm a delete; nothing is sent until `confirm_delete`
    pub async fn request_delete(&self, id: Uuid) -> Result<(), ListError> {
        let mut state = self.state.write().await;
        if !state.items.contains(id) {
            return Err(self.not_found(id));
        }
        state.pending_delete = Some(id);
        Ok(())
    }

    pub async fn cancel_delete(&self) {
        self.state.write().await.pending_delete = None;
    }

    pub async fn pending_delete(&self) -> Option<Uuid> {
        self.state.read().await.pending_delete
    }

    /// Delete the armed entity. A failed delete stays armed so it can be retried.
    pub async fn confirm_delete(&self) -> Result<Uuid, ListError> {
        let id = self
            .state
            .read()
            .await
            .pending_delete
            .ok_or(ListError::ConfirmationRequired)?;
        let _busy = FlagGuard::acquire(&self.deleting).ok_or(ListError::Busy("delete"))?;

        match self.gateway.delete(id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.items = state.items.with_removed(id);
                state.pending_delete = None;
                if state.editor == Some(Editor::Edit(id)) {
                    state.editor = None;
                }
                drop(state);

                info!("Deleted {} {}", T::LABEL, id);
                self.notifier.notify(Notice::succeeded::<T>("deleted"));
                Ok(id)
            }
            Err(e) => Err(self.fail(Mutation::Delete, e.into())),
        }
    }

    /// Move the entity at sorted position `from` to `to`.
    ///
    /// The new order is visible before the confirmation batch is sent. Only
    /// entities whose `display_order` changed are written. If the batch fails
    /// every entity from the pre-move snapshot gets its old order back.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<ReorderOutcome, ListError> {
        let Some(_busy) = FlagGuard::acquire(&self.reordering) else {
            debug!("Ignoring reorder {} -> {} while another is in flight", from, to);
            return Ok(ReorderOutcome::InFlight);
        };

        let (snapshot, changed) = {
            let mut state = self.state.write().await;
            let len = state.items.len();
            for index in [from, to] {
                if index >= len {
                    return Err(CollectionError::IndexOutOfRange { index, len }.into());
                }
            }
            if from == to {
                return Ok(ReorderOutcome::Unchanged);
            }

            let snapshot = state.items.clone();
            let next = snapshot.with_reordered(from, to)?;
            let changed = next.changed_orders(&snapshot);
            state.items = next;
            (snapshot, changed)
        };

        if changed.is_empty() {
            return Ok(ReorderOutcome::Committed);
        }

        match self.gateway.update_orders(&changed).await {
            Ok(()) => {
                info!("Reordered {} ({} -> {}), {} rows confirmed", T::PLURAL, from, to, changed.len());
                Ok(ReorderOutcome::Committed)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.items = state.items.with_orders_restored(&snapshot);
                drop(state);
                warn!("Rolled back reorder of {} after failed confirmation", T::PLURAL);
                Err(self.fail(Mutation::Reorder, e.into()))
            }
        }
    }

    fn not_found(&self, id: Uuid) -> ListError {
        ListError::NotFound { label: T::LABEL, id }
    }

    /// Log, notify, and hand the error back
    fn fail(&self, mutation: Mutation, err: ListError) -> ListError {
        if let ListError::Remote(db) = &err {
            warn!(
                mutation = ?mutation,
                tour_id = %self.tour_id,
                "{} request failed: {}",
                T::LABEL,
                db.public_message()
            );
        }
        self.notifier.notify(Notice::failed::<T>(mutation));
        err
    }
}

impl<T: Publishable, G: PublishGateway<T>> ListController<T, G> {
    /// Flip visibility locally, then confirm. Returns the new value.
    pub async fn toggle_published(&self, id: Uuid) -> Result<bool, ListError> {
        let previous = {
            let mut state = self.state.write().await;
            let previous = state
                .items
                .get(id)
                .map(Publishable::is_published)
                .ok_or_else(|| self.not_found(id))?;
            if let Some(next) = state.items.with_updated(id, |entity| entity.set_published(!previous)) {
                state.items = next;
            }
            previous
        };

        match self.gateway.update_published(id, !previous).await {
            Ok(()) => {
                let outcome = if previous { "unpublished" } else { "published" };
                info!("{} {} {}", T::LABEL, id, outcome);
                self.notifier.notify(Notice::succeeded::<T>(outcome));
                Ok(!previous)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                if let Some(reverted) = state.items.with_updated(id, |entity| entity.set_published(previous)) {
                    state.items = reverted;
                }
                drop(state);
                Err(self.fail(Mutation::TogglePublished, e.into()))
            }
        }
    }
}

#[async_trait]
impl<T: Orderable, G: Gateway<T>> DragSortSurface for ListController<T, G> {
    async fn on_reorder_committed(&self, from: usize, to: usize) {
        // Remote failures are already rolled back and surfaced as notices
        if let Err(ListError::Collection(e)) = self.reorder(from, to).await {
            warn!("Discarded drop outside the list: {}", e);
        }
    }
}
