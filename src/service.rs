use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    future::Future,
    rc::Rc,
};

use futures::future::LocalBoxFuture;
use parse_display::Display;
use uuid::Uuid;

use crate::{EditRecord, Event, Field, NotLoadedError, RecordEditContext, Subscription};

/// Failure reported by a [`RecordBroker`].
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum DataError {
    #[display("record {0} not found")]
    NotFound(Uuid),
    #[display("{0}")]
    Rejected(String),
}
impl std::error::Error for DataError {}

/// The data layer behind an edit service.
///
/// Implementations talk to whatever store holds the records. The edit context never calls them directly.
pub trait RecordBroker<R> {
    fn get(&self, id: Uuid) -> LocalBoxFuture<'_, Result<R, DataError>>;
    fn add(&self, record: R) -> LocalBoxFuture<'_, Result<(), DataError>>;
    fn update(&self, record: R) -> LocalBoxFuture<'_, Result<(), DataError>>;
    fn delete(&self, id: Uuid) -> LocalBoxFuture<'_, Result<(), DataError>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The record was loaded into the edit context.
    Loaded,
    /// The broker failed. The edit context was left untouched.
    Failed(DataError),
    /// The edit context was dropped before the record arrived.
    Abandoned,
    /// A later load was started before this one completed.
    Superseded,
}

/// Connects one [`RecordEditContext`] to a [`RecordBroker`].
///
/// The context is shared with the UI scope through [`context_handle`](Self::context_handle).
/// Every mutation the service performs fires its notifications after releasing the context borrow.
pub struct RecordEditService<R: EditRecord, B> {
    broker: Rc<B>,
    context: Rc<RefCell<RecordEditContext<R>>>,
    load_generation: Rc<Cell<u64>>,
    list_changed: Event<()>,
}

impl<R: EditRecord, B: RecordBroker<R> + 'static> RecordEditService<R, B> {
    pub fn new(broker: B) -> Self {
        Self::with_context(Rc::new(broker), RecordEditContext::new())
    }

    pub fn with_context(broker: Rc<B>, context: RecordEditContext<R>) -> Self {
        Self {
            broker,
            context: Rc::new(RefCell::new(context)),
            load_generation: Rc::new(Cell::new(0)),
            list_changed: Event::new(),
        }
    }

    pub fn broker(&self) -> &Rc<B> {
        &self.broker
    }
    pub fn context(&self) -> Ref<'_, RecordEditContext<R>> {
        self.context.borrow()
    }
    pub fn context_mut(&self) -> RefMut<'_, RecordEditContext<R>> {
        self.context.borrow_mut()
    }
    pub fn context_handle(&self) -> Rc<RefCell<RecordEditContext<R>>> {
        self.context.clone()
    }

    /// Fetches record `id` and loads it into the edit context.
    ///
    /// The returned future does not borrow the service. Its result is applied only if
    /// the edit context is still alive and no later `load` was started in the meantime.
    pub fn load(&self, id: Uuid) -> impl Future<Output = LoadOutcome> + 'static {
        let broker = self.broker.clone();
        let context = Rc::downgrade(&self.context);
        let generation = self.load_generation.clone();
        let ticket = generation.get() + 1;
        generation.set(ticket);

        async move {
            let result = broker.get(id).await;
            let Some(context) = context.upgrade() else {
                tracing::debug!(%id, "edit context dropped before load completed");
                return LoadOutcome::Abandoned;
            };
            if generation.get() != ticket {
                tracing::debug!(%id, "load superseded by a later load");
                return LoadOutcome::Superseded;
            }
            match result {
                Ok(record) => {
                    let pending = context.borrow_mut().load_deferred(record);
                    pending.notify();
                    LoadOutcome::Loaded
                }
                Err(e) => {
                    tracing::warn!(%id, error = %e, "failed to load record");
                    LoadOutcome::Failed(e)
                }
            }
        }
    }

    /// Adds `record`, or the edited values under a fresh id when `None`.
    ///
    /// On success the edit context is rebased onto the added record.
    pub async fn add_record(&self, record: Option<R>) -> Result<R, DataError> {
        let record = record.unwrap_or_else(|| self.context.borrow().as_new_record());
        let result = self.broker.add(record.clone()).await;
        self.complete("add", result)?;
        self.rebase(&record);
        Ok(record)
    }

    /// Updates `record`, or the edited values when `None`.
    pub async fn update_record(&self, record: Option<R>) -> Result<R, DataError> {
        let record = record.unwrap_or_else(|| self.context.borrow().as_record());
        let result = self.broker.update(record.clone()).await;
        self.complete("update", result)?;
        self.rebase(&record);
        Ok(record)
    }

    pub async fn delete_record(&self, id: Uuid) -> Result<(), DataError> {
        let result = self.broker.delete(id).await;
        self.complete("delete", result)
    }

    /// Writes `value` into `field` of the shared context.
    ///
    /// Handlers run after the context borrow is released, so they may read the context.
    pub fn set<T: PartialEq>(&self, field: Field<R, T>, value: T) -> Result<bool, NotLoadedError> {
        let pending = self.context.borrow_mut().set_deferred(field, value)?;
        let is_changed = !pending.is_empty();
        pending.notify();
        Ok(is_changed)
    }

    /// Discards every edit of the shared context.
    pub fn reset(&self) -> Result<(), NotLoadedError> {
        let pending = self.context.borrow_mut().reset_deferred()?;
        pending.notify();
        Ok(())
    }

    /// Subscribes to successful add, update and delete commands.
    pub fn on_list_changed(&self, f: impl Fn() + 'static) -> Subscription {
        self.list_changed.subscribe(move |_| f())
    }

    fn complete(&self, operation: &'static str, result: Result<(), DataError>) -> Result<(), DataError> {
        match result {
            Ok(()) => {
                tracing::debug!(operation, "record command completed");
                self.list_changed.emit(&());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "data broker rejected command");
                Err(e)
            }
        }
    }

    /// Makes `record` the baseline of the edit context.
    ///
    /// A load still in flight would overwrite it, so it is superseded.
    fn rebase(&self, record: &R) {
        self.load_generation.set(self.load_generation.get() + 1);
        let pending = {
            let mut context = self.context.borrow_mut();
            let saved = if context.as_record() == *record {
                // fails only when unloaded, which loads the record instead
                context.save_deferred().ok()
            } else {
                None
            };
            saved.unwrap_or_else(|| context.load_deferred(record.clone()))
        };
        pending.notify();
    }
}

impl<R: EditRecord + std::fmt::Debug, B> std::fmt::Debug for RecordEditService<R, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordEditService")
            .field("context", &self.context)
            .field("list_changed", &self.list_changed)
            .finish_non_exhaustive()
    }
}
