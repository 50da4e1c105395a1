//! Action executor of one mounted listing view.
//!
//! [`ListingController`] owns a [`ListingState`] and runs the actions
//! [`handle_event`] returns: worker messages become Tokio tasks, debounce
//! actions drive the view's [`Debouncer`], filter changes go to the
//! [`FilterStore`] and refreshes invalidate the [`RemoteListCache`].
//!
//! The controller also watches its page in the [`FilterStore`]. Filters
//! written there by someone else, such as another view of the same page,
//! are applied as [`Event::ReplaceFilters`]; its own writes come back equal
//! to the view's filters and are ignored.
//!
//! Worker tasks live in a [`JoinSet`] owned by the controller. Dropping the
//! controller aborts the tasks still waiting on behalf of this view and
//! cancels its pending search; a request shared with another view keeps
//! running inside the cache.
//!
//! [`RemoteListCache`]: crate::cache::RemoteListCache

use super::{handle_event, Action, Event, ListingState};
use crate::domain::{ListingSpec, PageFilterState, PageFilters, Result};
use crate::infrastructure::Debouncer;
use crate::store::FilterStore;
use crate::worker::ListingWorker;
use crate::ListingContext;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};

enum Step {
    Event(Option<Event>),
    /// `false` once the store is gone.
    Filters(bool),
    Joined(Option<std::result::Result<(), JoinError>>),
}

/// Drives one listing view.
///
/// # Example
///
/// ```
/// use erp_listing::app::ListingController;
/// use erp_listing::domain::pages;
/// use erp_listing::transport::MemoryTransport;
/// use erp_listing::{initialize_with_transport, Config};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> erp_listing::Result<()> {
/// let transport = Arc::new(MemoryTransport::new());
/// transport.seed("positions", vec![json!({ "id": 1, "code": "CLK", "name": "Clerk" })]);
///
/// let context = initialize_with_transport(&Config::default(), transport)?;
/// let mut controller = ListingController::new(&context, pages::positions());
/// controller.mount()?;
/// controller.settle().await?;
///
/// assert_eq!(controller.state().rows.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ListingController {
    state: ListingState,
    store: FilterStore,
    worker: ListingWorker,
    debouncer: Debouncer<String>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    filters_rx: watch::Receiver<PageFilterState>,
    watching_store: bool,
    tasks: JoinSet<()>,
}

impl ListingController {
    /// Creates the controller for `spec`, starting from the filters the store
    /// holds for the page.
    #[must_use]
    pub fn new(context: &ListingContext, spec: ListingSpec) -> Self {
        let mut filters_rx = context.store.subscribe(&spec.page_id);
        let filters = filters_rx.borrow_and_update().clone();
        let state = ListingState::new(spec, filters, context.config.page_size, context.theme.clone());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let settled_tx = events_tx.clone();
        let debouncer = Debouncer::new(
            Duration::from_millis(context.config.debounce_ms),
            move |text: String| {
                if settled_tx.send(Event::SearchSettled(text)).is_err() {
                    tracing::debug!("listing view gone before search settled");
                }
            },
        );

        Self {
            state,
            store: context.store.clone(),
            worker: ListingWorker::new(context.cache.clone()),
            debouncer,
            events_tx,
            events_rx,
            filters_rx,
            watching_store: true,
            tasks: JoinSet::new(),
        }
    }

    /// Loads the first page.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event handler.
    pub fn mount(&mut self) -> Result<bool> {
        self.dispatch(Event::Mount)
    }

    /// Handles one event and executes the resulting actions.
    ///
    /// Returns whether the view needs to be redrawn. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event handler.
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let (render, actions) = handle_event(&mut self.state, &event)?;
        for action in actions {
            self.execute(action);
        }
        self.reap_finished();
        Ok(render)
    }

    /// Applies a typed filter set, keeping the current search text.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event handler.
    pub fn apply_typed<F: PageFilters>(&mut self, filters: &F) -> Result<bool> {
        if F::PAGE_ID != self.state.spec.page_id.as_str() {
            tracing::warn!(
                filters_page = F::PAGE_ID,
                page = %self.state.spec.page_id,
                "typed filters belong to another page, ignoring"
            );
            return Ok(false);
        }
        let next = filters.apply_to(&self.state.filters);
        self.dispatch(Event::ReplaceFilters(next))
    }

    /// Current filters of the view as the page's typed filter set.
    #[must_use]
    pub fn typed_filters<F: PageFilters>(&self) -> F {
        F::from_state(&self.state.filters)
    }

    /// Waits for the next debounced search, worker response or filter change
    /// made in the store.
    ///
    /// Returns `None` once no event can arrive anymore.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.take_store_change() {
                return Some(event);
            }
            let step = tokio::select! {
                event = self.events_rx.recv() => Step::Event(event),
                changed = self.filters_rx.changed(), if self.watching_store => Step::Filters(changed.is_ok()),
            };
            match step {
                Step::Event(event) => return event,
                Step::Filters(true) => {
                    if let Some(event) = self.stored_filters_event() {
                        return Some(event);
                    }
                }
                Step::Filters(false) => self.watching_store = false,
                Step::Joined(_) => {}
            }
        }
    }

    /// Waits for the next internal event and handles it.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event handler.
    pub async fn process_next(&mut self) -> Result<bool> {
        match self.next_event().await {
            Some(event) => self.dispatch(event),
            None => Ok(false),
        }
    }

    /// Handles internal events until no search is pending and no worker task
    /// is running.
    ///
    /// Returns whether any handled event asked for a redraw.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event handler.
    pub async fn settle(&mut self) -> Result<bool> {
        let mut render = false;
        loop {
            while let Ok(event) = self.events_rx.try_recv() {
                render |= self.dispatch(event)?;
            }
            if let Some(event) = self.take_store_change() {
                render |= self.dispatch(event)?;
                continue;
            }
            if self.tasks.is_empty() && !self.debouncer.is_pending() {
                // Tasks reaped during the drain may have answered after it.
                if self.events_rx.is_empty() {
                    return Ok(render);
                }
                continue;
            }

            let step = tokio::select! {
                event = self.events_rx.recv() => Step::Event(event),
                joined = self.tasks.join_next(), if !self.tasks.is_empty() => Step::Joined(joined),
                changed = self.filters_rx.changed(), if self.watching_store => Step::Filters(changed.is_ok()),
            };

            match step {
                Step::Event(Some(event)) => render |= self.dispatch(event)?,
                Step::Event(None) => return Ok(render),
                Step::Filters(true) => {
                    if let Some(event) = self.stored_filters_event() {
                        render |= self.dispatch(event)?;
                    }
                }
                Step::Filters(false) => self.watching_store = false,
                Step::Joined(Some(Err(e))) => log_join_error(&e),
                Step::Joined(_) => {}
            }
        }
    }

    /// Read-only view of the listing state, for rendering and inspection.
    #[must_use]
    pub const fn state(&self) -> &ListingState {
        &self.state
    }

    /// Worker tasks still running for this view.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Renders the current state to an ANSI frame.
    #[must_use]
    pub fn render(&self, rows: usize, cols: usize) -> String {
        crate::ui::render(&self.state, rows, cols)
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::PostToWorker(message) => {
                let worker = self.worker.clone();
                let events_tx = self.events_tx.clone();
                self.tasks.spawn(async move {
                    let response = worker.handle_message(message).await;
                    if events_tx.send(Event::WorkerResponse(response)).is_err() {
                        tracing::debug!("listing view gone before worker response");
                    }
                });
            }
            Action::Debounce(text) => self.debouncer.push(text),
            Action::CancelDebounce => self.debouncer.cancel(),
            Action::PersistFilters { page_id, state } => {
                self.store.set_page_filter(&page_id, state);
            }
            Action::InvalidateCache(resource) => {
                let marked = self.worker.cache().invalidate(&resource);
                tracing::debug!(resource = %resource, marked, "cache invalidated");
            }
        }
    }

    /// Turns an unseen store value that differs from the view's filters into
    /// a replace event.
    fn take_store_change(&mut self) -> Option<Event> {
        if !self.watching_store || !self.filters_rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.stored_filters_event()
    }

    fn stored_filters_event(&mut self) -> Option<Event> {
        let stored = self.filters_rx.borrow_and_update().clone();
        (stored != self.state.filters).then(|| {
            tracing::debug!(page = %self.state.spec.page_id, "filters changed in the store");
            Event::ReplaceFilters(stored)
        })
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                log_join_error(&e);
            }
        }
    }
}

fn log_join_error(error: &JoinError) {
    if error.is_cancelled() {
        tracing::debug!("worker task cancelled");
    } else {
        tracing::warn!(error = %error, "worker task panicked");
    }
}
