//! Event handling and state transitions of a listing view.
//!
//! [`handle_event`] is the only place where [`ListingState`] changes. It is
//! synchronous and free of I/O: fetches, debounce timers, filter persistence
//! and cache invalidation are returned as [`Action`]s.
//!
//! # Event Types
//!
//! - **Search**: `Char`, `Backspace`, `SearchInput`, `SearchSettled`
//! - **Filters**: `SetFilter`, `ReplaceFilters`, `ClearFilters`
//! - **Table**: `PageChange`, `PageSizeChange`, `ToggleSort`, `KeyUp`, `KeyDown`
//! - **Data**: `Mount`, `Refresh`, `Mutate`, `DeleteSelected`, `WorkerResponse`
//!
//! Every change of a filter or of the settled search resets the page index in
//! the same update that starts the new fetch, so no state ever pairs the new
//! filter with the old page.
//!
//! # Example
//!
//! ```
//! use erp_listing::app::{handle_event, Action, Event, ListingState};
//! use erp_listing::domain::{pages, FilterValue, PageFilterState};
//! use erp_listing::ui::Theme;
//!
//! let mut state = ListingState::new(pages::purchase_orders(), PageFilterState::default(), 10, Theme::default());
//! state.pagination.page_index = 2;
//!
//! let (render, actions) = handle_event(&mut state, &Event::SetFilter {
//!     key: "status".into(),
//!     value: FilterValue::parse("pending_approval"),
//! })?;
//!
//! assert!(render);
//! assert_eq!(state.pagination.page_index, 0);
//! assert!(matches!(actions.last(), Some(Action::PostToWorker(_))));
//! # Ok::<(), erp_listing::ListingError>(())
//! ```

use super::status::{LoadStatus, Notification};
use super::{Action, ListingState};
use crate::domain::{FilterValue, Mutation, PageFilterState, PaginationState, Result};
use crate::worker::{WorkerMessage, WorkerResponse};

/// Input to a listing view: user interaction, timers and worker responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The view was mounted; loads the first page.
    Mount,

    /// Appends a character to the search input.
    Char(char),
    /// Removes the last character of the search input.
    Backspace,
    /// Replaces the search input.
    SearchInput(String),
    /// The search input has been quiet for the debounce period.
    SearchSettled(String),

    /// Selects a value in one filter control.
    SetFilter { key: String, value: FilterValue },
    /// Replaces every filter at once, keeping the given search text.
    ReplaceFilters(PageFilterState),
    /// Clears search and filters.
    ClearFilters,

    /// Moves to a zero-based page index.
    PageChange(usize),
    /// Changes the number of rows per page.
    PageSizeChange(usize),
    /// Cycles the sort of a column.
    ToggleSort(String),

    /// Moves the selection down (wraps to top).
    KeyDown,
    /// Moves the selection up (wraps to bottom).
    KeyUp,

    /// Drops cached pages of the resource and reloads the current one.
    Refresh,
    /// Creates, updates or deletes a record of the listed resource.
    Mutate(Mutation),
    /// Deletes the selected row.
    DeleteSelected,
    /// Hides the current notification.
    DismissNotification,

    /// Response from the fetch worker.
    WorkerResponse(WorkerResponse),
}

/// Processes an event, mutates the listing state and returns the actions to execute.
///
/// The boolean tells the caller whether the view needs to be redrawn.
///
/// # Errors
///
/// Currently infallible; the `Result` keeps the signature stable for
/// handlers that need to validate input.
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut ListingState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", page = %state.spec.page_id, event_type = ?event).entered();

    match event {
        Event::Mount => Ok((true, vec![state.begin_fetch()])),

        Event::Char(c) => {
            state.search_input.push(*c);
            tracing::trace!(query = %state.search_input, "search input updated");
            Ok((true, vec![Action::Debounce(state.search_input.clone())]))
        }
        Event::Backspace => {
            if state.search_input.pop().is_none() {
                return Ok((false, vec![]));
            }
            Ok((true, vec![Action::Debounce(state.search_input.clone())]))
        }
        Event::SearchInput(text) => {
            if &state.search_input == text {
                return Ok((false, vec![]));
            }
            state.search_input.clone_from(text);
            Ok((true, vec![Action::Debounce(text.clone())]))
        }
        Event::SearchSettled(text) => {
            if state.filters.search == *text {
                tracing::debug!("settled search unchanged, skipping fetch");
                return Ok((false, vec![]));
            }
            let filters = state.filters.with_search(text.clone());
            Ok((true, apply_filters(state, filters)))
        }

        Event::SetFilter { key, value } => {
            // `all` and empty text both mean no filter.
            if state.filters.get(key).as_param() == value.as_param() {
                return Ok((false, vec![]));
            }
            let filters = state.filters.with_filter(key.clone(), value.clone());
            Ok((true, apply_filters(state, filters)))
        }
        Event::ReplaceFilters(filters) => {
            if state.filters == *filters {
                return Ok((false, vec![]));
            }
            if state.filters.search != filters.search {
                state.search_input.clone_from(&filters.search);
            }
            Ok((true, apply_filters(state, filters.clone())))
        }
        Event::ClearFilters => {
            let mut actions = vec![Action::CancelDebounce];
            state.search_input.clear();
            if state.filters == PageFilterState::default() {
                return Ok((true, actions));
            }
            actions.extend(apply_filters(state, PageFilterState::default()));
            Ok((true, actions))
        }

        Event::PageChange(page_index) => {
            let last_page = state.page_count.max(1) - 1;
            if *page_index == state.pagination.page_index || *page_index > last_page {
                tracing::debug!(page_index, last_page, "page change ignored");
                return Ok((false, vec![]));
            }
            state.pagination.page_index = *page_index;
            state.selected_index = 0;
            Ok((true, vec![state.begin_fetch()]))
        }
        Event::PageSizeChange(page_size) => {
            if *page_size == 0 || *page_size == state.pagination.page_size {
                return Ok((false, vec![]));
            }
            state.pagination = PaginationState::first(*page_size);
            state.selected_index = 0;
            Ok((true, vec![state.begin_fetch()]))
        }
        Event::ToggleSort(column_id) => {
            let sortable = state
                .spec
                .column(column_id)
                .is_some_and(|column| column.sortable);
            if !sortable {
                tracing::debug!(column = %column_id, "column is not sortable");
                return Ok((false, vec![]));
            }
            state.sorting = state.sorting.toggle(column_id);
            Ok((true, vec![state.begin_fetch()]))
        }

        Event::KeyDown => {
            state.move_selection_down();
            Ok((true, vec![]))
        }
        Event::KeyUp => {
            state.move_selection_up();
            Ok((true, vec![]))
        }

        Event::Refresh => {
            let invalidate = Action::InvalidateCache(state.spec.resource.clone());
            Ok((true, vec![invalidate, state.begin_fetch()]))
        }
        Event::Mutate(mutation) => {
            tracing::debug!(op = mutation.verb(), "posting mutation");
            Ok((
                false,
                vec![Action::PostToWorker(WorkerMessage::mutate(
                    state.spec.resource.clone(),
                    mutation.clone(),
                ))],
            ))
        }
        Event::DeleteSelected => {
            let Some(id) = state.selected_id() else {
                state.notification = Some(Notification::error("No row selected"));
                return Ok((true, vec![]));
            };
            handle_event(state, &Event::Mutate(Mutation::Delete { id }))
        }
        Event::DismissNotification => Ok((state.notification.take().is_some(), vec![])),

        Event::WorkerResponse(response) => Ok(handle_worker_response(state, response)),
    }
}

/// Stores new filters, resets the page and starts the fetch in one update.
fn apply_filters(state: &mut ListingState, filters: PageFilterState) -> Vec<Action> {
    state.filters = filters;
    state.pagination = state.pagination.reset();
    state.selected_index = 0;

    vec![
        Action::PersistFilters {
            page_id: state.spec.page_id.clone(),
            state: state.filters.clone(),
        },
        state.begin_fetch(),
    ]
}

fn handle_worker_response(state: &mut ListingState, response: &WorkerResponse) -> (bool, Vec<Action>) {
    match response {
        WorkerResponse::ListLoaded {
            resource,
            params,
            result,
        } => {
            if *resource != state.spec.resource || !state.is_current(params) {
                tracing::debug!(params = %params, "discarding stale list response");
                return (false, vec![]);
            }
            state.status = LoadStatus::Success;
            state.set_rows(result.results.clone(), result.count, result.page_count);
            (true, vec![])
        }
        WorkerResponse::ListFailed {
            resource,
            params,
            error,
        } => {
            if *resource != state.spec.resource || !state.is_current(params) {
                tracing::debug!(params = %params, "discarding stale list failure");
                return (false, vec![]);
            }
            tracing::debug!(error = %error, "page load failed");
            state.status = LoadStatus::Error(error.message.clone());
            state.set_rows(Vec::new(), 0, 0);
            (true, vec![])
        }
        WorkerResponse::MutationApplied {
            resource, mutation, ..
        } => {
            if *resource != state.spec.resource {
                return (false, vec![]);
            }
            let message = match mutation {
                Mutation::Create { .. } => "Record created".to_string(),
                Mutation::Update { id, .. } => format!("Record {id} updated"),
                Mutation::Delete { id } => format!("Record {id} deleted"),
            };
            state.notification = Some(Notification::success(message));

            if matches!(mutation, Mutation::Delete { .. })
                && state.rows.len() == 1
                && state.pagination.page_index > 0
            {
                state.pagination.page_index -= 1;
            }
            (true, vec![state.begin_fetch()])
        }
        WorkerResponse::MutationFailed {
            resource,
            mutation,
            error,
        } => {
            if *resource != state.spec.resource {
                return (false, vec![]);
            }
            state.notification = Some(Notification::error(format!(
                "Could not {} record: {}",
                mutation.verb(),
                error.message
            )));
            (true, vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::status::NotificationKind;
    use crate::domain::{pages, FetchFailure, QueryParams, RemoteListResult, ResourceKey};
    use crate::ui::Theme;
    use serde_json::json;
    use std::sync::Arc;

    fn purchase_orders() -> ListingState {
        ListingState::new(pages::purchase_orders(), PageFilterState::default(), 10, Theme::default())
    }

    fn fetched_params(actions: &[Action]) -> QueryParams {
        actions
            .iter()
            .find_map(|action| match action {
                Action::PostToWorker(WorkerMessage::FetchList { params, .. }) => Some(params.clone()),
                _ => None,
            })
            .expect("a fetch action")
    }

    fn loaded(state: &ListingState, rows: Vec<serde_json::Value>, count: u64) -> Event {
        Event::WorkerResponse(WorkerResponse::ListLoaded {
            resource: state.spec.resource.clone(),
            params: state.requested.clone().unwrap(),
            result: Arc::new(RemoteListResult {
                page_count: (count as usize).div_ceil(10),
                results: rows,
                count,
            }),
        })
    }

    #[test]
    fn typing_only_debounces() {
        let mut state = purchase_orders();
        let (_, actions) = handle_event(&mut state, &Event::Char('A')).unwrap();
        let (_, more) = handle_event(&mut state, &Event::Char('C')).unwrap();

        assert_eq!(actions, vec![Action::Debounce("A".into())]);
        assert_eq!(more, vec![Action::Debounce("AC".into())]);
        assert!(state.requested.is_none());
        assert_eq!(state.filters.search, "");
    }

    #[test]
    fn settled_search_resets_page_and_fetches() {
        let mut state = purchase_orders();
        state.pagination.page_index = 4;
        state.search_input = "ACME".into();

        let (render, actions) = handle_event(&mut state, &Event::SearchSettled("ACME".into())).unwrap();

        assert!(render);
        assert_eq!(state.pagination.page_index, 0);
        assert_eq!(state.status, LoadStatus::Loading);
        let params = fetched_params(&actions);
        assert_eq!(params.get("search"), Some("ACME"));
        assert_eq!(params.get("page"), Some("1"));
        assert!(matches!(&actions[0], Action::PersistFilters { state, .. } if state.search == "ACME"));

        let (render, actions) = handle_event(&mut state, &Event::SearchSettled("ACME".into())).unwrap();
        assert!(!render);
        assert!(actions.is_empty());
    }

    #[test]
    fn filter_change_on_page_three_loads_page_one() {
        let mut state = purchase_orders();
        state.pagination.page_index = 2;

        let (_, actions) = handle_event(
            &mut state,
            &Event::SetFilter {
                key: "status".into(),
                value: FilterValue::parse("pending_approval"),
            },
        )
        .unwrap();

        assert_eq!(state.pagination.page_index, 0);
        let params = fetched_params(&actions);
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("status"), Some("pending_approval"));
        assert!(!params.contains("priority"));
        assert_eq!(state.requested.as_ref(), Some(&params));
    }

    #[test]
    fn blank_filter_on_unfiltered_key_changes_nothing() {
        let mut state = purchase_orders();
        state.pagination.page_index = 2;

        let (render, actions) = handle_event(
            &mut state,
            &Event::SetFilter {
                key: "status".into(),
                value: FilterValue::Text(String::new()),
            },
        )
        .unwrap();

        assert!(!render);
        assert!(actions.is_empty());
        assert_eq!(state.pagination.page_index, 2);

        state.filters = state.filters.with_filter("status", FilterValue::parse("approved"));
        let (render, actions) = handle_event(
            &mut state,
            &Event::SetFilter {
                key: "status".into(),
                value: FilterValue::Text(String::new()),
            },
        )
        .unwrap();
        assert!(render);
        assert!(!fetched_params(&actions).contains("status"));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut state = purchase_orders();
        state.page_count = 3;
        let (_, first) = handle_event(&mut state, &Event::Mount).unwrap();
        let stale_params = fetched_params(&first);
        handle_event(&mut state, &Event::PageChange(1)).unwrap();

        let stale = Event::WorkerResponse(WorkerResponse::ListLoaded {
            resource: state.spec.resource.clone(),
            params: stale_params,
            result: Arc::new(RemoteListResult {
                results: vec![json!({ "id": 1 })],
                count: 25,
                page_count: 3,
            }),
        });
        let (render, _) = handle_event(&mut state, &stale).unwrap();
        assert!(!render);
        assert_eq!(state.status, LoadStatus::Loading);
        assert!(state.rows.is_empty());

        let fresh = loaded(&state, vec![json!({ "id": 11 })], 25);
        handle_event(&mut state, &fresh).unwrap();
        assert_eq!(state.status, LoadStatus::Success);
        assert_eq!(state.rows, vec![json!({ "id": 11 })]);
    }

    #[test]
    fn page_change_is_bounded() {
        let mut state = purchase_orders();
        state.page_count = 2;
        assert!(!handle_event(&mut state, &Event::PageChange(0)).unwrap().0);
        assert!(!handle_event(&mut state, &Event::PageChange(2)).unwrap().0);
        let (render, actions) = handle_event(&mut state, &Event::PageChange(1)).unwrap();
        assert!(render);
        assert_eq!(fetched_params(&actions).get("page"), Some("2"));
    }

    #[test]
    fn sort_toggles_only_sortable_columns() {
        let mut state = ListingState::new(pages::salary_slips(), PageFilterState::default(), 10, Theme::default());

        let (render, actions) = handle_event(&mut state, &Event::ToggleSort("paid".into())).unwrap();
        assert!(!render);
        assert!(actions.is_empty());

        let (_, actions) = handle_event(&mut state, &Event::ToggleSort("net_pay".into())).unwrap();
        assert_eq!(fetched_params(&actions).get("ordering"), Some("net_pay"));
        let (_, actions) = handle_event(&mut state, &Event::ToggleSort("net_pay".into())).unwrap();
        assert_eq!(fetched_params(&actions).get("ordering"), Some("-net_pay"));
        let (_, actions) = handle_event(&mut state, &Event::ToggleSort("net_pay".into())).unwrap();
        assert!(!fetched_params(&actions).contains("ordering"));
    }

    #[test]
    fn page_size_change_resets_page() {
        let mut state = purchase_orders();
        state.pagination.page_index = 3;
        assert!(!handle_event(&mut state, &Event::PageSizeChange(0)).unwrap().0);

        let (_, actions) = handle_event(&mut state, &Event::PageSizeChange(25)).unwrap();
        let params = fetched_params(&actions);
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("page_size"), Some("25"));
    }

    #[test]
    fn clear_filters_cancels_pending_search() {
        let mut state = purchase_orders();
        state.filters = state.filters.with_filter("priority", FilterValue::parse("high"));
        state.search_input = "AC".into();

        let (_, actions) = handle_event(&mut state, &Event::ClearFilters).unwrap();

        assert_eq!(actions[0], Action::CancelDebounce);
        assert!(state.search_input.is_empty());
        assert_eq!(state.filters, PageFilterState::default());
        assert!(!fetched_params(&actions).contains("priority"));
    }

    #[test]
    fn refresh_invalidates_before_fetching() {
        let mut state = purchase_orders();
        let (_, actions) = handle_event(&mut state, &Event::Refresh).unwrap();
        assert_eq!(actions[0], Action::InvalidateCache(ResourceKey::new("purchase-orders")));
        assert!(matches!(actions[1], Action::PostToWorker(WorkerMessage::FetchList { .. })));
    }

    #[test]
    fn delete_of_last_row_steps_back_a_page() {
        let mut state = purchase_orders();
        state.page_count = 2;
        handle_event(&mut state, &Event::PageChange(1)).unwrap();
        let event = loaded(&state, vec![json!({ "id": 11 })], 11);
        handle_event(&mut state, &event).unwrap();

        let (_, actions) = handle_event(&mut state, &Event::DeleteSelected).unwrap();
        let Action::PostToWorker(WorkerMessage::Mutate { mutation, .. }) = &actions[0] else {
            panic!("expected a mutation");
        };
        assert_eq!(mutation, &Mutation::Delete { id: "11".into() });

        let applied = Event::WorkerResponse(WorkerResponse::MutationApplied {
            resource: state.spec.resource.clone(),
            mutation: mutation.clone(),
            record: None,
        });
        let (_, actions) = handle_event(&mut state, &applied).unwrap();

        assert_eq!(state.pagination.page_index, 0);
        assert_eq!(fetched_params(&actions).get("page"), Some("1"));
        assert_eq!(state.notification.as_ref().map(|n| n.kind), Some(NotificationKind::Success));
    }

    #[test]
    fn failed_mutation_notifies_without_refetch() {
        let mut state = purchase_orders();
        let failed = Event::WorkerResponse(WorkerResponse::MutationFailed {
            resource: state.spec.resource.clone(),
            mutation: Mutation::Delete { id: "7".into() },
            error: FetchFailure {
                status: Some(409),
                message: "Order is already approved.".into(),
            },
        });

        let (render, actions) = handle_event(&mut state, &failed).unwrap();

        assert!(render);
        assert!(actions.is_empty());
        let notification = state.notification.clone().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "Could not delete record: Order is already approved.");

        assert!(handle_event(&mut state, &Event::DismissNotification).unwrap().0);
        assert!(state.notification.is_none());
    }

    #[test]
    fn delete_without_selection_reports_error() {
        let mut state = purchase_orders();
        let (render, actions) = handle_event(&mut state, &Event::DeleteSelected).unwrap();
        assert!(render);
        assert!(actions.is_empty());
        assert_eq!(state.notification, Some(Notification::error("No row selected")));
    }

    #[test]
    fn load_failure_shows_error() {
        let mut state = purchase_orders();
        handle_event(&mut state, &Event::Mount).unwrap();
        let failed = Event::WorkerResponse(WorkerResponse::ListFailed {
            resource: state.spec.resource.clone(),
            params: state.requested.clone().unwrap(),
            error: FetchFailure {
                status: None,
                message: "connection refused".into(),
            },
        });
        handle_event(&mut state, &failed).unwrap();
        assert_eq!(state.status, LoadStatus::Error("connection refused".into()));
    }
}
