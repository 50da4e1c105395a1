//! Listing view state and view model computation.
//!
//! [`ListingState`] is the single source of truth for one mounted listing:
//! pagination, sorting, the raw and settled search, filters, the rows of the
//! last accepted response and the parameters of the latest request.
//!
//! # Example
//!
//! ```
//! use erp_listing::app::ListingState;
//! use erp_listing::domain::{pages, PageFilterState};
//! use erp_listing::ui::Theme;
//!
//! let state = ListingState::new(pages::positions(), PageFilterState::default(), 10, Theme::default());
//! let params = state.current_query();
//! assert_eq!(params.to_string(), "page=1&page_size=10");
//! ```

use super::actions::Action;
use super::status::{LoadStatus, Notification};
use crate::domain::{
    build_query, ListingSpec, PageFilterState, PaginationState, QueryInput, QueryParams,
    SortState,
};
use crate::ui::helpers::{highlight_ranges, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    ColumnHeader, DisplayCell, DisplayRow, EmptyState, FilterChip, FooterInfo, HeaderInfo,
    SearchBarInfo, TableBody, TableViewModel,
};
use crate::worker::WorkerMessage;
use serde_json::Value;

/// Rows taken by header, borders, column headers, footer and notification.
const CHROME_ROWS: usize = 7;

/// Extra rows taken by the search box and the filter chip line.
const SEARCH_ROWS: usize = 3;
const CHIP_ROWS: usize = 1;

/// State of one mounted listing view.
#[derive(Debug, Clone)]
pub struct ListingState {
    /// Page being listed.
    pub spec: ListingSpec,

    /// Colors used when rendering this view.
    pub theme: Theme,

    /// Zero-based page index and page size of the next request.
    pub pagination: PaginationState,

    /// Column sort sent as `ordering`; sort changes keep the page index.
    pub sorting: SortState,

    /// Search input as typed; only its debounced value reaches `filters.search`.
    pub search_input: String,

    /// Settled search and filter selections, mirrored to the filter store.
    pub filters: PageFilterState,

    /// Load state of the latest request. A failed load clears the rows.
    pub status: LoadStatus,

    /// Rows of the last accepted response.
    pub rows: Vec<Value>,

    /// Total row count reported by the server.
    pub count: u64,

    /// Pages at the current page size, 0 for an empty result.
    pub page_count: usize,

    /// Parameters of the latest request. Responses for anything else are stale.
    pub requested: Option<QueryParams>,

    /// Zero-based index into `rows`.
    pub selected_index: usize,

    /// Outcome of the last mutation, shown until dismissed or replaced.
    pub notification: Option<Notification>,
}

impl ListingState {
    /// Creates the state of a freshly mounted listing.
    ///
    /// `filters` is what the filter store holds for the page; the search box
    /// starts out showing its settled search.
    #[must_use]
    pub fn new(spec: ListingSpec, filters: PageFilterState, page_size: usize, theme: Theme) -> Self {
        Self {
            spec,
            theme,
            pagination: PaginationState::first(page_size),
            sorting: SortState::unsorted(),
            search_input: filters.search.clone(),
            filters,
            status: LoadStatus::Idle,
            rows: Vec::new(),
            count: 0,
            page_count: 0,
            requested: None,
            selected_index: 0,
            notification: None,
        }
    }

    /// Request parameters for the current view state.
    #[must_use]
    pub fn current_query(&self) -> QueryParams {
        build_query(QueryInput {
            pagination: self.pagination,
            sorting: &self.sorting,
            filters: &self.filters,
            search: &self.filters.search,
        })
    }

    /// Marks the view as loading and returns the fetch for the current parameters.
    ///
    /// The parameters become the latest request, so any response still in
    /// flight for older parameters will be discarded on arrival.
    pub fn begin_fetch(&mut self) -> Action {
        let params = self.current_query();
        tracing::debug!(resource = %self.spec.resource, params = %params, "fetching page");

        self.status = LoadStatus::Loading;
        self.requested = Some(params.clone());

        Action::PostToWorker(WorkerMessage::fetch_list(
            self.spec.resource.clone(),
            params,
            self.pagination.page_size,
        ))
    }

    /// Whether `params` are the parameters of the latest request.
    #[must_use]
    pub fn is_current(&self, params: &QueryParams) -> bool {
        self.requested.as_ref() == Some(params)
    }

    /// Replaces the rows and keeps the selection in bounds.
    pub fn set_rows(&mut self, rows: Vec<Value>, count: u64, page_count: usize) {
        self.rows = rows;
        self.count = count;
        self.page_count = page_count;
        self.selected_index = self.selected_index.min(self.rows.len().saturating_sub(1));
    }

    /// Moves the selection down, wrapping to the top.
    pub fn move_selection_down(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected_index = (self.selected_index + 1) % self.rows.len();
    }

    /// Moves the selection up, wrapping to the bottom.
    pub fn move_selection_up(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = self.rows.len() - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    #[must_use]
    pub fn selected_row(&self) -> Option<&Value> {
        self.rows.get(self.selected_index)
    }

    /// `id` field of the selected row, as the string used in item URLs.
    #[must_use]
    pub fn selected_id(&self) -> Option<String> {
        match self.selected_row()?.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Computes the data table view model for a terminal of `rows` x `cols`.
    ///
    /// The body is chosen by load status first (loading, then error) and by
    /// row count second (empty, then rows). Rows are windowed around the
    /// selection when the page is taller than the terminal.
    #[must_use]
    pub fn compute_viewmodel(&self, rows: usize, cols: usize) -> TableViewModel {
        let search_bar = self.compute_search_bar();
        let filter_chips = self.compute_filter_chips();

        let body = match &self.status {
            LoadStatus::Idle | LoadStatus::Loading => TableBody::Loading,
            LoadStatus::Error(message) => TableBody::Error {
                message: message.clone(),
            },
            LoadStatus::Success if self.rows.is_empty() => TableBody::Empty(self.compute_empty_state()),
            LoadStatus::Success => {
                let mut chrome = CHROME_ROWS;
                if search_bar.is_some() {
                    chrome += SEARCH_ROWS;
                }
                if !filter_chips.is_empty() {
                    chrome += CHIP_ROWS;
                }
                self.compute_rows(rows.saturating_sub(chrome).max(1), cols)
            }
        };

        TableViewModel {
            header: self.compute_header(),
            search_bar,
            filter_chips,
            columns: self.compute_columns(),
            body,
            footer: self.compute_footer(),
            notification: self.notification.clone(),
        }
    }

    fn compute_rows(&self, available_rows: usize, cols: usize) -> TableBody {
        let mut visible_start = self.selected_index.saturating_sub(available_rows / 2);
        let visible_end = (visible_start + available_rows).min(self.rows.len());
        if visible_end - visible_start < available_rows && self.rows.len() >= available_rows {
            visible_start = visible_end.saturating_sub(available_rows);
        }

        let widths = self.column_widths(cols);
        let query = self.filters.search.trim();

        let rows = self.rows[visible_start..visible_end]
            .iter()
            .enumerate()
            .map(|(relative_idx, row)| {
                let cells = self
                    .spec
                    .columns
                    .iter()
                    .zip(&widths)
                    .map(|(column, &width)| {
                        let text = truncate(&cell_text(row, &column.id), width);
                        let highlight_ranges = highlight_ranges(&text, query);
                        DisplayCell {
                            text,
                            width,
                            highlight_ranges,
                        }
                    })
                    .collect();
                DisplayRow {
                    cells,
                    is_selected: visible_start + relative_idx == self.selected_index,
                }
            })
            .collect();

        TableBody::Rows {
            rows,
            selected_index: self.selected_index.saturating_sub(visible_start),
        }
    }

    /// Column widths shrunk from the right to fit `cols`.
    fn column_widths(&self, cols: usize) -> Vec<usize> {
        let mut remaining = cols;
        self.spec
            .columns
            .iter()
            .map(|column| {
                let width = column.width.min(remaining.saturating_sub(1));
                remaining = remaining.saturating_sub(width + 1);
                width
            })
            .collect()
    }

    fn compute_columns(&self) -> Vec<ColumnHeader> {
        self.spec
            .columns
            .iter()
            .map(|column| ColumnHeader {
                label: column.label.clone(),
                width: column.width,
                sortable: column.sortable,
                sort: self.sorting.direction_of(&column.id),
            })
            .collect()
    }

    fn compute_header(&self) -> HeaderInfo {
        HeaderInfo {
            title: format!(" {} ({}) ", self.spec.title, self.count),
        }
    }

    fn compute_footer(&self) -> FooterInfo {
        let page_label = format!(
            "Page {} of {} · {} rows",
            self.pagination.page_index + 1,
            self.page_count.max(1),
            self.count
        );
        FooterInfo {
            page_label,
            keybindings: "/ search  f filter  p page  s sort  j/k select  d delete  r refresh  q quit"
                .to_string(),
        }
    }

    fn compute_search_bar(&self) -> Option<SearchBarInfo> {
        if self.search_input.is_empty() && self.filters.search.is_empty() {
            return None;
        }
        Some(SearchBarInfo {
            query: self.search_input.clone(),
            pending: self.search_input.trim() != self.filters.search.trim(),
        })
    }

    fn compute_filter_chips(&self) -> Vec<FilterChip> {
        self.filters
            .active()
            .map(|(key, value)| FilterChip {
                key: key.to_string(),
                value,
            })
            .collect()
    }

    fn compute_empty_state(&self) -> EmptyState {
        let subtitle = if self.filters.is_unfiltered() {
            "Nothing has been created yet".to_string()
        } else {
            "Try a different search or clear the filters".to_string()
        };
        EmptyState {
            message: format!("No {} found", self.spec.title.to_lowercase()),
            subtitle,
        }
    }
}

/// Display text of `column_id` in `row`.
///
/// Dotted ids (`department.name`) walk nested objects. Missing and null
/// values render as `-`.
#[must_use]
pub fn cell_text(row: &Value, column_id: &str) -> String {
    let value = column_id
        .split('.')
        .try_fold(row, |value, segment| value.get(segment));

    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(true)) => "yes".to_string(),
        Some(Value::Bool(false)) => "no".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{pages, FilterValue};
    use serde_json::json;

    fn state() -> ListingState {
        ListingState::new(pages::positions(), PageFilterState::default(), 10, Theme::default())
    }

    fn loaded(rows: Vec<Value>) -> ListingState {
        let mut state = state();
        let count = rows.len() as u64;
        state.status = LoadStatus::Success;
        state.set_rows(rows, count, 1);
        state
    }

    #[test]
    fn cell_text_walks_nested_objects() {
        let row = json!({ "name": "Clerk", "department": { "name": "Finance" }, "active": true, "note": null });
        assert_eq!(cell_text(&row, "name"), "Clerk");
        assert_eq!(cell_text(&row, "department.name"), "Finance");
        assert_eq!(cell_text(&row, "active"), "yes");
        assert_eq!(cell_text(&row, "note"), "-");
        assert_eq!(cell_text(&row, "missing.field"), "-");
    }

    #[test]
    fn body_prefers_loading_then_error_then_empty() {
        let mut state = loaded(vec![json!({ "id": 1, "code": "CLK", "name": "Clerk" })]);
        state.status = LoadStatus::Loading;
        assert_eq!(state.compute_viewmodel(24, 80).body, TableBody::Loading);

        state.status = LoadStatus::Error("Server unavailable".into());
        assert!(matches!(
            state.compute_viewmodel(24, 80).body,
            TableBody::Error { message } if message == "Server unavailable"
        ));

        state.status = LoadStatus::Success;
        state.set_rows(vec![], 0, 0);
        assert!(matches!(state.compute_viewmodel(24, 80).body, TableBody::Empty(_)));
    }

    #[test]
    fn selection_wraps_and_clamps() {
        let mut state = loaded(vec![json!({ "id": 1 }), json!({ "id": "b2" })]);
        state.move_selection_up();
        assert_eq!(state.selected_index, 1);
        assert_eq!(state.selected_id().as_deref(), Some("b2"));
        state.move_selection_down();
        assert_eq!(state.selected_id().as_deref(), Some("1"));

        state.selected_index = 1;
        state.set_rows(vec![json!({ "id": 1 })], 1, 1);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn settled_search_is_highlighted_and_pending_input_flagged() {
        let mut state = loaded(vec![json!({ "id": 1, "code": "MGR", "name": "Manager" })]);
        state.filters = state.filters.with_search("man");
        state.search_input = "mana".to_string();

        let vm = state.compute_viewmodel(24, 80);
        let search_bar = vm.search_bar.unwrap();
        assert!(search_bar.pending);

        let TableBody::Rows { rows, .. } = vm.body else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].cells[1].text, "Manager");
        assert_eq!(rows[0].cells[1].highlight_ranges, vec![(0, 3)]);
    }

    #[test]
    fn chips_and_sort_indicators_follow_state() {
        let mut state = state();
        state.filters = state
            .filters
            .with_filter("department", FilterValue::parse("finance"))
            .with_filter("status", FilterValue::All);
        state.sorting = SortState::by("name", true);

        let vm = state.compute_viewmodel(24, 80);
        assert_eq!(
            vm.filter_chips,
            vec![FilterChip {
                key: "department".into(),
                value: "finance".into()
            }]
        );
        assert_eq!(vm.columns[1].display_label(), "NAME ▼");
        assert_eq!(vm.footer.page_label, "Page 1 of 1 · 0 rows");
    }

    #[test]
    fn rows_are_windowed_around_selection() {
        let rows: Vec<Value> = (1..=20).map(|id| json!({ "id": id, "code": format!("C{id}") })).collect();
        let mut state = loaded(rows);
        state.selected_index = 19;

        let TableBody::Rows { rows, selected_index } = state.compute_viewmodel(12, 80).body else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 5);
        assert_eq!(selected_index, 4);
        assert!(rows[4].is_selected);
        assert_eq!(rows[4].cells[0].text, "C20");
    }
}
