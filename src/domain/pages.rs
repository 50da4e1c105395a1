//! Listing pages of the admin console.
//!
//! Each page pairs a [`PageId`] (filter store key) with the [`ResourceKey`] it
//! reads, its table columns and a typed filter struct. Typed filters keep the
//! per-resource filter keys in one place; `None` always means "all".

use super::filters::{FilterValue, PageFilterState, PageFilters};
use super::resource::{PageId, ResourceKey};
use serde::{Deserialize, Serialize};

/// One column of a listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Field name in the row object and ordering field on the server.
    pub id: String,
    /// Header text.
    pub label: String,
    /// Whether clicking the header toggles server-side sorting.
    pub sortable: bool,
    /// Display width in characters.
    pub width: usize,
}

impl Column {
    #[must_use]
    pub fn new(id: &str, label: &str, width: usize) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            sortable: true,
            width,
        }
    }

    #[must_use]
    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// Static description of one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSpec {
    /// Key of the page's entry in the filter store.
    pub page_id: PageId,
    /// Collection the page lists; also its cache family.
    pub resource: ResourceKey,
    pub title: String,
    /// Columns in display order.
    pub columns: Vec<Column>,
}

impl ListingSpec {
    #[must_use]
    pub fn new(page_id: &str, resource: &str, title: &str, columns: Vec<Column>) -> Self {
        Self {
            page_id: PageId::new(page_id),
            resource: ResourceKey::new(resource),
            title: title.to_string(),
            columns,
        }
    }

    /// Column by id.
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Looks up a built-in page by its page id or resource key.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        all_pages()
            .into_iter()
            .find(|spec| spec.page_id.as_str() == name || spec.resource.as_str() == name)
    }
}

/// Every built-in listing page.
#[must_use]
pub fn all_pages() -> Vec<ListingSpec> {
    vec![
        employees(),
        positions(),
        purchase_orders(),
        salary_slips(),
        contacts(),
        short_urls(),
    ]
}

#[must_use]
pub fn employees() -> ListingSpec {
    ListingSpec::new(
        "hr.employees",
        "employees",
        "Employees",
        vec![
            Column::new("employee_id", "ID", 10),
            Column::new("full_name", "NAME", 28),
            Column::new("department", "DEPARTMENT", 18),
            Column::new("position", "POSITION", 18),
            Column::new("is_active", "ACTIVE", 8).unsortable(),
        ],
    )
}

#[must_use]
pub fn positions() -> ListingSpec {
    ListingSpec::new(
        "hr.positions",
        "positions",
        "Positions",
        vec![
            Column::new("code", "CODE", 10),
            Column::new("name", "NAME", 30),
            Column::new("department", "DEPARTMENT", 20),
        ],
    )
}

#[must_use]
pub fn purchase_orders() -> ListingSpec {
    ListingSpec::new(
        "procurement.purchase-orders",
        "purchase-orders",
        "Purchase Orders",
        vec![
            Column::new("po_number", "PO", 12),
            Column::new("vendor", "VENDOR", 24),
            Column::new("status", "STATUS", 18),
            Column::new("priority", "PRIORITY", 10),
            Column::new("total_amount", "TOTAL", 12),
            Column::new("created_at", "CREATED", 12),
        ],
    )
}

#[must_use]
pub fn salary_slips() -> ListingSpec {
    ListingSpec::new(
        "finance.salary-slips",
        "salary-slips",
        "Salary Slips",
        vec![
            Column::new("employee", "EMPLOYEE", 24),
            Column::new("period", "PERIOD", 10),
            Column::new("net_pay", "NET PAY", 12),
            Column::new("paid", "PAID", 6).unsortable(),
        ],
    )
}

#[must_use]
pub fn contacts() -> ListingSpec {
    ListingSpec::new(
        "crm.contacts",
        "contacts",
        "Contacts",
        vec![
            Column::new("name", "NAME", 24),
            Column::new("company", "COMPANY", 22),
            Column::new("email", "EMAIL", 28).unsortable(),
            Column::new("contact_type", "TYPE", 10),
        ],
    )
}

#[must_use]
pub fn short_urls() -> ListingSpec {
    ListingSpec::new(
        "tools.short-urls",
        "short-urls",
        "Short URLs",
        vec![
            Column::new("short_code", "CODE", 10),
            Column::new("original_url", "TARGET", 40).unsortable(),
            Column::new("clicks", "CLICKS", 8),
            Column::new("is_active", "ACTIVE", 8).unsortable(),
        ],
    )
}

/// Purchase order workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    const ALL: [Self; 7] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Ordered,
        Self::Received,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Ordered => "ordered",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

/// Purchase order priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        [Self::Low, Self::Medium, Self::High, Self::Urgent]
            .into_iter()
            .find(|priority| priority.as_str() == raw)
    }
}

fn text_of(state: &PageFilterState, key: &str) -> Option<String> {
    match state.get(key) {
        value @ FilterValue::Text(_) if !value.is_active() => None,
        FilterValue::Text(text) => Some(text),
        _ => None,
    }
}

fn bool_of(state: &PageFilterState, key: &str) -> Option<bool> {
    match state.get(key) {
        FilterValue::Bool(flag) => Some(flag),
        FilterValue::Text(text) => text.parse().ok(),
        FilterValue::All => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseOrderFilters {
    pub status: Option<PurchaseOrderStatus>,
    pub priority: Option<Priority>,
}

impl PageFilters for PurchaseOrderFilters {
    const PAGE_ID: &'static str = "procurement.purchase-orders";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("status", self.status.map(|s| s.as_str().to_string()).into())
            .with_filter("priority", self.priority.map(|p| p.as_str().to_string()).into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            status: text_of(state, "status").and_then(|s| PurchaseOrderStatus::parse(&s)),
            priority: text_of(state, "priority").and_then(|p| Priority::parse(&p)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalarySlipFilters {
    pub paid: Option<bool>,
}

impl PageFilters for SalarySlipFilters {
    const PAGE_ID: &'static str = "finance.salary-slips";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("paid", self.paid.into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            paid: bool_of(state, "paid"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilters {
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

impl PageFilters for EmployeeFilters {
    const PAGE_ID: &'static str = "hr.employees";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("department", self.department.clone().into())
            .with_filter("is_active", self.is_active.into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            department: text_of(state, "department"),
            is_active: bool_of(state, "is_active"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionFilters {
    pub department: Option<String>,
}

impl PageFilters for PositionFilters {
    const PAGE_ID: &'static str = "hr.positions";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("department", self.department.clone().into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            department: text_of(state, "department"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilters {
    pub contact_type: Option<String>,
}

impl PageFilters for ContactFilters {
    const PAGE_ID: &'static str = "crm.contacts";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("contact_type", self.contact_type.clone().into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            contact_type: text_of(state, "contact_type"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortUrlFilters {
    pub is_active: Option<bool>,
}

impl PageFilters for ShortUrlFilters {
    const PAGE_ID: &'static str = "tools.short-urls";

    fn apply_to(&self, base: &PageFilterState) -> PageFilterState {
        base.with_filter("is_active", self.is_active.into())
    }

    fn from_state(state: &PageFilterState) -> Self {
        Self {
            is_active: bool_of(state, "is_active"),
        }
    }
}
