//! Terminal front end for the listing engine.
//!
//! Reads one command per line from stdin, turns it into listing
//! [`Event`]s, waits for the view to settle and redraws the screen.
//!
//! # Commands
//!
//! - `search <text>`: Type into the search box (empty text clears it)
//! - `filter <key> <value>`: Set a filter; `all` clears it
//! - `clear`: Reset search and filters
//! - `page <n>`: Go to page `n` (1-based)
//! - `size <n>`: Change the page size
//! - `sort <column>`: Toggle sorting on a column
//! - `j`/`down`, `k`/`up`: Move the selection
//! - `create <json>`, `update <id> <json>`, `delete`: Mutate records
//! - `r`/`refresh`: Invalidate and reload
//! - `open <page>`: Switch to another listing page
//! - `dismiss`: Hide the last notification
//! - `q`/`quit`: Exit

#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use erp_listing::app::{Event, ListingController};
use erp_listing::domain::{pages, FilterValue, ListingSpec, Mutation};
use erp_listing::transport::MemoryTransport;
use erp_listing::{initialize, initialize_with_transport, Config, ListingContext, ListingError, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Browse ERP listings from the terminal.
#[derive(Debug, Parser)]
#[command(name = "erp-listing", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listing page to open, by page id or resource (e.g. `positions`).
    #[arg(short, long, default_value = "positions")]
    page: String,

    /// Override the REST base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Serve seeded in-memory data instead of calling the REST backend.
    #[arg(long)]
    demo: bool,

    /// Configuration overrides as `key=value`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

enum Command {
    Dispatch(Event),
    Open(String),
    Quit,
    Unknown(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Err(e) = erp_listing::observability::init_tracing(&config) {
        eprintln!("tracing disabled: {e}");
    }

    let context = if cli.demo {
        initialize_with_transport(&config, Arc::new(demo_backend()))?
    } else {
        initialize(&config)?
    };

    let spec = find_page(&cli.page)?;
    let mut view = open_view(&context, spec).await?;
    let (rows, cols) = terminal_size();
    draw(&view, rows, cols, None);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut message = None;
        match parse_command(line.trim()) {
            Command::Quit => break,
            Command::Unknown(text) => message = Some(text),
            Command::Open(name) => match find_page(&name) {
                Ok(spec) => view = open_view(&context, spec).await?,
                Err(e) => message = Some(e.to_string()),
            },
            Command::Dispatch(event) => {
                view.dispatch(event)?;
                view.settle().await?;
            }
        }
        draw(&view, rows, cols, message.as_deref());
    }

    tracing::debug!("exiting");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut map = BTreeMap::new();
    for entry in &cli.overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ListingError::Config(format!("expected KEY=VALUE, got `{entry}`")))?;
        map.insert(key.trim().to_string(), value.to_string());
    }
    if let Some(base_url) = &cli.base_url {
        map.insert("base_url".to_string(), base_url.clone());
    }

    Ok(base.with_overrides(&map))
}

fn find_page(name: &str) -> Result<ListingSpec> {
    ListingSpec::builtin(name).ok_or_else(|| {
        let known: Vec<String> = pages::all_pages()
            .iter()
            .map(|spec| spec.resource.to_string())
            .collect();
        ListingError::Config(format!("unknown page `{name}` (known: {})", known.join(", ")))
    })
}

async fn open_view(context: &ListingContext, spec: ListingSpec) -> Result<ListingController> {
    let mut view = ListingController::new(context, spec);
    view.mount()?;
    view.settle().await?;
    Ok(view)
}

fn parse_command(line: &str) -> Command {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let event = match verb {
        "q" | "quit" | "exit" => return Command::Quit,
        "open" if !rest.is_empty() => return Command::Open(rest.to_string()),
        "search" | "/" => Event::SearchInput(rest.to_string()),
        "filter" => match rest.split_once(' ') {
            Some((key, value)) => Event::SetFilter {
                key: key.to_string(),
                value: FilterValue::parse(value.trim()),
            },
            None => return Command::Unknown("usage: filter <key> <value>".to_string()),
        },
        "clear" => Event::ClearFilters,
        "page" => match rest.parse::<usize>() {
            Ok(page) if page > 0 => Event::PageChange(page - 1),
            _ => return Command::Unknown("usage: page <n>".to_string()),
        },
        "size" => match rest.parse::<usize>() {
            Ok(size) if size > 0 => Event::PageSizeChange(size),
            _ => return Command::Unknown("usage: size <n>".to_string()),
        },
        "sort" if !rest.is_empty() => Event::ToggleSort(rest.to_string()),
        "j" | "down" => Event::KeyDown,
        "k" | "up" => Event::KeyUp,
        "r" | "refresh" => Event::Refresh,
        "dismiss" => Event::DismissNotification,
        "delete" => Event::DeleteSelected,
        "create" => match parse_body(rest) {
            Ok(body) => Event::Mutate(Mutation::Create { body }),
            Err(e) => return Command::Unknown(e),
        },
        "update" => {
            let (id, body) = rest.split_once(' ').unwrap_or((rest, ""));
            match parse_body(body) {
                Ok(body) if !id.is_empty() => Event::Mutate(Mutation::Update {
                    id: id.to_string(),
                    body,
                }),
                Ok(_) => return Command::Unknown("usage: update <id> <json>".to_string()),
                Err(e) => return Command::Unknown(e),
            }
        }
        "" => return Command::Unknown(String::new()),
        other => return Command::Unknown(format!("unknown command `{other}`")),
    };
    Command::Dispatch(event)
}

fn parse_body(text: &str) -> std::result::Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(body @ Value::Object(_)) => Ok(body),
        Ok(_) => Err("body must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn terminal_size() -> (usize, usize) {
    let read = |name: &str, fallback: usize| {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(fallback)
    };
    (read("LINES", 24), read("COLUMNS", 100))
}

fn draw(view: &ListingController, rows: usize, cols: usize, message: Option<&str>) {
    let mut frame = String::from("\u{1b}[2J\u{1b}[H");
    // Last line is the prompt.
    frame.push_str(&view.render(rows.saturating_sub(1), cols));
    frame.push_str(&format!("\u{1b}[{rows};1H"));
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        frame.push_str(message);
        frame.push_str("  ");
    }
    frame.push_str("> ");
    print!("{frame}");
    // Flushing stdout only fails when the terminal is gone.
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

fn demo_backend() -> MemoryTransport {
    const DEPARTMENTS: [&str; 4] = ["Finance", "Operations", "Sales", "Engineering"];
    const VENDORS: [&str; 5] = ["ACME", "Globex", "Initech", "Umbrella", "Stark"];
    const STATUSES: [&str; 4] = ["draft", "pending_approval", "approved", "rejected"];
    const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

    let backend = MemoryTransport::new();

    backend.seed(
        "employees",
        (1..=32)
            .map(|i| {
                json!({
                    "id": i,
                    "employee_id": format!("EMP-{i:03}"),
                    "full_name": format!("Employee {i}"),
                    "department": DEPARTMENTS[i % DEPARTMENTS.len()],
                    "position": format!("Position {}", i % 7 + 1),
                    "is_active": i % 5 != 0,
                })
            })
            .collect(),
    );
    backend.seed(
        "positions",
        (1..=24)
            .map(|i| {
                json!({
                    "id": i,
                    "code": format!("POS-{i:02}"),
                    "name": format!("Position {i}"),
                    "department": DEPARTMENTS[i % DEPARTMENTS.len()],
                })
            })
            .collect(),
    );
    backend.seed(
        "purchase-orders",
        (1..=40)
            .map(|i| {
                json!({
                    "id": i,
                    "po_number": format!("PO-2024-{i:04}"),
                    "vendor": VENDORS[i % VENDORS.len()],
                    "status": STATUSES[i % STATUSES.len()],
                    "priority": PRIORITIES[i % PRIORITIES.len()],
                    "total_amount": format!("{}.00", 250 * i),
                    "created_at": format!("2024-03-{:02}", i % 28 + 1),
                })
            })
            .collect(),
    );
    backend.seed(
        "salary-slips",
        (1..=18)
            .map(|i| {
                json!({
                    "id": i,
                    "employee": format!("Employee {}", i % 9 + 1),
                    "period": format!("2024-{:02}", i % 12 + 1),
                    "net_pay": format!("{}.00", 3000 + 125 * i),
                    "paid": i % 3 != 0,
                })
            })
            .collect(),
    );
    backend.seed(
        "contacts",
        (1..=15)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("Contact {i}"),
                    "company": VENDORS[i % VENDORS.len()],
                    "email": format!("contact{i}@example.com"),
                    "contact_type": if i % 2 == 0 { "vendor" } else { "customer" },
                })
            })
            .collect(),
    );
    backend.seed(
        "short-urls",
        (1..=12)
            .map(|i| {
                json!({
                    "id": i,
                    "short_code": format!("s{i:03}"),
                    "original_url": format!("https://example.com/reports/{i}"),
                    "clicks": i * 17,
                    "is_active": i % 4 != 0,
                })
            })
            .collect(),
    );

    backend
}
