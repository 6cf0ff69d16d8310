//! Session manager: device → package → database selection, tabs and history.
//!
//! One [`SessionManager`] owns all view state behind a single short-held lock.
//! Bridge calls are made with the lock released; their results are applied
//! when they resolve, so concurrent fetches on one tab race and the last
//! response to land is the one rendered.

use crate::catalog::PackageCatalog;
use crate::error::{SessionError, SessionResult};
use crate::history::{HistoryView, QueryHistoryEntry, QueryHistoryLog, QueryOutcome};
use crate::monitor::PollHandle;
use crate::pagination::PageDirection;
use crate::tab::{TabSummary, TableTabSession};
use crate::view::{ActiveView, InlineError, Region, ViewEvent};
use bridge_client::{
    BridgeError, DatabaseSnapshotToken, Device, PackageEntry, PackageFilter, PullResponse,
    PullTarget, RemoteBridge,
};
use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const NO_DEVICE: &str = "Please select a device first.";
const NO_PACKAGE: &str = "Please select a package first.";
const NO_DATABASE: &str = "Please select a database first.";
const NO_DATABASES_FOUND: &str = "No databases found or permission denied.";
const ROOTED: &str = "Rooted";
const NOT_ROOTED: &str = "Not rooted (only debuggable apps supported)";

const EVENT_CAPACITY: usize = 256;

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Rows per table page
    pub page_size: u64,
    /// Period between monitor ticks
    pub monitor_interval: Duration,
    /// Query history entries kept
    pub history_capacity: usize,
    /// Maximum packages returned by `visible_packages`
    pub package_render_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            monitor_interval: Duration::from_secs(3),
            history_capacity: 10,
            package_render_limit: 100,
        }
    }
}

/// How `execute_query` handled a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDispatch {
    /// No database was selected; a prompt was raised and nothing was sent.
    Prompted,
    /// The query ran and was recorded under this history sequence.
    Recorded(u64),
}

/// Owned copy of everything a front end renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub devices: Vec<Device>,
    pub selected_device: Option<String>,
    pub root_status: Option<String>,
    pub packages: Vec<PackageEntry>,
    pub package_count: usize,
    pub package_search: String,
    pub only_debuggable: bool,
    pub selected_package: Option<String>,
    /// `None` while the list is hidden
    pub databases: Option<Vec<String>>,
    pub database_notice: Option<String>,
    pub tables: Option<Vec<String>>,
    pub column_hints: BTreeMap<String, Vec<String>>,
    pub token: Option<DatabaseSnapshotToken>,
    pub pull_target: Option<PullTarget>,
    pub tabs: Vec<TabSummary>,
    pub active_view: ActiveView,
    pub prompt: Option<String>,
    pub inline_errors: Vec<InlineError>,
}

struct SessionState {
    devices: Vec<Device>,
    selected_device: Option<String>,
    rooted: bool,
    packages: PackageCatalog,
    selected_package: Option<String>,
    databases: Option<Vec<String>>,
    tables: Option<Vec<String>>,
    column_hints: BTreeMap<String, Vec<String>>,
    token: Option<DatabaseSnapshotToken>,
    /// Token that was current before the last device reselection. Open tabs
    /// keep reading it until a new pull succeeds.
    superseded_token: Option<DatabaseSnapshotToken>,
    pull_target: Option<PullTarget>,
    /// Open tabs in opening order; names are unique
    tabs: Vec<TableTabSession>,
    active: ActiveView,
    history: QueryHistoryLog,
    prompt: Option<String>,
    errors: BTreeMap<Region, String>,
}

impl SessionState {
    fn new(settings: &SessionSettings) -> Self {
        Self {
            devices: Vec::new(),
            selected_device: None,
            rooted: false,
            packages: PackageCatalog::new(settings.package_render_limit),
            selected_package: None,
            databases: None,
            tables: None,
            column_hints: BTreeMap::new(),
            token: None,
            superseded_token: None,
            pull_target: None,
            tabs: Vec::new(),
            active: ActiveView::default(),
            history: QueryHistoryLog::new(settings.history_capacity),
            prompt: None,
            errors: BTreeMap::new(),
        }
    }

    fn tab(&self, table: &str) -> Option<&TableTabSession> {
        self.tabs.iter().find(|tab| tab.table_name() == table)
    }

    fn tab_mut(&mut self, table: &str) -> Option<&mut TableTabSession> {
        self.tabs.iter_mut().find(|tab| tab.table_name() == table)
    }
}

struct Shared {
    bridge: Arc<dyn RemoteBridge>,
    settings: SessionSettings,
    state: Mutex<SessionState>,
    events: broadcast::Sender<ViewEvent>,
    next_poll_id: AtomicU64,
}

/// Client-side session over one bridge.
///
/// Cheap to clone; clones share state. Monitors hold only a weak reference,
/// so dropping the last clone stops every monitor.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    pub fn new(bridge: Arc<dyn RemoteBridge>, settings: SessionSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = Mutex::new(SessionState::new(&settings));
        Self {
            shared: Arc::new(Shared {
                bridge,
                settings,
                state,
                events,
                next_poll_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.shared.settings
    }

    /// Receive view change notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.shared.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Selection cascade
    // ------------------------------------------------------------------

    /// Reload the device list.
    pub async fn refresh_devices(&self) {
        match self.shared.bridge.list_devices().await {
            Ok(devices) => {
                debug!(count = devices.len(), "Devices loaded");
                self.shared.state.lock().devices = devices;
                self.clear_error(Region::Devices);
                self.emit(ViewEvent::DevicesChanged);
            }
            Err(err) => {
                warn!(error = %err, "Failed to list devices");
                self.set_error(Region::Devices, describe("Error loading devices", &err));
            }
        }
    }

    /// Select a device and load its packages.
    ///
    /// Resets the package, the current token and the database and table
    /// lists. Open tabs stay open and keep addressing the superseded token,
    /// so their next fetch surfaces whatever the bridge answers for it.
    pub async fn select_device(&self, device_id: &str) {
        let filter = {
            let mut state = self.shared.state.lock();
            let rooted = state
                .devices
                .iter()
                .find(|device| device.id == device_id)
                .is_some_and(|device| device.rooted);

            state.selected_device = Some(device_id.to_string());
            state.rooted = rooted;
            state.packages.clear();
            state.selected_package = None;
            state.databases = None;
            state.tables = None;
            state.column_hints.clear();
            for region in [Region::Packages, Region::Databases, Region::Tables] {
                state.errors.remove(&region);
            }
            if let Some(previous) = state.token.take() {
                state.superseded_token = Some(previous);
                self.emit(ViewEvent::TokenChanged { token: None });
            }
            PackageFilter::for_device(rooted)
        };
        info!(device_id, filter = filter.as_str(), "Device selected");
        self.emit(ViewEvent::PackagesChanged);
        self.emit(ViewEvent::DatabasesChanged);
        self.emit(ViewEvent::TablesChanged);

        let result = self.shared.bridge.list_packages(device_id, filter).await;

        let mut state = self.shared.state.lock();
        if state.selected_device.as_deref() != Some(device_id) {
            debug!(device_id, "Device changed while packages loaded, dropping list");
            return;
        }
        match result {
            Ok(packages) => {
                debug!(device_id, count = packages.len(), "Packages loaded");
                state.packages.replace(packages);
                state.errors.remove(&Region::Packages);
                self.emit(ViewEvent::PackagesChanged);
            }
            Err(err) => {
                warn!(device_id, error = %err, "Failed to list packages");
                let message = describe("Error loading packages", &err);
                state.errors.insert(Region::Packages, message.clone());
                self.emit(ViewEvent::InlineError {
                    region: Region::Packages,
                    message,
                });
            }
        }
    }

    /// Select a package of the current device and list its databases.
    pub async fn select_package(&self, package_name: &str) -> SessionResult<()> {
        let selected = self.shared.state.lock().selected_device.clone();
        let Some(device_id) = selected else {
            return Err(self.validation_gap(NO_DEVICE));
        };
        {
            let mut state = self.shared.state.lock();
            state.selected_package = Some(package_name.to_string());
            state.databases = None;
            state.tables = None;
            state.errors.remove(&Region::Databases);
        }
        self.emit(ViewEvent::DatabasesChanged);
        self.emit(ViewEvent::TablesChanged);

        let result = self
            .shared
            .bridge
            .list_databases(&device_id, package_name)
            .await;

        let mut state = self.shared.state.lock();
        if state.selected_package.as_deref() != Some(package_name)
            || state.selected_device.as_deref() != Some(device_id.as_str())
        {
            debug!(package_name, "Selection changed while databases loaded, dropping list");
            return Ok(());
        }
        match result {
            Ok(databases) => {
                debug!(package_name, count = databases.len(), "Databases loaded");
                state.databases = Some(databases);
                self.emit(ViewEvent::DatabasesChanged);
            }
            Err(err) => {
                warn!(package_name, error = %err, "Failed to list databases");
                let message = describe("Error loading databases", &err);
                state.errors.insert(Region::Databases, message.clone());
                self.emit(ViewEvent::InlineError {
                    region: Region::Databases,
                    message,
                });
            }
        }
        Ok(())
    }

    /// Pull `db_name` of the selected device and package.
    pub async fn open_database(&self, db_name: &str) -> SessionResult<()> {
        let selection = {
            let state = self.shared.state.lock();
            (state.selected_device.clone(), state.selected_package.clone())
        };
        let target = match selection {
            (Some(device), Some(package)) => PullTarget::new(device, package, db_name),
            (None, _) => return Err(self.validation_gap(NO_DEVICE)),
            (Some(_), None) => return Err(self.validation_gap(NO_PACKAGE)),
        };
        self.pull_database(target).await;
        Ok(())
    }

    /// Pull a database snapshot and, on success, make it current and list
    /// its tables.
    ///
    /// On failure the bridge's error is shown in the databases region and
    /// the current token is left as it was.
    pub async fn pull_database(&self, target: PullTarget) {
        info!(pull = %target, "Pulling database");
        let result = self
            .shared
            .bridge
            .pull_database(&target)
            .await
            .map(PullResponse::into_token);

        match result {
            Ok(Ok(token)) => {
                self.clear_error(Region::Databases);
                self.install_token(token, Some(target));
                if let Err(err) = self.list_tables().await {
                    debug!(error = %err, "Token replaced before tables listed");
                }
            }
            Ok(Err(message)) | Err(BridgeError::Remote(message)) => {
                warn!(pull = %target, error = %message, "Pull rejected");
                self.set_error(Region::Databases, message);
            }
            Err(err) => {
                warn!(pull = %target, error = %err, "Pull failed");
                self.set_error(Region::Databases, describe("Error pulling database", &err));
            }
        }
    }

    /// List tables of the current snapshot and sample one row of each for
    /// column hints. Sampling failures only drop that table's hint.
    pub async fn list_tables(&self) -> SessionResult<()> {
        let token = match self.current_token() {
            Some(token) => token,
            None => return Err(self.validation_gap(NO_DATABASE)),
        };

        let tables = match self.shared.bridge.list_tables(&token).await {
            Ok(tables) => tables,
            Err(err) => {
                warn!(token = %token, error = %err, "Failed to list tables");
                self.set_error(Region::Tables, describe("Error loading tables", &err));
                return Ok(());
            }
        };
        {
            let mut state = self.shared.state.lock();
            state.tables = Some(tables.clone());
            state.column_hints.clear();
            state.errors.remove(&Region::Tables);
        }
        self.emit(ViewEvent::TablesChanged);

        let bridge = &self.shared.bridge;
        let token_ref = &token;
        let samples = join_all(tables.iter().map(|table| async move {
            (table, bridge.read_table(token_ref, table, 1, 0).await)
        }))
        .await;

        let mut hints = BTreeMap::new();
        for (table, sample) in samples {
            match sample {
                Ok(page) => {
                    hints.insert(table.clone(), page.columns);
                }
                Err(err) => debug!(table = %table, error = %err, "Column sampling failed"),
            }
        }
        debug!(tables = tables.len(), hinted = hints.len(), "Tables listed");
        self.shared.state.lock().column_hints = hints;
        self.emit(ViewEvent::TablesChanged);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Package catalog
    // ------------------------------------------------------------------

    pub fn set_package_search(&self, term: &str) {
        self.shared.state.lock().packages.set_search(term);
        self.emit(ViewEvent::PackagesChanged);
    }

    pub fn set_only_debuggable(&self, only_debuggable: bool) {
        self.shared
            .state
            .lock()
            .packages
            .set_only_debuggable(only_debuggable);
        self.emit(ViewEvent::PackagesChanged);
    }

    pub fn visible_packages(&self) -> Vec<PackageEntry> {
        self.shared
            .state
            .lock()
            .packages
            .visible()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Ask the bridge about every visible package whose debuggable flag is
    /// unknown. Failures leave the flag unknown.
    pub async fn resolve_visible_debuggable(&self) {
        let (device_id, names) = {
            let state = self.shared.state.lock();
            match &state.selected_device {
                Some(device_id) => (device_id.clone(), state.packages.unresolved_visible()),
                None => return,
            }
        };
        if names.is_empty() {
            return;
        }

        let bridge = &self.shared.bridge;
        let device = device_id.as_str();
        let answers = join_all(names.iter().map(|name| async move {
            (name, bridge.resolve_debuggable(device, name).await)
        }))
        .await;

        let mut resolved = 0usize;
        {
            let mut state = self.shared.state.lock();
            if state.selected_device.as_deref() != Some(device) {
                return;
            }
            for (name, answer) in answers {
                match answer {
                    Ok(debuggable) => {
                        if state.packages.set_debuggable(name, debuggable) {
                            resolved += 1;
                        }
                    }
                    Err(err) => debug!(package = %name, error = %err, "Debuggable check failed"),
                }
            }
        }
        if resolved > 0 {
            self.emit(ViewEvent::PackagesChanged);
        }
    }

    // ------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------

    /// Open a table tab, or bring an existing one to the front.
    ///
    /// Reopening keeps the cursor and does not refetch.
    pub async fn open_table(&self, table: &str) -> SessionResult<()> {
        let created = {
            let mut state = self.shared.state.lock();
            let created = state.tab(table).is_none();
            if created {
                let tab = TableTabSession::new(table, self.shared.settings.page_size);
                state.tabs.push(tab);
            }
            state.active = ActiveView::Table(table.to_string());
            created
        };
        self.emit(ViewEvent::ActiveViewChanged {
            view: ActiveView::Table(table.to_string()),
        });

        if created {
            info!(table, "Tab opened");
            self.emit(ViewEvent::TabUpdated {
                table: table.to_string(),
            });
            self.fetch(table, None).await?;
        }
        Ok(())
    }

    /// Close a tab, cancelling its monitor.
    pub fn close_table(&self, table: &str) -> SessionResult<()> {
        let was_active = {
            let mut state = self.shared.state.lock();
            let index = state
                .tabs
                .iter()
                .position(|tab| tab.table_name() == table)
                .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?;
            // Dropping the session stops its monitor.
            drop(state.tabs.remove(index));
            state.errors.remove(&Region::Tab(table.to_string()));

            let was_active = state.active == ActiveView::Table(table.to_string());
            if was_active {
                state.active = ActiveView::QueryConsole;
            }
            was_active
        };
        info!(table, "Tab closed");
        self.emit(ViewEvent::TabClosed {
            table: table.to_string(),
        });
        if was_active {
            self.emit(ViewEvent::ActiveViewChanged {
                view: ActiveView::QueryConsole,
            });
        }
        Ok(())
    }

    /// Move one page and refetch. Going back from the first page still
    /// refetches the first page.
    pub async fn change_page(&self, table: &str, direction: PageDirection) -> SessionResult<()> {
        {
            let mut state = self.shared.state.lock();
            let tab = state
                .tab_mut(table)
                .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?;
            tab.step(direction);
            debug!(table, offset = tab.cursor().offset(), "Page changed");
        }
        self.fetch(table, None).await
    }

    /// Jump to a 1-based page and fetch it once.
    pub async fn go_to_page(&self, table: &str, page_number: u64) -> SessionResult<()> {
        {
            let mut state = self.shared.state.lock();
            let tab = state
                .tab_mut(table)
                .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?;
            tab.seek(page_number);
            debug!(table, offset = tab.cursor().offset(), "Page selected");
        }
        self.fetch(table, None).await
    }

    /// Read the tab's current page against the current token.
    pub async fn fetch_table(&self, table: &str) -> SessionResult<()> {
        self.fetch(table, None).await
    }

    /// One pull of the remembered target followed by a fetch.
    pub async fn refresh_table(&self, table: &str) -> SessionResult<()> {
        self.sync_and_fetch(table, None).await
    }

    /// Turn the tab's monitor on or off.
    ///
    /// Enabling runs one pull+fetch right away and then one per monitor
    /// interval. Disabling cancels before returning; no tick lands after.
    pub async fn set_monitor(&self, table: &str, enabled: bool) -> SessionResult<()> {
        if !enabled {
            let stopped = {
                let mut state = self.shared.state.lock();
                state
                    .tab_mut(table)
                    .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?
                    .stop_monitor()
            };
            if stopped {
                info!(table, "Monitor disabled");
                self.emit(ViewEvent::TabUpdated {
                    table: table.to_string(),
                });
            }
            return Ok(());
        }

        let poll_id = {
            let mut state = self.shared.state.lock();
            let tab = state
                .tab_mut(table)
                .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?;
            if tab.monitor_enabled() {
                return Ok(());
            }
            let poll_id = self.shared.next_poll_id.fetch_add(1, Ordering::Relaxed);
            tab.start_monitor(self.spawn_monitor(table, poll_id));
            poll_id
        };
        info!(
            table,
            poll_id,
            interval_ms = self.shared.settings.monitor_interval.as_millis() as u64,
            "Monitor enabled"
        );
        self.emit(ViewEvent::TabUpdated {
            table: table.to_string(),
        });

        self.sync_and_fetch(table, Some(poll_id)).await
    }

    /// Show the query console instead of a table tab.
    pub fn activate_console(&self) {
        self.shared.state.lock().active = ActiveView::QueryConsole;
        self.emit(ViewEvent::ActiveViewChanged {
            view: ActiveView::QueryConsole,
        });
    }

    fn spawn_monitor(&self, table: &str, poll_id: u64) -> PollHandle {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let table = table.to_string();
        PollHandle::spawn(poll_id, self.shared.settings.monitor_interval, move || {
            let weak = weak.clone();
            let table = table.clone();
            async move {
                match weak.upgrade() {
                    Some(shared) => SessionManager { shared }.monitor_tick(&table, poll_id).await,
                    None => false,
                }
            }
        })
    }

    /// Returns false once the tab is gone or monitored by another schedule.
    async fn monitor_tick(&self, table: &str, poll_id: u64) -> bool {
        if !self.is_current_poll(table, poll_id) {
            return false;
        }
        debug!(table, poll_id, "Monitor tick");
        if let Err(err) = self.sync_and_fetch(table, Some(poll_id)).await {
            debug!(table, error = %err, "Monitor tick skipped");
        }
        self.is_current_poll(table, poll_id)
    }

    fn is_current_poll(&self, table: &str, poll_id: u64) -> bool {
        self.shared
            .state
            .lock()
            .tab(table)
            .is_some_and(|tab| tab.poll_id() == Some(poll_id))
    }

    async fn sync_and_fetch(&self, table: &str, poll_id: Option<u64>) -> SessionResult<()> {
        let target = {
            let state = self.shared.state.lock();
            if state.tab(table).is_none() {
                return Err(SessionError::TabNotOpen(table.to_string()));
            }
            state.pull_target.clone()
        };

        if let Some(target) = target {
            let result = self
                .shared
                .bridge
                .pull_database(&target)
                .await
                .map(PullResponse::into_token);
            match result {
                Ok(Ok(token)) => self.install_token(token, None),
                Ok(Err(message)) => warn!(table, pull = %target, error = %message, "Refresh pull rejected"),
                Err(err) => warn!(table, pull = %target, error = %err, "Refresh pull failed"),
            }
        }

        self.fetch(table, poll_id).await
    }

    /// Fetch and render one page. With `poll_id` set, nothing is rendered
    /// unless that schedule still owns the tab.
    async fn fetch(&self, table: &str, poll_id: Option<u64>) -> SessionResult<()> {
        let request = {
            let mut state = self.shared.state.lock();
            let token = state
                .token
                .clone()
                .or_else(|| state.superseded_token.clone());
            let tab = state
                .tab_mut(table)
                .ok_or_else(|| SessionError::TabNotOpen(table.to_string()))?;
            if poll_id.is_some() && tab.poll_id() != poll_id {
                return Ok(());
            }
            let cursor = tab.cursor();
            match token {
                Some(token) => Some((token, cursor.limit(), cursor.offset())),
                None => {
                    tab.apply_error(NO_DATABASE);
                    None
                }
            }
        };
        let Some((token, limit, offset)) = request else {
            self.emit(ViewEvent::TabUpdated {
                table: table.to_string(),
            });
            self.set_error(Region::Tab(table.to_string()), NO_DATABASE.to_string());
            return Ok(());
        };

        debug!(table, token = %token, limit, offset, "Reading table");
        let result = self
            .shared
            .bridge
            .read_table(&token, table, limit, offset)
            .await;

        let region = Region::Tab(table.to_string());
        let failure = {
            let mut state = self.shared.state.lock();
            let Some(tab) = state.tab_mut(table) else {
                debug!(table, "Tab closed before page arrived");
                return Ok(());
            };
            if poll_id.is_some() && tab.poll_id() != poll_id {
                return Ok(());
            }
            let failure = match result {
                Ok(page) => {
                    tab.apply_page(page);
                    None
                }
                Err(err) => {
                    warn!(table, token = %token, error = %err, "Failed to read table");
                    let message = describe("Error loading data", &err);
                    tab.apply_error(message.clone());
                    Some(message)
                }
            };
            match &failure {
                Some(message) => state.errors.insert(region.clone(), message.clone()),
                None => state.errors.remove(&region),
            };
            failure
        };
        self.emit(ViewEvent::TabUpdated {
            table: table.to_string(),
        });
        if let Some(message) = failure {
            self.emit(ViewEvent::InlineError { region, message });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query console
    // ------------------------------------------------------------------

    /// Run an ad hoc query against the current snapshot.
    ///
    /// Every submission that reaches the bridge is recorded, including
    /// failures; nothing is raised to the caller.
    pub async fn execute_query(&self, query: &str) -> QueryDispatch {
        let Some(token) = self.current_token() else {
            self.validation_gap(NO_DATABASE);
            return QueryDispatch::Prompted;
        };

        let submitted_at = Utc::now();
        let outcome = match self.shared.bridge.execute_query(&token, query).await {
            Ok(response) => {
                self.clear_error(Region::QueryConsole);
                QueryOutcome::from(response)
            }
            Err(BridgeError::Remote(error)) => {
                self.clear_error(Region::QueryConsole);
                QueryOutcome::Error { error }
            }
            Err(err) => {
                warn!(error = %err, "Query transport failure");
                let message = describe("Error executing query", &err);
                self.set_error(Region::QueryConsole, message.clone());
                QueryOutcome::Error { error: message }
            }
        };

        let (sequence, status) = {
            let mut state = self.shared.state.lock();
            let entry = state.history.append(query, submitted_at, outcome);
            (entry.sequence, entry.status)
        };
        info!(sequence, status = %status, "Query recorded");
        self.emit(ViewEvent::HistoryAppended { sequence });
        QueryDispatch::Recorded(sequence)
    }

    /// Read the history through its restartable view.
    pub fn with_history<R>(&self, read: impl FnOnce(HistoryView<'_>) -> R) -> R {
        let state = self.shared.state.lock();
        read(state.history.entries())
    }

    /// Owned copy of the history, newest first.
    pub fn history(&self) -> Vec<QueryHistoryEntry> {
        self.with_history(|view| view.iter().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Display state
    // ------------------------------------------------------------------

    pub fn current_token(&self) -> Option<DatabaseSnapshotToken> {
        self.shared.state.lock().token.clone()
    }

    pub fn pull_target(&self) -> Option<PullTarget> {
        self.shared.state.lock().pull_target.clone()
    }

    pub fn active_view(&self) -> ActiveView {
        self.shared.state.lock().active.clone()
    }

    pub fn tab(&self, table: &str) -> Option<TabSummary> {
        self.shared.state.lock().tab(table).map(TableTabSession::summary)
    }

    pub fn open_tabs(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .tabs
            .iter()
            .map(|tab| tab.table_name().to_string())
            .collect()
    }

    pub fn inline_error(&self, region: &Region) -> Option<String> {
        self.shared.state.lock().errors.get(region).cloned()
    }

    pub fn prompt(&self) -> Option<String> {
        self.shared.state.lock().prompt.clone()
    }

    pub fn dismiss_prompt(&self) {
        self.shared.state.lock().prompt = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock();
        let root_status = state
            .selected_device
            .as_ref()
            .map(|_| (if state.rooted { ROOTED } else { NOT_ROOTED }).to_string());
        let database_notice = state
            .databases
            .as_ref()
            .filter(|databases| databases.is_empty())
            .map(|_| NO_DATABASES_FOUND.to_string());

        SessionSnapshot {
            devices: state.devices.clone(),
            selected_device: state.selected_device.clone(),
            root_status,
            packages: state.packages.visible().into_iter().cloned().collect(),
            package_count: state.packages.all().len(),
            package_search: state.packages.search().to_string(),
            only_debuggable: state.packages.only_debuggable(),
            selected_package: state.selected_package.clone(),
            databases: state.databases.clone(),
            database_notice,
            tables: state.tables.clone(),
            column_hints: state.column_hints.clone(),
            token: state.token.clone(),
            pull_target: state.pull_target.clone(),
            tabs: state.tabs.iter().map(TableTabSession::summary).collect(),
            active_view: state.active.clone(),
            prompt: state.prompt.clone(),
            inline_errors: state
                .errors
                .iter()
                .map(|(region, message)| InlineError {
                    region: region.clone(),
                    message: message.clone(),
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn install_token(&self, token: DatabaseSnapshotToken, target: Option<PullTarget>) {
        let changed = {
            let mut state = self.shared.state.lock();
            if let Some(target) = target {
                state.pull_target = Some(target);
            }
            let changed = state.token.as_ref() != Some(&token);
            state.token = Some(token.clone());
            state.superseded_token = None;
            changed
        };
        if changed {
            info!(token = %token, "Snapshot token acquired");
            self.emit(ViewEvent::TokenChanged { token: Some(token) });
        }
    }

    fn validation_gap(&self, message: &str) -> SessionError {
        self.shared.state.lock().prompt = Some(message.to_string());
        self.emit(ViewEvent::Prompt {
            message: message.to_string(),
        });
        SessionError::Validation(message.to_string())
    }

    fn set_error(&self, region: Region, message: String) {
        self.shared
            .state
            .lock()
            .errors
            .insert(region.clone(), message.clone());
        self.emit(ViewEvent::InlineError { region, message });
    }

    fn clear_error(&self, region: Region) {
        self.shared.state.lock().errors.remove(&region);
    }

    fn emit(&self, event: ViewEvent) {
        // No subscribers is fine.
        let _ = self.shared.events.send(event);
    }
}

/// Bridge errors are shown verbatim; anything else gets a context prefix.
fn describe(context: &str, err: &BridgeError) -> String {
    match err {
        BridgeError::Remote(message) => message.clone(),
        other => format!("{}: {}", context, other),
    }
}
