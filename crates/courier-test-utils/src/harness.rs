// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for dispatch and scheduler integration tests.
//!
//! `TestHarness` assembles in-memory stores, a mock transport, a recording
//! notifier, and a `Dispatcher` wired the same way `courier serve` wires
//! the production pieces. [`TempSqliteStore`] adds a real SQLite store on
//! a throwaway database for tests that need the SQL semantics.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_config::{BackendConfig, DeliveryTarget, SupportedBackendConfig};
use courier_core::{CourierError, MessageStore};
use courier_dispatch::{BackendPolicy, BackendRegistry, Dispatcher, RequestBuilder, Sanitizer};
use courier_storage::{Database, SqliteStore};
use tracing::debug;

use crate::memory_store::MemoryStore;
use crate::mock_notifier::RecordingNotifier;
use crate::mock_transport::MockTransport;

/// Kannel-style template used when a test does not care about routing.
pub const KANNEL_TEMPLATE: &str =
    "http://kannel/send?to=%(recipient)s&text=%(text)s&smsc=%(backend)s&priority=%(priority)s";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    stores: Vec<(String, DeliveryTarget)>,
    supported_backends: Option<BTreeMap<String, SupportedBackendConfig>>,
    backends: BTreeMap<String, BackendConfig>,
    special_chars: BTreeMap<String, String>,
    default_status: u16,
    max_attempts: Option<u32>,
    failing_notifier: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            stores: Vec::new(),
            supported_backends: None,
            backends: BTreeMap::new(),
            special_chars: BTreeMap::new(),
            default_status: 200,
            max_attempts: None,
            failing_notifier: false,
        }
    }

    /// Add a store delivering through `target`. Stores are polled in the
    /// order they are added.
    pub fn with_store(mut self, name: &str, target: DeliveryTarget) -> Self {
        self.stores.push((name.to_string(), target));
        self
    }

    /// Allow a backend, optionally with an identity rule.
    pub fn with_supported_backend(mut self, backend: &str, rule: Option<&str>) -> Self {
        self.supported_backends.get_or_insert_with(BTreeMap::new).insert(
            backend.to_string(),
            SupportedBackendConfig {
                identity_validation_regex: rule.map(str::to_string),
            },
        );
        self
    }

    /// Register a structured adapter backend.
    pub fn with_backend(mut self, name: &str, config: BackendConfig) -> Self {
        self.backends.insert(name.to_string(), config);
        self
    }

    /// Add a text substitution.
    pub fn with_special_char(mut self, from: &str, to: &str) -> Self {
        self.special_chars.insert(from.to_string(), to.to_string());
        self
    }

    /// Status the transport answers once its script runs out.
    pub fn with_default_status(mut self, status: u16) -> Self {
        self.default_status = status;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Use a notifier that fails every alert.
    pub fn with_failing_notifier(mut self) -> Self {
        self.failing_notifier = true;
        self
    }

    /// Build the harness. A harness without stores gets a single `default`
    /// store using [`KANNEL_TEMPLATE`].
    pub fn build(self) -> Result<TestHarness, CourierError> {
        let mut stores = self.stores;
        if stores.is_empty() {
            stores.push((
                "default".to_string(),
                DeliveryTarget::Template(KANNEL_TEMPLATE.to_string()),
            ));
        }

        let policy = BackendPolicy::from_config(self.supported_backends.as_ref())?;
        let adapters = BackendRegistry::from_config(&self.backends)?;
        let sanitizer = Sanitizer::new(&self.special_chars)?;
        let transport = Arc::new(MockTransport::with_default_status(self.default_status));
        let dispatcher = Dispatcher::new(
            RequestBuilder::new(sanitizer, adapters),
            policy,
            transport.clone(),
        )
        .with_max_attempts(self.max_attempts);

        let notifier = Arc::new(if self.failing_notifier {
            RecordingNotifier::failing()
        } else {
            RecordingNotifier::new()
        });

        let stores = stores
            .into_iter()
            .map(|(name, target)| (MemoryStore::new(name), target))
            .collect();

        Ok(TestHarness {
            stores,
            sqlite_stores: Vec::new(),
            transport,
            notifier,
            dispatcher: Arc::new(dispatcher),
        })
    }
}

/// A [`SqliteStore`] on a database in its own temporary directory.
///
/// The directory, and the database with it, is removed on drop.
pub struct TempSqliteStore {
    store: SqliteStore,
    _temp_dir: tempfile::TempDir,
}

impl TempSqliteStore {
    /// Creates the database and runs migrations.
    pub async fn open(name: &str) -> Result<Self, CourierError> {
        let temp_dir = tempfile::TempDir::new().map_err(CourierError::storage)?;
        let db_path = temp_dir.path().join(format!("{name}.db"));
        let db = Database::open(&db_path.to_string_lossy()).await?;
        debug!(store = name, path = %db_path.display(), "temporary SQLite store opened");
        Ok(Self {
            store: SqliteStore::new(name, db),
            _temp_dir: temp_dir,
        })
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Database handle for seeding rows with the query modules.
    pub fn database(&self) -> &Database {
        self.store.database()
    }
}

/// A complete dispatch stack with mock collaborators.
pub struct TestHarness {
    stores: Vec<(MemoryStore, DeliveryTarget)>,
    sqlite_stores: Vec<(TempSqliteStore, DeliveryTarget)>,
    transport: Arc<MockTransport>,
    notifier: Arc<RecordingNotifier>,
    dispatcher: Arc<Dispatcher>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The store with the given name.
    ///
    /// # Panics
    /// Panics when no such store was configured.
    pub fn store(&self, name: &str) -> &MemoryStore {
        match self.stores.iter().find(|(s, _)| s.name() == name) {
            Some((store, _)) => store,
            None => panic!("harness has no store named {name}"),
        }
    }

    /// The first configured store.
    pub fn default_store(&self) -> &MemoryStore {
        &self.stores[0].0
    }

    /// The delivery target of the first configured store.
    pub fn default_target(&self) -> &DeliveryTarget {
        &self.stores[0].1
    }

    /// Adds a SQLite store on a temporary database. It is polled after
    /// every in-memory store.
    pub async fn add_sqlite_store(
        &mut self,
        name: &str,
        target: DeliveryTarget,
    ) -> Result<&TempSqliteStore, CourierError> {
        let store = TempSqliteStore::open(name).await?;
        self.sqlite_stores.push((store, target));
        let last = self.sqlite_stores.len() - 1;
        Ok(&self.sqlite_stores[last].0)
    }

    /// The SQLite store with the given name.
    ///
    /// # Panics
    /// Panics when no such store was added.
    pub fn sqlite_store(&self, name: &str) -> &TempSqliteStore {
        match self
            .sqlite_stores
            .iter()
            .find(|(s, _)| s.store().name() == name)
        {
            Some((store, _)) => store,
            None => panic!("harness has no SQLite store named {name}"),
        }
    }

    /// Every store paired with its target, as the scheduler takes them.
    pub fn targets(&self) -> Vec<(Arc<dyn MessageStore>, DeliveryTarget)> {
        let memory = self.stores.iter().map(|(store, target)| {
            (
                Arc::new(store.clone()) as Arc<dyn MessageStore>,
                target.clone(),
            )
        });
        let sqlite = self.sqlite_stores.iter().map(|(temp, target)| {
            (
                Arc::new(temp.store().clone()) as Arc<dyn MessageStore>,
                target.clone(),
            )
        });
        memory.chain(sqlite).collect()
    }

    pub fn transport(&self) -> &Arc<MockTransport> {
        &self.transport
    }

    pub fn notifier(&self) -> Arc<RecordingNotifier> {
        self.notifier.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }
}
