//! Shared fixtures for the session integration tests.

#![allow(dead_code)]

use adapters::{AdapterError, AuthApi, AuthResponse, LoginRequest, UserPayload};
use async_trait::async_trait;
use frontend::auth::{AuthSessionManager, RecordingNavigator};
use frontend::config::PortalConfig;
use frontend::errors::StorageError;
use frontend::storage::{MemoryStorage, SessionStore, StorageBackend};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn user(permissions: &[&str]) -> UserPayload {
    UserPayload {
        id: "17".into(),
        email: "ana@example.com".into(),
        first_name: "Ana".into(),
        last_name: "Silva".into(),
        role: Some("agent".into()),
        departments: Vec::new(),
        subsidiaries: Vec::new(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}

/// `AuthApi` fake whose responses are scripted per call.
///
/// Whoami answers are consumed in order; once the queue is empty the
/// fallback answer repeats.
#[derive(Default)]
pub struct ScriptedApi {
    login: Mutex<Option<Result<AuthResponse, AdapterError>>>,
    whoami: Mutex<VecDeque<Result<UserPayload, AdapterError>>>,
    whoami_fallback: Mutex<Option<Result<UserPayload, AdapterError>>>,
    logout_result: Mutex<Option<AdapterError>>,
    pub login_calls: AtomicUsize,
    pub whoami_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    logout_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn login_ok(&self, token: &str, permissions: &[&str]) {
        *self.login.lock() = Some(Ok(AuthResponse {
            token: token.to_string(),
            user: user(permissions),
        }));
    }

    pub fn login_err(&self, err: AdapterError) {
        *self.login.lock() = Some(Err(err));
    }

    pub fn push_whoami(&self, result: Result<UserPayload, AdapterError>) {
        self.whoami.lock().push_back(result);
    }

    pub fn whoami_always(&self, result: Result<UserPayload, AdapterError>) {
        *self.whoami_fallback.lock() = Some(result);
    }

    pub fn fail_logout(&self, err: AdapterError) {
        *self.logout_result.lock() = Some(err);
    }

    /// Holds every following whoami call until the returned handle is
    /// notified.
    pub fn hold_whoami(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Holds every following logout call until the returned handle is
    /// notified.
    pub fn hold_logout(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.logout_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn whoami_count(&self) -> usize {
        self.whoami_calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().clone()
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, AdapterError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login
            .lock()
            .clone()
            .unwrap_or_else(|| Err(AdapterError::Transport("login not scripted".into())))
    }

    async fn whoami(&self, token: &str) -> Result<UserPayload, AdapterError> {
        self.whoami_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().push(token.to_string());
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(next) = self.whoami.lock().pop_front() {
            return next;
        }
        self.whoami_fallback
            .lock()
            .clone()
            .unwrap_or_else(|| Err(AdapterError::Transport("whoami not scripted".into())))
    }

    async fn logout(&self, _token: &str) -> Result<(), AdapterError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.logout_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.logout_result.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Memory backend that refuses writes while `refuse_writes` is set.
#[derive(Debug)]
pub struct FlakyStorage {
    inner: Arc<MemoryStorage>,
    pub refuse_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn new(inner: Arc<MemoryStorage>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            refuse_writes: AtomicBool::new(false),
        })
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse_writes.store(refuse, Ordering::SeqCst);
    }
}

impl StorageBackend for FlakyStorage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Err(StorageError::corrupt(self.name(), "quota exceeded"));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

/// Everything a test needs to drive one simulated browser tab.
pub struct Harness {
    pub api: Arc<ScriptedApi>,
    pub ephemeral: Arc<MemoryStorage>,
    pub durable: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
    pub manager: AuthSessionManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(
            Arc::new(MemoryStorage::new("ephemeral")),
            Arc::new(MemoryStorage::new("durable")),
        )
    }

    pub fn with_storage(ephemeral: Arc<MemoryStorage>, durable: Arc<MemoryStorage>) -> Self {
        Self::build(ephemeral.clone(), durable, ephemeral)
    }

    /// A tab whose ephemeral writes go through a [`FlakyStorage`].
    pub fn with_flaky_ephemeral() -> (Self, Arc<FlakyStorage>) {
        let ephemeral = Arc::new(MemoryStorage::new("ephemeral"));
        let flaky = FlakyStorage::new(ephemeral.clone());
        let durable = Arc::new(MemoryStorage::new("durable"));
        (Self::build(ephemeral, durable, flaky.clone()), flaky)
    }

    fn build(
        ephemeral: Arc<MemoryStorage>,
        durable: Arc<MemoryStorage>,
        ephemeral_backend: Arc<dyn StorageBackend>,
    ) -> Self {
        init_tracing();
        let api = ScriptedApi::new();
        let navigator = Arc::new(RecordingNavigator::new());
        let config = PortalConfig::default();
        let store = SessionStore::new(ephemeral_backend, durable.clone(), config.storage.clone());
        let manager = AuthSessionManager::new(api.clone(), store, navigator.clone(), config);
        Self {
            api,
            ephemeral,
            durable,
            navigator,
            manager,
        }
    }

    /// A fresh manager over the same storage, as after a page reload.
    pub fn reload(&self) -> Self {
        Self::with_storage(self.ephemeral.clone(), self.durable.clone())
    }

    pub fn ephemeral_token(&self) -> Option<String> {
        self.ephemeral.get("token").unwrap()
    }

    pub fn durable_token(&self) -> Option<String> {
        self.durable.get("token").unwrap()
    }

    /// Persists a session snapshot directly, bypassing login.
    pub fn seed(&self, backend: &dyn StorageBackend, token: &str, permissions: &[&str]) {
        backend.set("token", token).unwrap();
        backend
            .set("user", &serde_json::to_string(&user(permissions)).unwrap())
            .unwrap();
    }
}
