//! Supervised renderer IPC client: the lifecycle state machine and command
//! dispatch algorithm that launches, watches, and relays commands to an
//! out-of-process renderer.
//!
//! One worker task runs per launch attempt (`tokio::task::spawn`, not a raw
//! OS thread), and shared lifecycle state (`status`, `error_streak`,
//! `pending_command`) lives behind a single `tokio::sync::Mutex`. An async
//! mutex is used rather than a synchronous one because the flush-on-ready
//! transition must hold the lock across an IPC send: the pending command
//! has to be delivered and the status flip to `READY` has to happen
//! atomically, or a concurrently submitted command could be lost.

pub mod command;
pub mod ipc;
mod version;

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

pub use command::{CommandKind, RendererCommand};
pub use ipc::{
    FatalHandler, FatalReason, IpcClient, IpcClientFactory, IpcErrorKind, LaunchError, Pid, ProcessLauncher,
    RendezvousFactory, RendezvousListener, RendezvousNotifier, RendezvousOutcome, ServerTerminator,
};
pub use version::{compare_product_versions, server_is_older};

use crate::config::SupervisorConfig;

/// Lifecycle status of the supervised renderer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unknown,
    Launching,
    Ready,
    Timeout,
    Terminated,
    Fatal,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Unknown => "unknown",
            Status::Launching => "launching",
            Status::Ready => "ready",
            Status::Timeout => "timeout",
            Status::Terminated => "terminated",
            Status::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// The transport rendezvous/service key: `"renderer" + ("." + desktop)?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(desktop_name: Option<&str>) -> Self {
        match desktop_name {
            Some(name) if !name.is_empty() => ServiceName(format!("renderer.{name}")),
            _ => ServiceName("renderer".to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct SharedState {
    status: Status,
    error_streak: u32,
    last_launch_time: Option<Instant>,
    pending_command: Option<RendererCommand>,
}

impl SharedState {
    fn new() -> Self {
        SharedState {
            status: Status::Unknown,
            error_streak: 0,
            last_launch_time: None,
            pending_command: None,
        }
    }
}

/// Capability bundle a [`RendererSupervisor`] is constructed with, grouping
/// every external collaborator it needs into one injectable struct.
pub struct RendererDeps {
    pub ipc_factory: Arc<dyn IpcClientFactory>,
    pub launcher: Arc<dyn ProcessLauncher>,
    pub terminator: Arc<dyn ServerTerminator>,
    pub rendezvous: Arc<dyn RendezvousFactory>,
    pub fatal_handler: Arc<dyn FatalHandler>,
}

/// Owns the lifecycle of one renderer child process: spawn/watch, relay
/// [`RendererCommand`]s, and tolerate crashes, timeouts and protocol/version
/// mismatches.
pub struct RendererSupervisor {
    shared: Arc<Mutex<SharedState>>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,

    window_visible: AtomicBool,
    disable_path_check: AtomicBool,
    version_mismatch_count: AtomicU32,

    renderer_path: PathBuf,
    service_name: ServiceName,
    config: SupervisorConfig,
    deps: RendererDeps,
    /// `true` when the parent process is sandboxed/in a job object, so the
    /// child is launched with `--restricted`.
    restricted_spawn: bool,
}

fn encode_command(c: &RendererCommand) -> Vec<u8> {
    // The wire payload is opaque to this crate; this is a minimal stand-in
    // encoding good enough for a same-process test double.
    let kind = match c.kind {
        CommandKind::Noop => 0u8,
        CommandKind::Update => 1u8,
        CommandKind::Shutdown => 2u8,
    };
    vec![kind, c.visible as u8, c.has_output as u8]
}

impl RendererSupervisor {
    pub fn new(renderer_path: PathBuf, desktop_name: Option<&str>, deps: RendererDeps, config: SupervisorConfig) -> Self {
        RendererSupervisor {
            shared: Arc::new(Mutex::new(SharedState::new())),
            worker_handle: Mutex::new(None),
            window_visible: AtomicBool::new(false),
            disable_path_check: AtomicBool::new(false),
            version_mismatch_count: AtomicU32::new(0),
            renderer_path,
            service_name: ServiceName::new(desktop_name),
            config,
            deps,
            restricted_spawn: false,
        }
    }

    pub fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    pub async fn status(&self) -> Status {
        self.shared.lock().await.status
    }

    pub fn version_mismatch_count(&self) -> u32 {
        self.version_mismatch_count.load(AtomicOrdering::Relaxed)
    }

    /// Sets the flag that makes subsequent IPC clients skip path
    /// verification.
    pub fn disable_path_check(&self) {
        self.disable_path_check.store(true, AtomicOrdering::Relaxed);
    }

    /// Forwards to the launcher; suppresses user-facing error popups.
    pub fn set_suppress_error_dialog(&self, suppress: bool) {
        self.deps.launcher.set_suppress_error_dialog(suppress);
    }

    fn expected_path(&self) -> Option<PathBuf> {
        if self.disable_path_check.load(AtomicOrdering::Relaxed) {
            None
        } else {
            Some(self.renderer_path.clone())
        }
    }

    async fn can_connect(&self) -> bool {
        let guard = self.shared.lock().await;
        match guard.status {
            Status::Unknown | Status::Ready => true,
            Status::Launching => false,
            Status::Timeout | Status::Terminated => {
                let streak_ok = guard.error_streak <= self.config.max_retries;
                let cooldown_ok = guard.last_launch_time.is_none_or(|t| t.elapsed() >= self.config.retry_cooldown);
                streak_ok && cooldown_ok
            }
            Status::Fatal => false,
        }
    }

    async fn set_pending_command(&self, c: RendererCommand) {
        if c.kind != CommandKind::Update {
            return;
        }
        self.shared.lock().await.pending_command = Some(c);
    }

    /// `If already READY, return success. Else send a NOOP via exec_command.`
    pub async fn activate(&self) -> bool {
        if self.status().await == Status::Ready {
            return true;
        }
        self.exec_command(RendererCommand::noop()).await
    }

    /// Dispatches a command to the renderer, launching it first if
    /// necessary. Never surfaces transport failures to the caller: a
    /// `false` return means the command should be retried by the caller,
    /// while `true` covers both a successful send and every case where the
    /// command was durably pended, discarded, or silently dropped.
    #[instrument(skip(self, c), fields(service = %self.service_name))]
    pub async fn exec_command(&self, c: RendererCommand) -> bool {
        // Not connectable yet (still launching, cooling down, or fatally
        // broken): pend the command and bail out early if still unconnectable.
        if !self.can_connect().await {
            self.set_pending_command(c.clone()).await;
            if !self.can_connect().await {
                debug!("not connectable; command durably pended");
                return true;
            }
        }

        if self.version_mismatch_count() >= self.config.version_mismatch_drop_threshold {
            debug!("version mismatch count over threshold; dropping command");
            return true;
        }

        let expected_path = self.expected_path();
        let client = self.deps.ipc_factory.new_client(&self.service_name, expected_path.as_deref()).await;
        if let Some(client) = &client {
            if client.last_error().map(|e| e.kind()) == Some(IpcErrorKind::Timeout) {
                warn!("ipc client reports timeout; treating as transient failure");
                return false;
            }
        }

        self.window_visible.store(c.visible, AtomicOrdering::Relaxed);

        let connected = client.as_ref().map(|c| c.connected()).unwrap_or(false);
        if !connected {
            if c.is_hide_with_nothing_to_hide() {
                debug!("discarding hide with nothing to hide");
                return true;
            }
            self.set_pending_command(c).await;
            self.start().await;
            return true;
        }
        let client = client.expect("connected implies a client was constructed");

        let server_protocol_version = client.server_protocol_version();
        match self.config.client_protocol_version.cmp(&server_protocol_version) {
            Ordering::Greater => {
                warn!(server_protocol_version, "client newer than server; forcing restart");
                self.deps.terminator.terminate_server(&self.service_name).await;
                self.version_mismatch_count.fetch_add(1, AtomicOrdering::Relaxed);
                self.set_pending_command(c).await;
                return true;
            }
            Ordering::Less => {
                warn!(server_protocol_version, "client older than server; non-recoverable");
                self.version_mismatch_count.store(u32::MAX, AtomicOrdering::Relaxed);
                self.deps.fatal_handler.on_fatal(FatalReason::RendererVersionMismatch);
                return true;
            }
            Ordering::Equal => {}
        }

        let server_product_version = client.server_product_version();
        if server_is_older(&self.config.client_product_version, &server_product_version) {
            warn!(server_product_version, "server older than client; requesting restart");
            self.set_pending_command(c).await;
            let _ = client.call(&encode_command(&RendererCommand::shutdown()), self.config.ipc_call_timeout).await;
            self.version_mismatch_count.fetch_add(1, AtomicOrdering::Relaxed);
            return true;
        }

        let sent = client.call(&encode_command(&c), self.config.ipc_call_timeout).await;
        if !sent {
            debug!("transport error delivering command; not resurfaced");
        }
        true
    }

    /// `If not connected, return success. If force, force-terminate
    /// transport server by name; else send SHUTDOWN.`
    pub async fn shutdown(&self, force: bool) -> bool {
        let expected_path = self.expected_path();
        let client = self.deps.ipc_factory.new_client(&self.service_name, expected_path.as_deref()).await;
        let connected = client.as_ref().map(|c| c.connected()).unwrap_or(false);
        if !connected {
            return true;
        }
        if force {
            self.deps.terminator.terminate_server(&self.service_name).await
        } else {
            let client = client.expect("connected implies a client was constructed");
            client.call(&encode_command(&RendererCommand::shutdown()), self.config.ipc_call_timeout).await
        }
    }

    /// Spawns the one-shot launch worker, unless one is already in flight.
    async fn start(&self) {
        {
            let mut guard = self.shared.lock().await;
            if guard.status == Status::Launching {
                return;
            }
            guard.status = Status::Launching;
            guard.last_launch_time = Some(Instant::now());
        }

        let expected_path = self.expected_path();
        let restricted = self.restricted_spawn;
        let worker = LaunchWorker {
            shared: self.shared.clone(),
            ipc_factory: self.deps.ipc_factory.clone(),
            launcher: self.deps.launcher.clone(),
            rendezvous: self.deps.rendezvous.clone(),
            fatal_handler: self.deps.fatal_handler.clone(),
            service_name: self.service_name.clone(),
            config: self.config.clone(),
            renderer_path: self.renderer_path.clone(),
            expected_path,
            restricted,
        };

        let handle = tokio::spawn(worker.run());
        *self.worker_handle.lock().await = Some(handle);
    }

    /// Tears down the supervisor: hides a visible window, then unblocks and
    /// joins the launch worker. `Drop` cannot run async code, so callers
    /// that own a `RendererSupervisor` should call this before dropping it.
    pub async fn close(&self) {
        if self.status().await == Status::Ready && self.window_visible.load(AtomicOrdering::Relaxed) {
            let _ = self.exec_command(RendererCommand::update(false, false)).await;
        }

        self.deps.rendezvous.notifier(&self.service_name).notify();
        if let Some(handle) = self.worker_handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}

struct LaunchWorker {
    shared: Arc<Mutex<SharedState>>,
    ipc_factory: Arc<dyn IpcClientFactory>,
    launcher: Arc<dyn ProcessLauncher>,
    rendezvous: Arc<dyn RendezvousFactory>,
    fatal_handler: Arc<dyn FatalHandler>,
    service_name: ServiceName,
    config: SupervisorConfig,
    renderer_path: PathBuf,
    expected_path: Option<PathBuf>,
    restricted: bool,
}

impl LaunchWorker {
    #[instrument(skip(self), fields(service = %self.service_name))]
    async fn run(self) {
        let pid = match self.launcher.spawn(&self.renderer_path, self.restricted).await {
            Ok(pid) => pid,
            Err(LaunchError) => {
                error!("renderer spawn failed");
                self.shared.lock().await.status = Status::Fatal;
                self.fatal_handler.on_fatal(FatalReason::RendererFatal);
                return;
            }
        };

        let listener = self.rendezvous.listener(&self.service_name);
        let outcome = if listener.is_available() {
            listener.wait_event_or_process(self.config.rendezvous_timeout, pid).await
        } else {
            tokio::time::sleep(self.config.post_spawn_fallback_sleep).await;
            RendezvousOutcome::EventSignaled
        };

        match outcome {
            RendezvousOutcome::EventSignaled => self.flush_and_ready().await,
            RendezvousOutcome::Timeout => {
                debug!("rendezvous timed out");
                self.mark_failed(Status::Timeout).await;
            }
            RendezvousOutcome::ProcessSignaled => {
                debug!("renderer process exited before signaling");
                self.mark_failed(Status::Terminated).await;
            }
            RendezvousOutcome::Other => {
                error!("unknown rendezvous outcome");
                self.mark_failed(Status::Fatal).await;
            }
        }
    }

    async fn mark_failed(&self, status: Status) {
        let mut guard = self.shared.lock().await;
        guard.status = status;
        guard.error_streak += 1;
    }

    /// Under the single shared lock, sends any pending command best-effort,
    /// clears the slot, then transitions to `READY` and resets
    /// `error_streak`. Held across the `.await`s so a concurrent
    /// `set_pending_command` is serialized with this flush.
    async fn flush_and_ready(&self) {
        let mut guard = self.shared.lock().await;
        if let Some(pending) = guard.pending_command.take() {
            if let Some(client) = self.ipc_factory.new_client(&self.service_name, self.expected_path.as_deref()).await {
                let _ = client.call(&encode_command(&pending), self.config.ipc_call_timeout).await;
            }
        }
        guard.status = Status::Ready;
        guard.error_streak = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::ipc::test_support::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn deps_connected_noop() -> RendererDeps {
        RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(Arc::new(StubIpcClient::new(false, 1, "1.0.0")))),
            launcher: Arc::new(NullLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(ImmediateRendezvousFactory),
            fatal_handler: Arc::new(RecordingFatalHandler::default()),
        }
    }

    /// Test doubles agree on protocol version `1` / product version `"1.0.0"`;
    /// pin the client side to match so version-mismatch handling isn't
    /// accidentally exercised by tests that aren't testing it.
    fn test_config() -> SupervisorConfig {
        SupervisorConfig {
            client_product_version: "1.0.0".to_owned(),
            ..SupervisorConfig::default()
        }
    }

    fn supervisor(deps: RendererDeps) -> RendererSupervisor {
        RendererSupervisor::new(PathBuf::from("/bin/renderer"), None, deps, test_config())
    }

    /// A cold send from `UNKNOWN` reaches `LAUNCHING` with the command
    /// pended, then flushes to `READY` exactly once.
    #[tokio::test]
    async fn cold_send_reaches_launching_then_ready() {
        let sup = supervisor(deps_connected_noop());
        let ok = sup.exec_command(RendererCommand::update(true, true)).await;
        assert!(ok);

        // give the spawned worker a chance to run to completion.
        for _ in 0..50 {
            if sup.status().await == Status::Ready {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(sup.status().await, Status::Ready);
    }

    /// A hide-with-nothing-to-hide command while disconnected is dropped
    /// without starting a launch.
    #[tokio::test]
    async fn hide_with_nothing_to_hide_is_dropped_while_disconnected() {
        let sup = supervisor(deps_connected_noop());
        let ok = sup.exec_command(RendererCommand::update(false, false)).await;
        assert!(ok);
        assert_eq!(sup.status().await, Status::Unknown);
    }

    /// `NOOP`/`SHUTDOWN` never occupy the pending slot.
    #[tokio::test]
    async fn non_update_commands_never_pend() {
        let sup = supervisor(deps_connected_noop());
        sup.set_pending_command(RendererCommand::noop()).await;
        sup.set_pending_command(RendererCommand::shutdown()).await;
        assert!(sup.shared.lock().await.pending_command.is_none());

        sup.set_pending_command(RendererCommand::update(true, true)).await;
        assert!(sup.shared.lock().await.pending_command.is_some());
    }

    /// Multiple `UPDATE`s issued while `LAUNCHING` coalesce to the last one.
    #[tokio::test]
    async fn updates_coalesce_while_launching() {
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(Arc::new(StubIpcClient::new(false, 1, "1.0.0")))),
            launcher: Arc::new(NullLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(TimeoutRendezvousFactory),
            fatal_handler: Arc::new(RecordingFatalHandler::default()),
        };
        let sup = supervisor(deps);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        assert_eq!(sup.status().await, Status::Launching);
        assert!(sup.exec_command(RendererCommand::update(true, false)).await);
        assert!(sup.exec_command(RendererCommand::update(false, true)).await);

        let guard = sup.shared.lock().await;
        assert_eq!(guard.pending_command, Some(RendererCommand::update(false, true)));
    }

    /// Closing a `READY` supervisor with `window_visible == true` sends
    /// exactly one final `UPDATE(visible=false)`.
    ///
    /// The first client handed out is disconnected, forcing a real launch;
    /// the second (returned to both the flush and the later `close()` send)
    /// is connected, so the full launch-then-teardown path is exercised.
    #[tokio::test]
    async fn close_sends_final_hide_to_visible_ready_window() {
        let connected = Arc::new(StubIpcClient::new(true, 1, "1.0.0"));
        let disconnected: Arc<dyn IpcClient> = Arc::new(StubIpcClient::new(false, 1, "1.0.0"));
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::new(vec![Some(disconnected), Some(connected.clone())])),
            launcher: Arc::new(NullLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(ImmediateRendezvousFactory),
            fatal_handler: Arc::new(RecordingFatalHandler::default()),
        };
        let sup = supervisor(deps);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        for _ in 0..50 {
            if sup.status().await == Status::Ready {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(sup.status().await, Status::Ready);

        sup.close().await;
        let calls = connected.calls.lock();
        assert_eq!(calls.len(), 2, "one flush of the pended UPDATE, one final hide");
        assert_eq!(calls[0], encode_command(&RendererCommand::update(true, true)));
        assert_eq!(calls[1], encode_command(&RendererCommand::update(false, false)));
    }

    /// A client newer than the server forces exactly one terminate +
    /// mismatch bump per command; after 3, commands return success with no IPC.
    #[tokio::test]
    async fn newer_client_drops_after_three_mismatches() {
        let client = Arc::new(StubIpcClient::new(true, 0, "1.0.0"));
        let terminator = Arc::new(NullTerminator::default());
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(client.clone())),
            launcher: Arc::new(NullLauncher),
            terminator: terminator.clone(),
            rendezvous: Arc::new(ImmediateRendezvousFactory),
            fatal_handler: Arc::new(RecordingFatalHandler::default()),
        };
        let sup = supervisor(deps);

        for i in 0..3 {
            assert!(sup.exec_command(RendererCommand::update(true, true)).await);
            assert_eq!(sup.version_mismatch_count(), i + 1);
        }
        assert_eq!(*terminator.0.lock(), 3);
        assert_eq!(client.calls.lock().len(), 0);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        assert_eq!(*terminator.0.lock(), 3, "no further terminate once dropped silently");
    }

    /// A client older than the server is non-recoverable; `on_fatal` fires
    /// exactly once and subsequent commands succeed without any send.
    #[tokio::test]
    async fn client_older_than_server_is_fatal() {
        let client = Arc::new(StubIpcClient::new(true, 2, "1.0.0"));
        let fatal_handler = Arc::new(RecordingFatalHandler::default());
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(client.clone())),
            launcher: Arc::new(NullLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(ImmediateRendezvousFactory),
            fatal_handler: fatal_handler.clone(),
        };
        let sup = supervisor(deps);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        assert_eq!(fatal_handler.0.lock().as_slice(), [FatalReason::RendererVersionMismatch]);
        assert_eq!(sup.version_mismatch_count(), u32::MAX);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        assert_eq!(fatal_handler.0.lock().len(), 1, "on_fatal fires exactly once");
        assert_eq!(client.calls.lock().len(), 0);
    }

    /// Throttled while `TIMEOUT`: no relaunch before 30s and no more than
    /// 5 attempts without an intervening `READY`.
    #[tokio::test(start_paused = true)]
    async fn timeout_throttles_retries() {
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(Arc::new(StubIpcClient::new(false, 1, "1.0.0")))),
            launcher: Arc::new(NullLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(TimeoutRendezvousFactory),
            fatal_handler: Arc::new(RecordingFatalHandler::default()),
        };
        let sup = supervisor(deps);

        for attempt in 0..5 {
            assert!(sup.exec_command(RendererCommand::update(true, true)).await);
            tokio::time::advance(std::time::Duration::from_secs(31)).await;
            for _ in 0..50 {
                if sup.status().await == Status::Timeout {
                    break;
                }
                tokio::task::yield_now().await;
            }
            assert_eq!(sup.status().await, Status::Timeout, "attempt {attempt}");
        }

        // streak is now 5; can_connect still allows exactly one more try.
        assert!(sup.can_connect().await);
        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        tokio::time::advance(std::time::Duration::from_secs(31)).await;
        for _ in 0..50 {
            if sup.status().await == Status::Timeout {
                break;
            }
            tokio::task::yield_now().await;
        }
        // streak is now 6; can_connect must refuse until a READY resets it.
        assert!(!sup.can_connect().await);
    }

    #[tokio::test]
    async fn service_name_formatting() {
        assert_eq!(ServiceName::new(None).as_str(), "renderer");
        assert_eq!(ServiceName::new(Some("")).as_str(), "renderer");
        assert_eq!(ServiceName::new(Some("main")).as_str(), "renderer.main");
    }

    #[tokio::test]
    async fn launch_fatal_on_spawn_failure() {
        struct FailingLauncher;
        #[async_trait::async_trait]
        impl ProcessLauncher for FailingLauncher {
            async fn spawn(&self, _path: &Path, _restricted: bool) -> Result<Pid, LaunchError> {
                Err(LaunchError)
            }
            fn set_suppress_error_dialog(&self, _suppress: bool) {}
        }

        let fatal_handler = Arc::new(RecordingFatalHandler::default());
        let deps = RendererDeps {
            ipc_factory: Arc::new(ScriptedIpcFactory::single(Arc::new(StubIpcClient::new(false, 1, "1.0.0")))),
            launcher: Arc::new(FailingLauncher),
            terminator: Arc::new(NullTerminator::default()),
            rendezvous: Arc::new(ImmediateRendezvousFactory),
            fatal_handler: fatal_handler.clone(),
        };
        let sup = supervisor(deps);

        assert!(sup.exec_command(RendererCommand::update(true, true)).await);
        for _ in 0..50 {
            if sup.status().await == Status::Fatal {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(sup.status().await, Status::Fatal);
        assert_eq!(fatal_handler.0.lock().as_slice(), [FatalReason::RendererFatal]);
    }
}
