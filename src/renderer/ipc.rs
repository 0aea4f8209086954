//! Transport-agnostic IPC adapter boundary.
//!
//! Each collaborator the supervisor needs from the outside world — a
//! client connection, a process launcher, a rendezvous primitive, a fatal
//! fault sink — is a small `async_trait` capability trait with a blanket
//! `Arc<T>` impl, so production and test implementations can be swapped in
//! without touching the supervisor itself.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::ServiceName;

/// A lightweight, opaque process id handle. No further process
/// introspection is part of this crate's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("failed to spawn renderer process")]
pub struct LaunchError;

/// Classifies an [`IpcError`] without requiring callers to match on the
/// `Display` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcErrorKind {
    Timeout,
    NotConnected,
    Io,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("ipc call timed out")]
    Timeout,
    #[error("ipc client is not connected to a server")]
    NotConnected,
    #[error("ipc transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl IpcError {
    pub fn kind(&self) -> IpcErrorKind {
        match self {
            IpcError::Timeout => IpcErrorKind::Timeout,
            IpcError::NotConnected => IpcErrorKind::NotConnected,
            IpcError::Io(_) => IpcErrorKind::Io,
        }
    }
}

/// One connected (or connecting) IPC client, scoped to a single renderer
/// service. Responses are ignored by callers; `call` reports only whether
/// the round trip completed within `timeout`.
#[async_trait]
pub trait IpcClient: Send + Sync {
    fn connected(&self) -> bool;
    async fn call(&self, request: &[u8], timeout: Duration) -> bool;
    fn last_error(&self) -> Option<IpcError>;
    fn server_protocol_version(&self) -> i32;
    fn server_product_version(&self) -> String;
}

#[async_trait]
impl<T: IpcClient + ?Sized> IpcClient for Arc<T> {
    fn connected(&self) -> bool {
        (**self).connected()
    }

    async fn call(&self, request: &[u8], timeout: Duration) -> bool {
        (**self).call(request, timeout).await
    }

    fn last_error(&self) -> Option<IpcError> {
        (**self).last_error()
    }

    fn server_protocol_version(&self) -> i32 {
        (**self).server_protocol_version()
    }

    fn server_product_version(&self) -> String {
        (**self).server_product_version()
    }
}

/// Constructs [`IpcClient`]s for a given service name. May return `None`
/// (e.g. the transport rendezvous point does not exist yet); when
/// `expected_path` is `None` the client skips path verification.
#[async_trait]
pub trait IpcClientFactory: Send + Sync {
    async fn new_client(&self, service_name: &ServiceName, expected_path: Option<&Path>) -> Option<Arc<dyn IpcClient>>;
}

/// Best-effort kill of the transport server for a service name.
#[async_trait]
pub trait ServerTerminator: Send + Sync {
    async fn terminate_server(&self, service_name: &ServiceName) -> bool;
}

/// Per-platform child process spawn capability, isolating OS-specific
/// spawn logic behind a single trait.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawns the renderer binary at `path`, passing `--restricted` when
    /// `restricted` is set (the parent is sandboxed/in a job object).
    async fn spawn(&self, path: &Path, restricted: bool) -> Result<Pid, LaunchError>;

    /// Forwarded from [`super::RendererSupervisor::set_suppress_error_dialog`].
    fn set_suppress_error_dialog(&self, suppress: bool);
}

/// Outcome of waiting on the rendezvous primitive after spawning the
/// renderer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendezvousOutcome {
    Timeout,
    EventSignaled,
    ProcessSignaled,
    Other,
}

/// A named event/semaphore a freshly launched renderer signals once ready.
#[async_trait]
pub trait RendezvousListener: Send + Sync {
    fn is_available(&self) -> bool;
    async fn wait_event_or_process(&self, timeout: Duration, pid: Pid) -> RendezvousOutcome;
}

/// Unblocks a waiting [`RendezvousListener`]; used at supervisor
/// teardown to cancel an in-flight launch worker.
pub trait RendezvousNotifier: Send + Sync {
    fn notify(&self);
}

/// Produces the listener/notifier pair for a given service name.
pub trait RendezvousFactory: Send + Sync {
    fn listener(&self, service_name: &ServiceName) -> Arc<dyn RendezvousListener>;
    fn notifier(&self, service_name: &ServiceName) -> Arc<dyn RendezvousNotifier>;
}

/// Receives the non-recoverable-locally faults this crate ever surfaces to
/// the wider application.
pub trait FatalHandler: Send + Sync {
    fn on_fatal(&self, reason: FatalReason);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalReason {
    RendererFatal,
    RendererVersionMismatch,
}

/// A [`FatalHandler`] that does nothing; useful as a default when the host
/// application does not need to react to fatal renderer faults.
pub struct NullFatalHandler;

impl FatalHandler for NullFatalHandler {
    fn on_fatal(&self, _reason: FatalReason) {}
}

#[cfg(any(test, feature = "test"))]
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// A scriptable [`IpcClient`] double: canned connectivity/version
    /// responses, and a call log for assertions.
    pub struct StubIpcClient {
        pub connected: bool,
        pub last_error: Option<IpcErrorKind>,
        pub protocol_version: i32,
        pub product_version: String,
        pub calls: Mutex<Vec<Vec<u8>>>,
    }

    impl StubIpcClient {
        pub fn new(connected: bool, protocol_version: i32, product_version: impl Into<String>) -> Self {
            StubIpcClient {
                connected,
                last_error: None,
                protocol_version,
                product_version: product_version.into(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn timed_out() -> Self {
            StubIpcClient {
                connected: false,
                last_error: Some(IpcErrorKind::Timeout),
                protocol_version: 0,
                product_version: String::new(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IpcClient for StubIpcClient {
        fn connected(&self) -> bool {
            self.connected
        }

        async fn call(&self, request: &[u8], _timeout: Duration) -> bool {
            self.calls.lock().push(request.to_vec());
            true
        }

        fn last_error(&self) -> Option<IpcError> {
            self.last_error.map(|kind| match kind {
                IpcErrorKind::Timeout => IpcError::Timeout,
                IpcErrorKind::NotConnected => IpcError::NotConnected,
                IpcErrorKind::Io => IpcError::Io(std::io::Error::other("stub")),
            })
        }

        fn server_protocol_version(&self) -> i32 {
            self.protocol_version
        }

        fn server_product_version(&self) -> String {
            self.product_version.clone()
        }
    }

    /// Hands out a preconfigured queue of clients, one per `new_client`
    /// call, falling back to the last one once exhausted.
    pub struct ScriptedIpcFactory {
        clients: Mutex<VecDeque<Option<Arc<dyn IpcClient>>>>,
        fallback: Option<Arc<dyn IpcClient>>,
    }

    impl ScriptedIpcFactory {
        pub fn new(clients: Vec<Option<Arc<dyn IpcClient>>>) -> Self {
            let fallback = clients.last().cloned().flatten();
            ScriptedIpcFactory {
                clients: Mutex::new(clients.into()),
                fallback,
            }
        }

        pub fn single(client: Arc<dyn IpcClient>) -> Self {
            Self::new(vec![Some(client)])
        }
    }

    #[async_trait]
    impl IpcClientFactory for ScriptedIpcFactory {
        async fn new_client(&self, _service_name: &ServiceName, _expected_path: Option<&Path>) -> Option<Arc<dyn IpcClient>> {
            let mut queue = self.clients.lock();
            queue.pop_front().unwrap_or_else(|| self.fallback.clone())
        }
    }

    pub struct NullTerminator(pub Mutex<u32>);

    impl Default for NullTerminator {
        fn default() -> Self {
            NullTerminator(Mutex::new(0))
        }
    }

    #[async_trait]
    impl ServerTerminator for NullTerminator {
        async fn terminate_server(&self, _service_name: &ServiceName) -> bool {
            *self.0.lock() += 1;
            true
        }
    }

    pub struct NullLauncher;

    #[async_trait]
    impl ProcessLauncher for NullLauncher {
        async fn spawn(&self, _path: &Path, _restricted: bool) -> Result<Pid, LaunchError> {
            Ok(Pid(1))
        }

        fn set_suppress_error_dialog(&self, _suppress: bool) {}
    }

    pub struct ImmediateRendezvous;

    #[async_trait]
    impl RendezvousListener for ImmediateRendezvous {
        fn is_available(&self) -> bool {
            true
        }

        async fn wait_event_or_process(&self, _timeout: Duration, _pid: Pid) -> RendezvousOutcome {
            RendezvousOutcome::EventSignaled
        }
    }

    impl RendezvousNotifier for ImmediateRendezvous {
        fn notify(&self) {}
    }

    pub struct ImmediateRendezvousFactory;

    impl RendezvousFactory for ImmediateRendezvousFactory {
        fn listener(&self, _service_name: &ServiceName) -> Arc<dyn RendezvousListener> {
            Arc::new(ImmediateRendezvous)
        }

        fn notifier(&self, _service_name: &ServiceName) -> Arc<dyn RendezvousNotifier> {
            Arc::new(ImmediateRendezvous)
        }
    }

    /// A rendezvous whose listener never signals until timeout.
    pub struct TimeoutRendezvousFactory;

    pub struct TimeoutListener;

    #[async_trait]
    impl RendezvousListener for TimeoutListener {
        fn is_available(&self) -> bool {
            true
        }

        async fn wait_event_or_process(&self, timeout: Duration, _pid: Pid) -> RendezvousOutcome {
            tokio::time::sleep(timeout).await;
            RendezvousOutcome::Timeout
        }
    }

    impl RendezvousNotifier for TimeoutListener {
        fn notify(&self) {}
    }

    impl RendezvousFactory for TimeoutRendezvousFactory {
        fn listener(&self, _service_name: &ServiceName) -> Arc<dyn RendezvousListener> {
            Arc::new(TimeoutListener)
        }

        fn notifier(&self, _service_name: &ServiceName) -> Arc<dyn RendezvousNotifier> {
            Arc::new(TimeoutListener)
        }
    }

    #[derive(Default)]
    pub struct RecordingFatalHandler(pub Mutex<Vec<FatalReason>>);

    impl FatalHandler for RecordingFatalHandler {
        fn on_fatal(&self, reason: FatalReason) {
            self.0.lock().push(reason);
        }
    }
}
