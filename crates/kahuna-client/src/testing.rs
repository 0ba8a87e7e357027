//! Scripted transport doubles for driver tests.
//!
//! Provides an engine-independent way to test the runtime against a
//! deterministic vendor: [`ScriptedClient`] answers RPC calls from
//! per-operation response queues and records every call for ordering
//! assertions, and [`ScriptedDiscovery`] hands out scripted clients per
//! server name with configurable failure counts for retry tests.
//!
//! # Queue semantics
//!
//! Responses for one `(service, operation)` pair are consumed in order;
//! the **last** scripted response is sticky and repeats forever. This
//! matches how polling code consumes the transport: a status sequence
//! `["Experiment running", "Experiment completed"]` yields running once
//! and completed on every later poll, however many times the loop asks.
//!
//! # Example
//!
//! ```
//! use kahuna_client::testing::{ok_envelope, ScriptedClient};
//! use kahuna_client::RpcClient;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = ScriptedClient::new("AutomationStudio");
//! client.respond_ok(
//!     "ExperimentStatusService",
//!     "GetStatus",
//!     &ok_envelope("Experiment running", 0),
//! );
//!
//! let raw = client
//!     .call("ExperimentStatusService", "GetStatus", &[])
//!     .await
//!     .unwrap();
//! assert!(raw.contains("Experiment running"));
//! assert_eq!(client.call_count("ExperimentStatusService", "GetStatus"), 1);
//! # }
//! ```

use crate::error::TransportError;
use crate::transport::{Discovery, RpcClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builds a `ReturnValue` envelope with `Status: Success`.
#[must_use]
pub fn ok_envelope(content: &str, status_code: i64) -> String {
    serde_json::json!({
        "Status": "Success",
        "Content": content,
        "Error": "",
        "StatusCode": status_code,
    })
    .to_string()
}

/// Builds a `ReturnValue` envelope with `Status: Failure` and a
/// negative status code.
#[must_use]
pub fn err_envelope(error: &str, status_code: i64) -> String {
    serde_json::json!({
        "Status": "Failure",
        "Content": "",
        "Error": error,
        "StatusCode": status_code,
    })
    .to_string()
}

/// Record of one RPC call made against a [`ScriptedClient`].
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// RPC feature name.
    pub service: String,
    /// Operation name.
    pub operation: String,
    /// Positional arguments as passed.
    pub args: Vec<Value>,
}

enum Scripted {
    Ok(String),
    Err(TransportError),
}

/// Deterministic [`RpcClient`] answering from scripted queues.
pub struct ScriptedClient {
    server: String,
    scripts: Mutex<HashMap<(String, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<CallRecord>>,
    closed: AtomicBool,
}

impl ScriptedClient {
    /// Creates a client pretending to serve the named server.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// The server name this client was created for.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Queues a raw `ReturnValue` response for `(service, operation)`.
    pub fn respond_ok(&self, service: &str, operation: &str, raw: &str) {
        self.scripts
            .lock()
            .entry((service.to_string(), operation.to_string()))
            .or_default()
            .push_back(Scripted::Ok(raw.to_string()));
    }

    /// Queues a sequence of raw responses for `(service, operation)`.
    pub fn respond_seq<'a>(
        &self,
        service: &str,
        operation: &str,
        raws: impl IntoIterator<Item = &'a str>,
    ) {
        for raw in raws {
            self.respond_ok(service, operation, raw);
        }
    }

    /// Queues a transport failure for `(service, operation)`.
    pub fn respond_err(&self, service: &str, operation: &str, err: TransportError) {
        self.scripts
            .lock()
            .entry((service.to_string(), operation.to_string()))
            .or_default()
            .push_back(Scripted::Err(err));
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    /// Returns how many times `(service, operation)` was called.
    #[must_use]
    pub fn call_count(&self, service: &str, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.service == service && c.operation == operation)
            .count()
    }

    /// Returns the first string argument of every call to
    /// `(service, operation)`, e.g. the options answered via `SetInput`.
    #[must_use]
    pub fn string_args(&self, service: &str, operation: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.service == service && c.operation == operation)
            .filter_map(|c| c.args.first().and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Returns `true` once [`RpcClient::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcClient for ScriptedClient {
    async fn call(
        &self,
        service: &str,
        operation: &str,
        args: &[Value],
    ) -> Result<String, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Connection("client closed".into()));
        }

        self.calls.lock().push(CallRecord {
            service: service.to_string(),
            operation: operation.to_string(),
            args: args.to_vec(),
        });

        let mut scripts = self.scripts.lock();
        let queue = scripts
            .get_mut(&(service.to_string(), operation.to_string()))
            .ok_or_else(|| {
                TransportError::call(service, operation, "no scripted response")
            })?;

        // Sticky last: the final scripted entry repeats forever.
        let entry = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|e| match e {
                Scripted::Ok(raw) => Scripted::Ok(raw.clone()),
                Scripted::Err(err) => Scripted::Err(err.clone()),
            })
        };

        match entry {
            Some(Scripted::Ok(raw)) => Ok(raw),
            Some(Scripted::Err(err)) => Err(err),
            None => Err(TransportError::call(
                service,
                operation,
                "no scripted response",
            )),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Record of one discovery attempt against a [`ScriptedDiscovery`].
#[derive(Debug, Clone)]
pub struct DiscoveryRecord {
    /// The server name that was requested.
    pub server: String,
    /// The timeout the caller allowed.
    pub timeout: Duration,
}

/// Deterministic [`Discovery`] handing out scripted clients by name.
#[derive(Default)]
pub struct ScriptedDiscovery {
    servers: Mutex<HashMap<String, Arc<ScriptedClient>>>,
    failures: Mutex<HashMap<String, u32>>,
    log: Mutex<Vec<DiscoveryRecord>>,
}

impl ScriptedDiscovery {
    /// Creates an empty discovery double; unknown servers fail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a server and returns its scripted client for setup.
    pub fn serve(&self, server: &str) -> Arc<ScriptedClient> {
        let client = Arc::new(ScriptedClient::new(server));
        self.servers
            .lock()
            .insert(server.to_string(), Arc::clone(&client));
        client
    }

    /// Makes the first `n` discovery attempts for `server` fail before
    /// any registered client is handed out.
    pub fn fail_first(&self, server: &str, n: u32) {
        self.failures.lock().insert(server.to_string(), n);
    }

    /// Returns every discovery attempt made so far, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<DiscoveryRecord> {
        self.log.lock().clone()
    }

    /// Returns how many attempts targeted `server`.
    #[must_use]
    pub fn attempt_count(&self, server: &str) -> usize {
        self.log.lock().iter().filter(|r| r.server == server).count()
    }
}

#[async_trait]
impl Discovery for ScriptedDiscovery {
    async fn discover(
        &self,
        server_name: &str,
        timeout: Duration,
    ) -> Result<Arc<dyn RpcClient>, TransportError> {
        self.log.lock().push(DiscoveryRecord {
            server: server_name.to_string(),
            timeout,
        });

        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(server_name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(TransportError::discovery(
                        server_name,
                        "scripted discovery failure",
                    ));
                }
            }
        }

        self.servers
            .lock()
            .get(server_name)
            .map(|c| Arc::clone(c) as Arc<dyn RpcClient>)
            .ok_or_else(|| TransportError::discovery(server_name, "no such server"))
    }
}
