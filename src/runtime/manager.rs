//! Orchestration runtime shared by all attached controllers.
//!
//! Controllers hand the manager named workers while they attach. Nothing
//! runs until [`Manager::run`] is called; it then spawns every worker on
//! tokio, waits for the shutdown signal, and joins them.

use crate::error::ManagerError;
use anyhow::{anyhow, bail, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// A worker takes its shutdown receiver and runs until told to stop.
pub type Worker = Box<dyn FnOnce(Shutdown) -> BoxFuture<'static, Result<()>> + Send>;

/// Shutdown notification handed to each worker.
#[derive(Debug)]
pub struct Shutdown {
    receiver: broadcast::Receiver<()>,
}

impl Shutdown {
    pub(crate) fn new(receiver: broadcast::Receiver<()>) -> Self {
        Self { receiver }
    }

    /// Resolves once the manager stops (or is dropped).
    pub async fn wait(&mut self) {
        let _ = self.receiver.recv().await;
    }
}

#[derive(Default)]
struct State {
    names: Vec<String>,
    pending: Vec<(String, Worker)>,
    started: bool,
}

/// Runtime handle borrowed by every controller during attachment.
pub struct Manager {
    state: Mutex<State>,
    shutdown: broadcast::Sender<()>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Manager")
            .field("workers", &state.names)
            .field("started", &state.started)
            .finish()
    }
}

impl Manager {
    pub fn new() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            state: Mutex::new(State::default()),
            shutdown,
        }
    }

    /// Register a named worker to be spawned when the manager runs.
    pub fn add_worker<F, Fut>(&self, name: impl Into<String>, worker: F) -> Result<(), ManagerError>
    where
        F: FnOnce(Shutdown) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let mut state = self.state.lock();

        if state.started {
            return Err(ManagerError::AlreadyStarted(name));
        }
        if state.names.contains(&name) {
            return Err(ManagerError::DuplicateWorker(name));
        }

        debug!("Worker {} added", name);
        let worker: Worker = Box::new(move |shutdown| worker(shutdown).boxed());
        state.names.push(name.clone());
        state.pending.push((name, worker));
        Ok(())
    }

    /// Names of every worker added so far, in the order they were added.
    pub fn worker_names(&self) -> Vec<String> {
        self.state.lock().names.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Spawn all workers and run until `signal` resolves or every worker exits.
    ///
    /// A failing worker stops the whole manager. The first worker error is
    /// returned after all workers have been joined.
    pub async fn run<S>(&self, signal: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let pending = {
            let mut state = self.state.lock();
            if state.started {
                bail!("manager is already running");
            }
            state.started = true;
            std::mem::take(&mut state.pending)
        };

        info!("Starting {} workers", pending.len());

        let mut tasks = JoinSet::new();
        for (name, worker) in pending {
            let shutdown = Shutdown::new(self.shutdown.subscribe());
            tasks.spawn(async move {
                let result = worker(shutdown).await;
                (name, result)
            });
        }

        let mut first_error: Option<anyhow::Error> = None;
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received");
                    break;
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else {
                        debug!("All workers exited");
                        break;
                    };
                    record_exit(joined, &mut first_error);
                    if first_error.is_some() {
                        break;
                    }
                }
            }
        }

        let _ = self.shutdown.send(());
        while let Some(joined) = tasks.join_next().await {
            record_exit(joined, &mut first_error);
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("Manager stopped");
                Ok(())
            }
        }
    }
}

fn record_exit(
    joined: std::result::Result<(String, Result<()>), tokio::task::JoinError>,
    first_error: &mut Option<anyhow::Error>,
) {
    let err = match joined {
        Ok((name, Ok(()))) => {
            debug!("Worker {} exited", name);
            return;
        }
        Ok((name, Err(e))) => {
            error!("Worker {} failed: {:#}", name, e);
            e.context(format!("worker {} failed", name))
        }
        Err(join_err) => {
            error!("Worker task aborted: {}", join_err);
            anyhow!("worker task aborted: {}", join_err)
        }
    };

    if first_error.is_none() {
        *first_error = Some(err);
    }
}
