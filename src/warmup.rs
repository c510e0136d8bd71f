use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use tokio::{sync::watch, task::JoinHandle, time};

use crate::error::{PadError, PadResult};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Published over the gate's watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmState {
    Pending,
    Ready,
    Failed(String),
}

struct Shared {
    state_tx: watch::Sender<WarmState>,
    /// Bumped on every spawn; only the latest warm-up may publish.
    generation: AtomicU64,
}

impl Shared {
    fn publish(&self, spawned: u64, outcome: WarmState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != spawned {
                return false;
            }
            *state = outcome;
            true
        })
    }
}

/// One-shot readiness gate: after `delay` elapses the supplied loader runs and
/// the gate either opens or records the failure. Must be started from inside a
/// tokio runtime.
pub struct WarmUp {
    component: &'static str,
    delay: Duration,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WarmUp {
    pub fn new(component: &'static str, delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(WarmState::Pending);
        Self {
            component,
            delay,
            shared: Arc::new(Shared {
                state_tx,
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Starts the warm-up unless one is already running or has completed.
    /// Returns whether a new warm-up was spawned.
    pub fn begin<F>(&self, load: F) -> bool
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_ready() || task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        self.spawn(&mut task, load);
        true
    }

    /// Closes the gate, abandons any in-flight warm-up and starts a fresh one.
    pub fn restart<F>(&self, load: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
        self.spawn(&mut task, load);
    }

    fn spawn<F>(&self, slot: &mut Option<JoinHandle<()>>, load: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let spawned = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.state_tx.send_replace(WarmState::Pending);

        let component = self.component;
        let delay = self.delay;
        let shared = Arc::clone(&self.shared);

        log_info!("Initializing {component}...");
        *slot = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                time::sleep(delay).await;
            }
            let outcome = match load.await {
                Ok(()) => WarmState::Ready,
                Err(err) => WarmState::Failed(format!("{err:#}")),
            };
            let message = match &outcome {
                WarmState::Failed(reason) => Some(reason.clone()),
                _ => None,
            };

            if !shared.publish(spawned, outcome) {
                log_debug!("Discarding superseded {component} warm-up");
                return;
            }
            match message {
                Some(reason) => log_error!("{component} failed to initialize: {reason}"),
                None => log_info!("{component} ready"),
            }
        }));
    }

    pub fn state(&self) -> WarmState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.state_tx.borrow(), WarmState::Ready)
    }

    pub fn ensure_ready(&self) -> PadResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(PadError::NotReady(self.component))
        }
    }

    /// Resolves once the current warm-up settles. A failed loader surfaces as
    /// `StorageFailure` instead of leaving the caller waiting.
    pub async fn wait(&self) -> PadResult<()> {
        let mut rx = self.shared.state_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let settled = rx
            .wait_for(|state| *state != WarmState::Pending)
            .await
            .map_err(|_| PadError::NotReady(self.component))?;

        match &*settled {
            WarmState::Ready => Ok(()),
            WarmState::Failed(reason) => Err(PadError::StorageFailure(anyhow!(
                "{} failed to initialize: {reason}",
                self.component
            ))),
            WarmState::Pending => Err(PadError::NotReady(self.component)),
        }
    }
}

impl Drop for WarmUp {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = task {
            handle.abort();
        }
    }
}
