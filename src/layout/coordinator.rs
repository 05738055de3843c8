use tokio::task::JoinHandle;
use tracing::debug;

use super::{compute_layout, CancelFlag, Layout, LayoutSnapshot};

/// Lifecycle of a view's layout computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    Idle,
    Running,
    Cancelling,
}

/// Schedules layout computation off the interaction thread.
///
/// At most one computation is ever in flight per coordinator. A new request
/// signals cancellation to the in-flight run and waits for it to fully stop
/// before starting the next one, so published positions always come from a
/// single complete computation over a single snapshot.
#[derive(Debug)]
pub struct LayoutCoordinator {
    state: LayoutState,
    inflight: Option<Inflight>,
    generation: u64,
}

#[derive(Debug)]
struct Inflight {
    cancel: CancelFlag,
    handle: JoinHandle<Option<Layout>>,
    generation: u64,
}

impl LayoutCoordinator {
    pub fn new() -> Self {
        Self {
            state: LayoutState::Idle,
            inflight: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Starts a layout computation for the snapshot, first cancelling and
    /// awaiting any computation still in flight. The superseded run's partial
    /// result is discarded, never published.
    pub async fn request_layout(&mut self, snapshot: LayoutSnapshot) {
        if let Some(inflight) = self.inflight.take() {
            self.state = LayoutState::Cancelling;
            inflight.cancel.cancel();
            debug!(generation = inflight.generation, "cancelling stale layout");
            let _ = inflight.handle.await;
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let handle =
            tokio::task::spawn_blocking(move || compute_layout(&snapshot, &flag));
        debug!(generation, "layout started");
        self.state = LayoutState::Running;
        self.inflight = Some(Inflight {
            cancel,
            handle,
            generation,
        });
    }

    /// Awaits the in-flight computation and returns its complete result.
    ///
    /// Returns None when nothing is running or the run was cancelled; a
    /// partial layout is never returned.
    pub async fn finish(&mut self) -> Option<Layout> {
        let inflight = self.inflight.take()?;
        let result = match inflight.handle.await {
            Ok(layout) => layout,
            Err(_) => None,
        };
        self.state = LayoutState::Idle;
        debug!(
            generation = inflight.generation,
            published = result.is_some(),
            "layout finished"
        );
        result
    }

    /// Cancels any in-flight computation and waits for it to stop.
    pub async fn cancel(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            self.state = LayoutState::Cancelling;
            inflight.cancel.cancel();
            let _ = inflight.handle.await;
        }
        self.state = LayoutState::Idle;
    }
}

impl Default for LayoutCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
