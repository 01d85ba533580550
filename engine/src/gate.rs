//! Load gate.
//!
//! A store replays its log asynchronously before it can answer queries. The
//! gate holds back work submitted during that window and releases it, in
//! registration order, when the store reports that loading is complete. The
//! gate opens exactly once and never closes again.

use parking_lot::Mutex;
use std::fmt;
use tokio::sync::oneshot;

type Action = Box<dyn FnOnce() + Send + 'static>;

enum GateState {
    Pending(Vec<Action>),
    Open,
}

/// One-shot readiness barrier for a keyed store.
pub struct LoadGate {
    state: Mutex<GateState>,
}

impl LoadGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending(Vec::new())),
        }
    }

    /// Create a gate that is already open.
    pub fn opened() -> Self {
        Self {
            state: Mutex::new(GateState::Open),
        }
    }

    /// Whether the store has finished loading.
    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), GateState::Open)
    }

    /// Number of actions waiting for the gate to open.
    pub fn pending(&self) -> usize {
        match &*self.state.lock() {
            GateState::Pending(queue) => queue.len(),
            GateState::Open => 0,
        }
    }

    /// Run `action` once the gate is open.
    ///
    /// If the gate is already open the action runs before this call returns.
    pub fn when_ready<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if let GateState::Pending(queue) = &mut *state {
            queue.push(Box::new(action));
            return;
        }
        drop(state);
        action();
    }

    /// Open the gate and run every queued action in registration order.
    ///
    /// Returns the number of actions released. Opening twice is a no-op.
    pub fn open(&self) -> usize {
        let queued = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, GateState::Open) {
                GateState::Pending(queue) => queue,
                GateState::Open => return 0,
            }
        };

        let released = queued.len();
        for action in queued {
            action();
        }
        released
    }

    /// Wait until the gate is open.
    ///
    /// Waiters registered before the gate opens are woken in the order they
    /// started waiting.
    pub async fn wait(&self) {
        if self.is_open() {
            return;
        }

        let (tx, rx) = oneshot::channel();
        self.when_ready(move || {
            let _ = tx.send(());
        });
        // The sender is only dropped without sending if the gate itself is
        // dropped, in which case there is nothing left to wait for.
        let _ = rx.await;
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoadGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.lock() {
            GateState::Pending(queue) => f
                .debug_struct("LoadGate")
                .field("open", &false)
                .field("pending", &queue.len())
                .finish(),
            GateState::Open => f.debug_struct("LoadGate").field("open", &true).finish(),
        }
    }
}
