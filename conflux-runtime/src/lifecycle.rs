//! Runtime lifecycle state machine (spec §4.9 "Runtime lifecycle") and
//! the `Runtime` that ties the graph, plan, supervisor, and injector
//! together for `conflux run`.

use std::sync::Arc;

use conflux_graph::Graph;
use conflux_library::Library;
use conflux_planner::Plan;

use crate::error::RuntimeError;
use crate::iip;
use crate::supervisor::Supervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Loaded,
    Flattened,
    Planned,
    Running,
    Draining,
    Done,
}

pub struct Runtime {
    supervisor: Arc<Supervisor>,
    zmq_context: zmq::Context,
    state: RuntimeState,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            supervisor: Supervisor::new(),
            zmq_context: zmq::Context::new(),
            state: RuntimeState::Loaded,
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    /// Spawn every process, wait the settle period, inject IIPs, then
    /// block until cascade shutdown (triggered by the children draining
    /// each other) or an operator interrupt reaches `Done`.
    pub async fn run(&mut self, graph: &Graph, plan: &Plan, library: &Library, debug: bool) -> Result<(), RuntimeError> {
        self.state = RuntimeState::Planned;
        self.supervisor.spawn_all(graph, plan, library, debug).await?;
        self.state = RuntimeState::Running;

        iip::settle().await;
        iip::inject_all(&self.zmq_context, plan);

        let supervisor = Arc::clone(&self.supervisor);
        let signals = tokio::spawn(async move {
            wait_for_interrupt().await;
            supervisor.initiate_shutdown();
        });

        self.supervisor.wait_done().await;
        self.state = RuntimeState::Draining;
        signals.abort();
        self.state = RuntimeState::Done;
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    let _ = tokio::signal::ctrl_c().await;
}
