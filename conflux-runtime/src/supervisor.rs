//! Process Supervisor (spec §4.6, §8 property 6, §9 "Global state").
//!
//! The signal channel, the shutdown flag, and the live-process map are
//! process-wide singletons in the source this is grounded on; here they
//! are fields on one `Supervisor` passed by reference to every task,
//! rather than statics.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::process::Command;
use tokio::sync::Notify;
use tokio::time::{sleep, Duration};

use conflux_graph::Graph;
use conflux_library::Library;
use conflux_planner::Plan;

use crate::error::RuntimeError;
use crate::logsink;

/// Grace period between SIGTERM and the SIGKILL watchdog (spec §4.6).
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

struct LiveProcess {
    pid: u32,
}

/// Owns the live-process map and the shutdown flag; the single point
/// through which every spawn, exit observation, and teardown signal
/// flows.
pub struct Supervisor {
    live: Mutex<HashMap<String, LiveProcess>>,
    shutdown_started: Mutex<bool>,
    done: Notify,
    done_flag: AtomicBool,
    waiters: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Supervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Supervisor {
            live: Mutex::new(HashMap::new()),
            shutdown_started: Mutex::new(false),
            done: Notify::new(),
            done_flag: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        })
    }

    /// Spawn every process in the flattened graph, wiring its `--port.*`
    /// arguments from `plan` and starting a waiter + log-forwarding task
    /// for each child.
    pub async fn spawn_all(
        self: &Arc<Self>,
        graph: &Graph,
        plan: &Plan,
        library: &Library,
        debug: bool,
    ) -> Result<(), RuntimeError> {
        for (index, (name, process)) in graph.processes.iter().enumerate() {
            let entry = library
                .get(&process.component)
                .map_err(|_| RuntimeError::UnknownComponent(process.component.clone(), name.clone()))?;

            let mut args = plan.args.get(name).cloned().unwrap_or_default();
            if debug {
                args.push("--debug".to_string());
            }

            let mut command = Command::new(&entry.executable_path);
            command.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());
            #[cfg(unix)]
            {
                // New session (spec §4.6): a signal to the session leader's
                // group reaches the whole subtree the child may spawn.
                unsafe {
                    command.pre_exec(|| {
                        libc::setsid();
                        Ok(())
                    });
                }
            }

            let mut child = command.spawn().map_err(|source| RuntimeError::Spawn {
                process: name.clone(),
                executable: entry.executable_path.clone(),
                source,
            })?;

            let pid = child.id().unwrap_or(0);
            self.live.lock().unwrap().insert(name.clone(), LiveProcess { pid });

            let color = logsink::color_for(index);
            if let Some(stdout) = child.stdout.take() {
                logsink::forward(name.clone(), color, false, stdout);
            }
            if let Some(stderr) = child.stderr.take() {
                logsink::forward(name.clone(), color, true, stderr);
            }

            let supervisor = Arc::clone(self);
            let waited_name = name.clone();
            let waiter = tokio::spawn(async move {
                let status = child.wait().await;
                match status {
                    Ok(status) => tracing::info!(process = %waited_name, %status, "Stopped"),
                    Err(e) => tracing::warn!(process = %waited_name, error = %e, "Stopped (wait failed)"),
                }
                supervisor.on_child_exited(&waited_name);
            });
            self.waiters.lock().unwrap().push(waiter);
        }
        Ok(())
    }

    fn on_child_exited(self: &Arc<Self>, name: &str) {
        let became_empty = {
            let mut live = self.live.lock().unwrap();
            live.remove(name);
            live.is_empty()
        };
        if became_empty {
            self.initiate_shutdown();
        }
    }

    /// Operator interrupt or cascade completion: serialized so concurrent
    /// triggers do not double-send signals (spec §4.6 "process-wide lock").
    pub fn initiate_shutdown(self: &Arc<Self>) {
        {
            let mut started = self.shutdown_started.lock().unwrap();
            if *started {
                return;
            }
            *started = true;
        }

        let pids: Vec<u32> = self.live.lock().unwrap().values().map(|p| p.pid).collect();
        if pids.is_empty() {
            // Cascade already drained every child; nothing to signal or
            // wait out before reaching Done.
            self.mark_done();
            return;
        }

        for pid in &pids {
            send_signal(*pid, libc::SIGTERM);
        }

        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            sleep(SHUTDOWN_GRACE).await;
            let remaining: Vec<u32> = supervisor.live.lock().unwrap().values().map(|p| p.pid).collect();
            for pid in remaining {
                tracing::warn!(pid, "watchdog escalation: SIGKILL");
                send_signal(pid, libc::SIGKILL);
            }
            supervisor.mark_done();
        });
    }

    /// Flip the `Done` latch. Uses `notify_one` (which stores a permit for
    /// whichever `wait_done` call comes next) rather than `notify_waiters`
    /// (which wakes only tasks already parked and drops the signal
    /// otherwise) — shutdown can complete before `Runtime::run` ever calls
    /// `wait_done` (e.g. during the settle/inject window), and that signal
    /// must not be lost.
    fn mark_done(&self) {
        self.done_flag.store(true, Ordering::SeqCst);
        self.done.notify_one();
    }

    /// Suspend until the `Done` latch fires. Safe to call after the latch
    /// has already flipped: the flag is checked before parking.
    pub async fn wait_done(&self) {
        if self.done_flag.load(Ordering::SeqCst) {
            return;
        }
        self.done.notified().await;
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: i32) {
    // SAFETY: signaling a known, still-possibly-live pid by number; ESRCH
    // (already exited) is not an error worth surfacing here.
    unsafe {
        libc::kill(pid as libc::pid_t, signal);
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: i32) {
    tracing::warn!("process signaling is a no-op on this platform");
}
