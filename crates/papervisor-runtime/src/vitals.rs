//! Resource usage of the supervised server.

use std::sync::{Mutex, PoisonError};

use papervisor_core::Vitals;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;

use crate::process::Supervisor;

/// Samples CPU and memory of the running server.
///
/// CPU usage is relative to the previous sample, so the first reading after
/// a start is usually zero.
pub struct VitalsMonitor {
    supervisor: Supervisor,
    heap_size: String,
    system: Mutex<System>,
}

impl VitalsMonitor {
    pub fn new(supervisor: Supervisor, heap_size: impl Into<String>) -> Self {
        Self {
            supervisor,
            heap_size: heap_size.into(),
            system: Mutex::new(System::new()),
        }
    }

    /// Current vitals. Never fails: when the server is down or cannot be
    /// sampled the usage figures are zero.
    pub async fn vitals(&self) -> Vitals {
        let status = self.supervisor.status().await;
        let players = self.supervisor.sessions().players();

        let pid = if status.is_running() {
            self.supervisor.pid().await
        } else {
            None
        };
        let Some(pid) = pid else {
            return Vitals::idle(status, self.heap_size.as_str(), players);
        };

        match self.sample(pid) {
            Some((cpu, ram)) => Vitals {
                status,
                cpu,
                ram,
                total_memory: self.heap_size.clone(),
                players: players.len(),
                player_list: players,
            },
            None => {
                debug!(pid, "Server process not found while sampling vitals");
                Vitals::idle(status, self.heap_size.as_str(), players)
            }
        }
    }

    fn sample(&self, pid: u32) -> Option<(f32, u64)> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        let pid = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system
            .process(pid)
            .map(|process| (process.cpu_usage(), process.memory()))
    }
}
