//! Process metrics
//!
//! The standard `process_*` series for the exporter process itself,
//! collected with sysinfo and refreshed on every scrape.

use std::sync::Mutex;

use prometheus::{Counter, Gauge, Registry};
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::errors::Result;

pub struct ProcessMetrics {
    system: Mutex<System>,
    pid: Pid,
    pub resident_memory_bytes: Gauge,
    pub virtual_memory_bytes: Gauge,
    /// Accumulated user and system CPU time
    pub cpu_seconds_total: Counter,
    pub start_time_seconds: Gauge,
}

impl ProcessMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            system: Mutex::new(System::new()),
            pid: Pid::from_u32(std::process::id()),
            resident_memory_bytes: Gauge::new(
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
            )?,
            virtual_memory_bytes: Gauge::new(
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
            )?,
            cpu_seconds_total: Counter::new(
                "process_cpu_seconds_total",
                "Total user and system CPU time spent in seconds.",
            )?,
            start_time_seconds: Gauge::new(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.resident_memory_bytes.clone()))?;
        registry.register(Box::new(self.virtual_memory_bytes.clone()))?;
        registry.register(Box::new(self.cpu_seconds_total.clone()))?;
        registry.register(Box::new(self.start_time_seconds.clone()))?;
        Ok(())
    }

    /// Refresh memory and CPU time of the current process.
    pub fn update(&self) {
        let mut sys = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("System metrics mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        // 只刷新当前进程
        sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        if let Some(process) = sys.process(self.pid) {
            self.resident_memory_bytes.set(process.memory() as f64);
            self.virtual_memory_bytes.set(process.virtual_memory() as f64);
            self.start_time_seconds.set(process.start_time() as f64);

            // 毫秒 -> 秒，计数器只能递增
            let cpu_seconds = process.accumulated_cpu_time() as f64 / 1000.0;
            let delta = cpu_seconds - self.cpu_seconds_total.get();
            if delta > 0.0 {
                self.cpu_seconds_total.inc_by(delta);
            }
        }
    }
}
