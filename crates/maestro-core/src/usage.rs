use std::collections::HashMap;

use maestro_types::Pid;
use sysinfo::System;

use crate::types::ResourceUsage;

/// Sample CPU and memory usage of `pids`. Processes that cannot be read are
/// simply missing from the result.
pub async fn sample(pids: &[Pid]) -> HashMap<Pid, ResourceUsage> {
    if pids.is_empty() {
        return HashMap::new();
    }

    let targets: Vec<_> = pids
        .iter()
        .map(|pid| (*pid, sysinfo::Pid::from_u32(pid.as_u32())))
        .collect();

    let mut system = System::new();
    for (_, target) in &targets {
        system.refresh_process(*target);
    }
    // CPU usage is a delta between two refreshes.
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;

    targets
        .into_iter()
        .filter_map(|(pid, target)| {
            if !system.refresh_process(target) {
                tracing::debug!("no resource figures for pid {pid}");
                return None;
            }
            let process = system.process(target)?;
            Some((
                pid,
                ResourceUsage {
                    cpu_percent: process.cpu_usage(),
                    memory_bytes: process.memory(),
                },
            ))
        })
        .collect()
}
