use std::io::Write;

use maestro_core::{ServiceState, StatusReport};

use crate::logger::Logger;

pub fn render_status<W: Write>(logger: &mut Logger<W>, report: &StatusReport) {
    if report.running.is_empty() {
        logger.system("No services currently running");
    }
    for service in &report.running {
        logger.log(&service.name, &describe(service));
    }

    if !report.stopped.is_empty() {
        logger.system(&format!(
            "Available but not running: {}",
            report.stopped.join(", ")
        ));
    }
    for (name, pid) in &report.unmanaged {
        logger.system(&format!(
            "{name} (pid {pid}) is running but no longer configured"
        ));
    }
}

#[allow(clippy::cast_precision_loss)]
fn describe(service: &ServiceState) -> String {
    let pid = service.pid.as_u32();
    match service.usage {
        Some(usage) => format!(
            "running (pid {pid:<7}) CPU {:>5.1}%  RAM {:>7.1} MB",
            usage.cpu_percent,
            usage.memory_bytes as f64 / (1024.0 * 1024.0)
        ),
        None => format!("running (pid {pid})"),
    }
}
