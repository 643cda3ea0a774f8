//! One-line fleet status summary.
//!
//! Purely observational: consumes the health registry and the running event
//! total, feeds nothing back into coordination.

use crate::health::HealthRegistry;
use chrono::{DateTime, Utc};
use tracing::info;

/// One line per pass, e.g. `fleet 2/3 healthy [0:OK 1:OK 2:--] events=117`.
pub fn summary_line(registry: &HealthRegistry, now: DateTime<Utc>) -> String {
    let cells: Vec<String> = (0..registry.len())
        .map(|i| {
            let mark = if registry.healthy(i, now) { "OK" } else { "--" };
            format!("{i}:{mark}")
        })
        .collect();
    format!(
        "fleet {}/{} healthy [{}] events={}",
        registry.healthy_count(now),
        registry.len(),
        cells.join(" "),
        registry.total_events()
    )
}

pub struct StatusBoard;

impl StatusBoard {
    pub fn render(&self, registry: &HealthRegistry, now: DateTime<Utc>) {
        info!(target: "fleet_status", "{}", summary_line(registry, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn summary_reflects_health_and_totals() {
        let mut reg = HealthRegistry::new(Duration::seconds(60));
        let now = Utc::now();
        reg.add("aa:aa".into(), 1);
        reg.add("bb:bb".into(), 6);
        reg.mark_success(1, 42, now);

        assert_eq!(
            summary_line(&reg, now),
            "fleet 1/2 healthy [0:-- 1:OK] events=42"
        );
    }

    #[test]
    fn empty_fleet_renders_cleanly() {
        let reg = HealthRegistry::new(Duration::seconds(60));
        assert_eq!(
            summary_line(&reg, Utc::now()),
            "fleet 0/0 healthy [] events=0"
        );
    }
}
