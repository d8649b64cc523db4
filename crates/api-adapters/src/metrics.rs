//! Prometheus counters for the portal's user-facing flows.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct FlowLabels {
    pub flow: String,
    pub outcome: String,
}

pub struct PortalMetrics {
    registry: Registry,
    flows: Family<FlowLabels, Counter>,
    visits: Counter,
}

impl Default for PortalMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("portal");
        let flows = Family::<FlowLabels, Counter>::default();
        let visits = Counter::default();

        registry.register(
            "flow_outcomes",
            "Outcomes of vote, submission, search and admin flows",
            flows.clone(),
        );
        registry.register("visits", "Visits recorded by the counter widget", visits.clone());

        Self {
            registry,
            flows,
            visits,
        }
    }

    pub fn record(&self, flow: &str, outcome: &str) {
        self.flows
            .get_or_create(&FlowLabels {
                flow: flow.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn visit(&self) {
        self.visits.inc();
    }

    /// OpenMetrics text exposition.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_exposition() {
        let metrics = PortalMetrics::new();
        metrics.record("vote", "counted");
        metrics.record("vote", "counted");
        metrics.visit();

        let body = metrics.encode().unwrap();
        assert!(body.contains(r#"portal_flow_outcomes_total{flow="vote",outcome="counted"} 2"#));
        assert!(body.contains("portal_visits_total 1"));
    }
}
