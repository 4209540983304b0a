use metrics_exporter_prometheus::PrometheusHandle;
use recall_db::ReviewStore;

use crate::{config::SchedulerConfig, review::Scheduler};

#[derive(Clone)]
pub struct ApiState<S> {
    pub scheduler: Scheduler<S>,
    /// Set when a Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl<S: ReviewStore> ApiState<S> {
    pub const fn new(store: S, config: SchedulerConfig) -> Self {
        Self {
            scheduler: Scheduler::new(store, config),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
