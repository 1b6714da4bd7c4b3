use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::{
    AppState,
    services::{
        aggregator::{AggregationReport, PriceAggregator},
        evaluator::{EvaluationReport, TriggerEvaluator},
        metrics::Metrics,
    },
};

#[derive(Debug, Default)]
pub struct CycleReport {
    pub aggregation: AggregationReport,
    /// `None` when the cycle had no symbols and stopped before evaluating.
    pub evaluation: Option<EvaluationReport>,
}

/// One aggregate-then-evaluate pass. Evaluation starts only after every
/// fetch task of this cycle has finished or timed out.
pub async fn run_cycle(
    aggregator: &PriceAggregator,
    evaluator: &TriggerEvaluator,
    metrics: &Metrics,
) -> CycleReport {
    tracing::debug!("price cycle started");

    let aggregation = aggregator.refresh().await;
    if aggregation.is_idle() {
        let report = CycleReport {
            aggregation,
            evaluation: None,
        };
        metrics.record_cycle(&report);
        return report;
    }

    let evaluation = evaluator.evaluate();

    tracing::info!(
        classes = aggregation.outcomes.len(),
        updated = aggregation.outcomes.values().filter(|o| o.is_updated()).count(),
        triggered = evaluation.promoted(),
        users = evaluation.promotions.len(),
        "price cycle complete"
    );

    let report = CycleReport {
        aggregation,
        evaluation: Some(evaluation),
    };
    metrics.record_cycle(&report);
    report
}

/// Runs `run_cycle` immediately and then on every refresh interval until
/// the process exits.
pub fn spawn_price_alert_monitor(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(state.settings.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_cycle(&state.aggregator, &state.evaluator, &state.metrics).await;
        }
    })
}
