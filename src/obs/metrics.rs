// self
use crate::obs::{FlowKind, FlowOutcome};

/// Increments `news_relay_flow_total` for `kind` and `outcome` when `metrics` is enabled.
pub(super) fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("news_relay_flow_total", "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}
