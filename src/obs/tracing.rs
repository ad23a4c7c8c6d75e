// self
use crate::{_prelude::*, obs::FlowKind};

/// Awaits `fut` inside a `news_relay.flow` span tagged with `kind` and `stage`.
#[cfg(feature = "tracing")]
pub(super) async fn in_flow_span<Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Fut::Output
where
	Fut: Future,
{
	// crates.io
	use tracing::Instrument;

	fut.instrument(tracing::info_span!("news_relay.flow", flow = kind.as_str(), stage)).await
}

/// Awaits `fut` as-is; spans are compiled out.
#[cfg(not(feature = "tracing"))]
pub(super) async fn in_flow_span<Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Fut::Output
where
	Fut: Future,
{
	let _ = (kind, stage);

	fut.await
}
