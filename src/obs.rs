//! Observability helpers for relay stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `news_relay.flow` with the
//!   `flow` (stage kind) and `stage` (call site) fields, plus progress events inside them.
//! - Enable `metrics` to increment the `news_relay_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

// self
use self::{metrics::record_flow_outcome, tracing::in_flow_span};
use crate::_prelude::*;

/// Stage kinds observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Client-credential token exchange.
	ClientCredentials,
	/// Device-code token exchange.
	DeviceCode,
	/// News-search fetch.
	NewsSearch,
	/// Graph `sendMail` call.
	SendMail,
	/// Graph directory reads (`/me`, `/users`).
	Directory,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::DeviceCode => "device_code",
			FlowKind::NewsSearch => "news_search",
			FlowKind::SendMail => "send_mail",
			FlowKind::Directory => "directory",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a relay stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` as one observed relay stage, counting its attempt and its outcome.
pub(crate) async fn stage<T, E, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = in_flow_span(kind, stage, fut).await;

	record_flow_outcome(kind, if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure });

	result
}

/// Emits a tracing event when the `tracing` feature is enabled.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	}};
}
pub(crate) use event;
