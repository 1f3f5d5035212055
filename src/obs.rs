//! Optional observability helpers for the gate and the coordinator.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_gate.stage` with the `stage`
//!   (hook) and `op` (call site) fields.
//! - Enable `metrics` to increment the `bearer_gate_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Lifecycle stages observed by the gated client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Pre-flight gate + transport execution of a business request.
	Request,
	/// Single-flight token refresh.
	Refresh,
	/// Post-flight 401 recovery.
	Recovery,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Request => "request",
			Stage::Refresh => "refresh",
			Stage::Recovery => "recovery",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a gated hook.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a warn-level event when the `tracing` feature is enabled; no-op otherwise.
pub(crate) fn warn_stage(stage: Stage, message: &'static str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(stage = stage.as_str(), error = %error, "{message}");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message, error);
	}
}
