//! Post-flight recovery: one refresh-and-retry cycle after an authorization failure.

// crates.io
use http::{StatusCode, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	client::{GatedClient, gate::bearer_header},
	obs::{self, Stage, StageOutcome, StageSpan},
	transport::{HttpRequest, HttpResponse, HttpTransport},
};

impl<T> GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Inspects `response` and, on an authorization failure, drives one reactive
	/// refresh before re-issuing `retry_template` once.
	///
	/// The retried response is final even if it is another rejection — retrying
	/// forever would mask a genuine, persistent auth failure. When the refresh yields
	/// no token, the original rejection propagates; the coordinator has already
	/// terminated the session by then.
	pub(crate) async fn recover_unauthorized(
		&self,
		response: HttpResponse,
		retry_template: HttpRequest,
	) -> Result<HttpResponse> {
		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}

		const STAGE: Stage = Stage::Recovery;

		let span = StageSpan::new(STAGE, "recover_unauthorized");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let retried = span
			.instrument(async move {
				match self.coordinator.refresh().await {
					Some(token) => {
						let mut retry = retry_template;

						retry.headers_mut().insert(AUTHORIZATION, bearer_header(&token)?);

						Ok(Some(self.transport.execute(retry).await?))
					},
					None => Ok(None),
				}
			})
			.await;

		match retried {
			Ok(Some(retried)) => {
				obs::record_stage_outcome(STAGE, StageOutcome::Success);

				Ok(retried)
			},
			Ok(None) => {
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);

				Ok(response)
			},
			Err(e) => {
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);

				Err(e)
			},
		}
	}
}
