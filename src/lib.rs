//! Single-flight bearer-token lifecycle for authenticated HTTP clients—proactive refresh,
//! one-shot 401 recovery, and pluggable credential stores in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod coordinator;
pub mod credential;
pub mod error;
pub mod obs;
pub mod policy;
pub mod store;
pub mod transport;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
