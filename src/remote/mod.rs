//! Access to the service under test
//!
//! Two collaborators are built once per run and handed to every case: an
//! HTTP API client and a listener on the service's event stream.

pub mod api;
pub mod codec;
pub mod events;
pub mod types;

pub use api::ApiClient;
pub use events::EventListener;
pub use types::*;
