//! Backends for bill generation and delivery: always-succeeding stubs and HTTP clients.

mod stub;
pub use stub::{NoopNotifier, StaticBillGenerator};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{BackendHttpError, HttpBillGenerator, HttpMailer};
