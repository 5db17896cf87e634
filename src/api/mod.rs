//! Platform API access: the [`Transport`] seam, its HTTP implementation and
//! the wire payloads it exchanges.

mod client;
mod transport;
pub mod wire;

pub use client::HttpTransport;
pub use transport::{Fetched, Transport};
