// Fetch Guard: SSRF-hardened retrieval of job postings by URL.
// Scheme and address policy run before any request; redirects are followed
// by hand so every hop is re-validated.

pub mod address;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod transport;

pub use error::FetchError;
pub use guard::{FetchConfig, FetchGuard};
