//! Core Components
//!
//! Credential source, request interceptor and transport seam.

pub mod credentials;
pub mod interceptor;
pub mod transport;

pub use credentials::*;
pub use interceptor::*;
pub use transport::*;
