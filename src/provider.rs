//! Identity-provider descriptors.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! token and device-authorization endpoints, supported grant flags, and the client
//! authentication preference used by the credential flows.

pub mod descriptor;

pub use descriptor::*;
