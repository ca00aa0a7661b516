//! Channels ("constellations") and endpoint memberships.
//!
//! ## Module Organization
//!
//! - `types`: `Constellation`, `Endpoint` and the id aliases
//! - `registry`: CRUD over the channel set, public channel protection
//! - `endpoints`: endpoint store and membership mutation
//! - `cascade`: keeps memberships consistent after registry changes

pub mod cascade;
pub mod endpoints;
pub mod registry;
pub mod types;

pub use cascade::{CascadeReport, MembershipCascade, RefreshNotice};
pub use endpoints::{EndpointError, EndpointSort, EndpointStore, frequency_label};
pub use registry::{ConstellationRegistry, RegistryError};
pub use types::{Constellation, Endpoint, EndpointId, EndpointKind, Frequency};
