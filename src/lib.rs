//! # Constellation Overlay
//!
//! Logical channels ("constellations") layered over a physical relay network,
//! and the per-frame signal overlay that shows which channel governs each
//! link and how strong it is.
//!
//! ## Architecture
//!
//! - `constellation`: channel registry, endpoint memberships and the cascade
//!   that keeps them consistent
//! - `signal`: range models and the link colour resolver
//! - `overlay`: topology view, display modes and strength colouring
//! - `common`: colours, settings and scene loading shared with the viewer
//!
//! Everything runs on the caller's thread. Registry mutations and their
//! cascade complete before the next frame resolves colours.

pub mod common;
pub mod constellation;
pub mod overlay;
pub mod signal;
