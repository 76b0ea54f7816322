//! Pluggable hooks into the FDTD update cycle.
//!
//! The [`Extension`] trait defines the hook points. [`Probe`] and
//! [`PeakHold`] are the built-in monitors; [`AnyExtension`] lets a
//! simulation hold a mix of them.

mod extension_trait;
mod monitors;

pub use extension_trait::Extension;
pub use monitors::{AnyExtension, PeakHold, Probe};
