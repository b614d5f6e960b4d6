//! Named component registry with dependency injection.
//!
//! A [`Hub`] stores singletons under unique names. Components describe what they
//! need through [`Injectable`], and the hub fills those needs either by name or,
//! with the `*` directive, by finding the single component of the requested type.

mod binding;
mod dependency;
mod registry;

pub use binding::{Binder, Binding, Injectable};
pub use dependency::{Component, TypeDescriptor};
pub use registry::Hub;

/// Directive target that resolves a dependency by type.
pub const WILDCARD: &str = "*";

/// Name the hub registers itself under.
pub const HUB: &str = "hub";

/// Name the application registers itself under.
pub const APP: &str = "app";

/// Name of the application's lifecycle component.
pub const LIFECYCLE: &str = "lifecycle";

/// Name of the application's settings component.
pub const SETTINGS: &str = "settings";
