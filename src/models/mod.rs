//! Domain models for feature policies.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`Policy`]: A text rule belonging to a project.
//! - [`FeaturePolicy`]: Join row attaching a policy to a [`Feature`].
//! - [`Project`] and [`Feature`]: Parents that policies and links refer to.
//! - [`Organization`] and [`Actor`]: Created from their single-field forms.
//!
//! ## Ephemeral Entities
//!
//! - [`Recommendation`]: Candidate policy text from the recommendation
//!   service, held in memory until selected and submitted or discarded.

mod actor;
mod feature;
mod organization;
mod policy;
mod project;
mod recommendation;

pub use actor::*;
pub use feature::*;
pub use organization::*;
pub use policy::*;
pub use project::*;
pub use recommendation::*;
