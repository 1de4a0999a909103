//! Resource-graph declaration for the CI deployment setup.
//!
//! Builds the graph an external provisioning engine deploys: a pipeline stack
//! (artifact bucket, CI role trusted through OIDC federation, deployment
//! pipeline, upload trigger) and the stages it deploys (an API backed by a
//! serverless function). The result is a [`Manifest`] of templates; nothing in
//! this crate deploys anything.
//!
//! ## Architectural Layer
//!
//! **Declaration.** Subject-matcher validation is delegated to the [`trust`]
//! crate. This crate owns the registry, the template rendering, and the stack
//! layout.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`registry`] | [`Stack`], [`Stage`], [`App`], [`Environment`] |
//! | [`resource`] | [`Resource`] kinds and their template form |
//! | [`expr`] | [`Expr`] property values and [`ResourceRef`] handles |
//! | [`iam`] | Trust-policy document, federation constants, permission statements |
//! | [`pipeline`] | Deployment pipeline declaration |
//! | [`stacks`] | The concrete stacks and constructs |
//! | [`manifest`] | [`synth`] and the [`Manifest`] it produces |
//! | [`errors`] | [`AssemblyError`] |

pub mod errors;
pub mod expr;
pub mod iam;
pub mod manifest;
pub mod pipeline;
pub mod registry;
pub mod resource;
pub mod stacks;

pub use errors::AssemblyError;
pub use expr::{Expr, ResourceRef};
pub use iam::{FederationSettings, TrustPolicyDocument};
pub use manifest::{synth, Artifact, Manifest, SynthMetadata, SynthRunId, Timestamp};
pub use registry::{App, Environment, Stack, Stage};
pub use resource::Resource;
