//! modelgen: compile schema declaration units into derived model source.
//!
//! Pipeline: raw declaration JSON ([`raw`]) → two-pass resolution into the
//! semantic model ([`resolve`], [`model`]) → derived names and types
//! ([`naming`], [`typing`]) → artifact synthesis ([`synth`]). The CLI in
//! [`cli`] drives the whole thing over globbed inputs, one unit at a time.

pub mod cli;
pub mod emit;
pub mod error;
pub mod guards;
pub mod jq_exec;
pub mod load;
pub mod model;
pub mod naming;
pub mod raw;
pub mod resolve;
pub mod synth;
pub mod typing;
