//! # rowql-engine
//!
//! The execution engine: the scalar/aggregate function registry (spec
//! §4.3), the [`Source`] format-adapter seam (spec §6), the scan → join →
//! {where, project, having | group + aggregate + having} → sort →
//! limit/offset pipeline (spec §4.6), and the [`Results`] handle (spec
//! §4.7) that drives it.

#![deny(unused_imports)]

pub mod functions;
mod pipeline;
mod results;
mod source;

pub use self::{
    pipeline::execute,
    results::{Results, ResultsState},
    source::Source,
};
