//! Library surface for the controller binary, split out so integration
//! tests under `tests/` can drive the workflow and transport layers
//! directly instead of only through the `actl-controller` process.

pub mod context;
pub mod dispatcher;
pub mod emitter;
pub mod logging;
pub mod pending;
pub mod workflow;
