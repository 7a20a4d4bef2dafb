//! Wiring for the guildsync binary: the sync pipeline and sink construction.

pub mod pipeline;
