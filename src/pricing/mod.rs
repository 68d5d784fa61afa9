//! Model dispatch and the caller-facing pricing surface.

pub mod dispatcher;

pub use dispatcher::{build_engine, default_model, permitted_models, Pricer};
