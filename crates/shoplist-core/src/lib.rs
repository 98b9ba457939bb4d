pub mod config;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod store;
pub mod sync;
pub mod tracing_setup;
pub mod transport;

pub use config::CoreConfig;
pub use runtime::{CoreHandle, CoreRuntime};
pub use sync::{App, Effect, Event};
