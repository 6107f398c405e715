#[allow(clippy::module_inception)]
mod executor;
mod pipes;
mod wait;

pub use executor::Executor;
