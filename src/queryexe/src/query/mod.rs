pub use executor::Executor;
mod executor;
