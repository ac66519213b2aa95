use rand::distr::{Alphanumeric, SampleString};

/// Item traits shared by readers, handlers and writers
pub mod item;

/// Instrumentation hooks around step execution
pub mod listener;

/// Sequential and parallel dispatch of items to a handler
pub mod step;

/// Generates a random name consisting of alphanumeric characters.
///
/// # Returns
///
/// A `String` containing the generated random name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
