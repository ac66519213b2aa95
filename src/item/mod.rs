/// The record shape decoded from every array element.
pub mod record;

/// This module provides a logging item handler, useful for debugging purposes.
pub mod logger;

/// This module provides a JSON array reader and writer.
pub mod json;

#[cfg(feature = "fake")]
/// This module provides a fake record reader, used to generate sample inputs.
pub mod fake;
