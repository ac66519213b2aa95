/// Generates random [`Record`](crate::item::record::Record)s.
pub mod record_reader;

pub use record_reader::{RecordReader, RecordReaderBuilder};
