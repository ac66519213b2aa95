/// JSON support for streaming arrays in and out.
///
/// 1. **JsonArrayReader**: scans the framing of a top-level JSON array on a
///    buffered source and decodes the elements one at a time, so arrays far
///    larger than memory can be processed.
///
/// 2. **JsonItemWriter**: writes items as a JSON array, opening and closing
///    the brackets and separating elements with commas, in compact or
///    pretty-printed form.
///
/// Both follow the builder pattern.
///
/// # Examples
///
/// ```
/// use stream_batch_rs::core::item::{ItemReader, ItemWriter};
/// use stream_batch_rs::item::json::{JsonArrayReaderBuilder, JsonItemWriterBuilder};
/// use stream_batch_rs::item::record::Record;
///
/// let records = vec![
///     Record { id: 1, name: "first".to_string(), ..Record::default() },
///     Record { id: 2, name: "second".to_string(), ..Record::default() },
/// ];
///
/// let mut buffer = Vec::new();
/// {
///     let writer = JsonItemWriterBuilder::<Record>::new().from_writer(&mut buffer);
///     writer.open().unwrap();
///     writer.write(&records).unwrap();
///     writer.close().unwrap();
/// }
///
/// let reader = JsonArrayReaderBuilder::<Record>::new()
///     .from_reader(buffer.as_slice())
///     .unwrap();
///
/// assert_eq!(reader.read().unwrap().unwrap().name, "first");
/// assert_eq!(reader.read().unwrap().unwrap().name, "second");
/// assert!(reader.read().unwrap().is_none());
/// ```
pub mod json_reader;
/// Writes items as a JSON array.
pub mod json_writer;

pub use json_reader::{JsonArrayReader, JsonArrayReaderBuilder};
pub use json_writer::{JsonItemWriter, JsonItemWriterBuilder};
