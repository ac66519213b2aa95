use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufWriter, Write},
    marker::PhantomData,
    path::Path,
};

use serde::Serialize;

use crate::{BatchError, core::item::ItemWriter};

/// Writes items as one JSON array, element by element.
///
/// `open` writes the opening bracket, every `write` appends its items with
/// the separating commas and `close` writes the closing bracket and flushes.
/// Nothing but the current item is serialized in memory.
pub struct JsonItemWriter<W: Write, T> {
    pd: PhantomData<T>,
    stream: RefCell<BufWriter<W>>,
    use_pretty_formatter: bool,
    is_first_item: Cell<bool>,
}

impl<W: Write, T> JsonItemWriter<W, T> {
    fn new(wtr: W, use_pretty_formatter: bool) -> Self {
        Self {
            pd: PhantomData,
            stream: RefCell::new(BufWriter::new(wtr)),
            use_pretty_formatter,
            is_first_item: Cell::new(true),
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), BatchError> {
        self.stream
            .borrow_mut()
            .write_all(bytes)
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }
}

impl<W: Write, T: Serialize> ItemWriter<T> for JsonItemWriter<W, T> {
    fn write(&self, items: &[T]) -> Result<(), BatchError> {
        for item in items {
            if !self.is_first_item.get() {
                let separator: &[u8] = if self.use_pretty_formatter { b",\n" } else { b"," };
                self.write_bytes(separator)?;
            }
            self.is_first_item.set(false);

            let mut stream = self.stream.borrow_mut();
            let result = if self.use_pretty_formatter {
                serde_json::to_writer_pretty(&mut *stream, item)
            } else {
                serde_json::to_writer(&mut *stream, item)
            };
            result.map_err(|error| BatchError::ItemWriter(error.to_string()))?;
        }

        Ok(())
    }

    fn flush(&self) -> Result<(), BatchError> {
        self.stream
            .borrow_mut()
            .flush()
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }

    fn open(&self) -> Result<(), BatchError> {
        self.is_first_item.set(true);
        let opening: &[u8] = if self.use_pretty_formatter { b"[\n" } else { b"[" };
        self.write_bytes(opening)
    }

    fn close(&self) -> Result<(), BatchError> {
        let closing: &[u8] = if self.use_pretty_formatter { b"\n]\n" } else { b"]\n" };
        self.write_bytes(closing)?;
        ItemWriter::<T>::flush(self)
    }
}

pub struct JsonItemWriterBuilder<T> {
    _pd: PhantomData<T>,
    pretty_formatter: bool,
}

impl<T> Default for JsonItemWriterBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonItemWriterBuilder<T> {
    pub fn new() -> JsonItemWriterBuilder<T> {
        Self {
            _pd: PhantomData,
            pretty_formatter: false,
        }
    }

    pub fn pretty_formatter(mut self, yes: bool) -> JsonItemWriterBuilder<T> {
        self.pretty_formatter = yes;
        self
    }

    pub fn from_writer<W: Write>(self, wtr: W) -> JsonItemWriter<W, T> {
        JsonItemWriter::new(wtr, self.pretty_formatter)
    }

    /// Creates (or truncates) the file at `path`.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<JsonItemWriter<File, T>, BatchError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| BatchError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.from_writer(file))
    }
}
