use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader, Read},
    marker::PhantomData,
    path::Path,
};

use log::debug;
use serde::de::DeserializeOwned;

use crate::{
    BatchError,
    core::item::{ItemReader, ItemReaderResult},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArrayState {
    /// Just after `[`: an element or `]` may follow.
    Start,
    /// Just after `,`: an element must follow.
    Pending,
    /// Just after an element: `,` or `]` must follow.
    AfterElement,
    /// `]` consumed or the scan failed.
    Done,
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// Skips whitespace and returns the next byte without consuming it.
fn peek_token<R: Read>(reader: &mut BufReader<R>) -> Result<Option<u8>, BatchError> {
    loop {
        let (skip, token) = {
            let buffer = reader.fill_buf()?;
            if buffer.is_empty() {
                return Ok(None);
            }
            match buffer.iter().position(|byte| !is_whitespace(*byte)) {
                Some(index) => (index, Some(buffer[index])),
                None => (buffer.len(), None),
            }
        };

        reader.consume(skip);

        if token.is_some() {
            return Ok(token);
        }
    }
}

/// Copies the bytes of the next array element into `object`.
///
/// Nesting is tracked with a level counter and string contents are skipped
/// so brackets inside strings do not count. The element ends on its
/// closing bracket, or for a scalar on the first `,`, `]` or whitespace at
/// level 0, which is left in the reader. A truncated element is copied as
/// is and left to the decoder to reject.
fn scan_element<R: Read>(reader: &mut BufReader<R>, object: &mut Vec<u8>) -> Result<(), BatchError> {
    let mut level: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    loop {
        let (used, ended) = {
            let buffer = reader.fill_buf()?;
            if buffer.is_empty() {
                return Ok(());
            }

            let mut ended = None;
            for (index, &byte) in buffer.iter().enumerate() {
                if in_string {
                    if escaped {
                        escaped = false;
                    } else if byte == b'\\' {
                        escaped = true;
                    } else if byte == b'"' {
                        in_string = false;
                        if level == 0 {
                            ended = Some(index + 1);
                            break;
                        }
                    }
                    continue;
                }

                match byte {
                    b'"' => in_string = true,
                    b'{' | b'[' => level += 1,
                    b'}' | b']' if level == 0 => {
                        ended = Some(index);
                        break;
                    }
                    b'}' | b']' => {
                        level -= 1;
                        if level == 0 {
                            ended = Some(index + 1);
                            break;
                        }
                    }
                    b',' if level == 0 => {
                        ended = Some(index);
                        break;
                    }
                    byte if level == 0 && is_whitespace(byte) => {
                        ended = Some(index);
                        break;
                    }
                    _ => {}
                }
            }

            let used = ended.unwrap_or(buffer.len());
            object.extend_from_slice(&buffer[..used]);
            (used, ended.is_some())
        };

        reader.consume(used);

        if ended {
            return Ok(());
        }
    }
}

fn describe(token: Option<u8>) -> String {
    match token {
        Some(byte) if byte.is_ascii_graphic() => format!("'{}'", char::from(byte)),
        Some(byte) => format!("byte 0x{:02x}", byte),
        None => "end of input".to_string(),
    }
}

/// A streaming reader over a top-level JSON array.
///
/// The array framing (`[`, `,`, `]`) is scanned byte by byte on a buffered
/// source. The bytes of each element are collected on their own and decoded
/// with `serde_json`, so only one element is ever held in memory. The underlying source is
/// dropped as soon as the closing bracket is consumed or an error occurs.
///
/// ```
/// use stream_batch_rs::core::item::ItemReader;
/// use stream_batch_rs::item::json::json_reader::JsonArrayReaderBuilder;
/// use stream_batch_rs::item::record::Record;
///
/// let json = r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#;
///
/// let reader = JsonArrayReaderBuilder::<Record>::new()
///     .from_reader(json.as_bytes())
///     .unwrap();
///
/// let mut ids = Vec::new();
/// while let Some(record) = reader.read().unwrap() {
///     ids.push(record.id);
/// }
///
/// assert_eq!(ids, vec![1, 2]);
/// ```
pub struct JsonArrayReader<R, T> {
    pd: PhantomData<T>,
    reader: RefCell<Option<BufReader<R>>>,
    object: RefCell<Vec<u8>>,
    state: Cell<ArrayState>,
    position: Cell<usize>,
}

impl<R: Read, T: DeserializeOwned> JsonArrayReader<R, T> {
    fn open(rdr: R, capacity: usize) -> Result<Self, BatchError> {
        let mut buf_reader = BufReader::with_capacity(capacity, rdr);

        match peek_token(&mut buf_reader)? {
            Some(b'[') => buf_reader.consume(1),
            token => {
                return Err(BatchError::Framing(format!(
                    "expected '[' at start of document, found {}",
                    describe(token)
                )));
            }
        }

        debug!("Start of array");

        Ok(Self {
            pd: PhantomData,
            reader: RefCell::new(Some(buf_reader)),
            object: RefCell::new(Vec::new()),
            state: Cell::new(ArrayState::Start),
            position: Cell::new(0),
        })
    }

    /// Number of elements decoded so far.
    pub fn position(&self) -> usize {
        self.position.get()
    }

    /// Tells whether another element is pending.
    ///
    /// Consumes separators and, at the end of the array, the closing
    /// bracket. Returns a framing error when the array is not properly
    /// delimited or closed. Calling it repeatedly without reading is
    /// harmless.
    pub fn has_more(&self) -> Result<bool, BatchError> {
        let result = self.advance();
        if !matches!(result, Ok(true)) {
            self.release();
        }
        result
    }

    fn advance(&self) -> Result<bool, BatchError> {
        let state = self.state.get();

        match state {
            ArrayState::Done => return Ok(false),
            ArrayState::Pending => return Ok(true),
            ArrayState::Start | ArrayState::AfterElement => {}
        }

        let mut guard = self.reader.borrow_mut();
        let Some(reader) = guard.as_mut() else {
            return Ok(false);
        };

        match peek_token(reader)? {
            Some(b']') => {
                reader.consume(1);
                Self::expect_end(reader)?;
                debug!("End of array after {} elements", self.position.get());
                Ok(false)
            }
            Some(b',') if state == ArrayState::AfterElement => {
                reader.consume(1);
                self.state.set(ArrayState::Pending);
                Ok(true)
            }
            Some(_) if state == ArrayState::Start => Ok(true),
            None => Err(BatchError::Framing(format!(
                "array not closed, input ended after {} elements",
                self.position.get()
            ))),
            token => Err(BatchError::Framing(format!(
                "expected ',' or ']' after element {}, found {}",
                self.position.get() - 1,
                describe(token)
            ))),
        }
    }

    fn expect_end(reader: &mut BufReader<R>) -> Result<(), BatchError> {
        match peek_token(reader)? {
            None => Ok(()),
            token => Err(BatchError::Framing(format!(
                "unexpected {} after closing ']'",
                describe(token)
            ))),
        }
    }

    /// Drops the source; every later call reports an exhausted stream.
    fn release(&self) {
        self.state.set(ArrayState::Done);
        self.reader.borrow_mut().take();
    }
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for JsonArrayReader<R, T> {
    /// Decodes the next element of the array.
    ///
    /// # Returns
    /// - `Ok(Some(item))` when an element was decoded
    /// - `Ok(None)` once the closing bracket has been consumed
    /// - `Err(BatchError::Decode { position, .. })` when the element at
    ///   `position` does not match `T`
    /// - `Err(BatchError::Framing(..))` when the array is malformed
    fn read(&self) -> ItemReaderResult<T> {
        if !self.has_more()? {
            return Ok(None);
        }

        let position = self.position.get();

        let mut object = self.object.borrow_mut();
        object.clear();

        let scanned = match self.reader.borrow_mut().as_mut() {
            Some(reader) => {
                peek_token(reader).and_then(|_| scan_element(reader, &mut object))
            }
            None => return Ok(None),
        };
        if let Err(err) = scanned {
            self.release();
            return Err(err);
        }

        match serde_json::from_slice::<T>(&object) {
            Ok(item) => {
                self.position.set(position + 1);
                self.state.set(ArrayState::AfterElement);
                Ok(Some(item))
            }
            Err(source) => {
                self.release();
                Err(BatchError::Decode { position, source })
            }
        }
    }
}

pub struct JsonArrayReaderBuilder<T> {
    _pd: PhantomData<T>,
    capacity: usize,
}

impl<T> Default for JsonArrayReaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonArrayReaderBuilder<T> {
    pub fn new() -> JsonArrayReaderBuilder<T> {
        Self {
            _pd: PhantomData,
            capacity: 8 * 1024,
        }
    }

    /// Sets the capacity of the read buffer.
    pub fn capacity(mut self, capacity: usize) -> JsonArrayReaderBuilder<T> {
        self.capacity = capacity;
        self
    }
}

impl<T: DeserializeOwned> JsonArrayReaderBuilder<T> {
    /// Builds a reader over any byte source and checks the opening bracket.
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<JsonArrayReader<R, T>, BatchError> {
        JsonArrayReader::open(rdr, self.capacity)
    }

    /// Opens `path` and checks the opening bracket.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<JsonArrayReader<File, T>, BatchError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| BatchError::File {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Opened {}", path.display());

        self.from_reader(file)
    }
}
