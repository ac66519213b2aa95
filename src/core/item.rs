use crate::error::BatchError;

/// Result of a single read: `Ok(None)` once the source is exhausted.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of handing one item to an [`ItemHandler`].
pub type ItemHandlerResult = Result<(), BatchError>;

/// Produces items one at a time from some source.
pub trait ItemReader<R> {
    /// Reads the next item.
    ///
    /// # Returns
    /// - `Ok(Some(item))` when an item was read
    /// - `Ok(None)` when there are no more items
    /// - `Err(BatchError)` when the source is broken; the reader should not
    ///   be polled again after an error
    fn read(&self) -> ItemReaderResult<R>;
}

/// The per-item callback driven by a step.
///
/// Any closure `Fn(&T) -> Result<(), BatchError>` is a handler, so most
/// callers never implement this trait by hand.
pub trait ItemHandler<T> {
    fn handle(&self, item: &T) -> ItemHandlerResult;
}

impl<T, F> ItemHandler<T> for F
where
    F: Fn(&T) -> ItemHandlerResult,
{
    fn handle(&self, item: &T) -> ItemHandlerResult {
        self(item)
    }
}

/// Consumes items and writes them to some sink.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> Result<(), BatchError>;
    fn flush(&self) -> Result<(), BatchError> {
        Ok(())
    }
    fn open(&self) -> Result<(), BatchError> {
        Ok(())
    }
    fn close(&self) -> Result<(), BatchError> {
        Ok(())
    }
}
