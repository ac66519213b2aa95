use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::bounded;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    BatchError,
    item::{json::json_reader::JsonArrayReaderBuilder, record::Record},
};

use super::{
    build_name,
    item::{ItemHandler, ItemReader},
    listener::StepListener,
};

/// Capacity of the queue between the producer and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Capacity of the read buffer in front of the JSON source.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepStatus {
    Success,
    Failed,
    Cancelled,
}

/// Outcome of one step execution.
///
/// `count` is the number of items the handler accepted. On failure it holds
/// whatever was accumulated before the run stopped; partial counts are
/// never discarded.
#[derive(Debug)]
pub struct ProcessResult {
    /// Unique identifier of this execution
    pub id: Uuid,
    /// Name of the step
    pub name: String,
    pub status: StepStatus,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    /// Number of items successfully handled
    pub count: usize,
    /// First error encountered, if any
    pub error: Option<BatchError>,
}

impl ProcessResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Turns the result into the count, or the first error.
    pub fn into_result(self) -> Result<usize, BatchError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.count),
        }
    }
}

/// Drives items from a reader into a handler.
///
/// A step runs in one of two modes:
///
/// - **sequential**: every item is handled inline, in the order it was
///   read. Two runs over the same input invoke the handler in the same
///   order.
/// - **parallel**: the calling thread reads items and pushes them onto a
///   bounded queue drained by a fixed number of worker threads. The handler
///   is invoked in no particular order; only the final count and the first
///   error are meaningful.
///
/// In both modes the first error, from the reader or the handler, stops
/// the run. In parallel mode the failing party cancels the step: the
/// producer stops reading and workers stop pulling, while handler calls
/// already in flight run to completion.
///
/// # Example
///
/// ```
/// use stream_batch_rs::core::step::StepBuilder;
/// use stream_batch_rs::core::item::ItemHandlerResult;
/// use stream_batch_rs::item::json::json_reader::JsonArrayReaderBuilder;
/// use stream_batch_rs::item::record::Record;
///
/// let json = r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#;
/// let reader = JsonArrayReaderBuilder::<Record>::new()
///     .from_reader(json.as_bytes())
///     .unwrap();
///
/// let step = StepBuilder::new().name("ids".to_string()).workers(2).build();
/// let handler = |record: &Record| -> ItemHandlerResult {
///     assert!(record.id > 0);
///     Ok(())
/// };
///
/// let result = step.execute_parallel(&reader, &handler);
/// assert_eq!(result.into_result().unwrap(), 3);
/// ```
pub struct Step<'a> {
    id: Uuid,
    name: String,
    workers: usize,
    queue_capacity: usize,
    buffer_capacity: usize,
    token: CancellationToken,
    listeners: Vec<&'a dyn StepListener>,
}

impl Step<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_workers(&self) -> usize {
        self.workers
    }

    /// Streams the JSON array at `path` through `handler`, one item at a time.
    pub fn run_sequential<T, P, H>(&self, path: P, handler: &H) -> ProcessResult
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
        H: ItemHandler<T> + ?Sized,
    {
        let start = self.start();

        let reader = match JsonArrayReaderBuilder::<T>::new()
            .capacity(self.buffer_capacity)
            .from_path(path)
        {
            Ok(reader) => reader,
            Err(err) => return self.fail_to_open(start, err),
        };

        let (count, error) = self.sequential(&reader, handler);
        self.finish(start, count, error)
    }

    /// Streams the JSON array at `path` through `handler` on the worker pool.
    pub fn run_parallel<T, P, H>(&self, path: P, handler: &H) -> ProcessResult
    where
        T: DeserializeOwned + Send,
        P: AsRef<Path>,
        H: ItemHandler<T> + Sync + ?Sized,
    {
        let start = self.start();

        let reader = match JsonArrayReaderBuilder::<T>::new()
            .capacity(self.buffer_capacity)
            .from_path(path)
        {
            Ok(reader) => reader,
            Err(err) => return self.fail_to_open(start, err),
        };

        let (count, error) = self.parallel(&reader, handler);
        self.finish(start, count, error)
    }

    /// Handles every item of `reader` inline.
    pub fn execute_sequential<T, Rd, H>(&self, reader: &Rd, handler: &H) -> ProcessResult
    where
        Rd: ItemReader<T> + ?Sized,
        H: ItemHandler<T> + ?Sized,
    {
        let start = self.start();
        let (count, error) = self.sequential(reader, handler);
        self.finish(start, count, error)
    }

    /// Handles every item of `reader` on the worker pool.
    ///
    /// The reader is polled on the calling thread only.
    pub fn execute_parallel<T, Rd, H>(&self, reader: &Rd, handler: &H) -> ProcessResult
    where
        T: Send,
        Rd: ItemReader<T> + ?Sized,
        H: ItemHandler<T> + Sync + ?Sized,
    {
        let start = self.start();
        let (count, error) = self.parallel(reader, handler);
        self.finish(start, count, error)
    }

    fn sequential<T, Rd, H>(&self, reader: &Rd, handler: &H) -> (usize, Option<BatchError>)
    where
        Rd: ItemReader<T> + ?Sized,
        H: ItemHandler<T> + ?Sized,
    {
        let mut count = 0;

        let error = loop {
            if self.token.is_cancelled() {
                warn!("Step {} cancelled after {} items", self.name, count);
                break Some(BatchError::Cancelled);
            }

            match reader.read() {
                Ok(Some(item)) => match handler.handle(&item) {
                    Ok(()) => count += 1,
                    Err(err) => {
                        error!("ItemHandler error after {} items: {}", count, err);
                        break Some(err);
                    }
                },
                Ok(None) => break None,
                Err(err) => {
                    error!("ItemReader error: {}", err);
                    break Some(err);
                }
            }
        };

        (count, error)
    }

    fn parallel<T, Rd, H>(&self, reader: &Rd, handler: &H) -> (usize, Option<BatchError>)
    where
        T: Send,
        Rd: ItemReader<T> + ?Sized,
        H: ItemHandler<T> + Sync + ?Sized,
    {
        let external = &self.token;
        let token = self.token.child_token();
        let count = AtomicUsize::new(0);
        let first_error: Mutex<Option<BatchError>> = Mutex::new(None);

        thread::scope(|scope| {
            let (sender, receiver) = bounded::<T>(self.queue_capacity);

            let handles: Vec<_> = (0..self.workers)
                .map(|worker| {
                    let receiver = receiver.clone();
                    let (count, first_error, token) = (&count, &first_error, &token);

                    scope.spawn(move || {
                        debug!("Worker {} started", worker);
                        loop {
                            if is_stopped(token, external, first_error) {
                                break;
                            }
                            // an error here means the queue is closed and drained
                            let Ok(item) = receiver.recv() else {
                                break;
                            };
                            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&item))) {
                                Ok(Ok(())) => {
                                    count.fetch_add(1, Ordering::SeqCst);
                                }
                                Ok(Err(err)) => {
                                    error!("ItemHandler error on worker {}: {}", worker, err);
                                    report_error(first_error, token, err);
                                    break;
                                }
                                Err(panic) => {
                                    let message = panic_message(panic.as_ref());
                                    error!("ItemHandler panicked on worker {}: {}", worker, message);
                                    report_error(first_error, token, BatchError::Worker(message));
                                    break;
                                }
                            }
                        }
                        debug!("Worker {} finished", worker);
                    })
                })
                .collect();

            drop(receiver);

            loop {
                if is_stopped(&token, external, &first_error) {
                    break;
                }
                match reader.read() {
                    Ok(Some(item)) => {
                        if sender.send(item).is_err() {
                            debug!("No worker left, stopping producer");
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        error!("ItemReader error: {}", err);
                        report_error(&first_error, &token, err);
                        break;
                    }
                }
            }

            // closing the queue lets the workers drain it and exit
            drop(sender);

            for handle in handles {
                if let Err(panic) = handle.join() {
                    report_error(
                        &first_error,
                        &token,
                        BatchError::Worker(panic_message(panic.as_ref())),
                    );
                }
            }
        });

        let error = first_error
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        (count.into_inner(), error)
    }

    fn start(&self) -> Instant {
        debug!("Start of step: {}, id: {}", self.name, self.id);
        self.listeners
            .iter()
            .for_each(|listener| listener.before_step(&self.name));
        Instant::now()
    }

    fn fail_to_open(&self, start: Instant, err: BatchError) -> ProcessResult {
        error!("Unable to open source: {}", err);
        self.finish(start, 0, Some(err))
    }

    fn finish(&self, start: Instant, count: usize, error: Option<BatchError>) -> ProcessResult {
        let status = match &error {
            None => StepStatus::Success,
            Some(BatchError::Cancelled) => StepStatus::Cancelled,
            Some(_) => StepStatus::Failed,
        };

        debug!("End of step: {}, id: {}", self.name, self.id);

        let result = ProcessResult {
            id: self.id,
            name: self.name.clone(),
            status,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            count,
            error,
        };

        self.listeners
            .iter()
            .for_each(|listener| listener.after_step(&result));

        result
    }
}

/// Keeps the first error and cancels the run.
fn report_error(slot: &Mutex<Option<BatchError>>, token: &CancellationToken, err: BatchError) {
    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_ref() {
        None => *guard = Some(err),
        Some(_) => debug!("Ignoring subsequent error: {}", err),
    }
    token.cancel();
}

fn is_stopped(
    token: &CancellationToken,
    external: &CancellationToken,
    slot: &Mutex<Option<BatchError>>,
) -> bool {
    if !token.is_cancelled() {
        return false;
    }
    if external.is_cancelled() {
        report_error(slot, token, BatchError::Cancelled);
    }
    true
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Builder for [`Step`].
pub struct StepBuilder<'a> {
    name: Option<String>,
    workers: Option<usize>,
    queue_capacity: usize,
    buffer_capacity: usize,
    token: Option<CancellationToken>,
    listeners: Vec<&'a dyn StepListener>,
}

impl Default for StepBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StepBuilder<'a> {
    pub fn new() -> StepBuilder<'a> {
        Self {
            name: None,
            workers: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            token: None,
            listeners: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> StepBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Number of worker threads used in parallel mode.
    ///
    /// Defaults to the available hardware concurrency.
    pub fn workers(mut self, workers: usize) -> StepBuilder<'a> {
        self.workers = Some(workers);
        self
    }

    /// Capacity of the queue between the producer and the workers.
    pub fn queue_capacity(mut self, queue_capacity: usize) -> StepBuilder<'a> {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Capacity of the read buffer used when the step opens a file.
    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> StepBuilder<'a> {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Token checked before every read and every pull from the queue.
    pub fn cancellation_token(mut self, token: CancellationToken) -> StepBuilder<'a> {
        self.token = Some(token);
        self
    }

    pub fn listener(mut self, listener: &'a dyn StepListener) -> StepBuilder<'a> {
        self.listeners.push(listener);
        self
    }

    pub fn build(self) -> Step<'a> {
        let workers = match self.workers {
            Some(0) => {
                warn!("A step needs at least one worker, using 1");
                1
            }
            Some(workers) => workers,
            None => default_workers(),
        };

        let step = Step {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            workers,
            queue_capacity: self.queue_capacity,
            buffer_capacity: self.buffer_capacity,
            token: self.token.unwrap_or_else(CancellationToken::new),
            listeners: self.listeners,
        };

        info!(
            "Step {} built with {} workers, queue capacity {}",
            step.name, step.workers, step.queue_capacity
        );

        step
    }
}

/// Number of hardware threads, or 1 when it cannot be determined.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|workers| workers.get())
        .unwrap_or(1)
}

/// Decodes every [`Record`] of the JSON array at `path` and hands it to
/// `handler` in file order.
pub fn run_sequential<H>(path: impl AsRef<Path>, handler: &H) -> ProcessResult
where
    H: ItemHandler<Record> + ?Sized,
{
    StepBuilder::new()
        .build()
        .run_sequential::<Record, _, _>(path, handler)
}

/// Decodes every [`Record`] of the JSON array at `path` and hands it to
/// `handler` from `worker_count` worker threads, in no particular order.
pub fn run_parallel<H>(path: impl AsRef<Path>, worker_count: usize, handler: &H) -> ProcessResult
where
    H: ItemHandler<Record> + Sync + ?Sized,
{
    StepBuilder::new()
        .workers(worker_count)
        .build()
        .run_parallel::<Record, _, _>(path, handler)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use mockall::{Sequence, mock};
    use tokio_util::sync::CancellationToken;

    use crate::{
        BatchError,
        core::{
            item::{ItemHandler, ItemHandlerResult, ItemReader},
            listener::StepListener,
        },
        item::{json::json_reader::JsonArrayReaderBuilder, record::Record},
    };

    use super::{ProcessResult, StepBuilder, StepStatus};

    mock! {
        pub Handler {}
        impl ItemHandler<Record> for Handler {
            fn handle(&self, item: &Record) -> ItemHandlerResult;
        }
    }

    fn records(count: usize) -> String {
        let items: Vec<String> = (1..=count)
            .map(|id| format!(r#"{{"id":{},"name":"r{}","value":{}.5}}"#, id, id, id))
            .collect();
        format!("[{}]", items.join(","))
    }

    fn accept_all(_: &Record) -> ItemHandlerResult {
        Ok(())
    }

    #[test]
    fn sequential_should_handle_items_in_order() {
        let json = records(2);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let mut sequence = Sequence::new();
        let mut handler = MockHandler::new();
        handler
            .expect_handle()
            .withf(|item| item.id == 1)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        handler
            .expect_handle()
            .withf(|item| item.id == 2)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let step = StepBuilder::new().build();
        let result = step.execute_sequential(&reader, &handler);

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.count, 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn sequential_should_be_deterministic() {
        let json = records(50);
        let step = StepBuilder::new().build();

        let run = || {
            let reader = JsonArrayReaderBuilder::<Record>::new()
                .capacity(7)
                .from_reader(json.as_bytes())
                .unwrap();
            let seen = RefCell::new(Vec::new());
            let handler = |record: &Record| -> ItemHandlerResult {
                seen.borrow_mut().push(record.id);
                Ok(())
            };
            let result = step.execute_sequential(&reader, &handler);
            assert_eq!(result.count, 50);
            seen.into_inner()
        };

        let first = run();
        assert_eq!(first, (1..=50).collect::<Vec<i64>>());
        assert_eq!(first, run());
    }

    #[test]
    fn sequential_should_stop_on_first_handler_error() {
        let json = records(5);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let calls = AtomicUsize::new(0);
        let handler = |record: &Record| -> ItemHandlerResult {
            calls.fetch_add(1, Ordering::SeqCst);
            if record.id == 3 {
                return Err(BatchError::ItemHandler("id 3 rejected".to_string()));
            }
            Ok(())
        };

        let result = StepBuilder::new()
            .build()
            .execute_sequential(&reader, &handler);

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.count, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.error {
            Some(BatchError::ItemHandler(message)) => assert_eq!(message, "id 3 rejected"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn sequential_should_count_items_before_decode_error() {
        let json = r#"[{"id":1},{"id":2},{"id":[]},{"id":4}]"#;
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let result = StepBuilder::new()
            .build()
            .execute_sequential(&reader, &accept_all);

        assert_eq!(result.count, 2);
        assert_eq!(result.error.as_ref().and_then(BatchError::position), Some(2));
    }

    #[test]
    fn parallel_should_handle_every_item() {
        let json = records(1000);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let sum = AtomicUsize::new(0);
        let handler = |record: &Record| -> ItemHandlerResult {
            sum.fetch_add(record.id as usize, Ordering::SeqCst);
            Ok(())
        };

        let result = StepBuilder::new()
            .workers(4)
            .queue_capacity(8)
            .build()
            .execute_parallel(&reader, &handler);

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.count, 1000);
        assert_eq!(sum.load(Ordering::SeqCst), 1000 * 1001 / 2);
    }

    #[test]
    fn parallel_should_report_decode_error_with_bounded_count() {
        let json = r#"[{"id":1},{"id":2},{"id":3},{"id":"bad"},{"id":5},{"id":6}]"#;
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let result = StepBuilder::new()
            .workers(3)
            .build()
            .execute_parallel(&reader, &accept_all);

        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.count <= 3);
        assert!(matches!(
            result.error,
            Some(BatchError::Decode { position: 3, .. })
        ));
    }

    #[test]
    fn parallel_should_stop_pulling_after_handler_error() {
        let json = records(10_000);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let calls = AtomicUsize::new(0);
        let handler = |_: &Record| -> ItemHandlerResult {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BatchError::ItemHandler("always failing".to_string()))
        };

        let result = StepBuilder::new()
            .workers(2)
            .queue_capacity(4)
            .build()
            .execute_parallel(&reader, &handler);

        assert_eq!(result.count, 0);
        assert!(matches!(result.error, Some(BatchError::ItemHandler(_))));
        // each worker stops after its own failure
        assert!(calls.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn parallel_should_report_worker_panic() {
        let json = records(3);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let handler = |record: &Record| -> ItemHandlerResult {
            if record.id == 2 {
                panic!("boom");
            }
            Ok(())
        };

        let result = StepBuilder::new()
            .workers(1)
            .build()
            .execute_parallel(&reader, &handler);

        match result.error {
            Some(BatchError::Worker(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(result.count, 1);
    }

    #[test]
    fn parallel_worker_panic_should_stop_the_other_workers() {
        let total = 2_000;
        let json = records(total);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let calls = AtomicUsize::new(0);
        let handler = |record: &Record| -> ItemHandlerResult {
            calls.fetch_add(1, Ordering::SeqCst);
            if record.id == 2 {
                panic!("boom");
            }
            thread::sleep(Duration::from_millis(1));
            Ok(())
        };

        let result = StepBuilder::new()
            .workers(4)
            .queue_capacity(10)
            .build()
            .execute_parallel(&reader, &handler);

        assert_eq!(result.status, StepStatus::Failed);
        assert!(matches!(result.error, Some(BatchError::Worker(ref message)) if message == "boom"));
        assert!(calls.load(Ordering::SeqCst) < 100);
        assert!(result.count < 100);
    }

    #[test]
    fn zero_workers_should_be_clamped_to_one() {
        let step = StepBuilder::new().workers(0).build();

        assert_eq!(step.get_workers(), 1);
    }

    #[test]
    fn cancelled_token_should_stop_both_modes() {
        let token = CancellationToken::new();
        token.cancel();

        let step = StepBuilder::new()
            .workers(2)
            .cancellation_token(token)
            .build();

        let json = records(10);
        for parallel in [false, true] {
            let reader = JsonArrayReaderBuilder::<Record>::new()
                .from_reader(json.as_bytes())
                .unwrap();
            let result = if parallel {
                step.execute_parallel(&reader, &accept_all)
            } else {
                step.execute_sequential(&reader, &accept_all)
            };

            assert_eq!(result.status, StepStatus::Cancelled);
            assert_eq!(result.count, 0);
            assert!(matches!(result.error, Some(BatchError::Cancelled)));
        }
    }

    #[test]
    fn cancellation_during_run_should_keep_partial_count() {
        let token = CancellationToken::new();
        let json = records(100);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let handler = |record: &Record| -> ItemHandlerResult {
            if record.id == 10 {
                token.cancel();
            }
            Ok(())
        };

        let result = StepBuilder::new()
            .cancellation_token(token.clone())
            .build()
            .execute_sequential(&reader, &handler);

        assert_eq!(result.count, 10);
        assert!(matches!(result.error, Some(BatchError::Cancelled)));
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl StepListener for RecordingListener {
        fn before_step(&self, name: &str) {
            self.events.lock().unwrap().push(format!("before:{}", name));
        }

        fn after_step(&self, result: &ProcessResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("after:{}:{}", result.name, result.count));
        }
    }

    #[test]
    fn listeners_should_surround_the_run() {
        let listener = RecordingListener::default();
        let json = records(4);
        let reader = JsonArrayReaderBuilder::<Record>::new()
            .from_reader(json.as_bytes())
            .unwrap();

        let step = StepBuilder::new()
            .name("listened".to_string())
            .workers(2)
            .listener(&listener)
            .build();
        step.execute_parallel(&reader, &accept_all);

        assert_eq!(
            *listener.events.lock().unwrap(),
            vec!["before:listened".to_string(), "after:listened:4".to_string()]
        );
    }

    #[test]
    fn reader_trait_object_should_be_accepted() {
        struct Countdown(RefCell<i64>);

        impl ItemReader<Record> for Countdown {
            fn read(&self) -> crate::core::item::ItemReaderResult<Record> {
                let mut left = self.0.borrow_mut();
                if *left == 0 {
                    return Ok(None);
                }
                *left -= 1;
                Ok(Some(Record {
                    id: *left,
                    ..Record::default()
                }))
            }
        }

        let reader = Countdown(RefCell::new(25));
        let result = StepBuilder::new()
            .workers(3)
            .build()
            .execute_parallel(&reader, &accept_all);

        assert_eq!(result.into_result().unwrap(), 25);
    }
}
