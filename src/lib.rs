#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Stream Batch for Rust

 Process JSON arrays that do not fit in memory. The array at a path is
 scanned incrementally, every element is decoded into a typed record and
 handed to a handler, either inline or from a fixed pool of worker threads.

 ## Core Concepts

- **ItemReader:** produces items one at a time. `JsonArrayReader` checks the
  array framing and decodes each element with `serde_json`.
- **ItemHandler:** the per-item callback. Any `Fn(&T) -> Result<(), BatchError>`
  is a handler.
- **Step:** drives a reader into a handler, sequentially or in parallel, and
  reports a `ProcessResult`: the number of handled items and the first error.
- **StepListener:** optional hooks called before and after a step, used for
  timing or profiling without touching the dispatch loop.

 ## Modes

 | **Mode**   | **Ordering**                     | **Entry point**  |
 |------------|----------------------------------|------------------|
 | sequential | handler sees items in file order | `run_sequential` |
 | parallel   | no ordering across workers       | `run_parallel`   |

 In both modes the first error, from decoding or from the handler, stops the
 run and is returned together with the count accumulated so far.

 ## Features

| **Feature** | **Description**                                           |
|-------------|-----------------------------------------------------------|
| fake        | Enables a fake `ItemReader` used to generate sample files |

 ## Getting Started

```rust
# use std::io::Write;
use stream_batch_rs::{run_parallel, run_sequential, BatchError, Record};

# fn main() -> Result<(), BatchError> {
# let mut file = tempfile::NamedTempFile::new()?;
# write!(file, r#"[{{"id":1,"name":"a"}},{{"id":2,"name":"b"}}]"#)?;
# let path = file.path();
let handler = |record: &Record| -> Result<(), BatchError> {
    if record.name.is_empty() {
        return Err(BatchError::ItemHandler(format!("record {} has no name", record.id)));
    }
    Ok(())
};

let count = run_sequential(path, &handler).into_result()?;
assert_eq!(count, 2);

let count = run_parallel(path, 4, &handler).into_result()?;
assert_eq!(count, 2);
# Ok(())
# }
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item readers, writers and handlers
pub mod item;

#[doc(inline)]
pub use crate::core::step::{ProcessResult, run_parallel, run_sequential};

#[doc(inline)]
pub use item::record::{Metadata, Record};
