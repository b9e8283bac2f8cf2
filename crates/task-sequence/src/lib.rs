//! task-sequence: Task sequence environment and progress UI bindings
//!
//! This crate lets a step running inside a task sequence read and write task
//! sequence variables and drive the progress, error, reboot and message
//! dialogs of the host. Both native objects are bound lazily: creating a
//! [`VariableStore`] or [`ProgressReporter`] never fails, even outside the
//! host. Operations report [`TaskSequenceError::NotAvailable`] instead.
//!
//! # Features
//!
//! - **Variables**: enumerate, get, set, iterate and snapshot into a map
//! - **Progress UI**: action/sequence progress, error, reboot, swap-media and
//!   message dialogs, including result-bearing message boxes
//! - **Explicit optionals**: omitted parameters reach the host as "absent",
//!   never as `0` or `""`
//! - **Dry runs**: in-memory adapters from `ts-dispatch` stand in for the host
//!
//! # Example
//!
//! ```
//! use task_sequence::prelude::*;
//!
//! let store = VariableStore::new();
//! if store.is_available() {
//!     let name = store.get("OSDComputerName")?;
//!     println!("deploying {name}");
//! }
//! # Ok::<(), TaskSequenceError>(())
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod message;
pub mod prelude;
pub mod progress;

pub use config::{AutomationConfig, DEFAULT_ENVIRONMENT_CLASS, DEFAULT_PROGRESS_CLASS};
pub use environment::{VariableEntry, VariableStore, Variables};
pub use error::{Result, TaskSequenceError};
pub use message::{DialogOutcome, MessageType, MessageboxResult, ResultCodes};
pub use progress::{
    ActionProgress, DEFAULT_CAPTION, ErrorDialog, Message, ProgressReporter, RebootPrompt,
    TsProgress,
};

// Re-export the dispatch layer so hosts can pick an adapter
pub use ts_dispatch::{self as dispatch, BindingState};
