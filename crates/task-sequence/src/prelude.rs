//! Convenient re-exports for common task-sequence usage.
//!
//! # Example
//!
//! ```
//! use task_sequence::prelude::*;
//!
//! let store = VariableStore::new();
//! let progress = ProgressReporter::new();
//! if store.is_available() && progress.is_available() {
//!     let org = store.get("_SMSTSOrgName")?;
//!     progress.report_ts_progress(&TsProgress::new().org_name(org).step(1).max_step(4))?;
//! }
//! # Ok::<(), TaskSequenceError>(())
//! ```

// Configuration
pub use crate::config::AutomationConfig;

// Error handling
pub use crate::error::{Result, TaskSequenceError};

// Variables
pub use crate::environment::{VariableEntry, VariableStore};

// Dialogs
pub use crate::message::{DialogOutcome, MessageType, MessageboxResult};
pub use crate::progress::{
    ActionProgress, ErrorDialog, Message, ProgressReporter, RebootPrompt, TsProgress,
};
