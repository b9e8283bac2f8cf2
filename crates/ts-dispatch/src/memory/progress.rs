//! In-memory progress UI that records every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{DispatchError, Result};
use crate::traits::NativeObject;
use crate::value::{Arg, InvokeKind, Value};

/// Members of the progress UI object and their argument counts.
const MEMBERS: &[(&str, usize)] = &[
    ("CloseProgressDialog", 0),
    ("ShowActionProgress", 9),
    ("ShowErrorDialog", 7),
    ("ShowMessage", 3),
    ("ShowMessageEx", 4),
    ("ShowRebootDialog", 5),
    ("ShowSwapMediaDialog", 2),
    ("ShowTsProgress", 6),
];

/// Result code written by `ShowMessageEx` unless configured otherwise.
pub const DEFAULT_MESSAGE_RESULT: u32 = 1;

/// A call received by [`MemoryProgressUi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Member name.
    pub member: String,
    /// Arguments as received, before any output slot was written.
    pub args: Vec<Arg>,
}

impl RecordedCall {
    /// Get an argument by position.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }
}

#[derive(Debug)]
struct ProgressState {
    calls: Vec<RecordedCall>,
    message_result: u32,
    failures: HashMap<String, String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            message_result: DEFAULT_MESSAGE_RESULT,
            failures: HashMap::new(),
        }
    }
}

/// Progress UI stand-in shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressUi {
    state: Arc<Mutex<ProgressState>>,
}

impl MemoryProgressUi {
    /// Create a recorder with no calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result code `ShowMessageEx` writes back.
    pub fn respond_with(&self, code: u32) {
        self.lock().message_result = code;
    }

    /// Make every call to `member` fail with `reason`.
    pub fn fail_member(&self, member: impl Into<String>, reason: impl Into<String>) {
        self.lock().failures.insert(member.into(), reason.into());
    }

    /// All calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// The most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.lock().calls.last().cloned()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NativeObject for MemoryProgressUi {
    fn invoke(&mut self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value> {
        let mut state = self.lock();

        let Some(&(_, argc)) = MEMBERS.iter().find(|(name, _)| *name == member) else {
            return Err(DispatchError::unknown_member(member));
        };
        if kind != InvokeKind::Method {
            return Err(DispatchError::invocation(member, "member is a method"));
        }
        if args.len() != argc {
            return Err(DispatchError::invocation(
                member,
                format!("expected {argc} arguments, got {}", args.len()),
            ));
        }

        state.calls.push(RecordedCall {
            member: member.to_string(),
            args: args.to_vec(),
        });

        if let Some(reason) = state.failures.get(member) {
            return Err(DispatchError::invocation(member, reason.as_str()));
        }

        if member == "ShowMessageEx" {
            match args.last_mut() {
                Some(Arg::Out(slot)) => *slot = Value::U32(state.message_result),
                _ => return Err(DispatchError::type_mismatch(member, "output slot")),
            }
        }

        Ok(Value::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let ui = MemoryProgressUi::new();
        let mut object = ui.clone();

        object
            .invoke("CloseProgressDialog", InvokeKind::Method, &mut [])
            .unwrap();
        object
            .invoke(
                "ShowSwapMediaDialog",
                InvokeKind::Method,
                &mut [Arg::from("Deploy"), Arg::U32(2)],
            )
            .unwrap();

        let calls = ui.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].member, "CloseProgressDialog");
        assert_eq!(calls[1].arg(1), Some(&Arg::U32(2)));
    }

    #[test]
    fn message_ex_writes_result() {
        let ui = MemoryProgressUi::new();
        ui.respond_with(7);
        let mut object = ui.clone();

        let mut args = [Arg::from("Continue?"), Arg::from("Confirm"), Arg::U32(4), Arg::out()];
        object
            .invoke("ShowMessageEx", InvokeKind::Method, &mut args)
            .unwrap();

        assert_eq!(args[3].out_value(), Some(&Value::U32(7)));
        assert_eq!(ui.last_call().unwrap().arg(3), Some(&Arg::out()));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut ui = MemoryProgressUi::new();
        let err = ui
            .invoke("ShowSwapMediaDialog", InvokeKind::Method, &mut [Arg::from("Deploy")])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Invocation { .. }));
        assert!(ui.calls().is_empty());
    }

    #[test]
    fn injected_failure() {
        let ui = MemoryProgressUi::new();
        ui.fail_member("CloseProgressDialog", "0x80004005");
        let mut object = ui.clone();

        let err = object
            .invoke("CloseProgressDialog", InvokeKind::Method, &mut [])
            .unwrap_err();
        assert_eq!(err.to_string(), "invoking 'CloseProgressDialog' failed: 0x80004005");
    }
}
