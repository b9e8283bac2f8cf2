//! In-memory task sequence variable store.
//!
//! Implements the members of the host's environment object:
//! `GetVariables()` and the indexed `Value(name)` property.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{DispatchError, Result};
use crate::traits::NativeObject;
use crate::value::{Arg, InvokeKind, Value};

#[derive(Debug, Default)]
struct EnvironmentState {
    variables: BTreeMap<String, String>,
    strict: bool,
    failures: HashMap<String, String>,
}

/// In-memory variable store shared between clones.
///
/// Reading an undefined variable yields an empty string, like the host does,
/// unless the store is [`strict`](Self::strict).
#[derive(Debug, Clone, Default)]
pub struct MemoryEnvironment {
    state: Arc<Mutex<EnvironmentState>>,
}

impl MemoryEnvironment {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that fails when an undefined variable is read.
    #[must_use]
    pub fn strict() -> Self {
        let env = Self::new();
        env.lock().strict = true;
        env
    }

    /// Create a store pre-populated with variables.
    #[must_use]
    pub fn with_variables<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = Self::new();
        env.lock()
            .variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v.into())));
        env
    }

    /// Define or overwrite a variable.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.lock().variables.insert(name.into(), value.into());
    }

    /// Remove a variable.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.lock().variables.remove(name)
    }

    /// Read a variable directly.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().variables.get(name).cloned()
    }

    /// Number of defined variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().variables.len()
    }

    /// Check if no variables are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().variables.is_empty()
    }

    /// Make every call to `member` fail with `reason`.
    pub fn fail_member(&self, member: impl Into<String>, reason: impl Into<String>) {
        self.lock().failures.insert(member.into(), reason.into());
    }

    fn lock(&self) -> MutexGuard<'_, EnvironmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn string_arg<'a>(member: &str, args: &'a [Arg], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Arg::as_str)
        .ok_or_else(|| DispatchError::type_mismatch(member, "string argument"))
}

impl NativeObject for MemoryEnvironment {
    fn invoke(&mut self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value> {
        let mut state = self.lock();
        if let Some(reason) = state.failures.get(member) {
            return Err(DispatchError::invocation(member, reason.as_str()));
        }

        match (member, kind) {
            ("GetVariables", InvokeKind::Method) => Ok(Value::List(
                state.variables.keys().cloned().map(Value::Str).collect(),
            )),
            ("Value", InvokeKind::PropertyGet) => {
                let name = string_arg(member, args, 0)?;
                match state.variables.get(name) {
                    Some(value) => Ok(Value::Str(value.clone())),
                    None if state.strict => Err(DispatchError::invocation(
                        member,
                        format!("variable '{name}' is not defined"),
                    )),
                    None => Ok(Value::Str(String::new())),
                }
            }
            ("Value", InvokeKind::PropertyPut) => {
                let name = string_arg(member, args, 0)?.to_string();
                let value = string_arg(member, args, 1)?.to_string();
                state.variables.insert(name, value);
                Ok(Value::Empty)
            }
            _ => Err(DispatchError::unknown_member(member)),
        }
    }
}
