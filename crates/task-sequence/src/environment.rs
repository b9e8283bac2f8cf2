//! Task sequence variables.
//!
//! [`VariableStore`] wraps the host's environment object. Creating one never
//! fails; the object is bound on first use. `is_available` and `list_keys`
//! never report unavailability as an error, every other operation does.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ts_dispatch::{Arg, BindingState, InvokeKind, NativeObjectBinder, Resolver, Value};

use crate::config::{AutomationConfig, DEFAULT_ENVIRONMENT_CLASS};
use crate::error::{Result, TaskSequenceError};

const GET_VARIABLES: &str = "GetVariables";
const VALUE: &str = "Value";

/// A variable name and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableEntry {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

impl VariableEntry {
    /// Split into a `(key, value)` pair.
    #[must_use]
    pub fn into_pair(self) -> (String, String) {
        (self.key, self.value)
    }
}

/// Access to the task sequence variables of the host.
#[derive(Debug)]
pub struct VariableStore {
    binder: NativeObjectBinder,
}

impl VariableStore {
    /// Create a store bound to the default class through the platform resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(ts_dispatch::native_resolver())
    }

    /// Create a store bound to the default class through `resolver`.
    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            binder: NativeObjectBinder::new(DEFAULT_ENVIRONMENT_CLASS, resolver),
        }
    }

    /// Create a store bound to the configured class through `resolver`.
    #[must_use]
    pub fn from_config(config: &AutomationConfig, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            binder: NativeObjectBinder::new(config.environment_class.as_str(), resolver),
        }
    }

    /// Check whether the host object can be used. Never fails.
    pub fn is_available(&self) -> bool {
        self.binder.is_available()
    }

    /// Current binding state, without triggering a bind.
    #[must_use]
    pub fn binding_state(&self) -> BindingState {
        self.binder.state()
    }

    /// Names of the currently defined variables.
    ///
    /// Returns an empty list when the host object is not available. Names are
    /// unique; entries the host returns that are not strings are skipped.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        if !self.binder.is_available() {
            return Ok(Vec::new());
        }

        let names = self
            .binder
            .invoke(GET_VARIABLES, InvokeKind::Method, &mut [])?;
        let items = match names {
            Value::List(items) => items,
            Value::Empty => Vec::new(),
            single @ Value::Str(_) => vec![single],
            _ => {
                return Err(TaskSequenceError::NativeInvocationFailure(
                    ts_dispatch::DispatchError::type_mismatch(GET_VARIABLES, "array of names"),
                ));
            }
        };

        let mut seen = HashSet::with_capacity(items.len());
        Ok(items
            .into_iter()
            .filter_map(Value::into_string)
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }

    /// Read a variable.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self
            .binder
            .invoke(VALUE, InvokeKind::PropertyGet, &mut [Arg::from(key)])?;
        match value {
            Value::Str(s) => Ok(s),
            Value::Empty => Ok(String::new()),
            _ => Err(TaskSequenceError::NativeInvocationFailure(
                ts_dispatch::DispatchError::type_mismatch(VALUE, "string value"),
            )),
        }
    }

    /// Write a variable.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        tracing::debug!(key, "setting task sequence variable");
        self.binder.invoke(
            VALUE,
            InvokeKind::PropertyPut,
            &mut [Arg::from(key), Arg::from(value)],
        )?;
        Ok(())
    }

    /// Iterate over the variables.
    ///
    /// The names are listed once, up front; each value is read when the
    /// iterator reaches it. Every call takes a new listing, so two iterations
    /// may see different variables if the host changes them in between.
    pub fn iter(&self) -> Result<Variables<'_>> {
        self.require_available()?;
        Ok(Variables {
            store: self,
            keys: self.list_keys()?.into_iter(),
        })
    }

    /// Copy all variables into a map.
    pub fn snapshot_to_map(&self) -> Result<HashMap<String, String>> {
        self.iter()?
            .map(|entry| entry.map(VariableEntry::into_pair))
            .collect()
    }

    /// Release the host object. The next operation binds again.
    pub fn release(&mut self) -> bool {
        self.binder.release()
    }

    fn require_available(&self) -> Result<()> {
        self.binder.handle().map(|_| ()).map_err(Into::into)
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over task sequence variables, created by [`VariableStore::iter`].
#[derive(Debug)]
pub struct Variables<'a> {
    store: &'a VariableStore,
    keys: std::vec::IntoIter<String>,
}

impl Iterator for Variables<'_> {
    type Item = Result<VariableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        Some(self.store.get(&key).map(|value| VariableEntry { key, value }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for Variables<'_> {}
