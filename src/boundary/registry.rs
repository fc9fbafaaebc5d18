//! Boundary function table
//!
//! Boundary-side functions are registered by name and assigned sequential
//! 32-bit indices. The index is the `function_ref` the encoder packs into each
//! entry header, so dispatch is a bounds-checked table lookup.
//!
//! # Example
//!
//! ```
//! use callbatch::boundary::FunctionTable;
//!
//! extern "C" fn flush_state() {}
//!
//! let mut table = FunctionTable::with_noop();
//! let id = table.register("flush_state", flush_state);
//! assert_eq!(table.get_name(id), Some("flush_state"));
//! ```

use std::collections::HashMap;

use crate::batch::{CallEntry, CallSink, FunctionRef};

/// Signature of a boundary-side function
///
/// Arguments travel in the batch but are not unpacked for the callee.
pub type BoundaryFn = extern "C" fn();

/// The function every benchmark call targets
#[no_mangle]
#[inline(never)]
pub extern "C" fn callbatch_noop() {}

/// Registry entry for a boundary function
#[derive(Clone)]
struct TableEntry {
    name: String,
    func: BoundaryFn,
}

/// Registry of functions callable across the boundary
///
/// The table is append-only; indices are never removed or reassigned.
#[derive(Clone, Default)]
pub struct FunctionTable {
    /// Functions stored by index
    functions: Vec<TableEntry>,
    /// Name to index mapping for registration lookup
    name_to_id: HashMap<String, FunctionRef>,
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("function_count", &self.functions.len())
            .field("names", &self.functions.iter().map(|e| e.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with `noop` registered at [`FunctionRef::NOOP`]
    pub fn with_noop() -> Self {
        let mut table = Self::new();
        table.register("noop", callbatch_noop);
        table
    }

    /// Register a function, returning its reference
    ///
    /// If a function with this name already exists, returns its existing reference.
    pub fn register(&mut self, name: &str, func: BoundaryFn) -> FunctionRef {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }

        let id = FunctionRef(self.functions.len() as u32);
        self.functions.push(TableEntry {
            name: name.to_string(),
            func,
        });
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Get the reference of a registered function by name
    pub fn get_id(&self, name: &str) -> Option<FunctionRef> {
        self.name_to_id.get(name).copied()
    }

    /// Get the name of a registered function by reference
    pub fn get_name(&self, id: FunctionRef) -> Option<&str> {
        self.functions.get(id.index()).map(|e| e.name.as_str())
    }

    /// Get the function pointer for a reference
    #[inline]
    pub fn get(&self, id: FunctionRef) -> Option<BoundaryFn> {
        self.functions.get(id.index()).map(|e| e.func)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// The executor dispatches through a shared table; invoking never mutates it.
impl CallSink for &FunctionTable {
    #[inline]
    fn knows(&self, function: FunctionRef) -> bool {
        function.index() < self.functions.len()
    }

    #[inline]
    fn invoke(&mut self, entry: CallEntry<'_>) {
        if let Some(func) = self.get(entry.function) {
            func();
        }
    }
}
