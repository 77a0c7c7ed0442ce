use std::collections::HashMap;

use inkwell::{types::BasicTypeEnum, values::PointerValue};

use crate::error::{CompileError, Result};

/// Stack slot backing a named local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub ty: BasicTypeEnum<'ctx>,
    pub signed: bool,
}

/// Flat name -> slot map for the function being generated.
///
/// There are no nested scopes: a later declaration replaces an earlier one for
/// the rest of the function. Callers that need a temporary binding (loop
/// variables) keep the value returned by `bind` and hand it back to `restore`.
#[derive(Debug, Default)]
pub struct SymbolTable<'ctx> {
    slots: HashMap<String, Slot<'ctx>>,
}

impl<'ctx> SymbolTable<'ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the binding it replaced.
    pub fn bind(&mut self, name: impl Into<String>, slot: Slot<'ctx>) -> Option<Slot<'ctx>> {
        self.slots.insert(name.into(), slot)
    }

    /// Put back a binding saved by `bind`; `None` unbinds the name.
    pub fn restore(&mut self, name: &str, previous: Option<Slot<'ctx>>) {
        match previous {
            Some(slot) => {
                self.slots.insert(name.to_string(), slot);
            }
            None => {
                self.slots.remove(name);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Slot<'ctx>> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UnknownVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}
