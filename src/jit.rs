//! Run mode: execute the entry function in-process with LLVM's JIT.

use std::{fmt, sync::OnceLock};

use inkwell::{
    execution_engine::ExecutionEngine,
    module::Module,
    targets::{InitializationConfig, Target},
    OptimizationLevel,
};
use tracing::{debug, info};

use crate::codegen::Signature;
use crate::error::{CompileError, Result};
use crate::types::JamType;

/// What the entry function handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Integer or bool result, widened to `i64` by the entry's declared signedness.
    Returned(i64),
    /// The entry returns nothing printable (`void` or a fat pointer).
    Completed,
}

impl RunOutcome {
    /// Line printed by the binary after the program finishes.
    pub fn report(&self, entry: &str) -> String {
        match self {
            RunOutcome::Returned(value) => format!("{entry} returned {value}"),
            RunOutcome::Completed => format!("{entry} completed"),
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Returned(value) => write!(f, "{value}"),
            RunOutcome::Completed => write!(f, "completed"),
        }
    }
}

fn init_native() -> Result<()> {
    static NATIVE: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    NATIVE
        .get_or_init(|| Target::initialize_native(&InitializationConfig::default()))
        .clone()
        .map_err(CompileError::Backend)
}

/// JIT-compile `module` and call `entry`, which must take no parameters.
///
/// C stdio is flushed afterwards so `print` output lands before the caller
/// writes its own report.
pub fn run(module: &Module<'_>, entry: &str, signature: &Signature) -> Result<RunOutcome> {
    if !signature.params.is_empty() {
        return Err(CompileError::ArityMismatch {
            callee: entry.to_string(),
            expected: 0,
            found: signature.params.len(),
        });
    }
    if module.get_function(entry).is_none() {
        return Err(CompileError::UnknownFunction(entry.to_string()));
    }

    init_native()?;
    let engine = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| CompileError::Backend(e.to_string()))?;
    debug!(entry, "jit engine ready");

    let outcome = match &signature.ret {
        // only bit 0 of an i1 return is defined
        Some(JamType::Bool) => RunOutcome::Returned(i64::from(call::<u8>(&engine, entry)? & 1)),
        Some(JamType::U8) => RunOutcome::Returned(i64::from(call::<u8>(&engine, entry)?)),
        Some(JamType::I8) => RunOutcome::Returned(i64::from(call::<i8>(&engine, entry)?)),
        Some(JamType::U16) => RunOutcome::Returned(i64::from(call::<u16>(&engine, entry)?)),
        Some(JamType::I16) => RunOutcome::Returned(i64::from(call::<i16>(&engine, entry)?)),
        Some(JamType::U32) => RunOutcome::Returned(i64::from(call::<u32>(&engine, entry)?)),
        Some(JamType::I32) => RunOutcome::Returned(i64::from(call::<i32>(&engine, entry)?)),
        // fat pointers come back by value; there is nothing useful to print
        Some(JamType::Str | JamType::Slice(_)) | None => {
            call::<()>(&engine, entry)?;
            RunOutcome::Completed
        }
    };

    // SAFETY: fflush(NULL) flushes every open C output stream and touches no Rust state.
    unsafe {
        libc::fflush(std::ptr::null_mut());
    }
    info!(entry, outcome = %outcome, "program finished");
    Ok(outcome)
}

fn call<T>(engine: &ExecutionEngine<'_>, entry: &str) -> Result<T> {
    // SAFETY: `run` checked that the entry takes no parameters and `T` is chosen
    // from its declared return type.
    unsafe {
        let function = engine
            .get_function::<unsafe extern "C" fn() -> T>(entry)
            .map_err(|e| CompileError::Backend(e.to_string()))?;
        Ok(function.call())
    }
}
