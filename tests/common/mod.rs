use std::{
    env, fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::Result;
use inkwell::context::Context as LlvmContext;
use jam::{compile_source, jit, CompileError};

/// Compile `src` and return the module's textual IR.
#[allow(dead_code)]
pub fn compile_to_ir(src: &str) -> Result<String> {
    let ctx = LlvmContext::create();
    let codegen = compile_source(&ctx, src)?;
    codegen.verify()?;
    Ok(codegen.print_ir())
}

/// Compile `src` and hand back only the error, for failure-path tests.
#[allow(dead_code)]
pub fn compile_error(src: &str) -> CompileError {
    let ctx = LlvmContext::create();
    match compile_source(&ctx, src) {
        Ok(_) => panic!("expected compilation to fail:\n{src}"),
        Err(err) => err,
    }
}

/// Compile `src` and JIT-execute `entry`.
#[allow(dead_code)]
pub fn run_entry(src: &str, entry: &str) -> Result<jit::RunOutcome> {
    let ctx = LlvmContext::create();
    let codegen = compile_source(&ctx, src)?;
    let signature = codegen
        .signature(entry)
        .cloned()
        .ok_or_else(|| CompileError::UnknownFunction(entry.to_string()))?;
    Ok(jit::run(codegen.module(), entry, &signature)?)
}

/// Body of the function named `name` in `ir`, from `define` to the closing brace.
#[allow(dead_code)]
pub fn function_body<'a>(ir: &'a str, name: &str) -> &'a str {
    let marker = format!("@{name}(");
    let start = ir
        .match_indices("define ")
        .map(|(i, _)| i)
        .find(|&i| ir[i..].lines().next().is_some_and(|line| line.contains(&marker)))
        .unwrap_or_else(|| panic!("no definition of @{name} in:\n{ir}"));
    let end = ir[start..].find("\n}").map_or(ir.len(), |e| start + e + 2);
    &ir[start..end]
}

/// Fresh scratch directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(label: &str) -> Result<PathBuf> {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = env::temp_dir().join(format!("jam-{label}-{}-{n}", std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
