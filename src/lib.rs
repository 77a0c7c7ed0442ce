//! Front end for the Jam language: lexer, parser, type resolution and LLVM IR
//! generation, plus the object/link and JIT back ends used by the `jam` binary.

pub mod ast;
pub mod backend;
pub mod codegen;
pub mod config;
pub mod error;
pub mod jit;
pub mod lexer;
pub mod link;
pub mod parser;
pub mod types;

use inkwell::context::Context as LlvmContext;
use tracing::debug;

pub use codegen::{Codegen, Signature};
pub use error::{CompileError, Result};

/// Name given to the LLVM module holding a compiled program.
pub const MODULE_NAME: &str = "jam";

/// Lex, parse and lower `src` into a fresh module owned by `ctx`.
pub fn compile_source<'ctx>(ctx: &'ctx LlvmContext, src: &str) -> Result<Codegen<'ctx>> {
    let tokens = lexer::scan(src)?;
    debug!(tokens = tokens.len(), "lexed source");
    let functions = parser::parse(tokens)?;
    let mut codegen = Codegen::new(ctx, MODULE_NAME);
    codegen.compile(&functions)?;
    Ok(codegen)
}
