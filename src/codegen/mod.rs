//! LLVM IR generation for Jam programs using Inkwell.
//!
//! One `Codegen` owns one LLVM module. Functions are lowered in source order in
//! a single walk; a call may only name a function that was lowered earlier (or
//! the function currently being lowered).

mod builtins;
mod expr;
mod stmt;
pub mod symbols;

use std::collections::HashMap;

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context as LlvmContext,
    module::Module,
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    values::{BasicValueEnum, FunctionValue, PointerValue},
};
use tracing::{debug, trace};

use crate::ast::FunctionDecl;
use crate::error::{CompileError, Result};
use crate::types::{JamType, TypeResolver};

pub use expr::literal_width;
use symbols::{Slot, SymbolTable};

/// Resolved parameter and return types of a lowered function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<JamType>,
    pub ret: Option<JamType>,
}

/// Jump targets of the innermost enclosing loop.
#[derive(Debug, Clone, Copy)]
struct LoopTargets<'ctx> {
    continue_to: BasicBlock<'ctx>,
    break_to: BasicBlock<'ctx>,
}

/// Per-function state, created fresh for every function and threaded through
/// statement lowering.
struct FunctionState<'ctx> {
    function: FunctionValue<'ctx>,
    entry: BasicBlock<'ctx>,
    ret: Option<JamType>,
    symbols: SymbolTable<'ctx>,
    loops: Vec<LoopTargets<'ctx>>,
}

/// Generates LLVM IR, keeps track of runtime declarations, and records function signatures.
pub struct Codegen<'ctx> {
    ctx: &'ctx LlvmContext,
    builder: Builder<'ctx>,
    module: Module<'ctx>,
    types: TypeResolver<'ctx>,
    signatures: HashMap<String, Signature>,
    fmt_str: Option<PointerValue<'ctx>>,
}

impl<'ctx> Codegen<'ctx> {
    pub fn new(ctx: &'ctx LlvmContext, module_name: &str) -> Self {
        Self {
            ctx,
            builder: ctx.create_builder(),
            module: ctx.create_module(module_name),
            types: TypeResolver::new(ctx),
            signatures: HashMap::new(),
            fmt_str: None,
        }
    }

    /// Lower every function, in order. The first error aborts the whole module.
    pub fn compile(&mut self, functions: &[FunctionDecl]) -> Result<()> {
        for function in functions {
            self.emit_function(function)?;
        }
        Ok(())
    }

    /// Lower one function declaration and verify the result.
    pub fn emit_function(&mut self, decl: &FunctionDecl) -> Result<FunctionValue<'ctx>> {
        if self.signatures.contains_key(&decl.name) {
            return Err(CompileError::DuplicateFunction(decl.name.clone()));
        }
        // only runtime declarations live in the module without a signature
        if self.module.get_function(&decl.name).is_some() {
            return Err(CompileError::RuntimeNameClash(decl.name.clone()));
        }

        let params = decl
            .params
            .iter()
            .map(|p| p.ty.parse::<JamType>())
            .collect::<Result<Vec<_>>>()?;
        let ret = decl.return_type.as_deref().map(str::parse::<JamType>).transpose()?;

        let param_types: Vec<BasicMetadataTypeEnum> =
            params.iter().map(|ty| self.types.lower(ty).into()).collect();
        let fn_type = match &ret {
            Some(ty) => self.types.lower(ty).fn_type(&param_types, false),
            None => self.ctx.void_type().fn_type(&param_types, false),
        };
        let function = self.module.add_function(&decl.name, fn_type, None);
        self.signatures.insert(
            decl.name.clone(),
            Signature { params: params.clone(), ret: ret.clone() },
        );
        debug!(function = %decl.name, params = params.len(), "lowering function");

        let entry = self.ctx.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let mut state = FunctionState {
            function,
            entry,
            ret,
            symbols: SymbolTable::new(),
            loops: Vec::new(),
        };

        for ((param, ty), value) in decl.params.iter().zip(&params).zip(function.get_param_iter()) {
            value.set_name(&param.name);
            let slot_ty = self.types.lower(ty);
            let ptr = self.entry_alloca(&state, slot_ty, &param.name)?;
            self.builder.build_store(ptr, value)?;
            state.symbols.bind(
                param.name.clone(),
                Slot { ptr, ty: slot_ty, signed: ty.is_signed() },
            );
        }

        self.gen_block(&mut state, &decl.body)?;
        self.finish_function(&state)?;

        if !function.verify(true) {
            return Err(CompileError::InvalidFunction(decl.name.clone()));
        }
        Ok(function)
    }

    /// Close the block the body ended in, if it still falls through.
    fn finish_function(&self, state: &FunctionState<'ctx>) -> Result<()> {
        let Some(block) = self.builder.get_insert_block() else {
            return Ok(());
        };
        if block.get_terminator().is_some() {
            return Ok(());
        }
        match &state.ret {
            None => {
                self.builder.build_return(None)?;
            }
            Some(_) if block != state.entry && block.get_first_use().is_none() => {
                self.builder.build_unreachable()?;
            }
            Some(ty) => {
                let zero = zero_value(self.types.lower(ty));
                self.builder.build_return(Some(&zero))?;
            }
        }
        Ok(())
    }

    /// Allocate a named slot at the top of the entry block.
    fn entry_alloca(
        &self,
        state: &FunctionState<'ctx>,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let builder = self.ctx.create_builder();
        match state.entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(state.entry),
        }
        Ok(builder.build_alloca(ty, name)?)
    }

    fn append_block(&self, state: &FunctionState<'ctx>, name: &str) -> BasicBlock<'ctx> {
        trace!(block = name, "appending block");
        self.ctx.append_basic_block(state.function, name)
    }

    fn current_block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|block| block.get_terminator().is_some())
    }

    /// Signature of a function lowered so far.
    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Textual IR of the whole module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Structural check of the whole module.
    pub fn verify(&self) -> Result<()> {
        self.module
            .verify()
            .map_err(|e| CompileError::Backend(e.to_string()))
    }
}

/// Zero/empty value of a storage type: `0`, `false`, or `{ null, 0 }`.
fn zero_value(ty: BasicTypeEnum<'_>) -> BasicValueEnum<'_> {
    match ty {
        BasicTypeEnum::IntType(t) => t.const_zero().into(),
        BasicTypeEnum::StructType(t) => t.const_zero().into(),
        BasicTypeEnum::PointerType(t) => t.const_null().into(),
        BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
        BasicTypeEnum::FloatType(t) => t.const_zero().into(),
        BasicTypeEnum::VectorType(t) => t.const_zero().into(),
    }
}
