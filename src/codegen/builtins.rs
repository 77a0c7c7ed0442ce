//! `print`, `println` and `printf`, lowered onto the C runtime's `puts` and `printf`.

use inkwell::{
    module::Linkage,
    values::{BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace,
};

use super::{Codegen, FunctionState};
use crate::ast::Expr;
use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    Print,
    Println,
    Printf,
}

impl Builtin {
    pub(super) fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Builtin::Print),
            "println" => Some(Builtin::Println),
            "printf" => Some(Builtin::Printf),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Printf => "printf",
        }
    }
}

impl<'ctx> Codegen<'ctx> {
    pub(super) fn gen_builtin(
        &mut self,
        state: &mut FunctionState<'ctx>,
        builtin: Builtin,
        args: &[Expr],
    ) -> Result<()> {
        match (builtin, args) {
            (Builtin::Println, [arg]) => {
                let data = self.string_data(state, builtin, arg)?;
                let puts = self.runtime_function("puts")?;
                self.builder.build_call(puts, &[data.into()], "")?;
            }
            (Builtin::Print, [arg]) => {
                let data = self.string_data(state, builtin, arg)?;
                let fmt = self.fmt_str()?;
                let printf = self.runtime_function("printf")?;
                self.builder.build_call(printf, &[fmt.into(), data.into()], "")?;
            }
            _ => return Err(CompileError::UnimplementedBuiltin(builtin.name().to_string())),
        }
        Ok(())
    }

    /// Data pointer of a `str` argument.
    fn string_data(
        &mut self,
        state: &mut FunctionState<'ctx>,
        builtin: Builtin,
        arg: &Expr,
    ) -> Result<PointerValue<'ctx>> {
        let operand = self.gen_expr(state, arg)?;
        match operand.value {
            BasicValueEnum::StructValue(value) if value.get_type() == self.types.str_type() => Ok(self
                .builder
                .build_extract_value(value, 0, "strdata")?
                .into_pointer_value()),
            _ => Err(CompileError::UnimplementedBuiltin(builtin.name().to_string())),
        }
    }

    /// `i32 puts(ptr)` or `i32 printf(ptr, ...)`, declared on first use.
    ///
    /// A user function already holding the name cannot stand in for the C one.
    fn runtime_function(&self, name: &str) -> Result<FunctionValue<'ctx>> {
        let i32_t = self.ctx.i32_type();
        let i8ptr_t = self.ctx.i8_type().ptr_type(AddressSpace::default());
        let variadic = name == "printf";
        let fn_type = i32_t.fn_type(&[i8ptr_t.into()], variadic);
        match self.module.get_function(name) {
            Some(function) if function.get_type() == fn_type && !self.signatures.contains_key(name) => Ok(function),
            Some(_) => Err(CompileError::RuntimeNameClash(name.to_string())),
            None => Ok(self.module.add_function(name, fn_type, Some(Linkage::External))),
        }
    }

    /// Shared `"%s"` format string used by `print`.
    fn fmt_str(&mut self) -> Result<PointerValue<'ctx>> {
        if let Some(ptr) = self.fmt_str {
            return Ok(ptr);
        }
        let ptr = self.builder.build_global_string_ptr("%s", ".fmt_str")?.as_pointer_value();
        self.fmt_str = Some(ptr);
        Ok(ptr)
    }
}
