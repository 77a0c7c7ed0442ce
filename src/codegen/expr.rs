use inkwell::{
    types::{BasicTypeEnum, IntType},
    values::{BasicMetadataValueEnum, BasicValueEnum, IntValue},
    IntPredicate,
};

use super::{builtins::Builtin, Codegen, FunctionState};
use crate::ast::{BinaryOp, Expr};
use crate::error::{CompileError, Result};
use crate::types::{describe, JamType};

/// An SSA value together with how it widens when a declaration forces a cast.
#[derive(Debug, Clone, Copy)]
pub(super) struct Operand<'ctx> {
    pub value: BasicValueEnum<'ctx>,
    pub signed: bool,
}

/// Narrowest of 8/16/32/64 bits whose unsigned or signed range holds `value`.
///
/// Each literal is sized on its own; `255` becomes an 8-bit `-1` bit pattern.
pub fn literal_width(value: i64) -> u32 {
    let fits = |min: i64, max: i64| value >= min && value <= max;
    if fits(i8::MIN as i64, u8::MAX as i64) {
        8
    } else if fits(i16::MIN as i64, u16::MAX as i64) {
        16
    } else if fits(i32::MIN as i64, u32::MAX as i64) {
        32
    } else {
        64
    }
}

impl<'ctx> Codegen<'ctx> {
    pub(super) fn gen_expr(&mut self, state: &mut FunctionState<'ctx>, expr: &Expr) -> Result<Operand<'ctx>> {
        match expr {
            Expr::Number(value) => Ok(self.number(*value)),
            Expr::Bool(value) => Ok(Operand {
                value: self.ctx.bool_type().const_int(u64::from(*value), false).into(),
                signed: false,
            }),
            Expr::Str(text) => self.string_literal(text),
            Expr::Variable(name) => {
                let slot = state.symbols.lookup(name)?;
                let value = self.builder.build_load(slot.ty, slot.ptr, name)?;
                Ok(Operand { value, signed: slot.signed })
            }
            Expr::Binary { op, lhs, rhs } => self.binary(state, *op, lhs, rhs),
            Expr::Call { callee, args } => self.gen_call(state, callee, args)?.ok_or_else(|| {
                CompileError::mismatch(format!("call to `{callee}`"), "a value", "void")
            }),
        }
    }

    fn number(&self, value: i64) -> Operand<'ctx> {
        let ty = self.int_type(literal_width(value));
        Operand {
            // const_int truncates to the chosen width
            value: ty.const_int(value as u64, true).into(),
            signed: value < 0,
        }
    }

    fn int_type(&self, bits: u32) -> IntType<'ctx> {
        match bits {
            1 => self.ctx.bool_type(),
            8 => self.ctx.i8_type(),
            16 => self.ctx.i16_type(),
            32 => self.ctx.i32_type(),
            64 => self.ctx.i64_type(),
            other => self.ctx.custom_width_int_type(other),
        }
    }

    /// `{ ptr, len }` pointing at a NUL-terminated private global.
    fn string_literal(&self, text: &str) -> Result<Operand<'ctx>> {
        let data = self.builder.build_global_string_ptr(text, ".str")?.as_pointer_value();
        let len = self.types.len_type().const_int(text.len() as u64, false);
        let value = self.types.str_type().const_named_struct(&[data.into(), len.into()]);
        Ok(Operand { value: value.into(), signed: false })
    }

    fn binary(
        &mut self,
        state: &mut FunctionState<'ctx>,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Operand<'ctx>> {
        let left = self.gen_expr(state, lhs)?;
        let right = self.gen_expr(state, rhs)?;
        let (l, r) = int_operands(op, left, right)?;

        if l.get_type() != r.get_type() {
            return Err(CompileError::OperandWidthMismatch {
                op: op.to_string(),
                lhs: describe(l.get_type().into()),
                rhs: describe(r.get_type().into()),
            });
        }

        let predicate = match op {
            BinaryOp::Add => {
                let sum = self.builder.build_int_add(l, r, "addtmp")?;
                return Ok(Operand { value: sum.into(), signed: left.signed || right.signed });
            }
            // comparisons are unsigned whatever the declared signedness
            BinaryOp::Equal => IntPredicate::EQ,
            BinaryOp::NotEqual => IntPredicate::NE,
            BinaryOp::Less => IntPredicate::ULT,
            BinaryOp::LessEqual => IntPredicate::ULE,
            BinaryOp::Greater => IntPredicate::UGT,
            BinaryOp::GreaterEqual => IntPredicate::UGE,
        };
        let flag = self.builder.build_int_compare(predicate, l, r, "cmptmp")?;
        Ok(Operand { value: flag.into(), signed: false })
    }

    /// Lower a call. Returns `None` for calls that produce no value.
    pub(super) fn gen_call(
        &mut self,
        state: &mut FunctionState<'ctx>,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<Operand<'ctx>>> {
        if let Some(builtin) = Builtin::from_name(callee) {
            self.gen_builtin(state, builtin, args)?;
            return Ok(None);
        }

        let signature = self
            .signatures
            .get(callee)
            .cloned()
            .ok_or_else(|| CompileError::UnknownFunction(callee.to_string()))?;
        let function = self
            .module
            .get_function(callee)
            .ok_or_else(|| CompileError::UnknownFunction(callee.to_string()))?;
        if signature.params.len() != args.len() {
            return Err(CompileError::ArityMismatch {
                callee: callee.to_string(),
                expected: signature.params.len(),
                found: args.len(),
            });
        }

        let mut values: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for (index, (arg, ty)) in args.iter().zip(&signature.params).enumerate() {
            let operand = self.gen_expr(state, arg)?;
            let context = format!("argument {} of `{callee}`", index + 1);
            values.push(self.coerce(operand, ty, &context)?.into());
        }

        let name = if signature.ret.is_some() { "calltmp" } else { "" };
        let call = self.builder.build_call(function, &values, name)?;
        Ok(call.try_as_basic_value().left().map(|value| Operand {
            value,
            signed: signature.ret.as_ref().is_some_and(JamType::is_signed),
        }))
    }

    /// Convert `operand` to the storage type of `target`.
    ///
    /// Integers are truncated or extended (sign-extended when the operand is
    /// signed); a `bool` target takes `operand != 0`. Anything else must already
    /// have the target's type.
    pub(super) fn coerce(
        &self,
        operand: Operand<'ctx>,
        target: &JamType,
        context: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        let target_ty = self.types.lower(target);
        let value = operand.value;
        if value.get_type() == target_ty {
            return Ok(value);
        }
        match (value, target_ty) {
            (BasicValueEnum::IntValue(v), BasicTypeEnum::IntType(t)) if t.get_bit_width() == 1 => {
                let zero = v.get_type().const_zero();
                Ok(self.builder.build_int_compare(IntPredicate::NE, v, zero, "tobool")?.into())
            }
            (BasicValueEnum::IntValue(v), BasicTypeEnum::IntType(t)) => {
                Ok(self.builder.build_int_cast_sign_flag(v, t, operand.signed, "casttmp")?.into())
            }
            _ => Err(CompileError::mismatch(context, target, describe(value.get_type()))),
        }
    }

    /// Integer condition lowered to `i1` via `!= 0`.
    pub(super) fn gen_condition(
        &mut self,
        state: &mut FunctionState<'ctx>,
        cond: &Expr,
        name: &str,
    ) -> Result<IntValue<'ctx>> {
        let operand = self.gen_expr(state, cond)?;
        let BasicValueEnum::IntValue(value) = operand.value else {
            return Err(CompileError::mismatch(
                "condition",
                "integer or bool",
                describe(operand.value.get_type()),
            ));
        };
        let zero = value.get_type().const_zero();
        Ok(self.builder.build_int_compare(IntPredicate::NE, value, zero, name)?)
    }
}

fn int_operands<'ctx>(
    op: BinaryOp,
    left: Operand<'ctx>,
    right: Operand<'ctx>,
) -> Result<(IntValue<'ctx>, IntValue<'ctx>)> {
    match (left.value, right.value) {
        (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => Ok((l, r)),
        (BasicValueEnum::IntValue(_), other) | (other, _) => Err(CompileError::mismatch(
            format!("operand of `{op}`"),
            "integer",
            describe(other.get_type()),
        )),
    }
}
