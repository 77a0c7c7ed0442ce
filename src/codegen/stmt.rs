use inkwell::{values::BasicValueEnum, IntPredicate};
use tracing::debug;

use super::{symbols::Slot, zero_value, Codegen, FunctionState, LoopTargets};
use crate::ast::{Expr, Stmt};
use crate::error::{CompileError, Result};
use crate::types::JamType;

impl<'ctx> Codegen<'ctx> {
    /// Lower statements in order into the current block.
    ///
    /// Statements after a terminator (`return`, `break`, `continue`) still get
    /// checked; they are lowered into a fresh block with no predecessors.
    pub(super) fn gen_block(&mut self, state: &mut FunctionState<'ctx>, body: &[Stmt]) -> Result<()> {
        for (index, stmt) in body.iter().enumerate() {
            if self.current_block_terminated() {
                debug!(remaining = body.len() - index, "lowering statements after terminator into a dead block");
                let dead = self.append_block(state, "dead");
                self.builder.position_at_end(dead);
            }
            self.gen_stmt(state, stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, state: &mut FunctionState<'ctx>, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Return(value) => self.gen_return(state, value.as_ref()),
            Stmt::VarDecl { name, ty, is_const, init } => {
                self.gen_declaration(state, name, ty, *is_const, init.as_ref())
            }
            Stmt::If { cond, then_body, else_body } => self.gen_if(state, cond, then_body, else_body),
            Stmt::While { cond, body } => self.gen_while(state, cond, body),
            Stmt::For { var, start, end, body } => self.gen_for(state, var, start, end, body),
            Stmt::Break => {
                let targets = state
                    .loops
                    .last()
                    .copied()
                    .ok_or(CompileError::LoopControlOutsideLoop("break"))?;
                self.builder.build_unconditional_branch(targets.break_to)?;
                Ok(())
            }
            Stmt::Continue => {
                let targets = state
                    .loops
                    .last()
                    .copied()
                    .ok_or(CompileError::LoopControlOutsideLoop("continue"))?;
                self.builder.build_unconditional_branch(targets.continue_to)?;
                Ok(())
            }
            Stmt::Expr(Expr::Call { callee, args }) => {
                self.gen_call(state, callee, args)?;
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.gen_expr(state, expr)?;
                Ok(())
            }
        }
    }

    fn gen_return(&mut self, state: &mut FunctionState<'ctx>, value: Option<&Expr>) -> Result<()> {
        match (value, state.ret.clone()) {
            (Some(expr), Some(ty)) => {
                let operand = self.gen_expr(state, expr)?;
                let value = self.coerce(operand, &ty, "return value")?;
                self.builder.build_return(Some(&value))?;
            }
            (None, None) => {
                self.builder.build_return(None)?;
            }
            (Some(_), None) => return Err(CompileError::mismatch("return value", "void", "a value")),
            (None, Some(ty)) => return Err(CompileError::mismatch("return value", ty, "void")),
        }
        Ok(())
    }

    fn gen_declaration(
        &mut self,
        state: &mut FunctionState<'ctx>,
        name: &str,
        ty_name: &str,
        is_const: bool,
        init: Option<&Expr>,
    ) -> Result<()> {
        let ty: JamType = ty_name.parse()?;
        let storage = self.types.lower(&ty);
        let ptr = self.entry_alloca(state, storage, name)?;

        let value = match init {
            Some(expr) => {
                let operand = self.gen_expr(state, expr)?;
                self.coerce(operand, &ty, &format!("declaration of `{name}`"))?
            }
            None => zero_value(storage),
        };
        self.builder.build_store(ptr, value)?;

        if state.symbols.contains(name) {
            debug!(local = %name, "declaration replaces an earlier binding");
        }
        // `const` is recorded by the parser but carries no extra checks here
        debug!(local = %name, %ty, is_const, "declared local");
        state.symbols.bind(name, Slot { ptr, ty: storage, signed: ty.is_signed() });
        Ok(())
    }

    fn gen_if(
        &mut self,
        state: &mut FunctionState<'ctx>,
        cond: &Expr,
        then_body: &[Stmt],
        else_body: &[Stmt],
    ) -> Result<()> {
        let flag = self.gen_condition(state, cond, "ifcond")?;

        let then_bb = self.append_block(state, "then");
        let else_bb = self.append_block(state, "else");
        let merge_bb = self.append_block(state, "ifcont");
        self.builder.build_conditional_branch(flag, then_bb, else_bb)?;

        self.builder.position_at_end(then_bb);
        self.gen_block(state, then_body)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        self.builder.position_at_end(else_bb);
        self.gen_block(state, else_body)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn gen_while(&mut self, state: &mut FunctionState<'ctx>, cond: &Expr, body: &[Stmt]) -> Result<()> {
        let cond_bb = self.append_block(state, "whilecond");
        let body_bb = self.append_block(state, "whilebody");
        let after_bb = self.append_block(state, "whileend");

        self.builder.build_unconditional_branch(cond_bb)?;
        self.builder.position_at_end(cond_bb);
        let flag = self.gen_condition(state, cond, "whilecond")?;
        self.builder.build_conditional_branch(flag, body_bb, after_bb)?;

        self.builder.position_at_end(body_bb);
        self.gen_loop_body(state, LoopTargets { continue_to: cond_bb, break_to: after_bb }, body)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(cond_bb)?;
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// `for var in start:end` counts up by one with signed compare/add.
    ///
    /// `continue` jumps to the increment block so the step always runs before
    /// the next test; `break` skips it.
    fn gen_for(
        &mut self,
        state: &mut FunctionState<'ctx>,
        var: &str,
        start: &Expr,
        end: &Expr,
        body: &[Stmt],
    ) -> Result<()> {
        let start = self.gen_expr(state, start)?;
        let end = self.gen_expr(state, end)?;
        let (BasicValueEnum::IntValue(first), BasicValueEnum::IntValue(mut last)) = (start.value, end.value) else {
            return Err(CompileError::RangeTypeMismatch);
        };

        // the counter takes the start's width; the end is widened or truncated to match
        if last.get_type() != first.get_type() {
            last = self.builder.build_int_cast_sign_flag(last, first.get_type(), end.signed, "rangeend")?;
        }
        let counter_ty = first.get_type();

        let ptr = self.entry_alloca(state, counter_ty.into(), var)?;
        self.builder.build_store(ptr, first)?;
        let shadowed = state.symbols.bind(var, Slot { ptr, ty: counter_ty.into(), signed: true });
        if shadowed.is_some() {
            debug!(local = %var, "loop variable shadows an existing binding");
        }

        let cond_bb = self.append_block(state, "forcond");
        let body_bb = self.append_block(state, "forbody");
        let inc_bb = self.append_block(state, "forinc");
        let after_bb = self.append_block(state, "forend");

        self.builder.build_unconditional_branch(cond_bb)?;
        self.builder.position_at_end(cond_bb);
        let current = self.builder.build_load(counter_ty, ptr, var)?.into_int_value();
        let in_range = self.builder.build_int_compare(IntPredicate::SLT, current, last, "forcond")?;
        self.builder.build_conditional_branch(in_range, body_bb, after_bb)?;

        self.builder.position_at_end(body_bb);
        let result = self.gen_loop_body(state, LoopTargets { continue_to: inc_bb, break_to: after_bb }, body);
        if let Err(err) = result {
            state.symbols.restore(var, shadowed);
            return Err(err);
        }
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(inc_bb)?;
        }

        self.builder.position_at_end(inc_bb);
        let current = self.builder.build_load(counter_ty, ptr, var)?.into_int_value();
        let next = self.builder.build_int_nsw_add(current, counter_ty.const_int(1, false), "nextvar")?;
        self.builder.build_store(ptr, next)?;
        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(after_bb);
        state.symbols.restore(var, shadowed);
        Ok(())
    }

    /// Lower a loop body with `targets` as the innermost break/continue destinations.
    fn gen_loop_body(
        &mut self,
        state: &mut FunctionState<'ctx>,
        targets: LoopTargets<'ctx>,
        body: &[Stmt],
    ) -> Result<()> {
        state.loops.push(targets);
        let result = self.gen_block(state, body);
        state.loops.pop();
        result
    }
}
