//! Jam's closed set of type names and their LLVM representations.

use std::{fmt, str::FromStr};

use inkwell::{
    context::Context as LlvmContext,
    types::{AnyType, BasicType, BasicTypeEnum, IntType, StructType},
    AddressSpace,
};

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JamType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    Bool,
    Str,
    Slice(Box<JamType>),
}

impl JamType {
    /// Only affects how values widen; the representation is the same for both signs.
    pub fn is_signed(&self) -> bool {
        matches!(self, JamType::I8 | JamType::I16 | JamType::I32)
    }
}

impl FromStr for JamType {
    type Err = CompileError;

    fn from_str(name: &str) -> Result<Self> {
        if let Some(inner) = name.strip_prefix("[]") {
            return Ok(JamType::Slice(Box::new(inner.parse()?)));
        }
        Ok(match name {
            "u8" => JamType::U8,
            "u16" => JamType::U16,
            "u32" => JamType::U32,
            "i8" => JamType::I8,
            "i16" => JamType::I16,
            "i32" => JamType::I32,
            "bool" => JamType::Bool,
            "str" => JamType::Str,
            _ => return Err(CompileError::UnknownType(name.to_string())),
        })
    }
}

impl fmt::Display for JamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JamType::U8 => f.write_str("u8"),
            JamType::U16 => f.write_str("u16"),
            JamType::U32 => f.write_str("u32"),
            JamType::I8 => f.write_str("i8"),
            JamType::I16 => f.write_str("i16"),
            JamType::I32 => f.write_str("i32"),
            JamType::Bool => f.write_str("bool"),
            JamType::Str => f.write_str("str"),
            JamType::Slice(inner) => write!(f, "[]{inner}"),
        }
    }
}

/// Maps Jam types onto LLVM types in one context.
///
/// `str` and `[]T` share the fat-pointer layout `{ ptr, i64 }`: a data pointer
/// followed by the element count.
#[derive(Clone, Copy)]
pub struct TypeResolver<'ctx> {
    ctx: &'ctx LlvmContext,
}

impl<'ctx> TypeResolver<'ctx> {
    pub fn new(ctx: &'ctx LlvmContext) -> Self {
        Self { ctx }
    }

    /// Resolve a surface type name such as `u16` or `[][]str`.
    pub fn resolve(&self, name: &str) -> Result<BasicTypeEnum<'ctx>> {
        Ok(self.lower(&name.parse()?))
    }

    pub fn lower(&self, ty: &JamType) -> BasicTypeEnum<'ctx> {
        match ty {
            JamType::U8 | JamType::I8 => self.ctx.i8_type().into(),
            JamType::U16 | JamType::I16 => self.ctx.i16_type().into(),
            JamType::U32 | JamType::I32 => self.ctx.i32_type().into(),
            JamType::Bool => self.ctx.bool_type().into(),
            JamType::Str => self.str_type().into(),
            JamType::Slice(inner) => self.fat_pointer_type(self.lower(inner)).into(),
        }
    }

    pub fn str_type(&self) -> StructType<'ctx> {
        self.fat_pointer_type(self.ctx.i8_type().into())
    }

    pub fn len_type(&self) -> IntType<'ctx> {
        self.ctx.i64_type()
    }

    fn fat_pointer_type(&self, element: BasicTypeEnum<'ctx>) -> StructType<'ctx> {
        let data = element.ptr_type(AddressSpace::default());
        self.ctx.struct_type(&[data.into(), self.len_type().into()], false)
    }
}

/// Render an LLVM type the way it appears in the IR text, for diagnostics.
pub fn describe(ty: BasicTypeEnum<'_>) -> String {
    ty.print_to_string().to_string()
}
