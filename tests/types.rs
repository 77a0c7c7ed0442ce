use anyhow::Result;
use inkwell::{context::Context as LlvmContext, types::BasicTypeEnum};
use jam::{
    types::{describe, JamType, TypeResolver},
    CompileError,
};

#[test]
fn integer_names_map_to_same_width() -> Result<()> {
    let ctx = LlvmContext::create();
    let resolver = TypeResolver::new(&ctx);
    for (name, bits) in [("u8", 8), ("i8", 8), ("u16", 16), ("i16", 16), ("u32", 32), ("i32", 32), ("bool", 1)] {
        match resolver.resolve(name)? {
            BasicTypeEnum::IntType(t) => assert_eq!(t.get_bit_width(), bits, "{name}"),
            other => panic!("{name} lowered to {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn signed_and_unsigned_share_a_representation() -> Result<()> {
    let ctx = LlvmContext::create();
    let resolver = TypeResolver::new(&ctx);
    assert_eq!(resolver.resolve("u16")?, resolver.resolve("i16")?);
    Ok(())
}

#[test]
fn str_is_pointer_and_length() -> Result<()> {
    let ctx = LlvmContext::create();
    let resolver = TypeResolver::new(&ctx);
    let ty = resolver.resolve("str")?;
    assert_eq!(describe(ty), "{ ptr, i64 }");
    assert_eq!(ty, resolver.str_type().into());
    Ok(())
}

#[test]
fn slices_lower_to_fat_pointers_at_any_depth() -> Result<()> {
    let ctx = LlvmContext::create();
    let resolver = TypeResolver::new(&ctx);
    for name in ["[]u8", "[]i32", "[]bool", "[]str", "[][]u16", "[][][]str"] {
        let BasicTypeEnum::StructType(st) = resolver.resolve(name)? else {
            panic!("{name} is not a struct");
        };
        assert_eq!(st.count_fields(), 2, "{name}");
        assert_eq!(describe(st.into()), "{ ptr, i64 }", "{name}");
    }
    Ok(())
}

#[test]
fn unknown_names_fail() {
    let ctx = LlvmContext::create();
    let resolver = TypeResolver::new(&ctx);
    for name in ["u64", "int", "[]", "[]f32", "U8", ""] {
        assert!(
            matches!(resolver.resolve(name), Err(CompileError::UnknownType(_))),
            "{name} should be rejected"
        );
    }
}

#[test]
fn display_round_trips_the_surface_name() -> Result<()> {
    for name in ["u8", "i32", "bool", "str", "[]u8", "[][]str"] {
        let ty: JamType = name.parse()?;
        assert_eq!(ty.to_string(), name);
    }
    Ok(())
}
