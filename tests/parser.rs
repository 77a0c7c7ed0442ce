use anyhow::Result;
use jam::{
    ast::{BinaryOp, Expr, FunctionDecl, Param, Stmt},
    parser::{parse_source, Parser, DEFAULT_DECL_TYPE},
    lexer::scan,
    CompileError,
};

fn single(src: &str) -> Result<FunctionDecl> {
    let mut functions = parse_source(src)?;
    assert_eq!(functions.len(), 1, "expected one function in {src}");
    Ok(functions.remove(0))
}

fn num(n: i64) -> Expr {
    Expr::Number(n)
}

fn var(name: &str) -> Expr {
    Expr::Variable(name.to_string())
}

#[test]
fn signature_with_params_and_return() -> Result<()> {
    let f = single("fn add(a: u8, b: []i16) -> u32 { return 0; }")?;
    assert_eq!(f.name, "add");
    assert_eq!(
        f.params,
        vec![
            Param { name: "a".into(), ty: "u8".into() },
            Param { name: "b".into(), ty: "[]i16".into() },
        ]
    );
    assert_eq!(f.return_type.as_deref(), Some("u32"));
    assert_eq!(f.body, vec![Stmt::Return(Some(num(0)))]);
    Ok(())
}

#[test]
fn missing_return_type_means_void() -> Result<()> {
    let f = single("fn main() { return; }")?;
    assert!(f.return_type.is_none());
    assert!(f.params.is_empty());
    assert_eq!(f.body, vec![Stmt::Return(None)]);
    Ok(())
}

#[test]
fn several_functions_in_order() -> Result<()> {
    let functions = parse_source("fn a() {} fn b() {} fn c() {}")?;
    let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    Ok(())
}

#[test]
fn nested_slice_types() -> Result<()> {
    let f = single("fn f(x: [][]str) -> []u8 { }")?;
    assert_eq!(f.params[0].ty, "[][]str");
    assert_eq!(f.return_type.as_deref(), Some("[]u8"));
    Ok(())
}

#[test]
fn declarations() -> Result<()> {
    let f = single("fn f() { const x: i16 = 5; var y; var z: bool = true; }")?;
    assert_eq!(
        f.body,
        vec![
            Stmt::VarDecl { name: "x".into(), ty: "i16".into(), is_const: true, init: Some(num(5)) },
            Stmt::VarDecl { name: "y".into(), ty: DEFAULT_DECL_TYPE.into(), is_const: false, init: None },
            Stmt::VarDecl { name: "z".into(), ty: "bool".into(), is_const: false, init: Some(Expr::Bool(true)) },
        ]
    );
    Ok(())
}

#[test]
fn comparison_binds_looser_than_addition() -> Result<()> {
    let f = single("fn f(a: u8, b: u8) -> bool { return a + 1 < b; }")?;
    let expected = Expr::Binary {
        op: BinaryOp::Less,
        lhs: Box::new(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(var("a")), rhs: Box::new(num(1)) }),
        rhs: Box::new(var("b")),
    };
    assert_eq!(f.body, vec![Stmt::Return(Some(expected))]);
    Ok(())
}

#[test]
fn parentheses_group() -> Result<()> {
    let f = single("fn f(a: u8) -> bool { return (a) >= (3); }")?;
    let Stmt::Return(Some(Expr::Binary { op, lhs, rhs })) = &f.body[0] else {
        panic!("unexpected body {:?}", f.body);
    };
    assert_eq!(*op, BinaryOp::GreaterEqual);
    assert_eq!(**lhs, var("a"));
    assert_eq!(**rhs, num(3));
    Ok(())
}

#[test]
fn calls_with_arguments() -> Result<()> {
    let f = single(r#"fn f() { println("hi"); g(1, x, h()); }"#)?;
    assert_eq!(
        f.body,
        vec![
            Stmt::Expr(Expr::Call { callee: "println".into(), args: vec![Expr::Str("hi".into())] }),
            Stmt::Expr(Expr::Call {
                callee: "g".into(),
                args: vec![num(1), var("x"), Expr::Call { callee: "h".into(), args: vec![] }],
            }),
        ]
    );
    Ok(())
}

#[test]
fn expression_statement_semicolon_is_optional() -> Result<()> {
    let f = single("fn f(a: u8) { a + 1 a }")?;
    assert_eq!(f.body.len(), 2);
    Ok(())
}

#[test]
fn control_flow_statements() -> Result<()> {
    let f = single(
        "fn f(n: u8) {
            if n == 1 { break; } else { continue; }
            while n != 0 { }
            for i in 0:10 { }
        }",
    )?;
    assert_eq!(
        f.body[0],
        Stmt::If {
            cond: Expr::Binary { op: BinaryOp::Equal, lhs: Box::new(var("n")), rhs: Box::new(num(1)) },
            then_body: vec![Stmt::Break],
            else_body: vec![Stmt::Continue],
        }
    );
    assert!(matches!(&f.body[1], Stmt::While { body, .. } if body.is_empty()));
    assert_eq!(
        f.body[2],
        Stmt::For { var: "i".into(), start: num(0), end: num(10), body: vec![] }
    );
    Ok(())
}

#[test]
fn else_if_nests_in_else_branch() -> Result<()> {
    let f = single("fn f(n: u8) { if n == 1 { } else if n == 2 { } else { return; } }")?;
    let Stmt::If { else_body, .. } = &f.body[0] else {
        panic!("expected if");
    };
    assert!(matches!(&else_body[..], [Stmt::If { else_body, .. }] if else_body == &vec![Stmt::Return(None)]));
    Ok(())
}

#[test]
fn missing_semicolon_after_call_is_an_error() {
    let err = parse_source("fn f() { g() }").unwrap_err();
    let CompileError::Parse { line, message } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(line, 1);
    assert!(message.contains("Expected ';' after function call"), "{message}");
}

#[test]
fn errors_name_the_expected_construct() {
    let cases = [
        ("main() {}", "Expected 'fn' keyword"),
        ("fn () {}", "Expected function name"),
        ("fn f(x u8) {}", "Expected ':' after parameter name"),
        ("fn f(x: float) {}", "Expected parameter type"),
        ("fn f() -> {}", "Expected return type"),
        ("fn f() { return 1 }", "Expected ';' after return statement"),
        ("fn f() { for i 0:1 {} }", "Expected 'in' after loop variable"),
        ("fn f() { for i in 0 1 {} }", "Expected ':' between range bounds"),
        ("fn f() { while 1 return; }", "Expected '{' to open while body"),
        ("fn f() { var = 1; }", "Expected variable name"),
        ("fn f() { return ; ", "Expected '}' after function body"),
        ("fn f() { return +; }", "Expected expression"),
    ];
    for (src, expected) in cases {
        match parse_source(src) {
            Err(CompileError::Parse { message, .. }) => {
                assert!(message.contains(expected), "{src}: got {message}")
            }
            other => panic!("{src}: expected parse error, got {other:?}"),
        }
    }
}

#[test]
fn error_reports_line_of_offending_token() {
    let err = parse_source("fn f() {\n\n  return 1\n}").unwrap_err();
    assert!(matches!(err, CompileError::Parse { line: 4, .. }), "{err}");
}

#[test]
fn multi_line_string_errors_point_at_its_opening_line() {
    let err = parse_source("fn f()\n  \"one\ntwo\" {}").unwrap_err();
    assert!(matches!(err, CompileError::Parse { line: 2, .. }), "{err}");
}

#[test]
fn parser_accepts_stream_without_eof() -> Result<()> {
    let mut tokens = scan("fn f() {}")?;
    tokens.pop();
    let functions = Parser::new(tokens).parse()?;
    assert_eq!(functions.len(), 1);
    Ok(())
}
