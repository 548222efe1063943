//! Parser tests for Ember language features

use crate::ast::{BinOp, Binder, Expr, LiteralPattern, Pattern, Program, Stmt, Type, UnOp};
use crate::error::CompileError;
use crate::lexer::tokenize;
use crate::parser::parse;

/// Helper to parse an Ember program and return the AST
fn parse_program(source: &str) -> crate::Result<Program> {
    let tokens = tokenize(source)?;
    parse(tokens)
}

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Program {
    parse_program(source).expect("Parse should succeed")
}

/// Helper to parse and expect a parser error
fn parse_err(source: &str) -> CompileError {
    match parse_program(source) {
        Ok(program) => panic!("expected parse error, got {program:?}"),
        Err(err) => err,
    }
}

/// Helper returning the program's trailing expression
fn tail(source: &str) -> Expr {
    parse_ok(source).tail.expect("trailing expression").node
}

// ============================================
// Literals and Operators
// ============================================

#[test]
fn test_parse_int_literal() {
    assert_eq!(tail("42"), Expr::IntLit(42));
}

#[test]
fn test_parse_string_and_bool_literals() {
    assert_eq!(tail(r#""hi""#), Expr::StringLit(b"hi".to_vec()));
    assert_eq!(tail("true"), Expr::BoolLit(true));
}

#[test]
fn test_parse_precedence_mul_over_add() {
    match tail("1 + 2 * 3") {
        Expr::Binary { op: BinOp::Add, right, .. } => {
            assert!(matches!(right.node, Expr::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("expected Add at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_left_associative_sub() {
    match tail("10 - 4 - 3") {
        Expr::Binary { op: BinOp::Sub, left, right } => {
            assert!(matches!(left.node, Expr::Binary { op: BinOp::Sub, .. }));
            assert_eq!(right.node, Expr::IntLit(3));
        }
        other => panic!("expected Sub at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_comparison_below_arithmetic() {
    match tail("a % 5 == 0") {
        Expr::Binary { op: BinOp::Eq, left, .. } => {
            assert!(matches!(left.node, Expr::Binary { op: BinOp::Mod, .. }));
        }
        other => panic!("expected Eq at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_unary_binds_tightest() {
    match tail("-a * b") {
        Expr::Binary { op: BinOp::Mul, left, .. } => {
            assert!(matches!(left.node, Expr::Unary { op: UnOp::Neg, .. }));
        }
        other => panic!("expected Mul at the root, got {other:?}"),
    }
    assert!(matches!(tail("!done"), Expr::Unary { op: UnOp::Not, .. }));
}

#[test]
fn test_parse_logical_operators() {
    match tail("a < b && b < c || d") {
        Expr::Binary { op: BinOp::Or, left, .. } => {
            assert!(matches!(left.node, Expr::Binary { op: BinOp::And, .. }));
        }
        other => panic!("expected Or at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_parenthesized() {
    match tail("(1 + 2) * 3") {
        Expr::Binary { op: BinOp::Mul, left, .. } => {
            assert!(matches!(left.node, Expr::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected Mul at the root, got {other:?}"),
    }
}

// ============================================
// Ranges
// ============================================

#[test]
fn test_parse_ranges() {
    assert!(matches!(tail("0..10"), Expr::Range { inclusive: false, .. }));
    assert!(matches!(tail("1..=100"), Expr::Range { inclusive: true, .. }));
}

#[test]
fn test_parse_range_bounds_are_additive() {
    match tail("0..n + 1") {
        Expr::Range { end, .. } => {
            assert!(matches!(end.node, Expr::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected Range, got {other:?}"),
    }
}

#[test]
fn test_parse_chained_range_fails() {
    assert!(matches!(parse_err("1..2..3"), CompileError::Parser { .. }));
}

// ============================================
// Statements
// ============================================

#[test]
fn test_parse_let_binding() {
    let prog = parse_ok("let x = 5;");
    assert!(prog.tail.is_none());
    match &prog.stmts[0].node {
        Stmt::Let { name, ty, value } => {
            assert_eq!(name.node, Binder::Name("x".to_string()));
            assert!(ty.is_none());
            assert_eq!(value.node, Expr::IntLit(5));
        }
        other => panic!("expected Let, got {other:?}"),
    }
}

#[test]
fn test_parse_let_with_type_annotation() {
    let prog = parse_ok("let x: int = 5");
    match &prog.stmts[0].node {
        Stmt::Let { ty: Some(ty), .. } => assert_eq!(ty.node, Type::Named("int".to_string())),
        other => panic!("expected typed Let, got {other:?}"),
    }
}

#[test]
fn test_parse_statements_without_semicolons() {
    let prog = parse_ok("let a = 1\nlet b = 2\nprintln(a)\nb");
    assert_eq!(prog.stmts.len(), 3);
    assert_eq!(prog.tail.unwrap().node, Expr::Var("b".to_string()));
}

#[test]
fn test_parse_semicolon_discards_trailing_value() {
    let prog = parse_ok("1 + 1;");
    assert!(prog.tail.is_none());
    assert_eq!(prog.stmts.len(), 1);
}

#[test]
fn test_parse_fn_declaration() {
    let prog = parse_ok("fn gcd(a: int, b: int) -> int { if b == 0 { a } else { gcd(b, a % b) } }");
    match &prog.stmts[0].node {
        Stmt::FnDecl { name, func } => {
            assert_eq!(name.node, "gcd");
            assert_eq!(func.name.as_deref(), Some("gcd"));
            let params: Vec<_> = func.params.iter().map(|p| p.name.node.as_str()).collect();
            assert_eq!(params, vec!["a", "b"]);
            assert_eq!(func.ret_ty.as_ref().unwrap().node, Type::Named("int".to_string()));
            assert!(matches!(func.body.tail.as_ref().unwrap().node, Expr::If { .. }));
        }
        other => panic!("expected FnDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_fun_keyword_is_synonym() {
    let prog = parse_ok("fun double(x) { x * 2 }");
    assert!(matches!(&prog.stmts[0].node, Stmt::FnDecl { name, .. } if name.node == "double"));
}

#[test]
fn test_parse_mixed_fn_keywords_still_parse() {
    let prog = parse_ok("fn a() { 1 }\nfun b() { 2 }\na() + b()");
    assert_eq!(prog.stmts.len(), 2);
}

#[test]
fn test_parse_unit_return_type() {
    let prog = parse_ok("fn noop() -> () { }");
    match &prog.stmts[0].node {
        Stmt::FnDecl { func, .. } => {
            assert_eq!(func.ret_ty.as_ref().unwrap().node, Type::Unit);
            assert!(func.body.tail.is_none());
        }
        other => panic!("expected FnDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_for_loop() {
    let prog = parse_ok("for i in 1..=100 { println(i) }");
    match &prog.stmts[0].node {
        Stmt::For { var, iter, body } => {
            assert_eq!(var.node, Binder::Name("i".to_string()));
            assert!(matches!(iter.node, Expr::Range { inclusive: true, .. }));
            assert!(body.tail.is_some());
        }
        other => panic!("expected For, got {other:?}"),
    }
}

#[test]
fn test_parse_for_loop_discard() {
    let prog = parse_ok("for _ in 0..3 { print(\".\") }");
    assert!(matches!(&prog.stmts[0].node, Stmt::For { var, .. } if var.node == Binder::Discard));
}

#[test]
fn test_parse_block_statement_does_not_absorb_next_line() {
    let prog = parse_ok("if x { 1 } else { 2 }\n-1");
    assert_eq!(prog.stmts.len(), 1);
    assert!(matches!(prog.tail.unwrap().node, Expr::Unary { op: UnOp::Neg, .. }));
}

// ============================================
// Control Flow Expressions
// ============================================

#[test]
fn test_parse_if_without_else() {
    match tail("if x > 1 { 2 }") {
        Expr::If { else_branch, .. } => assert!(else_branch.is_none()),
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn test_parse_else_if_chain_nests() {
    match tail("if a { 1 } else if b { 2 } else { 3 }") {
        Expr::If { else_branch: Some(inner), .. } => match inner.node {
            Expr::If { else_branch: Some(last), .. } => {
                assert!(matches!(last.node, Expr::Block(_)));
            }
            other => panic!("expected nested If, got {other:?}"),
        },
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn test_parse_if_as_let_value() {
    let prog = parse_ok("let sign = if n < 0 { -1 } else { 1 };");
    assert!(matches!(&prog.stmts[0].node, Stmt::Let { value, .. } if matches!(value.node, Expr::If { .. })));
}

#[test]
fn test_parse_match_arms() {
    let source = r#"match (i % 5) {
        0 => "zero",
        1 => "one",
        -2 => "minus two",
        "s" => "string",
        true => "bool",
        _ => "other",
    }"#;
    match tail(source) {
        Expr::Match { subject, arms } => {
            assert!(matches!(subject.node, Expr::Binary { op: BinOp::Mod, .. }));
            let patterns: Vec<_> = arms.iter().map(|a| a.pattern.node.clone()).collect();
            assert_eq!(
                patterns,
                vec![
                    Pattern::Literal(LiteralPattern::Int(0)),
                    Pattern::Literal(LiteralPattern::Int(1)),
                    Pattern::Literal(LiteralPattern::Int(-2)),
                    Pattern::Literal(LiteralPattern::Str(b"s".to_vec())),
                    Pattern::Literal(LiteralPattern::Bool(true)),
                    Pattern::Wildcard,
                ]
            );
        }
        other => panic!("expected Match, got {other:?}"),
    }
}

#[test]
fn test_parse_match_without_wildcard_is_accepted() {
    match tail("match x { 1 => 10, 2 => 20 }") {
        Expr::Match { arms, .. } => assert_eq!(arms.len(), 2),
        other => panic!("expected Match, got {other:?}"),
    }
}

#[test]
fn test_parse_match_block_arms_without_commas() {
    match tail("match x { 1 => { a } 2 => { b } _ => c }") {
        Expr::Match { arms, .. } => assert_eq!(arms.len(), 3),
        other => panic!("expected Match, got {other:?}"),
    }
}

#[test]
fn test_parse_match_requires_an_arm() {
    match parse_err("match x { }") {
        CompileError::Parser { expected, found, .. } => {
            assert_eq!(expected, "pattern");
            assert_eq!(found, "'}'");
        }
        other => panic!("expected parser error, got {other:?}"),
    }
}

#[test]
fn test_parse_match_arms_need_separator() {
    assert!(matches!(parse_err("match x { 1 => a 2 => b }"), CompileError::Parser { .. }));
}

// ============================================
// Functions and Calls
// ============================================

#[test]
fn test_parse_call_with_arguments() {
    match tail("assert_eq(gcd(16, 24), 8)") {
        Expr::Call { callee, args } => {
            assert_eq!(callee.node, Expr::Var("assert_eq".to_string()));
            assert_eq!(args.len(), 2);
            assert!(matches!(args[0].node, Expr::Call { .. }));
        }
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn test_parse_call_trailing_comma_and_chaining() {
    match tail("make(1,)(2)") {
        Expr::Call { callee, args } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(callee.node, Expr::Call { .. }));
        }
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn test_parse_function_literal() {
    match tail("fn(x) { x + 1 }") {
        Expr::Fn(func) => {
            assert!(func.name.is_none());
            assert_eq!(func.params.len(), 1);
        }
        other => panic!("expected Fn, got {other:?}"),
    }
}

#[test]
fn test_parse_pipe_closures() {
    match tail("|a, b| a + b") {
        Expr::Fn(func) => {
            assert_eq!(func.params.len(), 2);
            assert!(matches!(
                func.body.tail.as_ref().unwrap().node,
                Expr::Binary { op: BinOp::Add, .. }
            ));
        }
        other => panic!("expected Fn, got {other:?}"),
    }
    match tail("|| 7") {
        Expr::Fn(func) => assert!(func.params.is_empty()),
        other => panic!("expected Fn, got {other:?}"),
    }
}

// ============================================
// Errors
// ============================================

#[test]
fn test_parse_error_reports_expected_and_found() {
    match parse_err("let = 5") {
        CompileError::Parser { expected, found, span, .. } => {
            assert_eq!(expected, "identifier or '_'");
            assert_eq!(found, "'='");
            assert_eq!(span.start, 4);
        }
        other => panic!("expected parser error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_at_end_of_input() {
    match parse_err("fn f(a) { a") {
        CompileError::Parser { found, .. } => assert_eq!(found, "end of input"),
        other => panic!("expected parser error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_unclosed_paren() {
    match parse_err("(1 + 2") {
        CompileError::Parser { expected, .. } => assert_eq!(expected, "')'"),
        other => panic!("expected parser error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_missing_expression() {
    match parse_err("let x = ;") {
        CompileError::Parser { expected, .. } => assert_eq!(expected, "expression"),
        other => panic!("expected parser error, got {other:?}"),
    }
}

#[test]
fn test_parse_deeply_nested_parentheses() {
    let depth = 2000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(tail(&source), Expr::IntLit(1));
}
