use expect_test::expect;
use fool_frontend::{lex, parse_program, Type};
use fool_runtime::{Outcome, VmConfig, VmError};
use fool_sema::{resolve_program, DiagnosticKind, Session, SessionError};
use foolc::{compile_source, run_compiled, CompileConfig, CompileError, Compiled};

fn compile(src: &str) -> Compiled {
    match compile_source(src, &CompileConfig::default()) {
        Ok(c) => c,
        Err(e) => panic!("{e}: {:?}", e.diagnostics()),
    }
}

fn run(src: &str) -> (Outcome, String) {
    let compiled = compile(src);
    let mut out = Vec::new();
    let outcome = run_compiled(&compiled, &VmConfig::default(), &mut out).unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

fn top(src: &str) -> i64 {
    run(src).0.top.unwrap()
}

fn errors(src: &str) -> String {
    let err = compile_source(src, &CompileConfig::default()).unwrap_err();
    err.diagnostics()
        .iter()
        .map(|d| format!("{d}\n"))
        .collect()
}

#[test]
fn global_variable_plus_one() {
    let compiled = compile("let var x:int = 5; in x + 1;");
    assert_eq!(compiled.ty, Some(Type::Int));

    let (outcome, printed) = run("let var x:int = 5; in x + 1;");
    assert_eq!(outcome.top, Some(6));
    assert!(outcome.printed.is_empty());
    assert_eq!(printed, "");
}

#[test]
fn override_is_dispatched_dynamically() {
    let src = r#"
        let
          class Base() { fun m:int() 1; }
          class Derived extends Base() { fun m:int() 2; }
          var b:Base = new Base();
          var d:Base = new Derived();
        in b.m() * 10 + d.m();
    "#;
    let compiled = compile(src);
    let m_slot = 0;
    assert_ne!(
        compiled.code.dispatch_tables["Base"][m_slot],
        compiled.code.dispatch_tables["Derived"][m_slot]
    );
    assert_eq!(top(src), 12);
}

#[test]
fn arity_mismatch_names_function_and_line() {
    let src = "let\n  fun f:int(a:int, b:int) a + b;\nin f(1);";
    let err = compile_source(src, &CompileConfig::default()).unwrap_err();
    let d = &err.diagnostics()[0];
    assert_eq!(d.kind, DiagnosticKind::TypeMismatch);
    assert_eq!(d.line, 3);
    assert!(d.message.contains('f'));
    assert_eq!(
        d.to_string(),
        "line 3: Wrong number of parameters in the invocation of f"
    );
}

#[test]
fn passes_run_once_per_session() {
    let lexed = lex("let var x:int = 1; in x;").unwrap();
    let mut prog = parse_program(&lexed).unwrap();
    let mut session = Session::new();
    resolve_program(&mut session, &mut prog).unwrap();
    assert!(matches!(
        resolve_program(&mut session, &mut prog),
        Err(SessionError::PassOutOfOrder { .. })
    ));
}

#[test]
fn recursion() {
    let src = r#"
        let
          fun fact:int(n:int)
            if n <= 1 then { 1 } else { n * fact(n - 1) };
        in print(fact(5));
    "#;
    let (outcome, printed) = run(src);
    assert_eq!(printed, "120\n");
    assert_eq!(outcome.top, Some(120));
}

#[test]
fn nested_functions_follow_access_links() {
    let src = r#"
        let
          var base:int = 100;
          fun outer:int(n:int)
            let
              var local:int = 7;
              fun inner:int(m:int) base + n + m + local;
            in inner(10);
        in outer(5);
    "#;
    assert_eq!(top(src), 122);
}

#[test]
fn fields_and_objects_created_inside_methods() {
    let src = r#"
        let
          class Counter(n:int, step:int) {
            fun next:Counter() new Counter(n + step, step);
            fun get:int() n;
          }
          var c:Counter = new Counter(1, 5);
          var d:Counter = c.next();
          var e:Counter = d.next();
        in e.get() * 100 + c.get();
    "#;
    assert_eq!(top(src), 1101);
}

#[test]
fn inherited_method_calls_the_override() {
    let src = r#"
        let
          class Animal(legs:int) {
            fun sound:int() 1;
            fun speak:int() sound() * 10 + legs;
          }
          class Dog extends Animal(legs:int) {
            fun sound:int() 2;
          }
          var a:Animal = new Dog(4);
        in a.speak();
    "#;
    assert_eq!(top(src), 24);
}

#[test]
fn method_arguments_and_locals() {
    let src = r#"
        let
          class Acc(total:int) {
            fun add:int(x:int, y:int)
              let var s:int = x + y;
              in total + s;
          }
          var a:Acc = new Acc(10);
        in a.add(1, 2) - a.add(0, 0);
    "#;
    assert_eq!(top(src), 3);
}

#[test]
fn boolean_operators_short_circuit() {
    let (outcome, printed) = run("print(false && 1 / 0 == 0) + print(true || 1 / 0 == 0);");
    assert_eq!(printed, "0\n1\n");
    assert_eq!(outcome.top, Some(1));

    let src = "let var x:int = 3; in print(if (x >= 2) && !(x == 4) then { print(7) } else { 0 });";
    let (outcome, printed) = run(src);
    assert_eq!(printed, "7\n7\n");
    assert_eq!(outcome.top, Some(7));

    assert_eq!(top("2 >= 3;"), 0);
    assert_eq!(top("3 <= 3;"), 1);
    assert_eq!(top("true + true;"), 2);
}

#[test]
fn null_references() {
    let src = r#"
        let
          class C() {}
          var c:C = null;
          var d:C = new C();
        in (c == null) + (d == null) * 10;
    "#;
    assert_eq!(top(src), 1);
}

#[test]
fn runtime_errors_surface_from_the_vm() {
    let compiled = compile("10 / (2 - 2);");
    let err = run_compiled(&compiled, &VmConfig::default(), &mut std::io::sink()).unwrap_err();
    assert!(matches!(err, VmError::DivisionByZero { .. }));

    let looping = compile("let fun f:int(n:int) f(n); in f(0);");
    let limited = VmConfig {
        max_steps: Some(10_000),
        ..VmConfig::default()
    };
    let err = run_compiled(&looping, &limited, &mut std::io::sink()).unwrap_err();
    assert!(matches!(
        err,
        VmError::StepLimit(_) | VmError::OutOfMemory { .. }
    ));
}

#[test]
fn smaller_memory_is_honored_end_to_end() {
    let config = CompileConfig { memsize: 200 };
    let compiled = compile_source(
        "let class P(v:int) { fun get:int() v; } var p:P = new P(9); in p.get();",
        &config,
    )
    .unwrap();
    let vm = VmConfig {
        memsize: 200,
        max_steps: None,
    };
    let outcome = run_compiled(&compiled, &vm, &mut std::io::sink()).unwrap();
    assert_eq!(outcome.top, Some(9));
}

#[test]
fn every_error_is_reported() {
    let src = r#"
        let
          class A() { fun m:int() true; }
          class B extends A() { fun m:bool() 1; }
          var x:int = y;
          var z:bool = 3;
          var w:A = new A(1);
        in q;
    "#;
    expect![[r#"
        line 5: Var or Par id y not declared
        line 8: Var or Par id q not declared
        line 4: Wrong return type for method m
        line 6: Incompatible value for variable z
        line 7: Class A constructor expects 0 argument(s), got 1
    "#]]
    .assert_eq(&errors(src));
}

#[test]
fn syntax_and_lexical_errors_carry_lines() {
    let err = compile_source("let\n var x:int = ;\nin x;", &CompileConfig::default()).unwrap_err();
    let d = &err.diagnostics()[0];
    assert_eq!((d.kind, d.line), (DiagnosticKind::Syntax, 2));

    let err = compile_source("1 +\n\n 2 # 3;", &CompileConfig::default()).unwrap_err();
    let d = &err.diagnostics()[0];
    assert_eq!((d.kind, d.line), (DiagnosticKind::Syntax, 3));
    assert!(matches!(err, CompileError::Diagnostics(_)));
}

#[test]
fn override_violation_stops_before_code_generation() {
    let src = r#"
        let
          class C() { fun m:int() 1; }
          class D extends C() { fun m:bool() true; }
          var d:C = new D();
        in d.m();
    "#;
    let err = compile_source(src, &CompileConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::Diagnostics(_)));
    let diags = err.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::OverrideViolation);
    assert_eq!(diags[0].line, 4);
    assert_eq!(
        diags[0].message,
        "Override of method m in class D needs to be a subtype"
    );
}

#[test]
fn commented_source_compiles_and_runs() {
    let src = "/* globals */\nlet var x:int = 2; /* two */\nin print(x * 21);";
    let (outcome, printed) = run(src);
    assert_eq!(printed, "42\n");
    assert_eq!(outcome.top, Some(42));

    let err = compile_source("1 +\n/* open", &CompileConfig::default()).unwrap_err();
    let d = &err.diagnostics()[0];
    assert_eq!((d.kind, d.line), (DiagnosticKind::Syntax, 2));
}
