use expect_test::expect;
use fool_codegen::{assemble, generate, CodegenError, CodegenOptions, GeneratedCode};
use fool_frontend::{lex, parse_program};
use fool_runtime::{execute, VmConfig};
use fool_sema::{check_program, resolve_program, Session, SessionError};

fn compile_from_str(src: &str) -> Result<GeneratedCode, String> {
    let lexed = lex(src).map_err(|e| format!("lex error: {e:?}"))?;
    let mut prog = parse_program(&lexed).map_err(|e| format!("parse error: {e:?}"))?;

    let mut session = Session::new();
    resolve_program(&mut session, &mut prog).map_err(|e| e.to_string())?;
    check_program(&mut session, &prog).map_err(|e| e.to_string())?;

    generate(&mut session, &prog, &CodegenOptions::default())
        .map_err(|e| format!("codegen error: {e}"))
}

fn run_top(code: &GeneratedCode) -> Option<i64> {
    let ops = assemble(&code.instrs).unwrap();
    execute(&ops, VmConfig::default(), &mut std::io::sink())
        .unwrap()
        .top
}

#[test]
fn codegen_global_variable_read() {
    let code = compile_from_str("let var x:int = 5; in x + 1;").unwrap();
    expect![[r#"
        push 0
        push 5
        lfp
        push -2
        add
        lw
        push 1
        add
        halt
    "#]]
    .assert_eq(&code.asm());
    assert_eq!(run_top(&code), Some(6));
}

#[test]
fn codegen_function_body_shape() {
    let code = compile_from_str("let fun id:int(a:int) a; in id(4);").unwrap();
    expect![[r#"
        push 0
        push function0
        lfp
        push 4
        lfp
        stm
        ltm
        ltm
        push -2
        add
        lw
        js
        halt
        function0:
        cfp
        lra
        lfp
        push 1
        add
        lw
        stm
        sra
        pop
        pop
        sfp
        ltm
        lra
        js
    "#]]
    .assert_eq(&code.asm());
    assert_eq!(run_top(&code), Some(4));
}

#[test]
fn codegen_override_replaces_dispatch_slot() {
    let src = r#"
        let
          class Base() { fun m:int() 1; fun k:int() 10; }
          class Derived extends Base() { fun m:int() 2; fun extra:int() 3; }
          var d:Base = new Derived();
        in d.m();
    "#;
    let code = compile_from_str(src).unwrap();
    let base = &code.dispatch_tables["Base"];
    let derived = &code.dispatch_tables["Derived"];
    assert_eq!(base, &vec!["function0".to_string(), "function1".to_string()]);
    assert_eq!(
        derived,
        &vec![
            "function2".to_string(),
            "function1".to_string(),
            "function3".to_string()
        ]
    );
    assert_ne!(base[0], derived[0]);
    assert_eq!(run_top(&code), Some(2));
}

#[test]
fn codegen_refuses_programs_with_errors() {
    let lexed = lex("let var x:bool = 3; in x;").unwrap();
    let mut prog = parse_program(&lexed).unwrap();
    let mut session = Session::new();
    resolve_program(&mut session, &mut prog).unwrap();
    check_program(&mut session, &prog).unwrap();
    let err = generate(&mut session, &prog, &CodegenOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::Session(SessionError::ErrorsRecorded(1))
    ));
}

#[test]
fn codegen_requires_a_checked_program() {
    let lexed = lex("1;").unwrap();
    let mut prog = parse_program(&lexed).unwrap();
    let mut session = Session::new();
    resolve_program(&mut session, &mut prog).unwrap();
    let err = generate(&mut session, &prog, &CodegenOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::Session(SessionError::PassOutOfOrder { .. })
    ));
}
