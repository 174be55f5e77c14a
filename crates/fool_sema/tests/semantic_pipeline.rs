use fool_frontend::{lex, parse_program, Program, Type};
use fool_sema::{check_program, resolve_program, Phase, Session};

fn analyze(src: &str) -> (Session, Program, Option<Type>) {
    let lexed = lex(src).unwrap();
    let mut prog = parse_program(&lexed).unwrap();
    let mut session = Session::new();
    resolve_program(&mut session, &mut prog).unwrap();
    let ty = check_program(&mut session, &prog).unwrap();
    (session, prog, ty)
}

const SHAPES: &str = r#"
    let
      class Shape(id:int) { fun area:int() 0; }
      class Polygon extends Shape(id:int, sides:int) { fun area:int() sides; }
      class Square extends Polygon(id:int, sides:int, len:int) { fun area:int() len * len; }
      class Circle extends Shape(id:int, r:int) { fun area:int() 3 * r * r; }
      class Holder(s:Shape) { fun get:Shape() s; }
      class SquareHolder extends Holder(s:Square) { fun get:Square() s; }
      var sq:Square = new Square(1, 4, 2);
      var h:Holder = new SquareHolder(sq);
    in if sq.area() >= 4 then { new Circle(2, 1) } else { h.get() };
"#;

#[test]
fn hierarchy_is_recorded_and_joins_at_common_ancestor() {
    let (session, _, ty) = analyze(SHAPES);
    assert!(!session.has_errors(), "{:?}", session.diagnostics());
    assert_eq!(session.phase(), Phase::Checked);
    assert_eq!(ty, Some(Type::reference("Shape")));

    assert_eq!(
        session.rels.ancestors("Square"),
        vec!["Square", "Polygon", "Shape"]
    );
    assert_eq!(
        session
            .rels
            .lowest_common_ancestor(&Type::reference("Square"), &Type::reference("Circle")),
        Some(Type::reference("Shape"))
    );
}

#[test]
fn covariant_field_and_return_overrides_keep_their_slots() {
    let (session, prog, _) = analyze(SHAPES);
    let holder = session.classes.shape("SquareHolder").unwrap();
    assert_eq!(holder.fields, vec![Type::reference("Square")]);
    assert_eq!(holder.methods.len(), 1);
    assert_eq!(*holder.methods[0].ret, Type::reference("Square"));

    let square = session.classes.shape("Square").unwrap();
    assert_eq!(square.fields, vec![Type::Int, Type::Int, Type::Int]);
    assert_eq!(square.methods.len(), 1);
    assert_eq!(session.classes.member("Square", "len").unwrap().offset, -3);

    // each class takes the next global slot
    let offsets: Vec<i64> = prog
        .classes
        .iter()
        .map(|c| c.entry.as_ref().unwrap().offset)
        .collect();
    assert_eq!(offsets, vec![-2, -3, -4, -5, -6, -7]);
}
