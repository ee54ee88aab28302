//! End-to-end tests: symbol tables in, Go source out, plus behavioural checks
//! of the generated methods through the IR interpreter.

use crate::render::eval::{Machine, Value};
use crate::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn create_temp_dir() -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "enumgen_e2e_test_{}_{}",
        std::process::id(),
        id
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn paint() -> PackageInfo {
    PackageInfo::new("example.com/paint", "paint")
        .with_type("Color", Underlying::Basic(BasicType::Int))
        .with_const("Red", "Color", ConstLiteral::Int(1))
        .with_const("Green", "Color", ConstLiteral::Int(2))
        .with_const("Blue", "Color", ConstLiteral::Int(3))
        .with_type("Finish", Underlying::Basic(BasicType::String))
        .with_const("Matte", "Finish", ConstLiteral::Str("matte".into()))
        .with_const("Gloss", "Finish", ConstLiteral::Str("gloss".into()))
        .with_type("Ratio", Underlying::Basic(BasicType::Float64))
        .with_const("Half", "Ratio", ConstLiteral::Other("0.5".into()))
}

fn status() -> PackageInfo {
    PackageInfo::new("example.com/jobs", "jobs")
        .with_type("Status", Underlying::Basic(BasicType::String))
        .with_const("Active", "Status", ConstLiteral::Str("active".into()))
        .with_const("Closed", "Status", ConstLiteral::Str("closed".into()))
}

fn two_ints() -> PackageInfo {
    PackageInfo::new("p", "p")
        .with_type("T", Underlying::Basic(BasicType::Int))
        .with_const("A", "T", ConstLiteral::Int(1))
        .with_const("B", "T", ConstLiteral::Int(2))
}

fn two_strings() -> PackageInfo {
    PackageInfo::new("p", "p")
        .with_type("S", Underlying::Basic(BasicType::String))
        .with_const("X", "S", ConstLiteral::Str("x".into()))
        .with_const("Y", "S", ConstLiteral::Str("y".into()))
}

fn plan(pkg: &PackageInfo, type_name: &str, marshal: bool) -> (ConstantGroup, Vec<Method>) {
    let group = extract(pkg, type_name).unwrap();
    let methods = Renderer::go(RenderOptions {
        emit_marshal: marshal,
        ..RenderOptions::default()
    })
    .plan(&group)
    .unwrap();
    (group, methods)
}

// ============================================================================
// Generated output
// ============================================================================

#[test]
fn test_color_defaults() {
    let generated = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color"])
        .unwrap();
    let text = generated.text();

    assert!(text.starts_with(&format!(
        "{}\n\npackage paint\n\nimport \"strconv\"\n",
        BANNER
    )));
    assert!(text.contains("func (v Color) Name() string {"));
    assert!(text.contains("func (v Color) Lookup(name string) (value Color, ok bool) {"));
    assert!(text.contains("func (v Color) IsValid() bool {"));
    assert!(text.contains("func (v Color) String() string {"));
    assert!(text.contains("func (v *Color) Set(s string) error {"));
    assert!(text.contains("\"Red(1)\""));
    assert!(!text.contains("MarshalText"));
    assert!(!text.contains("\"fmt\""));
    assert!(text.ends_with("}\n"));
}

#[test]
fn test_status_with_marshal() {
    let generated = Enumgen::new("jobs")
        .with_provider(status())
        .marshal(true)
        .generate(&["Status"])
        .unwrap();
    let text = generated.text();

    assert!(text.starts_with(&format!("{}\n\npackage jobs\n\nimport \"fmt\"\n", BANNER)));
    assert!(text.contains("func (v Status) MarshalText() (text []byte, err error) {"));
    assert!(text.contains("func (v *Status) UnmarshalText(text []byte) (err error) {"));
    assert!(!text.contains("strconv"));
}

#[test]
fn test_without_set() {
    let generated = Enumgen::new("paint")
        .with_provider(paint())
        .flag(false)
        .generate(&["Color"])
        .unwrap();
    let text = generated.text();
    assert!(!text.contains(") Set("));
    // Nothing left that needs an import.
    assert!(!text.contains("import"));
}

#[test]
fn test_types_in_invocation_order() {
    let generated = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Finish", "Color"])
        .unwrap();
    let text = generated.text();

    let finish = text.find("func (v Finish) Name()").unwrap();
    let color = text.find("func (v Color) Name()").unwrap();
    assert!(finish < color);
    assert_eq!(
        generated
            .groups
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Finish", "Color"]
    );
}

#[test]
fn test_unformatted_output_is_raw() {
    let generated = Enumgen::new("paint")
        .with_provider(paint())
        .format(false)
        .generate(&["Color"])
        .unwrap();
    let text = generated.text();
    assert!(text.starts_with(&format!("{}\n\npackage paint\n\n// Name", BANNER)));
    assert!(!text.contains("import"));
}

#[test]
fn test_output_is_deterministic() {
    let first = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color", "Finish"])
        .unwrap();
    let second = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color", "Finish"])
        .unwrap();
    assert_eq!(first.source, second.source);

    // Declaration order does not leak into the output.
    let reversed = PackageInfo::new("example.com/paint", "paint")
        .with_const("Blue", "Color", ConstLiteral::Int(3))
        .with_const("Green", "Color", ConstLiteral::Int(2))
        .with_const("Red", "Color", ConstLiteral::Int(1))
        .with_type("Color", Underlying::Basic(BasicType::Int));
    let third = Enumgen::new("paint")
        .with_provider(reversed)
        .generate(&["Color"])
        .unwrap();
    let fourth = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color"])
        .unwrap();
    assert_eq!(third.text(), fourth.text());
}

#[test]
fn test_aliases_produce_one_case() {
    let pkg = PackageInfo::new("p", "p")
        .with_type("Level", Underlying::Basic(BasicType::Int))
        .with_const("Warn", "Level", ConstLiteral::Int(2))
        .with_const("Warning", "Level", ConstLiteral::Int(2));
    let text = Enumgen::new("p")
        .with_provider(pkg)
        .generate(&["Level"])
        .unwrap()
        .text();

    // Label-keyed Lookup lists both, value-keyed switches only the first.
    assert!(text.contains("case \"Warning\":"));
    assert!(text.contains("\"Warn(2)\""));
    assert!(!text.contains("\"Warning(2)\""));
}

#[test]
fn test_empty_group() {
    let pkg = PackageInfo::new("p", "p").with_type("Nothing", Underlying::Basic(BasicType::String));
    let generated = Enumgen::new("p")
        .with_provider(pkg)
        .generate(&["Nothing"])
        .unwrap();
    assert_eq!(generated.groups[0].constants, 0);

    let (group, methods) = plan(
        &PackageInfo::new("p", "p").with_type("Nothing", Underlying::Basic(BasicType::String)),
        "Nothing",
        false,
    );
    let mut m = Machine::new(&group, &methods, Value::text(""));
    assert_eq!(m.call(Routine::IsValid, &[]), vec![Value::Bool(false)]);
    assert_eq!(
        m.call(Routine::LookupByLabel, &[Value::text("")]),
        vec![Value::text(""), Value::Bool(false)]
    );
}

// ============================================================================
// Failures yield no output
// ============================================================================

#[test]
fn test_missing_type_fails_whole_run() {
    let err = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color", "Missing"])
        .unwrap_err();
    assert!(matches!(err, EnumgenError::TypeNotFound { ref type_name } if type_name == "Missing"));
}

#[test]
fn test_unsupported_kind_fails_whole_run() {
    let err = Enumgen::new("paint")
        .with_provider(paint())
        .generate(&["Color", "Ratio"])
        .unwrap_err();
    assert!(matches!(err, EnumgenError::UnsupportedKind { .. }));
}

#[test]
fn test_unknown_package() {
    let err = Enumgen::new("example.com/other")
        .with_provider(paint())
        .generate(&["Color"])
        .unwrap_err();
    assert!(matches!(err, EnumgenError::PackageNotFound { .. }));
}

// ============================================================================
// Behaviour of the generated methods
// ============================================================================

#[test]
fn test_integer_display() {
    let (group, methods) = plan(&two_ints(), "T", false);

    let mut m = Machine::new(&group, &methods, Value::Int(1));
    assert!(m.has(Routine::Set));
    assert!(!m.has(Routine::MarshalText));
    assert_eq!(m.call(Routine::Display, &[]), vec![Value::text("A(1)")]);
    assert_eq!(m.call(Routine::Label, &[]), vec![Value::text("A")]);

    let mut m = Machine::new(&group, &methods, Value::Int(99));
    assert_eq!(m.call(Routine::Display, &[]), vec![Value::text(UNKNOWN_MARKER)]);
    assert_eq!(m.call(Routine::Label, &[]), vec![Value::text("")]);
}

#[test]
fn test_string_display() {
    let (group, methods) = plan(&two_strings(), "S", false);

    let mut m = Machine::new(&group, &methods, Value::text("x"));
    assert_eq!(m.call(Routine::Display, &[]), vec![Value::text("X")]);

    let mut m = Machine::new(&group, &methods, Value::text("z"));
    assert_eq!(m.call(Routine::Display, &[]), vec![Value::text("<unknown>")]);
}

#[test]
fn test_lookup() {
    let (group, methods) = plan(&two_ints(), "T", false);
    let mut m = Machine::new(&group, &methods, Value::Int(0));

    assert_eq!(
        m.call(Routine::LookupByLabel, &[Value::text("B")]),
        vec![Value::Int(2), Value::Bool(true)]
    );
    assert_eq!(
        m.call(Routine::LookupByLabel, &[Value::text("Z")]),
        vec![Value::Int(0), Value::Bool(false)]
    );
    // Labels, not values.
    assert_eq!(
        m.call(Routine::LookupByLabel, &[Value::text("2")]),
        vec![Value::Int(0), Value::Bool(false)]
    );
}

#[test]
fn test_is_valid_exactly_declared_values() {
    let (group, methods) = plan(&two_ints(), "T", false);
    for n in -5..=10 {
        let mut m = Machine::new(&group, &methods, Value::Int(n));
        let expected = n == 1 || n == 2;
        assert_eq!(m.call(Routine::IsValid, &[]), vec![Value::Bool(expected)], "{}", n);
    }

    let (group, methods) = plan(&two_strings(), "S", false);
    for s in ["x", "y", "X", "", "xy", "z"] {
        let mut m = Machine::new(&group, &methods, Value::text(s));
        let expected = s == "x" || s == "y";
        assert_eq!(m.call(Routine::IsValid, &[]), vec![Value::Bool(expected)], "{:?}", s);
    }
}

#[test]
fn test_marshal_round_trip() {
    for (pkg, type_name) in [(two_ints(), "T"), (two_strings(), "S")] {
        let (group, methods) = plan(&pkg, type_name, true);
        for decl in &group.values {
            let mut m = Machine::new(&group, &methods, Value::Nil);
            let value = m.constant(&decl.name);
            m.receiver = value.clone();

            let marshalled = m.call(Routine::MarshalText, &[]);
            assert_eq!(marshalled.len(), 2);
            assert_eq!(marshalled[1], Value::Nil);

            let mut target = Machine::new(&group, &methods, Value::Nil);
            assert_eq!(
                target.call(Routine::UnmarshalText, &[marshalled[0].clone()]),
                vec![Value::Nil]
            );
            assert_eq!(target.receiver, value, "{}", decl.name);
        }
    }
}

#[test]
fn test_marshal_text_forms() {
    let (group, methods) = plan(&status(), "Status", true);
    let mut m = Machine::new(&group, &methods, Value::text("active"));
    assert!(m.has(Routine::MarshalText) && m.has(Routine::UnmarshalText));
    assert_eq!(
        m.call(Routine::MarshalText, &[]),
        vec![Value::Bytes(b"active".to_vec()), Value::Nil]
    );

    assert_eq!(
        m.call(Routine::UnmarshalText, &[Value::Bytes(b"closed".to_vec())]),
        vec![Value::Nil]
    );
    assert_eq!(m.receiver, m.constant("Closed"));
    assert!(m.call(Routine::UnmarshalText, &[Value::Bytes(b"bogus".to_vec())])[0].is_error());
    assert_eq!(m.receiver, Value::text("closed"));

    m.receiver = Value::text("bogus");
    let failed = m.call(Routine::MarshalText, &[]);
    assert_eq!(failed[0], Value::Nil);
    assert!(failed[1].is_error());

    // Integer groups marshal as the decimal value and accept labels back.
    let (group, methods) = plan(&two_ints(), "T", true);
    let mut m = Machine::new(&group, &methods, Value::Int(2));
    assert_eq!(
        m.call(Routine::MarshalText, &[]),
        vec![Value::Bytes(b"2".to_vec()), Value::Nil]
    );
    m.receiver = Value::Int(0);
    assert_eq!(
        m.call(Routine::UnmarshalText, &[Value::Bytes(b"A".to_vec())]),
        vec![Value::Nil]
    );
    assert_eq!(m.receiver, Value::Int(1));
    assert!(m.call(Routine::UnmarshalText, &[Value::Bytes(b"7".to_vec())])[0].is_error());
    assert_eq!(m.receiver, Value::Int(1));
}

#[test]
fn test_string_set_keeps_rejected_input() {
    let (group, methods) = plan(&status(), "Status", false);
    let mut m = Machine::new(&group, &methods, Value::text("active"));

    assert_eq!(m.call(Routine::Set, &[Value::text("closed")]), vec![Value::Nil]);
    assert_eq!(m.receiver, Value::text("closed"));

    let result = m.call(Routine::Set, &[Value::text("nonexistent")]);
    assert!(result[0].is_error());
    assert_eq!(m.receiver, Value::text("nonexistent"));
    assert_eq!(m.call(Routine::IsValid, &[]), vec![Value::Bool(false)]);
}

#[test]
fn test_integer_set_accepts_any_integer() {
    let (group, methods) = plan(&two_ints(), "T", false);
    let mut m = Machine::new(&group, &methods, Value::Int(1));

    assert_eq!(m.call(Routine::Set, &[Value::text("99")]), vec![Value::Nil]);
    assert_eq!(m.receiver, Value::Int(99));
    assert_eq!(m.call(Routine::IsValid, &[]), vec![Value::Bool(false)]);

    assert!(m.call(Routine::Set, &[Value::text("x")])[0].is_error());
    assert_eq!(m.receiver, Value::Int(99));

    // Labels are not accepted by Set.
    assert!(m.call(Routine::Set, &[Value::text("A")])[0].is_error());
}

// ============================================================================
// Providers end to end
// ============================================================================

#[cfg(feature = "go-source")]
#[test]
fn test_go_sources_to_file() {
    let dir = create_temp_dir();
    fs::write(dir.join("go.mod"), "module example.com/paint\n\ngo 1.21\n").unwrap();
    fs::write(
        dir.join("color.go"),
        "package paint\n\ntype Color int\n\nconst (\n\tRed Color = iota + 1\n\tGreen\n\tBlue\n)\n",
    )
    .unwrap();
    fs::write(
        dir.join("finish_windows.go"),
        "package paint\n\ntype Finish string\n",
    )
    .unwrap();

    let run = || {
        Enumgen::new(".")
            .with_provider(GoSourceProvider::new(&dir).with_platform("linux", "amd64"))
            .generate(&["Color"])
            .unwrap()
    };
    let generated = run();
    assert_eq!(generated.package_path, "example.com/paint");
    assert_eq!(generated.groups[0].constants, 3);
    assert!(generated.text().contains("return \"Blue(3)\""));

    let out = dir.join(DEFAULT_OUTPUT);
    let out = out.to_str().unwrap();
    assert_eq!(write_output(out, &generated.source).unwrap(), WriteOutcome::Generated);
    assert_eq!(write_output(out, &run().source).unwrap(), WriteOutcome::Unmodified);

    // Excluded on linux by its file name.
    let err = Enumgen::new(".")
        .with_provider(GoSourceProvider::new(&dir).with_platform("linux", "amd64"))
        .generate(&["Finish"])
        .unwrap_err();
    assert!(matches!(err, EnumgenError::TypeNotFound { .. }));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_json_symbols_to_text() {
    let dir = create_temp_dir();
    let path = dir.join("symbols.json");
    fs::write(&path, serde_json::to_string(&status()).unwrap()).unwrap();

    let generated = Enumgen::new("jobs")
        .with_provider(JsonSymbolProvider::new(&path))
        .generate(&["Status"])
        .unwrap();
    assert_eq!(generated.package_name, "jobs");
    assert!(generated.text().contains("func (v Status) Name() string {"));

    fs::remove_dir_all(&dir).ok();
}
