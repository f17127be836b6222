use super::*;

#[test]
fn test_bool() {
    assert_eq!(parse_literal(ParamType::Bool, "true"), Ok(Value::Bool(true)));
    assert_eq!(parse_literal(ParamType::Bool, "False"), Ok(Value::Bool(false)));
    assert_eq!(parse_literal(ParamType::Bool, " TRUE "), Ok(Value::Bool(true)));
    assert!(parse_literal(ParamType::Bool, "yes").is_err());
    assert!(parse_literal(ParamType::Bool, "truee").is_err());
}

#[test]
fn test_int() {
    assert_eq!(parse_literal(ParamType::Int, "42"), Ok(Value::Int(42)));
    assert_eq!(parse_literal(ParamType::Int, "-7"), Ok(Value::Int(-7)));
    assert_eq!(
        parse_literal(ParamType::Int, "1.5"),
        Err(ValueError::Unparseable {
            ty: ParamType::Int,
            text: "1.5".to_owned()
        })
    );
    assert!(parse_literal(ParamType::Int, "").is_err());
}

#[test]
fn test_float() {
    assert_eq!(parse_literal(ParamType::Float, "1.5"), Ok(Value::Float(1.5)));
    assert_eq!(parse_literal(ParamType::Float, "-2"), Ok(Value::Float(-2.)));
    assert_eq!(parse_literal(ParamType::Float, "1e3"), Ok(Value::Float(1000.)));
    assert!(parse_literal(ParamType::Float, "one").is_err());
}

#[test]
fn test_float_display_is_read_back() {
    for f in [0.1, 1. / 3., -1234.5678, 1e-9] {
        let text = Value::Float(f).to_string();
        assert_eq!(parse_literal(ParamType::Float, &text), Ok(Value::Float(f)));
    }
}

#[test]
fn test_vec2() {
    assert_eq!(
        parse_literal(ParamType::Vec2, "(1, -2.5)"),
        Ok(Value::Vec2(1., -2.5))
    );
    assert_eq!(
        parse_literal(ParamType::Vec2, "( 3 ,4 )"),
        Ok(Value::Vec2(3., 4.))
    );
    assert_eq!(parse_literal(ParamType::Vec2, "3, 4"), Ok(Value::Vec2(3., 4.)));
    assert!(parse_literal(ParamType::Vec2, "(3, 4").is_err());
    assert!(parse_literal(ParamType::Vec2, "(3)").is_err());
}

#[test]
fn test_string_is_raw() {
    assert_eq!(
        parse_literal(ParamType::String, " spaced out "),
        Ok(Value::String(" spaced out ".to_owned()))
    );
    assert_eq!(
        parse_literal(ParamType::String, ""),
        Ok(Value::String(String::new()))
    );
}
