//! Public API behaviour of the step-pattern compiler.
#![expect(clippy::expect_used, reason = "tests assert on successful compilation")]

use pagewright_patterns::{CapturedValue, CompiledPattern, ParamKind, PatternError};

#[test]
fn login_step_captures_username_and_password() {
    let pattern = CompiledPattern::compile(
        "the User tries to login with {word} as username and {word} as password",
    )
    .expect("login pattern should compile");
    assert_eq!(pattern.params(), &[ParamKind::Word, ParamKind::Word]);

    let values = pattern
        .match_text("the User tries to login with standard_user as username and secret_sauce as password")
        .expect("login step should match");
    assert_eq!(
        values,
        vec![
            CapturedValue::Word("standard_user".into()),
            CapturedValue::Word("secret_sauce".into()),
        ]
    );
}

#[test]
fn matching_is_repeatable() {
    let pattern =
        CompiledPattern::compile("I add {int} {string} to the cart").expect("pattern should compile");
    let text = r#"I add 2 "Sauce Labs Backpack" to the cart"#;
    let first = pattern.match_text(text);
    let second = pattern.match_text(text);
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn unknown_parameter_type_reports_name_and_offset() {
    let Err(err) = CompiledPattern::compile("I pay {float} dollars") else {
        panic!("expected unknown parameter type error");
    };
    let PatternError::Placeholder(info) = err else {
        panic!("expected placeholder error, got {err}");
    };
    assert_eq!(info.message, "unknown parameter type");
    assert_eq!(info.placeholder.as_deref(), Some("float"));
    assert_eq!(info.position, 6);
}

#[test]
fn escaped_braces_match_literally() {
    let pattern =
        CompiledPattern::compile("the payload is {{{string}}}").expect("pattern should compile");
    assert_eq!(
        pattern.match_text(r#"the payload is {"ok"}"#),
        Some(vec![CapturedValue::String("ok".into())])
    );
}
