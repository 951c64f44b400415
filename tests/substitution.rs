use compute_context::{Context, ContextError, Scope, Substitutions};
use std::sync::Arc;

#[test]
fn frame_padding_example() {
    let mut c = Context::new();
    c.set_frame(7.0).unwrap();
    assert_eq!(c.substitute("render_####.exr").unwrap(), "render_0007.exr");
}

#[test]
fn unknown_variable_expands_to_nothing() {
    let c = Context::new();
    assert_eq!(c.substitute("$UNSET_NAME_FOR_SUBSTITUTION_TEST").unwrap(), "");
    assert_eq!(c.substitute("a${UNSET_NAME_FOR_SUBSTITUTION_TEST}b").unwrap(), "ab");
}

#[test]
fn frame_variable_formats_like_a_number() {
    let mut c = Context::new();
    assert_eq!(c.substitute("${frame}").unwrap(), "1");
    c.set_frame(12.5).unwrap();
    assert_eq!(c.substitute("$frame").unwrap(), "12.5");
}

#[test]
fn repeated_variable() {
    let mut c = Context::new();
    c.set("a", "x");
    assert_eq!(c.substitute("${a}${a}").unwrap(), "xx");
}

#[test]
fn self_referencing_variable_fails() {
    let mut c = Context::new();
    c.set("a", "prefix $a");
    assert!(matches!(
        c.substitute("$a"),
        Err(ContextError::RecursionLimitExceeded { depth: 8 })
    ));
}

#[test]
fn mutual_recursion_fails() {
    let mut c = Context::new();
    c.set("a", "$b");
    c.set("b", "$a");
    assert!(c.substitute("${a}").is_err());
}

#[test]
fn substitution_does_not_modify_the_context() {
    let mut c = Context::new();
    c.set("a", "$b");
    let before = c.hash();
    c.substitute("$a ~ ##").unwrap();
    assert_eq!(c.hash(), before);
}

#[test]
fn lone_dollar_contributes_nothing() {
    let c = Context::new();
    assert_eq!(c.substitute("cost: $ 5").unwrap(), "cost:  5");
}

#[test]
fn unterminated_bracket_consumes_the_rest() {
    let mut c = Context::new();
    c.set("a b", "yes");
    assert_eq!(c.substitute("x${a b").unwrap(), "xyes");
}

#[test]
fn substitutes_against_the_current_context() {
    let mut c = Context::new();
    c.set("shot", "sh030");
    c.set_frame(42.0).unwrap();
    let c = Arc::new(c);
    let _scope = Scope::new(&c);
    assert_eq!(
        Context::current().substitute("/out/$shot/beauty.####.exr").unwrap(),
        "/out/sh030/beauty.0042.exr"
    );
}

#[test]
fn masks_leave_markers_untouched() {
    let c = Context::new();
    let subs = Substitutions::none();
    assert_eq!(c.substitute_with("~/$x/##", subs).unwrap(), "~/$x/##");
}
