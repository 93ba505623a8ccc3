mod helpers;

use helpers::*;
use wdl_graph::error::Phase;
use wdl_graph::parse::{ResolutionContext, SyntaxNode};
use wdl_graph::translate;

fn one_output_task() -> ResolutionContext {
    context_with_tasks(&[
        ("t", task("t", &[("Int", "a")], &[("Int", "out")])),
        ("empty", task("empty", &[], &[])),
    ])
}

#[test]
fn unknown_task_is_named_in_the_error() {
    let wf = workflow("wf", vec![call("nope", None, vec![])]);
    let err = translate(&wf, &ResolutionContext::new()).unwrap_err();

    assert_eq!(err.code, "T001");
    assert_eq!(err.phase, Phase::Translate);
    assert_eq!(err.message, "Undeclared task call: 'nope'.");
    assert_eq!(err.node.as_deref(), Some("wf"));
    assert_eq!(
        err.to_string(),
        "[Translate:T001] Undeclared task call: 'nope'. (node 'wf')"
    );
}

#[test]
fn unknown_variable_in_call_input() {
    let wf = workflow("wf", vec![call("t", None, vec![("a", ident("ghost"))])]);
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T003");
    assert_eq!(err.message, "Undeclared variable is referenced: 'ghost'");
}

#[test]
fn unknown_variable_inside_a_compound_names_the_whole_expression() {
    let wf = workflow(
        "wf",
        vec![call("t", None, vec![("a", binary("Add", ident("ghost"), int("1")))])],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T003");
    assert_eq!(err.message, "Undeclared variable is referenced: 'ghost + 1'");
}

#[test]
fn unknown_call_input_key() {
    let wf = workflow("wf", vec![call("t", None, vec![("zzz", int("1"))])]);
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T005");
    assert_eq!(
        err.message,
        "Undeclared variable trying to be assigned: call 't' --> 'zzz'"
    );
}

#[test]
fn unknown_call_in_current_syntax_output() {
    let wf = workflow(
        "wf",
        vec![outputs(vec![output(ty("Int"), "r", member("ghost", "out"))])],
    );
    let err = translate(&wf, &ResolutionContext::new()).unwrap_err();

    assert_eq!(err.code, "T004");
    assert_eq!(
        err.message,
        "Undeclared call in wf output block is referenced: 'ghost'"
    );
}

#[test]
fn unknown_output_in_current_syntax_output() {
    let wf = workflow(
        "wf",
        vec![
            call("t", None, vec![]),
            outputs(vec![output(ty("Int"), "r", member("t", "nope"))]),
        ],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T003");
    assert_eq!(
        err.message,
        "Undeclared variable in wf output block is referenced: 't.nope'"
    );
}

#[test]
fn unknown_output_in_legacy_output() {
    let wf = workflow(
        "wf",
        vec![
            call("t", None, vec![]),
            outputs(vec![legacy_output("t.nope", None)]),
        ],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T003");
    assert_eq!(
        err.message,
        "In 'wf' output block undeclared variable is referenced: 't.nope'"
    );
}

#[test]
fn wildcard_over_a_call_without_outputs() {
    let wf = workflow(
        "wf",
        vec![
            call("empty", None, vec![]),
            outputs(vec![legacy_output("empty", Some("*"))]),
        ],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T006");
    assert_eq!(
        err.message,
        "In 'wf' output block undeclared variable is referenced: 'empty.* (empty doesn't have any outputs)'"
    );
}

#[test]
fn unknown_call_in_legacy_output() {
    let wf = workflow("wf", vec![outputs(vec![legacy_output("ghost", Some("*"))])]);
    let err = translate(&wf, &ResolutionContext::new()).unwrap_err();

    assert_eq!(err.code, "T004");
    assert_eq!(
        err.message,
        "In 'wf' output block undeclared call is referenced: 'ghost'"
    );
}

#[test]
fn duplicate_call_alias() {
    let wf = workflow(
        "wf",
        vec![call("t", None, vec![]), call("t", None, vec![])],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T008");
    assert_eq!(err.message, "Duplicate name 't' in 'wf'");
}

#[test]
fn call_without_task_is_malformed() {
    let bad = SyntaxNode::ast("Call", [("alias", Some(ident("x")))]);
    let wf = workflow("wf", vec![bad]);
    let err = translate(&wf, &ResolutionContext::new()).unwrap_err();

    assert_eq!(err.code, "T007");
    assert_eq!(err.message, "Malformed 'call' node: missing attribute 'task'");
}

#[test]
fn workflow_without_name_is_malformed() {
    let wf = SyntaxNode::ast("Workflow", [("body", Some(SyntaxNode::list(vec![])))]);
    let err = translate(&wf, &ResolutionContext::new()).unwrap_err();

    assert_eq!(err.code, "T007");
    assert_eq!(err.message, "Malformed 'workflow' node: missing attribute 'name'");
}

#[test]
fn scatter_item_is_out_of_scope_after_the_scatter() {
    let wf = workflow(
        "wf",
        vec![
            declaration(array_of("Int"), "xs", None),
            scatter("x", ident("xs"), vec![]),
            call("t", None, vec![("a", ident("x"))]),
        ],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();
    assert_eq!(err.code, "T003");
}

#[test]
fn member_of_a_declaration_is_an_undeclared_call() {
    let wf = workflow(
        "wf",
        vec![
            declaration(ty("Int"), "y", Some(int("5"))),
            call("t", None, vec![("a", member("y", "left"))]),
        ],
    );
    let err = translate(&wf, &one_output_task()).unwrap_err();

    assert_eq!(err.code, "T004");
    assert_eq!(err.message, "Undeclared call is referenced: 'y'");
}
