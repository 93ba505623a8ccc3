//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::error::CompilerError;
use crate::ir::outline;
use crate::ir::types::WorkflowGraph;
use crate::translate::TranslateOptions;

/// Full pipeline: parse → translate → graph validation.
/// Returns a JSON object with either `graph` (success) or `errors` (failure).
#[wasm_bindgen]
pub fn translate_workflow(workflow_json: &str, context_json: &str) -> JsValue {
    let result = translate_workflow_inner(workflow_json, context_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Deterministic text outline of the translated graph, or the first error message.
#[wasm_bindgen]
pub fn outline_workflow(workflow_json: &str, context_json: &str) -> String {
    match translate_workflow_inner(workflow_json, context_json) {
        TranslateResult::Success { graph } => outline(&graph),
        TranslateResult::Errors { errors } => errors
            .into_iter()
            .map(|e| e.message)
            .next()
            .unwrap_or_default(),
    }
}

fn translate_workflow_inner(workflow_json: &str, context_json: &str) -> TranslateResult {
    // 1. Parse
    let workflow = match crate::parse::parse(workflow_json) {
        Ok(w) => w,
        Err(e) => return TranslateResult::errors(vec![e]),
    };
    let context = match crate::parse::parse_context(context_json) {
        Ok(c) => c,
        Err(e) => return TranslateResult::errors(vec![e]),
    };

    // 2. Translate + graph validation
    match crate::translate::compile(&workflow, &context, TranslateOptions { validate: true }) {
        Ok(graph) => TranslateResult::Success { graph },
        Err(errors) => TranslateResult::errors(errors),
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    node: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            node: e.node,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status")]
enum TranslateResult {
    #[serde(rename = "success")]
    Success { graph: WorkflowGraph },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}

impl TranslateResult {
    fn errors(errors: Vec<CompilerError>) -> Self {
        TranslateResult::Errors {
            errors: errors.into_iter().map(ErrorDto::from).collect(),
        }
    }
}
