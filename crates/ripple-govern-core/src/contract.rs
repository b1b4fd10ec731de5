// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Structural diff of two OpenAPI documents with a fixed breaking-change
//! rule set.
//!
//! The diff is shape-level on purpose: it reads `paths`, per-operation
//! `operationId`, `parameters`, the JSON request body's `schema.required`,
//! and `responses`. It does not chase `$ref`s, detect type narrowing, or
//! walk nested schemas.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use ripple_govern_model::{
    BaselineResolution, ChangeKind, ChangeSeverity, ContractChange, ContractDiffReport,
    ReportStatus, CONTRACT_DIFF_REPORT_SCHEMA,
};

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// The slice of one operation the differ compares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationShape {
    pub operation_id: Option<String>,
    pub required_fields: BTreeSet<String>,
    pub required_params: BTreeSet<(String, String)>,
    pub response_codes: BTreeSet<String>,
}

fn required_request_fields(operation: &Value) -> BTreeSet<String> {
    operation
        .get("requestBody")
        .and_then(|body| body.get("content"))
        .and_then(|content| content.get("application/json"))
        .and_then(|media| media.get("schema"))
        .and_then(|schema| schema.get("required"))
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn required_parameters(operation: &Value) -> BTreeSet<(String, String)> {
    operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|p| p.get("required").and_then(Value::as_bool) == Some(true))
                .filter_map(|p| {
                    let location = p.get("in").and_then(Value::as_str)?;
                    let name = p.get("name").and_then(Value::as_str)?;
                    Some((location.to_string(), name.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn response_codes(operation: &Value) -> BTreeSet<String> {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| responses.keys().cloned().collect())
        .unwrap_or_default()
}

fn operation_shape(operation: &Value) -> OperationShape {
    OperationShape {
        operation_id: operation
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string),
        required_fields: required_request_fields(operation),
        required_params: required_parameters(operation),
        response_codes: response_codes(operation),
    }
}

/// Reduces an OpenAPI document to `path -> method -> shape`.
#[must_use]
pub fn extract_operations(doc: &Value) -> BTreeMap<String, BTreeMap<String, OperationShape>> {
    let mut out = BTreeMap::new();
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return out;
    };
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let mut methods = BTreeMap::new();
        for method in HTTP_METHODS {
            if let Some(operation) = item.get(*method) {
                methods.insert((*method).to_string(), operation_shape(operation));
            }
        }
        out.insert(path.clone(), methods);
    }
    out
}

fn diff_matched_operation(
    path: &str,
    method: &str,
    baseline: &OperationShape,
    current: &OperationShape,
    changes: &mut Vec<ContractChange>,
) {
    if let (Some(before), Some(after)) = (&baseline.operation_id, &current.operation_id) {
        if before != after {
            changes.push(
                ContractChange::new(
                    ChangeKind::OperationIdChanged,
                    path,
                    method,
                    format!("operationId changed from \"{before}\" to \"{after}\""),
                )
                .with_operation_id(Some(after.clone())),
            );
        }
    }

    for field in current.required_fields.difference(&baseline.required_fields) {
        changes.push(
            ContractChange::new(
                ChangeKind::RequiredFieldAdded,
                path,
                method,
                format!("New required request field: \"{field}\""),
            )
            .with_operation_id(current.operation_id.clone()),
        );
    }

    for (location, name) in current.required_params.difference(&baseline.required_params) {
        changes.push(
            ContractChange::new(
                ChangeKind::RequiredParamAdded,
                path,
                method,
                format!("New required {location} parameter: \"{name}\""),
            )
            .with_operation_id(current.operation_id.clone()),
        );
    }

    for code in baseline.response_codes.difference(&current.response_codes) {
        changes.push(
            ContractChange::new(
                ChangeKind::ResponseCodeRemoved,
                path,
                method,
                format!("Response {code} removed from {} {path}", method.to_uppercase()),
            )
            .with_operation_id(current.operation_id.clone()),
        );
    }
}

/// Baseline-first structural diff. Removed paths produce one `path-removed`
/// per baseline method and never a duplicate `method-removed`; additions are
/// reported in a second pass and are always non-breaking.
#[must_use]
pub fn detect_changes(baseline_doc: &Value, current_doc: &Value) -> Vec<ContractChange> {
    let baseline = extract_operations(baseline_doc);
    let current = extract_operations(current_doc);
    let mut changes = Vec::new();

    for (path, baseline_methods) in &baseline {
        match current.get(path) {
            None => {
                for (method, shape) in baseline_methods {
                    changes.push(
                        ContractChange::new(
                            ChangeKind::PathRemoved,
                            path,
                            method,
                            format!("Path {path} removed"),
                        )
                        .with_operation_id(shape.operation_id.clone()),
                    );
                }
            }
            Some(current_methods) => {
                for (method, baseline_shape) in baseline_methods {
                    match current_methods.get(method) {
                        None => changes.push(
                            ContractChange::new(
                                ChangeKind::MethodRemoved,
                                path,
                                method,
                                format!(
                                    "Method {} removed from {path}",
                                    method.to_uppercase()
                                ),
                            )
                            .with_operation_id(baseline_shape.operation_id.clone()),
                        ),
                        Some(current_shape) => diff_matched_operation(
                            path,
                            method,
                            baseline_shape,
                            current_shape,
                            &mut changes,
                        ),
                    }
                }
            }
        }
    }

    for (path, current_methods) in &current {
        match baseline.get(path) {
            None => {
                for (method, shape) in current_methods {
                    changes.push(
                        ContractChange::new(
                            ChangeKind::PathAdded,
                            path,
                            method,
                            format!("Path {path} added"),
                        )
                        .with_operation_id(shape.operation_id.clone()),
                    );
                }
            }
            Some(baseline_methods) => {
                for (method, shape) in current_methods {
                    if !baseline_methods.contains_key(method) {
                        changes.push(
                            ContractChange::new(
                                ChangeKind::MethodAdded,
                                path,
                                method,
                                format!("Method {} added to {path}", method.to_uppercase()),
                            )
                            .with_operation_id(shape.operation_id.clone()),
                        );
                    }
                }
            }
        }
    }

    changes
}

/// Assembles the breaking-change report. A missing baseline (first release)
/// has nothing to break: `not-found`, zero changes, pass.
#[must_use]
pub fn diff_report(
    baseline_doc: Option<&Value>,
    current_doc: &Value,
    base_ref: &str,
    timestamp: &str,
) -> ContractDiffReport {
    let (baseline, changes) = match baseline_doc {
        Some(doc) => (BaselineResolution::Found, detect_changes(doc, current_doc)),
        None => (BaselineResolution::NotFound, Vec::new()),
    };
    let breaking = changes
        .iter()
        .filter(|c| c.severity == ChangeSeverity::Breaking)
        .count() as u64;
    let non_breaking = changes.len() as u64 - breaking;
    ContractDiffReport {
        schema: CONTRACT_DIFF_REPORT_SCHEMA.to_string(),
        timestamp: timestamp.to_string(),
        status: if breaking > 0 {
            ReportStatus::Fail
        } else {
            ReportStatus::Pass
        },
        base_ref: base_ref.to_string(),
        baseline,
        breaking,
        non_breaking,
        changes,
    }
}

/// Parses an OpenAPI document given as JSON or YAML text.
pub fn parse_contract(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(doc) => Ok(doc),
        Err(json_err) => serde_yaml::from_str::<Value>(text)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) or YAML ({yaml_err})")),
    }
}
