//! Builtin plugins
//!
//! Each plugin turns its keyword arguments into a list of rows.

use chrono::Utc;
use serde_json::{Value, json};

use super::evaluator::EvalContext;
use super::functions::current_hostname;
use super::statement::Call;
use crate::error::{ExecutionError, LookupError, Result};
use crate::executor::Row;

/// Run a plugin
///
/// # Arguments
/// * `call` - Plugin name and keyword arguments
/// * `ctx` - Scope and cancellation token
///
/// # Returns
/// * `Result<Vec<Row>>` - Rows produced by the plugin
pub fn call_plugin(call: &Call, ctx: &EvalContext<'_>) -> Result<Vec<Row>> {
    match call.name.as_str() {
        "info" => info(),
        "scope" => Ok(scope(ctx)),
        "artifact_definitions" => Ok(artifact_definitions(call, ctx)),
        "range" => range(call, ctx),
        other => Err(LookupError::UnknownSymbol(other.to_string()).into()),
    }
}

fn info() -> Result<Vec<Row>> {
    Ok(vec![to_row(json!({
        "Hostname": current_hostname()?,
        "OS": std::env::consts::OS,
        "Architecture": std::env::consts::ARCH,
        "Version": crate::VERSION,
        "Time": Utc::now().to_rfc3339(),
    }))])
}

fn scope(ctx: &EvalContext<'_>) -> Vec<Row> {
    ctx.scope
        .bindings()
        .into_iter()
        .map(|(name, binding)| to_row(json!({ "Name": name, "Type": binding.kind() })))
        .collect()
}

fn artifact_definitions(call: &Call, ctx: &EvalContext<'_>) -> Vec<Row> {
    let empty = Row::new();
    let names: Option<Vec<String>> = ctx.arg(call, "names", &empty).map(|value| match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    });

    ctx.scope
        .artifacts()
        .iter()
        .filter(|def| names.as_ref().is_none_or(|names| names.contains(&def.name)))
        .map(|def| {
            to_row(json!({
                "Name": def.name,
                "Description": def.description,
                "Query": def.query,
            }))
        })
        .collect()
}

/// Largest number of rows a single `range()` call may produce.
pub const MAX_RANGE_ROWS: u64 = 1_000_000;

fn range(call: &Call, ctx: &EvalContext<'_>) -> Result<Vec<Row>> {
    let empty = Row::new();
    let start = ctx.int_arg(call, "start", &empty)?.unwrap_or(0);
    let end = ctx
        .int_arg(call, "end", &empty)?
        .ok_or_else(|| ExecutionError::InvalidParameters("range: end is required".to_string()))?;
    let step = ctx.int_arg(call, "step", &empty)?.unwrap_or(1);

    let step = usize::try_from(step).ok().filter(|s| *s > 0).ok_or_else(|| {
        ExecutionError::InvalidParameters(format!("range: step must be positive, got {step}"))
    })?;

    let span = (i128::from(end) - i128::from(start)).max(0);
    let count = (span + step as i128 - 1) / step as i128;
    if count > i128::from(MAX_RANGE_ROWS) {
        return Err(ExecutionError::InvalidParameters(format!(
            "range: {count} rows requested, at most {MAX_RANGE_ROWS} allowed"
        ))
        .into());
    }

    let mut rows = Vec::with_capacity(count as usize);
    for value in (start..end).step_by(step) {
        if ctx.cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled("Query cancelled".to_string()).into());
        }
        rows.push(to_row(json!({ "Value": value })));
    }
    Ok(rows)
}

/// Convert an object literal into a row. Non-objects become `{"_value": ...}`.
pub(super) fn to_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => {
            let mut row = Row::new();
            row.insert("_value".to_string(), other);
            row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::scope::{Binding, BuiltinScope};
    use crate::builtin::statement::Operand;
    use crate::config::{ArtifactDefinition, Config};
    use std::path::Path;
    use tokio_util::sync::CancellationToken;

    fn call(name: &str, args: Vec<(&str, Value)>) -> Call {
        Call {
            name: name.to_string(),
            args: args
                .into_iter()
                .map(|(k, v)| (k.to_string(), Operand::Literal(v)))
                .collect(),
        }
    }

    fn scope_with_artifacts() -> BuiltinScope {
        let mut config = Config::default();
        config.artifacts = vec![
            ArtifactDefinition {
                name: "Generic.Client.Info".into(),
                description: "Client info".into(),
                query: "SELECT * FROM info()".into(),
            },
            ArtifactDefinition {
                name: "Demo.Range".into(),
                description: "Counting".into(),
                query: "SELECT * FROM range(end=3)".into(),
            },
        ];
        BuiltinScope::from_config(&config, Path::new(".")).unwrap()
    }

    #[test]
    fn test_info() {
        let scope = BuiltinScope::empty();
        let cancel = CancellationToken::new();
        let rows = call_plugin(&call("info", vec![]), &EvalContext::new(&scope, &cancel)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["OS"], json!(std::env::consts::OS));
        assert_eq!(rows[0]["Version"], json!(crate::VERSION));
    }

    #[test]
    fn test_scope_lists_bindings() {
        let scope = BuiltinScope::empty();
        scope.bind("x", Binding::Value(json!(1)));
        let cancel = CancellationToken::new();
        let rows = call_plugin(&call("scope", vec![]), &EvalContext::new(&scope, &cancel)).unwrap();
        assert_eq!(rows, vec![to_row(json!({"Name": "x", "Type": "value"}))]);
    }

    #[test]
    fn test_artifact_definitions() {
        let scope = scope_with_artifacts();
        let cancel = CancellationToken::new();
        let ctx = EvalContext::new(&scope, &cancel);

        let all = call_plugin(&call("artifact_definitions", vec![]), &ctx).unwrap();
        assert_eq!(all.len(), 2);

        let some = call_plugin(
            &call("artifact_definitions", vec![("names", json!(["Demo.Range"]))]),
            &ctx,
        )
        .unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0]["Query"], json!("SELECT * FROM range(end=3)"));
    }

    #[test]
    fn test_range() {
        let scope = BuiltinScope::empty();
        let cancel = CancellationToken::new();
        let ctx = EvalContext::new(&scope, &cancel);

        let rows = call_plugin(
            &call("range", vec![("start", json!(1)), ("end", json!(7)), ("step", json!(2))]),
            &ctx,
        )
        .unwrap();
        let values: Vec<i64> = rows.iter().map(|r| r["Value"].as_i64().unwrap()).collect();
        assert_eq!(values, vec![1, 3, 5]);

        assert!(call_plugin(&call("range", vec![]), &ctx).is_err());
        let zero_step = call("range", vec![("end", json!(3)), ("step", json!(0))]);
        assert!(call_plugin(&zero_step, &ctx).is_err());
    }

    #[test]
    fn test_range_rejects_oversized_span() {
        let scope = BuiltinScope::empty();
        let cancel = CancellationToken::new();
        let ctx = EvalContext::new(&scope, &cancel);

        let err = call_plugin(&call("range", vec![("end", json!(i64::MAX))]), &ctx).unwrap_err();
        assert!(matches!(
            err,
            crate::error::VqlshError::Execution(ExecutionError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_range_stops_when_cancelled() {
        let scope = BuiltinScope::empty();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = EvalContext::new(&scope, &cancel);

        let large = call("range", vec![("end", json!(MAX_RANGE_ROWS))]);
        let err = call_plugin(&large, &ctx).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_unknown_plugin() {
        let scope = BuiltinScope::empty();
        let cancel = CancellationToken::new();
        let ctx = EvalContext::new(&scope, &cancel);
        let err = call_plugin(&call("glob", vec![]), &ctx).unwrap_err();
        assert!(matches!(err, crate::error::VqlshError::Lookup(_)));
    }
}
