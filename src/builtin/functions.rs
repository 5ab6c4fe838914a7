//! Builtin functions

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::debug;

use super::evaluator::EvalContext;
use super::statement::Call;
use crate::error::{ExecutionError, LookupError, Result};
use crate::executor::Row;

/// Evaluate a function call for one row
///
/// # Arguments
/// * `call` - Function name and keyword arguments
/// * `row` - Row the call is evaluated against
/// * `ctx` - Scope and cancellation token
///
/// # Returns
/// * `Result<Value>` - Function result
pub async fn call_function(call: &Call, row: &Row, ctx: &EvalContext<'_>) -> Result<Value> {
    match call.name.as_str() {
        "now" => Ok(Value::String(Utc::now().to_rfc3339())),
        "hostname" => current_hostname().map(Value::String),
        "version" => Ok(Value::String(crate::VERSION.to_string())),
        "upload" => upload(call, row, ctx).await,
        "sleep" => sleep(call, row, ctx).await,
        other => Err(LookupError::UnknownSymbol(other.to_string()).into()),
    }
}

pub(super) fn current_hostname() -> Result<String> {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .map_err(|e| ExecutionError::QueryFailed(format!("Cannot read hostname: {e}")).into())
}

async fn upload(call: &Call, row: &Row, ctx: &EvalContext<'_>) -> Result<Value> {
    let file = ctx
        .string_arg(call, "file", row)
        .ok_or_else(|| ExecutionError::InvalidParameters("upload: file is required".to_string()))?;
    let upload_dir = ctx.scope.upload_dir().ok_or_else(|| {
        ExecutionError::UnsupportedOperation("upload: no uploader in scope".to_string())
    })?;

    let source = PathBuf::from(&file);
    let name = match ctx.string_arg(call, "name", row) {
        Some(name) => name,
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ExecutionError::InvalidParameters(format!("upload: {file} has no file name"))
            })?,
    };

    let destination = Path::new(&upload_dir).join(&name);
    let size = tokio::fs::copy(&source, &destination).await?;
    debug!("Uploaded {} to {} ({} bytes)", file, destination.display(), size);

    Ok(json!({
        "Path": destination.display().to_string(),
        "Size": size,
    }))
}

async fn sleep(call: &Call, row: &Row, ctx: &EvalContext<'_>) -> Result<Value> {
    let seconds = ctx
        .int_arg(call, "time", row)?
        .ok_or_else(|| ExecutionError::InvalidParameters("sleep: time is required".to_string()))?;
    let seconds = u64::try_from(seconds).map_err(|_| {
        ExecutionError::InvalidParameters(format!(
            "sleep: time must not be negative, got {seconds}"
        ))
    })?;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => Ok(Value::Bool(true)),
        _ = ctx.cancel.cancelled() => {
            Err(ExecutionError::Cancelled("Query cancelled".to_string()).into())
        }
    }
}
