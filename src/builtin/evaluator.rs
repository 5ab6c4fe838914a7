//! Evaluator for the builtin statement subset

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::functions::call_function;
use super::plugins::{call_plugin, to_row};
use super::scope::{Binding, BuiltinScope};
use super::statement::{
    Call, Column, CompareOp, Condition, Expr, LetMode, Operand, SelectQuery, Source, Statement,
};
use crate::catalog::ARTIFACT_PREFIX;
use crate::error::{ExecutionError, LookupError, Result};
use crate::executor::{Evaluator, QueryOutput, Row};

/// Limit on nested stored queries and artifact sources
const MAX_DEPTH: usize = 8;

/// What functions and plugins see while a statement runs
pub struct EvalContext<'a> {
    pub scope: &'a BuiltinScope,
    pub cancel: &'a CancellationToken,
}

impl<'a> EvalContext<'a> {
    pub fn new(scope: &'a BuiltinScope, cancel: &'a CancellationToken) -> Self {
        Self { scope, cancel }
    }

    /// Resolve a keyword argument against the row and scope
    pub fn arg(&self, call: &Call, name: &str, row: &Row) -> Option<Value> {
        call.arg(name)
            .map(|operand| resolve_operand(operand, row, self.scope))
            .filter(|value| !value.is_null())
    }

    pub fn string_arg(&self, call: &Call, name: &str, row: &Row) -> Option<String> {
        self.arg(call, name, row).map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn int_arg(&self, call: &Call, name: &str, row: &Row) -> Result<Option<i64>> {
        let Some(value) = self.arg(call, name, row) else {
            return Ok(None);
        };
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            ExecutionError::InvalidParameters(format!(
                "{}: {} must be an integer, got {}",
                call.name, name, value
            ))
            .into()
        })
    }
}

/// Evaluator backed by the builtin functions and plugins
pub struct BuiltinEvaluator {
    scope: Arc<BuiltinScope>,
}

impl BuiltinEvaluator {
    pub fn new(scope: Arc<BuiltinScope>) -> Self {
        Self { scope }
    }

    fn run_query<'a>(
        &'a self,
        query: &'a SelectQuery,
        cancel: &'a CancellationToken,
        depth: usize,
    ) -> BoxFuture<'a, Result<QueryOutput>> {
        Box::pin(async move {
            if depth > MAX_DEPTH {
                return Err(ExecutionError::QueryFailed(format!(
                    "Queries nested deeper than {MAX_DEPTH} levels"
                ))
                .into());
            }

            let source_rows = self.source_rows(query.source.as_ref(), cancel, depth).await?;
            trace!("Source produced {} rows", source_rows.len());

            let ctx = EvalContext::new(&self.scope, cancel);
            let stop_early = query.order_by.is_none();
            let mut results: Vec<(Row, Row)> = Vec::new();

            for source in source_rows {
                if cancel.is_cancelled() {
                    return Err(ExecutionError::Cancelled("Query cancelled".to_string()).into());
                }

                let projected = project(&query.columns, &source, &ctx).await?;
                let keep = query
                    .condition
                    .as_ref()
                    .is_none_or(|cond| matches_condition(cond, &projected, &source, &self.scope));
                if keep {
                    results.push((projected, source));
                }

                if stop_early && query.limit.is_some_and(|limit| results.len() >= limit) {
                    break;
                }
                tokio::task::yield_now().await;
            }

            if let Some(order) = &query.order_by {
                results.sort_by(|(a, a_src), (b, b_src)| {
                    let left = a.get(&order.column).or_else(|| a_src.get(&order.column));
                    let right = b.get(&order.column).or_else(|| b_src.get(&order.column));
                    let ordering = compare_values(left, right);
                    if order.descending { ordering.reverse() } else { ordering }
                });
            }
            if let Some(limit) = query.limit {
                results.truncate(limit);
            }

            let columns = output_columns(&query.columns, &results);
            let rows = results.into_iter().map(|(row, _)| row).collect();
            Ok(QueryOutput::new(columns, rows))
        })
    }

    async fn source_rows(
        &self,
        source: Option<&Source>,
        cancel: &CancellationToken,
        depth: usize,
    ) -> Result<Vec<Row>> {
        match source {
            None => Ok(vec![Row::new()]),
            Some(Source::Plugin(call)) => match call.name.strip_prefix(ARTIFACT_PREFIX) {
                Some(artifact) => self.artifact_rows(artifact, cancel, depth).await,
                None => call_plugin(call, &EvalContext::new(&self.scope, cancel)),
            },
            Some(Source::Variable(name)) => match self.scope.lookup(name) {
                Some(Binding::Stored(query)) => {
                    Ok(self.run_query(&query, cancel, depth + 1).await?.rows)
                }
                Some(Binding::Materialized(rows)) => Ok(rows),
                Some(Binding::Value(value)) => Ok(value_rows(value)),
                None => Err(LookupError::UnknownVariable(name.clone()).into()),
            },
        }
    }

    async fn artifact_rows(
        &self,
        name: &str,
        cancel: &CancellationToken,
        depth: usize,
    ) -> Result<Vec<Row>> {
        let definition = self
            .scope
            .artifacts()
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| LookupError::UnknownArtifact(name.to_string()))?;

        debug!("Running artifact {}", definition.name);
        match Statement::parse(&definition.query)? {
            Statement::Select(query) => Ok(self.run_query(&query, cancel, depth + 1).await?.rows),
            Statement::Let { .. } => Err(ExecutionError::InvalidParameters(format!(
                "Artifact {name} must be a SELECT query"
            ))
            .into()),
        }
    }
}

#[async_trait]
impl Evaluator for BuiltinEvaluator {
    async fn evaluate(&self, statement: &str, cancel: CancellationToken) -> Result<QueryOutput> {
        match Statement::parse(statement)? {
            Statement::Select(query) => self.run_query(&query, &cancel, 0).await,
            Statement::Let {
                name,
                mode: LetMode::Deferred,
                query,
            } => {
                debug!("Storing query {}", name);
                self.scope.bind(name, Binding::Stored(query));
                Ok(QueryOutput::default())
            }
            Statement::Let {
                name,
                mode: LetMode::Materialized,
                query,
            } => {
                let output = self.run_query(&query, &cancel, 0).await?;
                debug!("Materialized {} rows into {}", output.len(), name);
                self.scope.bind(name, Binding::Materialized(output.rows));
                Ok(QueryOutput::default())
            }
        }
    }
}

async fn project(columns: &[Column], source: &Row, ctx: &EvalContext<'_>) -> Result<Row> {
    let mut row = Row::new();
    for column in columns {
        match column {
            Column::All => row.extend(source.iter().map(|(k, v)| (k.clone(), v.clone()))),
            Column::Expr { expr, label } => {
                let value = match expr {
                    Expr::Literal(value) => value.clone(),
                    Expr::Name(name) => resolve_name(name, source, ctx.scope),
                    Expr::Call(call) => call_function(call, source, ctx).await?,
                };
                row.insert(label.clone(), value);
            }
        }
    }
    Ok(row)
}

/// Column order: explicit labels in place, `*` expands to source fields in first-seen order
fn output_columns(columns: &[Column], results: &[(Row, Row)]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &String| {
        if !names.contains(name) {
            names.push(name.clone());
        }
    };

    for column in columns {
        match column {
            Column::All => results
                .iter()
                .flat_map(|(_, source)| source.keys())
                .for_each(&mut push),
            Column::Expr { label, .. } => push(label),
        }
    }
    names
}

fn matches_condition(
    condition: &Condition,
    projected: &Row,
    source: &Row,
    scope: &BuiltinScope,
) -> bool {
    let null = Value::Null;
    let left = projected
        .get(&condition.column)
        .or_else(|| source.get(&condition.column))
        .unwrap_or(&null);
    let right = resolve_operand(&condition.value, source, scope);

    match condition.op {
        CompareOp::Eq => values_equal(left, &right),
        CompareOp::Ne => !values_equal(left, &right),
        CompareOp::Lt => compare_values(Some(left), Some(&right)) == Ordering::Less,
        CompareOp::Le => compare_values(Some(left), Some(&right)) != Ordering::Greater,
        CompareOp::Gt => compare_values(Some(left), Some(&right)) == Ordering::Greater,
        CompareOp::Ge => compare_values(Some(left), Some(&right)) != Ordering::Less,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

/// Total order used by `ORDER BY` and comparisons. Missing and null sort first.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());

    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

fn resolve_operand(operand: &Operand, row: &Row, scope: &BuiltinScope) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Name(name) => resolve_name(name, row, scope),
    }
}

/// Row fields shadow scope variables. Unknown names are null.
fn resolve_name(name: &str, row: &Row, scope: &BuiltinScope) -> Value {
    if let Some(value) = row.get(name) {
        return value.clone();
    }
    match scope.lookup(name) {
        Some(Binding::Value(value)) => value,
        Some(Binding::Materialized(rows)) => {
            Value::Array(rows.into_iter().map(Value::Object).collect())
        }
        Some(Binding::Stored(_)) => {
            debug!("Stored query {} used as a value", name);
            Value::Null
        }
        None => {
            debug!("Symbol {} not found", name);
            Value::Null
        }
    }
}

/// Rows for a variable bound to a plain value
fn value_rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items.into_iter().map(to_row).collect(),
        other => vec![to_row(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtifactDefinition, Config};
    use crate::error::VqlshError;
    use serde_json::json;
    use std::path::Path;

    fn evaluator() -> BuiltinEvaluator {
        let mut config = Config::default();
        config.artifacts = vec![
            ArtifactDefinition {
                name: "Demo.Range".into(),
                description: "Counting".into(),
                query: "SELECT Value FROM range(end=4)".into(),
            },
            ArtifactDefinition {
                name: "Demo.Loop".into(),
                description: "Refers to itself".into(),
                query: "SELECT * FROM Artifact.Demo.Loop()".into(),
            },
        ];
        config
            .env
            .insert("Greeting".to_string(), "hello".to_string());
        let scope = BuiltinScope::from_config(&config, Path::new("/tmp")).unwrap();
        BuiltinEvaluator::new(Arc::new(scope))
    }

    async fn run(evaluator: &BuiltinEvaluator, statement: &str) -> Result<QueryOutput> {
        evaluator
            .evaluate(statement, CancellationToken::new())
            .await
    }

    fn values(output: &QueryOutput, column: &str) -> Vec<Value> {
        output.rows.iter().map(|r| r[column].clone()).collect()
    }

    #[tokio::test]
    async fn test_select_without_from() {
        let output = run(&evaluator(), "SELECT 1 AS One, 'x', Greeting").await.unwrap();
        assert_eq!(output.columns, vec!["One", "'x'", "Greeting"]);
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.rows[0]["One"], json!(1));
        assert_eq!(output.rows[0]["'x'"], json!("x"));
        assert_eq!(output.rows[0]["Greeting"], json!("hello"));
    }

    #[tokio::test]
    async fn test_where_order_limit() {
        let output = run(
            &evaluator(),
            "SELECT Value FROM range(end=10) WHERE Value >= 3 ORDER BY Value DESC LIMIT 3",
        )
        .await
        .unwrap();
        assert_eq!(values(&output, "Value"), vec![json!(9), json!(8), json!(7)]);
    }

    #[tokio::test]
    async fn test_limit_without_order() {
        let output = run(&evaluator(), "SELECT * FROM range(end=1000) LIMIT 2")
            .await
            .unwrap();
        assert_eq!(values(&output, "Value"), vec![json!(0), json!(1)]);
        assert_eq!(output.columns, vec!["Value"]);
    }

    #[tokio::test]
    async fn test_condition_on_alias() {
        let output = run(&evaluator(), "SELECT Value AS N FROM range(end=5) WHERE N = 2")
            .await
            .unwrap();
        assert_eq!(values(&output, "N"), vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_let_deferred_and_materialized() {
        let evaluator = evaluator();

        let output = run(&evaluator, "LET small = SELECT * FROM range(end=3)").await.unwrap();
        assert!(output.is_empty());
        let output = run(&evaluator, "SELECT * FROM small WHERE Value != 1").await.unwrap();
        assert_eq!(values(&output, "Value"), vec![json!(0), json!(2)]);

        run(&evaluator, "LET fixed <= SELECT now() AS T").await.unwrap();
        let first = run(&evaluator, "SELECT T FROM fixed").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = run(&evaluator, "SELECT T FROM fixed").await.unwrap();
        assert_eq!(first.rows, second.rows);

        let kinds = run(&evaluator, "SELECT * FROM scope() WHERE Name = 'fixed'").await.unwrap();
        assert_eq!(values(&kinds, "Type"), vec![json!("materialized query")]);
    }

    #[tokio::test]
    async fn test_unknown_variable() {
        let err = run(&evaluator(), "SELECT * FROM missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Symbol missing not found.");
    }

    #[tokio::test]
    async fn test_artifact_source() {
        let evaluator = evaluator();

        let output = run(&evaluator, "SELECT * FROM Artifact.Demo.Range()").await.unwrap();
        assert_eq!(output.len(), 4);

        let err = run(&evaluator, "SELECT * FROM Artifact.Demo.Missing()").await.unwrap_err();
        assert!(matches!(err, VqlshError::Lookup(LookupError::UnknownArtifact(_))));

        let err = run(&evaluator, "SELECT * FROM Artifact.Demo.Loop()").await.unwrap_err();
        assert!(matches!(err, VqlshError::Execution(ExecutionError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn test_variable_bound_to_value() {
        let output = run(&evaluator(), "SELECT * FROM config").await.unwrap();
        assert_eq!(output.len(), 1);
        assert!(output.columns.contains(&"server_urls".to_string()));
    }

    #[tokio::test]
    async fn test_parse_error_surfaces() {
        let err = run(&evaluator(), "SELECT * FROM").await.unwrap_err();
        assert!(matches!(err, VqlshError::Parse(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_rows() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = evaluator()
            .evaluate("SELECT * FROM range(end=10)", cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_unbounded_range_is_rejected() {
        let err = run(&evaluator(), "SELECT * FROM range(end=9223372036854775807) LIMIT 1")
            .await
            .unwrap_err();
        assert!(matches!(err, VqlshError::Execution(ExecutionError::InvalidParameters(_))));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), None), Ordering::Equal);
        assert!(values_equal(&json!(1), &json!(1.0)));
    }
}
