//! MindSQL statement builders for the MindsDB SQL API

use serde_json::Value;

use crate::domain::template::escape_sql_string;
use crate::domain::{FinetunePayload, PredictPayload, TrainingPayload, UsingOptions};

/// Quote an identifier with backticks
pub fn quote_ident(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// `project`.`name`, optionally suffixed with a version
pub fn model_ref(project: &str, name: &str, version: Option<u32>) -> String {
    let base = format!("{}.{}", quote_ident(project), quote_ident(name));
    match version {
        Some(version) => format!("{}.{}", base, version),
        None => base,
    }
}

fn using_value(value: &Value) -> String {
    match value {
        Value::String(text) => escape_sql_string(text),
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn using_clause(using: &UsingOptions) -> Option<String> {
    if using.is_empty() {
        return None;
    }

    let assignments: Vec<String> = using
        .iter()
        .map(|(key, value)| format!("{} = {}", key, using_value(value)))
        .collect();

    Some(format!("USING {}", assignments.join(", ")))
}

fn from_clause(integration: &str, select: &str) -> String {
    if integration.is_empty() {
        format!("FROM ({})", select)
    } else {
        format!("FROM {} ({})", quote_ident(integration), select)
    }
}

fn training_body(target_column: &str, payload: &TrainingPayload) -> Vec<String> {
    let mut lines = vec![
        from_clause(&payload.integration, &payload.select),
        format!("PREDICT {}", quote_ident(target_column)),
    ];

    if let Some(order_by) = &payload.order_by {
        lines.push(format!("ORDER BY {}", order_by));
    }

    if let Some(group_by) = &payload.group_by {
        lines.push(format!("GROUP BY {}", group_by));
    }

    if let Some(window) = payload.window {
        lines.push(format!("WINDOW {}", window));
    }

    if let Some(horizon) = payload.horizon {
        lines.push(format!("HORIZON {}", horizon));
    }

    lines.extend(using_clause(&payload.using));
    lines
}

pub fn create_model(
    name: &str,
    target_column: &str,
    project: &str,
    payload: &TrainingPayload,
) -> String {
    let mut lines = vec![format!("CREATE MODEL {}", model_ref(project, name, None))];
    lines.extend(training_body(target_column, payload));
    lines.join("\n")
}

pub fn retrain_model(
    name: &str,
    target_column: &str,
    project: &str,
    payload: &TrainingPayload,
) -> String {
    let mut lines = vec![format!("RETRAIN {}", model_ref(project, name, None))];
    lines.extend(training_body(target_column, payload));
    lines.join("\n")
}

pub fn finetune_model(name: &str, project: &str, payload: &FinetunePayload) -> String {
    let mut lines = vec![
        format!("FINETUNE {}", model_ref(project, name, None)),
        from_clause(&payload.integration, &payload.select),
    ];

    if let Some(using) = &payload.using {
        lines.extend(using_clause(using));
    }

    lines.join("\n")
}

pub fn describe_model(name: &str, project: &str, version: Option<u32>) -> String {
    match version {
        Some(version) => format!(
            "SELECT * FROM {}.models_versions WHERE name = {} AND version = {}",
            quote_ident(project),
            escape_sql_string(name),
            version
        ),
        None => format!(
            "SELECT * FROM {}.models WHERE name = {}",
            quote_ident(project),
            escape_sql_string(name)
        ),
    }
}

pub fn list_models(project: &str) -> String {
    format!("SELECT * FROM {}.models", quote_ident(project))
}

pub fn drop_model(name: &str, project: &str) -> String {
    format!("DROP MODEL {}", model_ref(project, name, None))
}

pub fn list_views(project: &str) -> String {
    format!(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = {} AND table_type = 'VIEW'",
        escape_sql_string(project)
    )
}

pub fn create_view(name: &str, project: &str, select: &str) -> String {
    format!("CREATE VIEW {} AS ({})", model_ref(project, name, None), select)
}

fn predict_tail(payload: &PredictPayload) -> String {
    let mut tail = String::new();

    if !payload.where_clause.is_empty() {
        tail.push_str(&format!(" WHERE {}", payload.where_clause));
    }

    if let Some(limit) = payload.limit {
        tail.push_str(&format!(" LIMIT {}", limit));
    }

    tail
}

/// Prediction against the model alone
pub fn query(name: &str, project: &str, version: Option<u32>, payload: &PredictPayload) -> String {
    format!(
        "SELECT * FROM {}{}",
        model_ref(project, name, version),
        predict_tail(payload)
    )
}

/// Prediction joining a table (`t`) against the model (`m`)
pub fn batch_query(
    name: &str,
    project: &str,
    version: Option<u32>,
    join: &str,
    payload: &PredictPayload,
) -> String {
    format!(
        "SELECT m.*, t.* FROM {} AS t JOIN {} AS m{}",
        join,
        model_ref(project, name, version),
        predict_tail(payload)
    )
}
