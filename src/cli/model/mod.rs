//! One-shot model commands

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::domain::schedule::is_due_now;
use crate::domain::{
    DomainError, FinetuneOverrides, PredictOverrides, QueryParam, QueryParams, WhereClause,
};

#[derive(Args, Clone)]
pub struct RetrainArgs {
    /// Model name
    pub name: String,

    /// Replace the training select statement
    #[arg(long)]
    pub select: Option<String>,
}

#[derive(Args, Clone)]
pub struct FinetuneArgs {
    /// Model name
    pub name: String,

    /// Replace the finetune select statement
    #[arg(long)]
    pub select: Option<String>,

    /// Template parameter as KEY=VALUE; KEY is wrapped in `$` unless it already is
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, QueryParam)>,
}

#[derive(Args, Clone)]
pub struct PredictArgs {
    /// Model name
    pub name: String,

    /// Template parameter as KEY=VALUE; KEY is wrapped in `$` unless it already is
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, QueryParam)>,

    /// Replace the join clause
    #[arg(long)]
    pub join: Option<String>,

    /// Replace the where conditions (repeatable)
    #[arg(long = "where")]
    pub conditions: Vec<String>,

    #[arg(long)]
    pub limit: Option<u32>,

    /// Pin a model version
    #[arg(long)]
    pub version: Option<u32>,
}

#[derive(Args, Clone)]
pub struct DeleteArgs {
    /// Model name
    pub name: String,
}

#[derive(Subcommand, Clone)]
pub enum CallbackCommand {
    /// List registered callbacks
    List,

    /// Register a callback URL
    Create {
        /// http or https URL called on status changes
        url: String,
    },

    /// Remove a callback by id
    Delete { id: u64 },
}

fn parse_param(raw: &str) -> Result<(String, QueryParam), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }

    let token = if key.starts_with('$') && key.ends_with('$') && key.len() > 1 {
        key.to_string()
    } else {
        format!("${}$", key.trim_matches('$'))
    };

    Ok((token, QueryParam::parse_loose(value)))
}

fn to_params(params: Vec<(String, QueryParam)>) -> Option<QueryParams> {
    (!params.is_empty()).then(|| params.into_iter().collect())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn sync() -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    let report = lifecycle.sync_all().await;
    for name in &report.trained {
        println!("trained    {}", name);
    }
    for name in &report.retrained {
        println!("retrained  {}", name);
    }
    for name in &report.skipped {
        println!("up to date {}", name);
    }
    for (name, error) in &report.failed {
        println!("failed     {}: {}", name, error);
    }

    if !report.is_success() {
        anyhow::bail!("{} model(s) failed to sync", report.failed.len());
    }

    Ok(())
}

pub async fn retrain(args: RetrainArgs) -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    let overrides = crate::domain::TrainingOverrides {
        select: args.select,
        using: None,
    };
    lifecycle.retrain(&args.name, Some(&overrides)).await?;
    println!("Retraining {}", args.name);

    Ok(())
}

pub async fn finetune(args: FinetuneArgs) -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    let overrides = FinetuneOverrides {
        select: args.select,
        using: None,
        params: to_params(args.params),
    };
    lifecycle.finetune(&args.name, Some(&overrides)).await?;
    println!("Finetuning {}", args.name);

    Ok(())
}

pub async fn predict(args: PredictArgs) -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    let overrides = PredictOverrides {
        join: args.join,
        where_clause: (!args.conditions.is_empty()).then(|| WhereClause::Many(args.conditions)),
        limit: args.limit,
        params: to_params(args.params),
        version: args.version,
    };

    let rows = lifecycle.predict(&args.name, overrides).await?;
    print_json(&rows)
}

pub async fn list() -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    print_json(&lifecycle.list().await?)
}

pub async fn delete(args: DeleteArgs) -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    lifecycle.delete(&args.name).await?;
    println!("Deleted {}", args.name);

    Ok(())
}

pub async fn callbacks(command: CallbackCommand) -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    match command {
        CallbackCommand::List => print_json(&lifecycle.callbacks().await?),
        CallbackCommand::Create { url } => print_json(&lifecycle.create_callback(&url).await?),
        CallbackCommand::Delete { id } => {
            lifecycle.delete_callback(id).await?;
            println!("Deleted callback {}", id);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct DueStatus {
    model: String,
    cadence: String,
    last_run: Option<String>,
    due: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn due() -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;
    let table = config.scheduler.schedule_table();

    let statuses: Vec<DueStatus> = lifecycle
        .last_runs()
        .await?
        .into_iter()
        .filter_map(|model| {
            let cadence = model.cadence?;
            let due: Result<bool, DomainError> =
                is_due_now(cadence, &table, model.last_run, &config.scheduler.timezone);

            Some(DueStatus {
                model: model.name,
                cadence: cadence.to_string(),
                last_run: model.last_run.map(|at| at.to_rfc3339()),
                due: due.as_ref().ok().copied(),
                error: due.err().map(|e| e.to_string()),
            })
        })
        .collect();

    print_json(&statuses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_wraps_bare_keys() {
        let (token, value) = parse_param("ID=42").unwrap();
        assert_eq!(token, "$ID$");
        assert_eq!(value, QueryParam::Integer(42));

        let (token, value) = parse_param("$CITY$=Madrid").unwrap();
        assert_eq!(token, "$CITY$");
        assert_eq!(value, QueryParam::Text("Madrid".into()));
    }

    #[test]
    fn test_parse_param_rejects_malformed_input() {
        assert!(parse_param("no-equals").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_callback_subcommands_parse() {
        use crate::cli::{Cli, Command};
        use clap::Parser;

        let cli = Cli::try_parse_from(["mindsdb-models", "callbacks", "delete", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Callbacks(CallbackCommand::Delete { id: 7 })
        ));

        assert!(Cli::try_parse_from(["mindsdb-models", "callbacks", "delete", "x"]).is_err());
    }

    #[test]
    fn test_to_params_keeps_order() {
        let params = to_params(vec![
            ("$B$".into(), QueryParam::Integer(1)),
            ("$A$".into(), QueryParam::Integer(2)),
        ])
        .unwrap();

        let tokens: Vec<&str> = params.iter().map(|(token, _)| token).collect();
        assert_eq!(tokens, vec!["$B$", "$A$"]);
        assert!(to_params(Vec::new()).is_none());
    }
}
