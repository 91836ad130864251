use clap::Parser;
use mindsdb_model_manager::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => cli::run::run().await,
        Command::Sync => cli::model::sync().await,
        Command::Retrain(args) => cli::model::retrain(args).await,
        Command::Finetune(args) => cli::model::finetune(args).await,
        Command::Predict(args) => cli::model::predict(args).await,
        Command::List => cli::model::list().await,
        Command::Delete(args) => cli::model::delete(args).await,
        Command::Due => cli::model::due().await,
        Command::Callbacks(command) => cli::model::callbacks(command).await,
    }
}
