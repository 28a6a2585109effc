use anyhow::{Context, Result};
use clap::Parser;
use mmlu_eval_workflow::{
    DatasetLoader, EvaluationPipeline, OpenAiBackend, PromptBuilder, ReportWriter, ResultRecord,
    RunOptions, SubjectEvaluator, TiktokenCounter,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

mod cli;
mod config;
mod output;

use cli::{Cli, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = config::Config::load(cli.config.as_deref())?.apply_cli(&cli);
    config.validate().context("Invalid configuration")?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        save_dir = %config.save_dir.display(),
        backend = %config.backend,
        style = %config.style,
        "Configuration loaded"
    );

    let tokenizer = TiktokenCounter::for_model(&config.tokenizer_model)
        .context("Failed to load tokenizer")?;
    let prompts =
        PromptBuilder::new(Arc::new(tokenizer)).with_max_prefix_tokens(config.max_prefix_tokens);
    let backend = OpenAiBackend::new(config.inference()).context("Failed to create backend")?;

    let evaluator = SubjectEvaluator::new(config.evaluation(), prompts, Arc::new(backend))
        .context("Invalid sampling parameters")?;
    let pipeline = EvaluationPipeline::new(DatasetLoader::new(config.data_loading()), evaluator);

    let subjects = pipeline
        .discover_subjects()
        .await
        .context("Failed to discover subjects")?;

    let progress = output::SubjectProgress::new(subjects.len());
    let summary = pipeline
        .run(&subjects, |result| progress.subject_done(result))
        .await;
    progress.finish();
    let summary = summary.context("Benchmark run failed")?;

    output::print_summary(&summary);

    let record = ResultRecord::from_summary(
        &summary,
        pipeline.evaluator().backend().name(),
        config.num_gpus,
        RunOptions {
            nsub: config.nsub,
            parallel: config.parallel,
        },
    );
    ReportWriter::new(&config.result_file)
        .append(&record)
        .await
        .with_context(|| format!("Failed to write {}", config.result_file.display()))?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mmlu_eval=info,mmlu_eval_workflow=warn,mmlu_eval_metrics=warn".into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
