use clap::Parser;
use std::sync::Arc;
use survey_report::adapters::build_counter;
use survey_report::utils::error::ErrorSeverity;
use survey_report::utils::logger;
use survey_report::{
    CliConfig, LocalStorage, OpenAiClient, ReportEngine, ReportError, ResolvedConfig, Summarizer,
    SurveyPipeline,
};

fn exit_with(e: &ReportError) -> ! {
    tracing::error!(
        "❌ Survey report failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn build_pipeline(config: ResolvedConfig) -> Result<SurveyPipeline<LocalStorage, ResolvedConfig>, ReportError> {
    let model = OpenAiClient::new(&config.llm, config.api_key.expose())?;
    tracing::info!("Using model {} at {}", model.model(), config.llm.base_url);

    let counter = build_counter(config.tokenizer)?;
    let summarizer = Summarizer::new(
        Arc::new(model),
        counter,
        config.prompts.clone(),
        config.token_threshold,
    );
    let storage = LocalStorage::new(config.output_path.clone());

    Ok(SurveyPipeline::new(storage, config, summarizer))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting survey-report CLI");

    // 任何處理開始前先驗證輸入
    let config = cli.resolve().unwrap_or_else(|e| exit_with(&e));
    tracing::debug!("Resolved config: {:?}", config);

    let pipeline = build_pipeline(config).unwrap_or_else(|e| exit_with(&e));
    let engine = ReportEngine::new(pipeline);

    let run = engine.run().await.unwrap_or_else(|e| exit_with(&e));

    println!("{}", run.report.heading());
    for question in &run.report.questions {
        println!();
        println!("{}", question.heading());
        println!("{}", question.display_text());
    }
    if let Some(overall) = &run.report.overall_summary {
        println!();
        println!("Overall Summary");
        println!("{}", overall);
    }
    println!();

    let failed = run.report.failed_count();
    if failed > 0 {
        println!(
            "⚠️ {} question(s) could not be summarized; see the report for details",
            failed
        );
    } else {
        println!("✅ Responses have been processed");
    }
    for path in &run.written {
        println!("📁 Report saved to: {}", path);
    }

    Ok(())
}
