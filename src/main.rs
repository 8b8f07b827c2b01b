use anyhow::Result;
use doc2narration::core::config::Config;
use doc2narration::core::io::{NativeStorage, Storage};
use doc2narration::services::pipeline::{NarrationOutcome, Pipeline};
use doc2narration::services::{llm, setup, tts};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // Voice selection
    setup::run_setup(&mut config).await?;

    let llm = llm::create_llm(&config.llm)?;
    let tts = tts::create_tts_client(&config).await?;
    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());

    let mut documents: Vec<String> = storage
        .list(&config.input_folder)
        .await?
        .into_iter()
        .filter(|p| Path::new(p).is_file())
        .collect();
    documents.sort();

    if documents.is_empty() {
        println!("No documents found in {}", config.input_folder);
        return Ok(());
    }

    let unattended = config.unattended;
    let pipeline = Pipeline::new(config, llm, tts, storage);
    let total = documents.len();

    for (i, path) in documents.iter().enumerate() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.set_message(format!("Narrating {}", path));
        pb.enable_steady_tick(Duration::from_millis(120));

        let outcome = pipeline.handle(path).await;
        pb.finish_and_clear();

        match outcome {
            NarrationOutcome::Narrated(artifact) => {
                println!("{} -> {}", path, artifact.audio_filename);
                println!("{}", artifact.narrative);
            }
            NarrationOutcome::Rejected { message, .. } => {
                println!("{}: {}", path, message);
            }
            NarrationOutcome::Failed { stage, message } => {
                println!("{}: {} ({} stage)", path, message, stage);
            }
        }

        if !unattended && i < total - 1 {
            let ans = inquire::Confirm::new("Continue to next document?")
                .with_default(true)
                .prompt();

            match ans {
                Ok(true) => {}
                Ok(false) => {
                    println!("Stopping as requested.");
                    break;
                }
                Err(_) => {
                    println!("Error reading input, stopping.");
                    break;
                }
            }
        }
    }

    println!("All documents processed!");
    Ok(())
}
