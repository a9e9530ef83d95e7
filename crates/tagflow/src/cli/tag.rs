//! The `tagflow tag` command: run the classification pipeline over image files.

use std::path::PathBuf;

use clap::Args;
use tagflow_core::{
    worker, ClassificationCoordinator, Config, FsModelStore, HttpModelStore, InferenceEngine,
    TagField, UploadEvent, WorkerHandle,
};

/// Arguments for the `tag` command.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Image files to classify
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Model name (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Model artifact base: a directory or an http(s) URL (overrides config)
    #[arg(long)]
    pub base: Option<String>,

    /// Emit results as JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// Execute the tag command.
pub async fn execute(args: TagArgs, config: Config) -> anyhow::Result<()> {
    let model_name = args
        .model
        .clone()
        .unwrap_or_else(|| config.model.name.clone());
    let base = args.base.clone().unwrap_or_else(|| config.model_base());

    let worker = spawn_worker(&base, config.worker.channel_capacity);
    let mut coordinator = ClassificationCoordinator::new(worker, config.limits.clone());

    coordinator.start(&model_name).await?;
    tracing::info!("Model {:?} loaded from {}", model_name, base);

    submit_files(&mut coordinator, &args.images).await?;
    coordinator.drain().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(coordinator.results())?);
    } else {
        for field in coordinator.fields() {
            println!("{}: {}", field.id(), field.value().unwrap_or(""));
        }
    }
    Ok(())
}

/// Submit each file, registering a tag field only for accepted submissions
/// so that skipped non-images cannot shift the positional field fill.
async fn submit_files(
    coordinator: &mut ClassificationCoordinator,
    images: &[PathBuf],
) -> anyhow::Result<()> {
    for path in images {
        let upload = UploadEvent::from_path(path)?;
        if coordinator.submit(upload).await? {
            coordinator.add_field(TagField::new(path.display().to_string()));
        } else {
            tracing::warn!("Skipping non-image file {:?}", path);
        }
    }
    Ok(())
}

/// Spawn a worker backed by the appropriate store for `base`.
fn spawn_worker(base: &str, channel_capacity: usize) -> WorkerHandle {
    if base.starts_with("http://") || base.starts_with("https://") {
        worker::spawn(
            InferenceEngine::new(HttpModelStore::new(base)),
            channel_capacity,
        )
    } else {
        worker::spawn(
            InferenceEngine::new(FsModelStore::new(base)),
            channel_capacity,
        )
    }
}
