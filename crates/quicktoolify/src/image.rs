use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quicktoolify_core::images::{
    clamp_quality, decode_data_url, download_file_name, format_file_size, parse_target_format,
    quality_label, CompressedFile, ConvertedFile, FileOutcome, FormatHistory, ImageFormat,
    ImageWorkflow, WorkflowKind, COMPRESSION_INPUTS, CONVERSION_INPUTS, CONVERSION_TARGETS,
    DEFAULT_FORMAT, DEFAULT_QUALITY, FORMAT_HISTORY_KEY, MAX_FILE_SIZE, PROCESSING_FAILED_MESSAGE,
    QUALITY_PRESETS,
};
use quicktoolify_core::store::Storage;
use serde::Serialize;

use crate::api::{ApiClient, UploadFile};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "image")]
#[command(about = "Convert or compress images through the API")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Convert images to another format, one request per file
    #[clap(name = "convert")]
    Convert {
        /// Image files (jpeg, png, webp, heic, avif)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target format: jpeg, png, webp or avif
        #[arg(short, long, default_value = DEFAULT_FORMAT)]
        format: String,

        /// Directory to save converted files into
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compress images in a single batch request
    #[clap(name = "compress")]
    Compress {
        /// Image files (jpeg, png, webp)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Quality 1-100 (30 high compression, 60 standard, 80 high quality, 95 best)
        #[arg(short, long, default_value_t = DEFAULT_QUALITY as i64, allow_negative_numbers = true)]
        quality: i64,

        /// Directory to save compressed files into
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show supported formats, quality presets and recent targets
    #[clap(name = "formats")]
    Formats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct RunOutput<T> {
    pub results: Vec<FileOutcome<T>>,
    pub rejected: Vec<String>,
    pub saved: Vec<PathBuf>,
    pub save_errors: Vec<String>,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormatsOutput {
    pub conversion_inputs: Vec<ImageFormat>,
    pub conversion_targets: Vec<ImageFormat>,
    pub compression_inputs: Vec<ImageFormat>,
    pub quality_presets: Vec<(u8, String)>,
    pub recent_targets: Vec<ImageFormat>,
    pub max_file_size: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let client = ApiClient::new(&global.api_endpoint);

    if global.verbose {
        println!("API endpoint: {}", client.base_url());
        println!();
    }

    match app.command {
        Commands::Convert {
            files,
            format,
            out_dir,
            json,
        } => {
            let mut storage = crate::storage::open(&global)?;
            let target = parse_target_format(&format)?;
            remember_target(&mut storage, target);

            let uploads = load_uploads(&files).await?;
            let output = convert_data(&client, uploads, target, !json).await?;
            let output = save(output, out_dir.as_deref(), |file: &ConvertedFile| {
                (
                    file.url.clone(),
                    download_file_name(Some(&file.original_name), file.converted_format.extension()),
                )
            })?;
            print_converted(&output, json)
        }

        Commands::Compress {
            files,
            quality,
            out_dir,
            json,
        } => {
            let uploads = load_uploads(&files).await?;
            let output = compress_data(&client, uploads, quality, !json).await?;
            let output = save(output, out_dir.as_deref(), |file: &CompressedFile| {
                let name = if file.name.is_empty() {
                    file.original_name.clone()
                } else {
                    file.name.clone()
                };
                (file.url.clone(), name)
            })?;
            print_compressed(&output, json)
        }

        Commands::Formats { json } => {
            let storage = crate::storage::open(&global)?;
            formats(&storage, json)
        }
    }
}

async fn load_uploads(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(UploadFile::from_path(path).await?);
    }
    Ok(uploads)
}

/// Uploads indexed by the id their `SelectedFile` carries.
fn upload_slots(uploads: Vec<UploadFile>) -> Vec<Option<UploadFile>> {
    uploads.into_iter().map(Some).collect()
}

fn take_upload(slots: &mut [Option<UploadFile>], id: usize) -> Option<UploadFile> {
    slots.get_mut(id).and_then(Option::take)
}

fn load_history<S: Storage>(storage: &S) -> FormatHistory {
    match storage.get_item(FORMAT_HISTORY_KEY) {
        Ok(Some(raw)) => FormatHistory::from_tokens(&raw),
        Ok(None) => FormatHistory::new(),
        Err(e) => {
            log::warn!("Could not read recent formats: {e}");
            FormatHistory::new()
        }
    }
}

fn remember_target<S: Storage>(storage: &mut S, target: ImageFormat) {
    let mut history = load_history(storage);
    history.push(target);
    if let Err(e) = storage.set_item(FORMAT_HISTORY_KEY, &history.to_tokens()) {
        log::warn!("Could not save recent formats: {e}");
    }
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .map_err(|e| eyre!("Invalid progress template: {e}"))?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn rejected_messages<T>(workflow: &mut ImageWorkflow<T>, uploads: &[UploadFile]) -> Vec<String> {
    let selected = uploads
        .iter()
        .enumerate()
        .map(|(id, upload)| upload.selected().with_id(id))
        .collect();
    let report = workflow.drop_files(selected);
    report.errors.iter().map(|e| e.to_string()).collect()
}

/// Convert files sequentially, one request per file. A request that fails
/// outright abandons the rest of the queue.
pub async fn convert_data(
    client: &ApiClient,
    uploads: Vec<UploadFile>,
    target: ImageFormat,
    show_progress: bool,
) -> Result<RunOutput<ConvertedFile>> {
    let mut workflow = ImageWorkflow::new(WorkflowKind::Convert { target });
    let rejected = rejected_messages(&mut workflow, &uploads);

    let Some(queued) = workflow.begin() else {
        return Ok(RunOutput {
            results: Vec::new(),
            rejected,
            saved: Vec::new(),
            save_errors: Vec::new(),
            progress: 0,
            error: None,
        });
    };

    let bar = if show_progress {
        progress_bar(100)?
    } else {
        ProgressBar::hidden()
    };

    let mut slots = upload_slots(uploads);
    let mut failed = false;
    for file in queued {
        let Some(upload) = take_upload(&mut slots, file.id) else {
            continue;
        };
        bar.set_message(upload.name.clone());

        match client.convert_images(std::slice::from_ref(&upload), target.token()).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    workflow.record_result(outcome);
                }
                bar.set_position(workflow.progress() as u64);
            }
            Err(e) => {
                log::error!("Conversion of {} failed: {e}", upload.name);
                workflow.abort(PROCESSING_FAILED_MESSAGE);
                failed = true;
                break;
            }
        }
    }

    if !failed {
        workflow.finish();
    }
    bar.finish_and_clear();

    Ok(RunOutput {
        progress: workflow.progress(),
        error: workflow.error().map(str::to_string),
        results: workflow.results().to_vec(),
        rejected,
        saved: Vec::new(),
        save_errors: Vec::new(),
    })
}

/// Compress every accepted file in one request.
pub async fn compress_data(
    client: &ApiClient,
    uploads: Vec<UploadFile>,
    quality: i64,
    show_progress: bool,
) -> Result<RunOutput<CompressedFile>> {
    let mut workflow = ImageWorkflow::new(WorkflowKind::Compress);
    let rejected = rejected_messages(&mut workflow, &uploads);

    let Some(queued) = workflow.begin() else {
        return Ok(RunOutput {
            results: Vec::new(),
            rejected,
            saved: Vec::new(),
            save_errors: Vec::new(),
            progress: 0,
            error: None,
        });
    };

    let mut slots = upload_slots(uploads);
    let batch: Vec<UploadFile> = queued
        .iter()
        .filter_map(|file| take_upload(&mut slots, file.id))
        .collect();

    let spinner = if show_progress {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| eyre!("Invalid spinner template: {e}"))?,
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    } else {
        ProgressBar::hidden()
    };
    spinner.set_message(format!(
        "Compressing {} file(s) at {}",
        batch.len(),
        quality_label(clamp_quality(quality))
    ));

    match client.compress_images(&batch, quality).await {
        Ok(outcomes) => {
            workflow.record_batch(outcomes);
            workflow.finish();
        }
        Err(e) => {
            log::error!("Compression failed: {e}");
            workflow.abort(PROCESSING_FAILED_MESSAGE);
        }
    }
    spinner.finish_and_clear();

    Ok(RunOutput {
        progress: workflow.progress(),
        error: workflow.error().map(str::to_string),
        results: workflow.results().to_vec(),
        rejected,
        saved: Vec::new(),
        save_errors: Vec::new(),
    })
}

/// Last path component of a server-supplied name, if it is a plain file name.
fn safe_file_name(name: &str) -> Option<&str> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    (file_name == name && !file_name.is_empty()).then_some(file_name)
}

/// Write each successful result's data URL to `out_dir`. A file that cannot
/// be decoded, named or written is skipped and reported in `save_errors`.
fn save<T>(
    mut output: RunOutput<T>,
    out_dir: Option<&Path>,
    name_of: impl Fn(&T) -> (String, String),
) -> Result<RunOutput<T>> {
    let Some(dir) = out_dir else {
        return Ok(output);
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create {}: {e}", dir.display()))?;

    for outcome in &output.results {
        let FileOutcome::Succeeded(file) = outcome else {
            continue;
        };
        let (url, name) = name_of(file);
        let Some(file_name) = safe_file_name(&name) else {
            log::warn!("Refusing to save result with unsafe name {name:?}");
            output.save_errors.push(format!("Unsafe file name: {name}"));
            continue;
        };
        let data = match decode_data_url(&url) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Cannot decode result for {file_name}: {e}");
                output.save_errors.push(format!("Cannot save {file_name}: {e}"));
                continue;
            }
        };
        let path = dir.join(file_name);
        if let Err(e) = std::fs::write(&path, &data.bytes) {
            log::warn!("Failed to write {}: {e}", path.display());
            output
                .save_errors
                .push(format!("Failed to write {}: {e}", path.display()));
            continue;
        }
        log::debug!("Saved {} ({})", path.display(), data.mime_type);
        output.saved.push(path);
    }

    Ok(output)
}

fn print_problems<T>(output: &RunOutput<T>) {
    for message in &output.rejected {
        eprintln!("{} {}", "Skipped:".yellow().bold(), message);
    }
    if let Some(error) = &output.error {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }
    for message in &output.save_errors {
        eprintln!("{} {}", "Not saved:".yellow().bold(), message);
    }
}

fn print_converted(output: &RunOutput<ConvertedFile>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    print_problems(output);
    if output.results.is_empty() {
        println!("No files were converted.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Original".bold().cyan(),
        "Status".bold().cyan(),
        "Result".bold().cyan(),
        "Size".bold().cyan()
    ]);
    for outcome in &output.results {
        match outcome {
            FileOutcome::Succeeded(file) => table.add_row(prettytable::row![
                file.original_name.bright_white().to_string(),
                "converted".green().to_string(),
                download_file_name(Some(&file.original_name), file.converted_format.extension())
                    .bright_blue()
                    .to_string(),
                format_file_size(file.size).bright_yellow().to_string()
            ]),
            FileOutcome::Failed {
                original_name,
                reason,
            } => table.add_row(prettytable::row![
                original_name.bright_white().to_string(),
                "failed".red().to_string(),
                reason.to_string(),
                ""
            ]),
        };
    }
    table.printstd();
    print_saved(output);

    Ok(())
}

fn print_compressed(output: &RunOutput<CompressedFile>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    print_problems(output);
    if output.results.is_empty() {
        println!("No files were compressed.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Original".bold().cyan(),
        "Status".bold().cyan(),
        "Before".bold().cyan(),
        "After".bold().cyan(),
        "Saved".bold().cyan()
    ]);
    for outcome in &output.results {
        match outcome {
            FileOutcome::Succeeded(file) => table.add_row(prettytable::row![
                file.original_name.bright_white().to_string(),
                "compressed".green().to_string(),
                format_file_size(file.original_size),
                format_file_size(file.compressed_size).bright_yellow().to_string(),
                format!("{:.1}%", file.compression_ratio).green().to_string()
            ]),
            FileOutcome::Failed {
                original_name,
                reason,
            } => table.add_row(prettytable::row![
                original_name.bright_white().to_string(),
                "failed".red().to_string(),
                reason.to_string(),
                "",
                ""
            ]),
        };
    }
    table.printstd();
    print_saved(output);

    Ok(())
}

fn print_saved<T>(output: &RunOutput<T>) {
    for path in &output.saved {
        println!("{} {}", "Saved:".green().bold(), path.display());
    }
}

/// Supported formats plus the persisted recent targets.
pub fn formats_data<S: Storage>(storage: &S) -> FormatsOutput {
    FormatsOutput {
        conversion_inputs: CONVERSION_INPUTS.to_vec(),
        conversion_targets: CONVERSION_TARGETS.to_vec(),
        compression_inputs: COMPRESSION_INPUTS.to_vec(),
        quality_presets: QUALITY_PRESETS
            .iter()
            .map(|(value, label)| (*value, label.to_string()))
            .collect(),
        recent_targets: load_history(storage).recent().to_vec(),
        max_file_size: format_file_size(MAX_FILE_SIZE),
    }
}

fn formats<S: Storage>(storage: &S, json: bool) -> Result<()> {
    let output = formats_data(storage);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let join = |formats: &[ImageFormat]| {
        formats
            .iter()
            .map(|f| f.token())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("{} {}", "Convert from:".bold(), join(&output.conversion_inputs));
    println!("{} {}", "Convert to:".bold(), join(&output.conversion_targets));
    println!("{} {}", "Compress:".bold(), join(&output.compression_inputs));
    println!("{} {}", "Max file size:".bold(), output.max_file_size);
    if !output.recent_targets.is_empty() {
        println!("{} {}", "Recent targets:".bold(), join(&output.recent_targets));
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["Quality".bold().cyan(), "Preset".bold().cyan()]);
    for (value, label) in &output.quality_presets {
        table.add_row(prettytable::row![value.to_string().bright_yellow().to_string(), label]);
    }
    table.printstd();

    Ok(())
}
