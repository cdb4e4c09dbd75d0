//! Image conversion and compression: drop validation, the per-widget workflow
//! state machine, and decoding of the conversion API's responses.
//!
//! The API reports per-file failures by putting `error:<reason>` in the `url`
//! field of an otherwise successful response. That convention is translated
//! into [`FileOutcome::Failed`] in [`decode_converted`] / [`decode_compressed`]
//! and never leaks past them.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upload ceiling shared by conversion and compression.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Prefix marking a failed entry inside a result's `url` field.
pub const ERROR_SENTINEL: &str = "error:";

pub const DEFAULT_FORMAT: &str = "webp";
pub const DEFAULT_QUALITY: u8 = 60;

/// Shown when a request fails outright; the remaining queue is abandoned.
pub const PROCESSING_FAILED_MESSAGE: &str =
    "An error occurred while processing. Please try again.";

const FORMAT_HISTORY_LIMIT: usize = 5;

/// Storage key holding the recent conversion targets.
pub const FORMAT_HISTORY_KEY: &str = "recentImageFormats";

// ============================================================================
// Formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Heic,
    Avif,
}

/// Formats the conversion API can produce.
pub const CONVERSION_TARGETS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Webp,
    ImageFormat::Avif,
];

/// Inputs accepted by the converter.
pub const CONVERSION_INPUTS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Webp,
    ImageFormat::Heic,
    ImageFormat::Avif,
];

/// Inputs accepted by the compressor.
pub const COMPRESSION_INPUTS: [ImageFormat; 3] =
    [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Webp];

impl ImageFormat {
    /// Lowercase token sent to the API.
    pub fn token(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Heic => "heic",
            ImageFormat::Avif => "avif",
        }
    }

    /// File extension used for outputs of this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            other => other.token(),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Heic => "image/heic",
            ImageFormat::Avif => "image/avif",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "heic" => Some(ImageFormat::Heic),
            "avif" => Some(ImageFormat::Avif),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::Webp),
            "image/heic" => Some(ImageFormat::Heic),
            "image/avif" => Some(ImageFormat::Avif),
            _ => None,
        }
    }

    /// Format implied by a file name's last extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Normalise a user-supplied format token: lowercase, empty means `webp`.
pub fn normalize_format_token(format: &str) -> String {
    let format = format.trim().to_lowercase();
    if format.is_empty() {
        DEFAULT_FORMAT.to_string()
    } else {
        format
    }
}

/// Parse a conversion target, accepting `jpg` as an alias for `jpeg`.
pub fn parse_target_format(format: &str) -> Result<ImageFormat, ImageValidationError> {
    let token = normalize_format_token(format);
    ImageFormat::from_extension(&token)
        .filter(|f| CONVERSION_TARGETS.contains(f))
        .ok_or(ImageValidationError::UnsupportedTarget(token))
}

/// Clamp a quality setting to `1..=100`; anything outside falls back to 60.
pub fn clamp_quality(quality: i64) -> u8 {
    if (1..=100).contains(&quality) {
        quality as u8
    } else {
        DEFAULT_QUALITY
    }
}

pub const QUALITY_PRESETS: [(u8, &str); 4] = [
    (30, "High compression"),
    (60, "Standard"),
    (80, "High quality"),
    (95, "Best quality"),
];

pub fn quality_label(quality: u8) -> String {
    QUALITY_PRESETS
        .iter()
        .find(|(value, _)| *value == quality)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("Custom ({quality}%)"))
}

/// Recently chosen conversion targets, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatHistory {
    entries: Vec<ImageFormat>,
}

impl FormatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, format: ImageFormat) {
        self.entries.retain(|f| *f != format);
        self.entries.insert(0, format);
        self.entries.truncate(FORMAT_HISTORY_LIMIT);
    }

    pub fn recent(&self) -> &[ImageFormat] {
        &self.entries
    }

    /// Comma-separated tokens, most recent first, as persisted under
    /// [`FORMAT_HISTORY_KEY`].
    pub fn to_tokens(&self) -> String {
        self.entries
            .iter()
            .map(|f| f.token())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Inverse of [`FormatHistory::to_tokens`]. Unknown tokens are skipped.
    pub fn from_tokens(raw: &str) -> Self {
        let mut history = Self::new();
        for format in raw.rsplit(',').filter_map(ImageFormat::from_extension) {
            history.push(format);
        }
        history
    }
}

// ============================================================================
// Drop validation
// ============================================================================

/// A file the user picked, before upload. `id` is the caller's handle back to
/// the file's bytes; names are not unique across directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub id: usize,
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size: u64, content_type: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            size,
            content_type: content_type.into(),
        }
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Format from the declared type, falling back to the extension.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime(&self.content_type).or_else(|| ImageFormat::from_file_name(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageValidationError {
    #[error("File size exceeds {limit_mb}MB: {}", .names.join(", "))]
    Oversized { names: Vec<String>, limit_mb: u64 },

    #[error("Source and target format are the same: {}", .names.join(", "))]
    SameFormat { names: Vec<String> },

    #[error("Unsupported file format cannot be selected: {}", .names.join(", "))]
    Unsupported { names: Vec<String> },

    #[error("Cannot add new files while processing")]
    Busy,

    #[error("Unsupported target format: {0}")]
    UnsupportedTarget(String),
}

/// What a workflow does with the files it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Convert { target: ImageFormat },
    Compress,
}

impl WorkflowKind {
    fn accepts(self, format: ImageFormat) -> bool {
        match self {
            WorkflowKind::Convert { .. } => CONVERSION_INPUTS.contains(&format),
            WorkflowKind::Compress => COMPRESSION_INPUTS.contains(&format),
        }
    }
}

/// Outcome of validating one drop: the files that may proceed plus one error
/// per kind of problem found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReport {
    pub accepted: Vec<SelectedFile>,
    pub errors: Vec<ImageValidationError>,
}

impl DropReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Split a batch into accepted files and per-batch errors.
pub fn validate_drop(files: Vec<SelectedFile>, kind: WorkflowKind) -> DropReport {
    let mut report = DropReport::default();
    let mut oversized = Vec::new();
    let mut unsupported = Vec::new();
    let mut same_format = Vec::new();

    for file in files {
        if file.size > MAX_FILE_SIZE {
            oversized.push(file.name);
            continue;
        }

        let Some(format) = file.format().filter(|f| kind.accepts(*f)) else {
            unsupported.push(file.name);
            continue;
        };

        if let WorkflowKind::Convert { target } = kind {
            if ImageFormat::from_file_name(&file.name) == Some(target) || format == target {
                same_format.push(file.name);
                continue;
            }
        }

        report.accepted.push(file);
    }

    if !oversized.is_empty() {
        report.errors.push(ImageValidationError::Oversized {
            names: oversized,
            limit_mb: MAX_FILE_SIZE / (1024 * 1024),
        });
    }
    if !unsupported.is_empty() {
        report
            .errors
            .push(ImageValidationError::Unsupported { names: unsupported });
    }
    if !same_format.is_empty() {
        report
            .errors
            .push(ImageValidationError::SameFormat { names: same_format });
    }

    report
}

// ============================================================================
// Results
// ============================================================================

/// Per-file result: either the payload or the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome<T> {
    Succeeded(T),
    Failed { original_name: String, reason: String },
}

impl<T> FileOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Succeeded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFile {
    pub original_name: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub converted_format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressedFile {
    pub original_name: String,
    pub name: String,
    pub url: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
}

/// One entry of the `/convert/images` response.
///
/// Accepts camelCase as well as the snake_case the backend actually emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFileWire {
    #[serde(default, alias = "original_name")]
    pub original_name: String,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub files: Vec<ConvertedFileWire>,
}

/// One entry of the `/compress/images` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedFileWire {
    #[serde(default, alias = "original_name")]
    pub original_name: String,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default, alias = "original_size")]
    pub original_size: u64,
    #[serde(default, alias = "compressed_size")]
    pub compressed_size: u64,
    #[serde(default, alias = "compression_ratio")]
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressResponse {
    pub files: Vec<CompressedFileWire>,
}

fn sentinel_reason(url: &str) -> Option<&str> {
    url.strip_prefix(ERROR_SENTINEL)
}

pub fn decode_converted(wire: ConvertedFileWire, target: ImageFormat) -> FileOutcome<ConvertedFile> {
    if let Some(reason) = sentinel_reason(&wire.url) {
        return FileOutcome::Failed {
            original_name: wire.original_name,
            reason: reason.to_string(),
        };
    }
    FileOutcome::Succeeded(ConvertedFile {
        original_name: wire.original_name,
        name: wire.name,
        url: wire.url,
        size: wire.size,
        converted_format: target,
    })
}

pub fn decode_compressed(wire: CompressedFileWire) -> FileOutcome<CompressedFile> {
    if let Some(reason) = sentinel_reason(&wire.url) {
        return FileOutcome::Failed {
            original_name: wire.original_name,
            reason: reason.to_string(),
        };
    }
    FileOutcome::Succeeded(CompressedFile {
        original_name: wire.original_name,
        name: wire.name,
        url: wire.url,
        original_size: wire.original_size,
        compressed_size: wire.compressed_size,
        compression_ratio: wire.compression_ratio,
    })
}

/// Decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn decode_data_url(url: &str) -> Result<DataUrl, String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "Not a data URL".to_string())?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| "Data URL has no payload".to_string())?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| "Only base64 data URLs are supported".to_string())?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("Invalid base64 payload: {e}"))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Name a converted file is saved under: the original stem plus the new
/// extension, or `converted_image.<ext>` when there is no usable stem.
pub fn download_file_name(original_name: Option<&str>, extension: &str) -> String {
    let stem = original_name
        .and_then(|name| name.rsplit_once('.').map(|(stem, _)| stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or("converted_image");
    format!("{stem}.{extension}")
}

/// Human readable size in base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    let mut number = format!("{rounded:.2}");
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.pop();
    }
    format!("{number} {}", UNITS[exponent])
}

/// Completed-over-total as a rounded percentage.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed.min(total) as f64 / total as f64 * 100.0).round();
    pct as u8
}

// ============================================================================
// Workflow state machine
// ============================================================================

/// Every validation error of one drop on a single line.
fn error_summary(errors: &[ImageValidationError]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Processing { total: usize, completed: usize },
}

/// One image widget: queue, progress, accumulated results and the last
/// user-visible error.
#[derive(Debug)]
pub struct ImageWorkflow<T> {
    kind: WorkflowKind,
    state: WorkflowState,
    queue: Vec<SelectedFile>,
    results: Vec<FileOutcome<T>>,
    progress: u8,
    error: Option<String>,
}

impl<T> ImageWorkflow<T> {
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            state: WorkflowState::Idle,
            queue: Vec::new(),
            results: Vec::new(),
            progress: 0,
            error: None,
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, WorkflowState::Processing { .. })
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn queued(&self) -> &[SelectedFile] {
        &self.queue
    }

    pub fn results(&self) -> &[FileOutcome<T>] {
        &self.results
    }

    /// Change the conversion target. Ignored while processing. Queued files
    /// are validated again against the new target, so a file that now
    /// matches it drops out of the queue with a same-format error.
    pub fn set_target(&mut self, target: ImageFormat) -> bool {
        match self.kind {
            WorkflowKind::Convert { .. } if !self.is_processing() => {
                self.kind = WorkflowKind::Convert { target };
                let report = validate_drop(std::mem::take(&mut self.queue), self.kind);
                self.error = error_summary(&report.errors);
                self.queue = report.accepted;
                true
            }
            _ => false,
        }
    }

    /// Validate and queue a batch. While processing the whole batch is
    /// rejected.
    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> DropReport {
        if self.is_processing() {
            self.error = Some(ImageValidationError::Busy.to_string());
            return DropReport {
                accepted: Vec::new(),
                errors: vec![ImageValidationError::Busy],
            };
        }

        let report = validate_drop(files, self.kind);
        if let Some(summary) = error_summary(&report.errors) {
            self.error = Some(summary);
        }
        self.queue.extend(report.accepted.iter().cloned());
        report
    }

    /// Enter Processing with everything queued, handing the files to the
    /// caller. Returns `None` when idle with an empty queue or already busy.
    pub fn begin(&mut self) -> Option<Vec<SelectedFile>> {
        if self.is_processing() || self.queue.is_empty() {
            return None;
        }
        let files = std::mem::take(&mut self.queue);
        self.state = WorkflowState::Processing {
            total: files.len(),
            completed: 0,
        };
        self.progress = 0;
        self.error = None;
        Some(files)
    }

    /// Record one file's outcome. Outcomes arriving while idle (for example
    /// after an abort) are dropped and `false` is returned.
    pub fn record_result(&mut self, outcome: FileOutcome<T>) -> bool {
        let WorkflowState::Processing { total, completed } = self.state else {
            return false;
        };
        let completed = (completed + 1).min(total);
        self.results.push(outcome);
        self.state = WorkflowState::Processing { total, completed };
        self.progress = self.progress.max(progress_percent(completed, total));
        true
    }

    /// Record a whole batch returned by a single request.
    pub fn record_batch(&mut self, outcomes: Vec<FileOutcome<T>>) -> bool {
        let WorkflowState::Processing { total, .. } = self.state else {
            return false;
        };
        self.results.extend(outcomes);
        self.state = WorkflowState::Processing {
            total,
            completed: total,
        };
        self.progress = 100;
        true
    }

    /// Leave Processing normally.
    pub fn finish(&mut self) {
        if let WorkflowState::Processing { total, completed } = self.state {
            if completed >= total {
                self.progress = 100;
            }
        }
        self.state = WorkflowState::Idle;
        self.queue.clear();
    }

    /// Leave Processing after an unrecoverable failure.
    pub fn abort(&mut self, message: impl Into<String>) {
        self.state = WorkflowState::Idle;
        self.queue.clear();
        self.error = Some(message.into());
    }

    /// Drop queued files and accumulated results.
    pub fn clear(&mut self) {
        if !self.is_processing() {
            self.queue.clear();
            self.results.clear();
            self.progress = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: u64) -> SelectedFile {
        SelectedFile::new(name, size, "image/png")
    }

    fn webp_target() -> WorkflowKind {
        WorkflowKind::Convert {
            target: ImageFormat::Webp,
        }
    }

    // ============================================================================
    // Formats
    // ============================================================================

    #[test]
    fn test_format_from_extension_aliases() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(
            ImageFormat::from_file_name("archive.tar.avif"),
            Some(ImageFormat::Avif)
        );
        assert_eq!(ImageFormat::from_file_name("noext"), None);
    }

    #[test]
    fn test_normalize_format_token() {
        assert_eq!(normalize_format_token(""), "webp");
        assert_eq!(normalize_format_token("  "), "webp");
        assert_eq!(normalize_format_token("PNG"), "png");
    }

    #[test]
    fn test_parse_target_format() {
        assert_eq!(parse_target_format("jpg"), Ok(ImageFormat::Jpeg));
        assert_eq!(parse_target_format(""), Ok(ImageFormat::Webp));
        assert_eq!(
            parse_target_format("heic"),
            Err(ImageValidationError::UnsupportedTarget("heic".to_string()))
        );
    }

    #[test]
    fn test_clamp_quality() {
        assert_eq!(clamp_quality(1), 1);
        assert_eq!(clamp_quality(100), 100);
        assert_eq!(clamp_quality(0), 60);
        assert_eq!(clamp_quality(101), 60);
        assert_eq!(clamp_quality(-5), 60);
    }

    #[test]
    fn test_quality_label() {
        assert_eq!(quality_label(60), "Standard");
        assert_eq!(quality_label(95), "Best quality");
        assert_eq!(quality_label(42), "Custom (42%)");
    }

    #[test]
    fn test_format_history_tokens_round_trip() {
        let mut history = FormatHistory::new();
        history.push(ImageFormat::Png);
        history.push(ImageFormat::Jpeg);
        assert_eq!(history.to_tokens(), "jpeg,png");

        let restored = FormatHistory::from_tokens("jpeg,bogus,png");
        assert_eq!(restored.recent(), &[ImageFormat::Jpeg, ImageFormat::Png]);
        assert!(FormatHistory::from_tokens("").recent().is_empty());
    }

    #[test]
    fn test_format_history_dedups_and_caps() {
        let mut history = FormatHistory::new();
        for f in [
            ImageFormat::Png,
            ImageFormat::Webp,
            ImageFormat::Png,
            ImageFormat::Avif,
            ImageFormat::Jpeg,
            ImageFormat::Heic,
            ImageFormat::Webp,
        ] {
            history.push(f);
        }
        assert_eq!(
            history.recent(),
            &[
                ImageFormat::Webp,
                ImageFormat::Heic,
                ImageFormat::Jpeg,
                ImageFormat::Avif,
                ImageFormat::Png
            ]
        );
    }

    // ============================================================================
    // Validation
    // ============================================================================

    #[test]
    fn test_same_format_rejected() {
        let report = validate_drop(
            vec![SelectedFile::new("photo.webp", 1024, "image/webp")],
            webp_target(),
        );
        assert!(report.accepted.is_empty());
        assert_eq!(
            report.errors,
            vec![ImageValidationError::SameFormat {
                names: vec!["photo.webp".to_string()]
            }]
        );
    }

    #[test]
    fn test_jpg_counts_as_jpeg_target() {
        let report = validate_drop(
            vec![SelectedFile::new("a.JPG", 10, "image/jpeg")],
            WorkflowKind::Convert {
                target: ImageFormat::Jpeg,
            },
        );
        assert!(report.accepted.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_different_format_accepted() {
        let report = validate_drop(vec![png("photo.png", 2048)], webp_target());
        assert_eq!(report.accepted.len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_oversized_rejected_with_name() {
        let report = validate_drop(
            vec![png("big.png", 11 * 1024 * 1024), png("small.png", 100)],
            webp_target(),
        );
        assert_eq!(report.accepted, vec![png("small.png", 100)]);
        let message = report.errors[0].to_string();
        assert!(message.contains("10MB"));
        assert!(message.contains("big.png"));
    }

    #[test]
    fn test_exactly_at_limit_accepted() {
        let report = validate_drop(vec![png("edge.png", MAX_FILE_SIZE)], webp_target());
        assert_eq!(report.accepted.len(), 1);
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let report = validate_drop(
            vec![SelectedFile::new("anim.gif", 10, "image/gif")],
            webp_target(),
        );
        assert!(report.accepted.is_empty());
        assert!(matches!(
            report.errors[0],
            ImageValidationError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_compress_rejects_heic() {
        let report = validate_drop(
            vec![
                SelectedFile::new("a.heic", 10, "image/heic"),
                SelectedFile::new("b.webp", 10, "image/webp"),
            ],
            WorkflowKind::Compress,
        );
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].name, "b.webp");
    }

    #[test]
    fn test_one_error_per_kind() {
        let report = validate_drop(
            vec![
                png("a.png", 11 * 1024 * 1024),
                png("b.png", 12 * 1024 * 1024),
                SelectedFile::new("c.webp", 1, "image/webp"),
                SelectedFile::new("d.bmp", 1, "image/bmp"),
            ],
            webp_target(),
        );
        assert_eq!(report.errors.len(), 3);
        assert_eq!(
            report.errors[0],
            ImageValidationError::Oversized {
                names: vec!["a.png".to_string(), "b.png".to_string()],
                limit_mb: 10
            }
        );
    }

    // ============================================================================
    // Decoding
    // ============================================================================

    #[test]
    fn test_decode_converted_success_and_failure() {
        let ok = ConvertedFileWire {
            original_name: "a.png".to_string(),
            name: "x.webp".to_string(),
            url: "data:image/webp;base64,AAAA".to_string(),
            size: 3,
        };
        assert!(decode_converted(ok, ImageFormat::Webp).is_success());

        let failed = ConvertedFileWire {
            original_name: "b.png".to_string(),
            name: String::new(),
            url: "error:unsupported colorspace".to_string(),
            size: 0,
        };
        assert_eq!(
            decode_converted(failed, ImageFormat::Webp),
            FileOutcome::Failed {
                original_name: "b.png".to_string(),
                reason: "unsupported colorspace".to_string()
            }
        );
    }

    #[test]
    fn test_wire_accepts_both_casings() {
        let camel: CompressResponse = serde_json::from_str(
            r#"{"files":[{"originalName":"a.png","name":"a.png","url":"u","originalSize":10,"compressedSize":5,"compressionRatio":50.0}]}"#,
        )
        .unwrap();
        let snake: CompressResponse = serde_json::from_str(
            r#"{"files":[{"original_name":"a.png","name":"a.png","url":"u","original_size":10,"compressed_size":5,"compression_ratio":50.0}]}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.files[0].compressed_size, 5);
    }

    #[test]
    fn test_decode_compressed_failure() {
        let wire = CompressedFileWire {
            original_name: "c.jpg".to_string(),
            name: String::new(),
            url: "error:".to_string(),
            original_size: 0,
            compressed_size: 0,
            compression_ratio: 0.0,
        };
        assert!(!decode_compressed(wire).is_success());
    }

    #[test]
    fn test_decode_data_url() {
        let decoded = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, b"hello");

        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name(Some("photo.png"), "webp"), "photo.webp");
        assert_eq!(download_file_name(Some("my.photo.png"), "jpg"), "my.photo.jpg");
        assert_eq!(download_file_name(Some("noext"), "png"), "converted_image.png");
        assert_eq!(download_file_name(None, "avif"), "converted_image.avif");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 0), 0);
    }

    // ============================================================================
    // Workflow
    // ============================================================================

    fn converted(name: &str) -> FileOutcome<ConvertedFile> {
        FileOutcome::Succeeded(ConvertedFile {
            original_name: name.to_string(),
            name: name.to_string(),
            url: "data:image/webp;base64,".to_string(),
            size: 1,
            converted_format: ImageFormat::Webp,
        })
    }

    #[test]
    fn test_same_format_drop_does_not_start_processing() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![SelectedFile::new("photo.webp", 1, "image/webp")]);
        assert!(wf.begin().is_none());
        assert!(!wf.is_processing());
        assert!(wf.error().unwrap().contains("photo.webp"));
    }

    #[test]
    fn test_sequential_run_progress_is_monotonic() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![png("a.png", 1), png("b.png", 1), png("c.png", 1)]);
        let files = wf.begin().unwrap();
        assert_eq!(files.len(), 3);
        assert!(wf.queued().is_empty());

        let mut last = 0;
        for file in &files {
            assert!(wf.record_result(converted(&file.name)));
            assert!(wf.progress() >= last);
            last = wf.progress();
        }
        assert_eq!(wf.progress(), 100);
        wf.finish();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(wf.results().len(), 3);
    }

    #[test]
    fn test_drop_while_processing_is_rejected() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![png("a.png", 1)]);
        wf.begin().unwrap();

        let report = wf.drop_files(vec![png("b.png", 1)]);
        assert!(report.accepted.is_empty());
        assert_eq!(report.errors, vec![ImageValidationError::Busy]);
        assert!(wf.queued().is_empty());
        assert!(wf.begin().is_none());
    }

    #[test]
    fn test_abort_returns_to_idle_and_ignores_late_results() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![png("a.png", 1), png("b.png", 1)]);
        wf.begin().unwrap();
        wf.record_result(converted("a.png"));
        wf.abort(PROCESSING_FAILED_MESSAGE);

        assert!(!wf.is_processing());
        assert_eq!(wf.error(), Some(PROCESSING_FAILED_MESSAGE));
        assert!(!wf.record_result(converted("b.png")));
        assert_eq!(wf.results().len(), 1);
    }

    #[test]
    fn test_results_accumulate_across_runs_until_clear() {
        let mut wf: ImageWorkflow<CompressedFile> = ImageWorkflow::new(WorkflowKind::Compress);
        for name in ["a.png", "b.png"] {
            wf.drop_files(vec![png(name, 1)]);
            wf.begin().unwrap();
            wf.record_batch(vec![FileOutcome::Failed {
                original_name: name.to_string(),
                reason: "nope".to_string(),
            }]);
            wf.finish();
        }
        assert_eq!(wf.results().len(), 2);
        wf.clear();
        assert!(wf.results().is_empty());
    }

    #[test]
    fn test_set_target_clears_error_but_not_while_busy() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![SelectedFile::new("x.webp", 1, "image/webp")]);
        assert!(wf.error().is_some());
        assert!(wf.set_target(ImageFormat::Png));
        assert!(wf.error().is_none());

        wf.drop_files(vec![SelectedFile::new("x.webp", 1, "image/webp")]);
        wf.begin().unwrap();
        assert!(!wf.set_target(ImageFormat::Avif));

        let mut compress: ImageWorkflow<CompressedFile> = ImageWorkflow::new(WorkflowKind::Compress);
        assert!(!compress.set_target(ImageFormat::Png));
    }

    #[test]
    fn test_set_target_revalidates_queue() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![png("photo.png", 1), SelectedFile::new("b.jpg", 1, "image/jpeg")]);
        assert_eq!(wf.queued().len(), 2);

        assert!(wf.set_target(ImageFormat::Png));
        assert_eq!(wf.queued().len(), 1);
        assert_eq!(wf.queued()[0].name, "b.jpg");
        assert!(wf.error().unwrap().contains("photo.png"));

        let files = wf.begin().unwrap();
        assert!(files.iter().all(|f| f.format() != Some(ImageFormat::Png)));
    }

    #[test]
    fn test_set_target_to_queued_format_leaves_nothing_to_begin() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![png("photo.png", 1)]);
        wf.set_target(ImageFormat::Png);
        assert!(wf.begin().is_none());
        assert!(!wf.is_processing());
    }

    #[test]
    fn test_drop_error_keeps_every_kind() {
        let mut wf: ImageWorkflow<ConvertedFile> = ImageWorkflow::new(webp_target());
        wf.drop_files(vec![
            png("big.png", MAX_FILE_SIZE + 1),
            SelectedFile::new("anim.gif", 1, "image/gif"),
            SelectedFile::new("same.webp", 1, "image/webp"),
        ]);
        let error = wf.error().unwrap();
        assert!(error.contains("big.png"));
        assert!(error.contains("anim.gif"));
        assert!(error.contains("same.webp"));
    }

    #[test]
    fn test_validate_drop_keeps_ids() {
        let report = validate_drop(
            vec![png("photo.png", MAX_FILE_SIZE + 1).with_id(0), png("photo.png", 1).with_id(1)],
            webp_target(),
        );
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].id, 1);
    }
}
