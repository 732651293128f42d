use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use super::args::UploadCliArgs;
use crate::api::UploadRequest;
use crate::pipeline::{MeetingPipeline, PipelineError};

/// Best-effort mime type from the file extension; the backend only needs a
/// rough hint.
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "audio/wav",
    }
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static spinner template"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub async fn handle_upload_command(args: UploadCliArgs) -> Result<()> {
    let (config, client) = super::authed_client()?;
    let language = args
        .language
        .unwrap_or_else(|| config.backend.language.clone());
    let diarization = args.diarization || config.backend.diarization;

    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.wav")
        .to_string();

    let request = UploadRequest {
        mime_type: mime_for_path(&args.file).to_string(),
        data,
        filename,
        language: language.clone(),
        diarization,
        hotwords: args.hotwords,
    };

    let bar = spinner(&format!("Uploading {}...", args.file.display()));
    let pipeline = MeetingPipeline::new(client, &language);
    match pipeline.upload(&request).await {
        Ok(record_id) => {
            bar.finish_and_clear();
            println!("Uploaded as record {record_id}.");
            println!("Transcribe it with: voxminute transcribe {record_id}");
            Ok(())
        }
        Err(PipelineError::Api(e)) => {
            bar.finish_and_clear();
            eprintln!("Upload failed: {}", e.user_message());
            Err(e.into())
        }
        Err(e) => {
            bar.finish_and_clear();
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a.WAV")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("a.m4a")), "audio/mp4");
        assert_eq!(mime_for_path(Path::new("noext")), "audio/wav");
    }
}
