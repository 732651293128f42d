//! Interactive recording command.
//!
//! Runs the recording session on the main task (the capture stream is not
//! Send) and drives it from single-letter stdin commands. The finished WAV
//! can be kept locally, uploaded, or both.

use anyhow::{Context, Result};
use dialoguer::Confirm;
use std::io::{BufRead, Write};
use tracing::debug;

use super::args::RecordCliArgs;
use crate::api::UploadRequest;
use crate::global;
use crate::pipeline::MeetingPipeline;
use crate::recording::{format_duration, MicCaptureSource, RecordingBlob, RecordingSession};

pub async fn handle_record_command(args: RecordCliArgs) -> Result<()> {
    let (config, client) = super::authed_client()?;
    let language = args
        .language
        .clone()
        .unwrap_or_else(|| config.backend.language.clone());
    let diarization = args.diarization || config.backend.diarization;

    // A missing microphone is reported once; there is nothing to retry.
    let capture = match MicCaptureSource::new(config.recording.sample_rate) {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("Cannot start recording: {e}");
            return Err(e.into());
        }
    };

    let mut session = RecordingSession::new(Box::new(capture));
    session.start()?;

    println!("Recording. Commands: [p]ause, [r]esume, [s]top, [d]iscard");
    let blob = match drive_session(&mut session)? {
        Some(blob) => blob,
        None => {
            println!("No recording produced.");
            return Ok(());
        }
    };

    println!(
        "Recorded {} ({} KiB)",
        format_duration(blob.duration_seconds),
        blob.data.len() / 1024
    );

    if args.output.is_some() || config.recording.save_copies {
        let path = match &args.output {
            Some(path) => path.clone(),
            None => {
                let dir = global::recordings_dir()?;
                std::fs::create_dir_all(&dir).context("Failed to create recordings directory")?;
                dir.join(&blob.filename)
            }
        };
        std::fs::write(&path, &blob.data).context("Failed to write recording")?;
        println!("Saved to {}", path.display());
    }

    if args.no_upload {
        return Ok(());
    }
    let upload = Confirm::new()
        .with_prompt("Upload this recording?")
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;
    if !upload {
        return Ok(());
    }

    let request = UploadRequest {
        data: blob.data,
        filename: blob.filename,
        mime_type: blob.mime_type.to_string(),
        language: language.clone(),
        diarization,
        hotwords: args.hotwords,
    };
    let pipeline = MeetingPipeline::new(client, &language);
    let record_id = pipeline
        .upload(&request)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Uploaded as record {record_id}.");
    println!("Transcribe it with: voxminute transcribe {record_id}");
    Ok(())
}

/// Read commands from stdin until the session is stopped or discarded.
/// Returns the finished blob, or `None` when nothing usable was captured.
fn drive_session(session: &mut RecordingSession) -> Result<Option<RecordingBlob>> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("[{}] > ", format_duration(session.elapsed_seconds()));
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            // stdin closed: treat like stop without confirmation.
            debug!("stdin closed, stopping recording");
            return Ok(session.stop()?);
        };
        let line = line.context("Failed to read command")?;

        match line.trim() {
            "p" => {
                session.pause();
                println!("Paused at {}", format_duration(session.elapsed_seconds()));
            }
            "r" => {
                session.resume();
                println!("Resumed");
            }
            "s" => {
                let confirmed = Confirm::new()
                    .with_prompt("Finish recording?")
                    .default(true)
                    .interact()
                    .context("Failed to read confirmation")?;
                if confirmed {
                    return Ok(session.stop()?);
                }
            }
            "d" => {
                session.discard();
                return Ok(None);
            }
            "" => {}
            other => println!("Unknown command '{other}'. Use p, r, s or d."),
        }
    }
}
