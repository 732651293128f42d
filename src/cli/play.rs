//! Playback command: plays a record's audio (or a local file) while
//! printing the transcript segment under the playhead. Playback is driven
//! by single-letter stdin commands; stdin is read on a separate thread
//! because the rodio sink must stay on the main task.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::debug;

use super::args::PlayCliArgs;
use crate::api::TranscriptSegment;
use crate::playback::{format_clock, PlaybackController, RodioSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayCommand {
    Toggle,
    Jump(usize),
    Restart,
    Quit,
}

/// Parse a runtime playback command. Unknown or malformed input is ignored
/// rather than interrupting playback.
fn parse_play_command(line: &str) -> Option<PlayCommand> {
    let line = line.trim();
    match line {
        "p" => Some(PlayCommand::Toggle),
        "r" => Some(PlayCommand::Restart),
        "q" => Some(PlayCommand::Quit),
        _ => line
            .strip_prefix('j')
            .and_then(|rest| rest.trim().parse::<usize>().ok())
            .map(PlayCommand::Jump),
    }
}

fn spawn_command_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn handle_play_command(args: PlayCliArgs) -> Result<()> {
    let (path, segments, _tempfile) = match (&args.record_id, &args.file) {
        (_, Some(file)) => (file.clone(), Vec::new(), None),
        (Some(record_id), None) => {
            let (path, segments, tempfile) = fetch_record_audio(record_id).await?;
            (path, segments, Some(tempfile))
        }
        (None, None) => bail!("Provide a record id or --file"),
    };

    let sink = RodioSink::open(&path)?;
    let mut controller = PlaybackController::new(sink, segments);
    controller.set_volume(args.volume);
    controller.set_speed(args.speed);
    if let Some(fraction) = args.seek {
        controller.seek_fraction(fraction)?;
    }
    controller.play();

    if let Some(total) = controller.duration() {
        println!("Playing {} ({})", path.display(), format_clock(total.as_secs_f64()));
    } else {
        println!("Playing {}", path.display());
    }
    if controller.segments().is_empty() {
        println!("Commands: [p] pause/resume, [r] restart, [q] quit");
    } else {
        println!(
            "{} segments. Commands: [p] pause/resume, [j <n>] jump to segment, [r] restart, [q] quit",
            controller.segments().len()
        );
    }

    let commands = spawn_command_reader();
    let mut last_segment: Option<usize> = None;

    'playback: while !controller.is_finished() {
        while let Ok(line) = commands.try_recv() {
            match parse_play_command(&line) {
                Some(PlayCommand::Toggle) => controller.toggle(),
                Some(PlayCommand::Jump(index)) => {
                    if index < controller.segments().len() {
                        controller.select_segment(index)?;
                    } else {
                        println!("No segment {index}");
                    }
                }
                Some(PlayCommand::Restart) => {
                    // A fresh sink; volume and speed carry over.
                    controller.replace_sink(RodioSink::open(&path)?);
                    controller.play();
                    last_segment = None;
                    debug!("Restarted playback of {}", path.display());
                }
                Some(PlayCommand::Quit) => break 'playback,
                None => {}
            }
        }

        let position = controller.position().as_secs_f64();
        let active = controller.active_segment();
        if active != last_segment {
            if let Some(index) = active {
                let segment = &controller.segments()[index];
                let speaker = segment.speaker.as_deref().unwrap_or("Speaker");
                println!(
                    "[{}] #{} {}: {}",
                    format_clock(position),
                    index,
                    speaker,
                    segment.text.trim()
                );
            }
            last_segment = active;
        } else {
            print!("\r{}", format_clock(position));
            std::io::stdout().flush().ok();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    println!();
    Ok(())
}

/// Download a record's audio to a temp file and fetch its transcript for
/// segment display. A missing transcript is not an error.
async fn fetch_record_audio(
    record_id: &str,
) -> Result<(PathBuf, Vec<TranscriptSegment>, tempfile::NamedTempFile)> {
    let (_, client) = super::authed_client()?;

    let records = client
        .list_records()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
    let record = records
        .iter()
        .find(|r| r.id == record_id)
        .with_context(|| format!("Record {record_id} not found"))?;
    let Some(url) = record.source_url.as_deref() else {
        bail!("Record {record_id} has no audio URL yet");
    };

    let bar = super::upload::spinner("Downloading audio...");
    let bytes = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .context("Failed to download audio")?
        .bytes()
        .await
        .context("Failed to download audio")?;
    bar.finish_and_clear();

    let mut file = tempfile::Builder::new()
        .suffix(&suffix_for(Path::new(url)))
        .tempfile()
        .context("Failed to create temp file")?;
    file.write_all(&bytes).context("Failed to write audio")?;

    let segments = match client.get_transcript(record_id).await {
        Ok(transcript) => transcript.segments,
        Err(e) => {
            debug!("No transcript for playback sync: {}", e);
            Vec::new()
        }
    };

    Ok((file.path().to_path_buf(), segments, file))
}

/// Keep the source extension so the decoder can sniff the container.
fn suffix_for(url: &Path) -> String {
    match url.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!(".{ext}"),
        _ => ".wav".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_commands() {
        assert_eq!(parse_play_command("p"), Some(PlayCommand::Toggle));
        assert_eq!(parse_play_command(" q "), Some(PlayCommand::Quit));
        assert_eq!(parse_play_command("r"), Some(PlayCommand::Restart));
        assert_eq!(parse_play_command("j 3"), Some(PlayCommand::Jump(3)));
        assert_eq!(parse_play_command("j0"), Some(PlayCommand::Jump(0)));
    }

    #[test]
    fn test_malformed_commands_are_ignored() {
        assert_eq!(parse_play_command(""), None);
        assert_eq!(parse_play_command("x"), None);
        assert_eq!(parse_play_command("j"), None);
        assert_eq!(parse_play_command("j abc"), None);
    }

    #[test]
    fn test_suffix_preserves_known_extension() {
        assert_eq!(suffix_for(Path::new("https://bucket/a1.mp3")), ".mp3");
        assert_eq!(suffix_for(Path::new("https://bucket/a1")), ".wav");
    }
}
