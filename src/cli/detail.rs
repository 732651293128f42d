//! Transcript, summary, chat and delete commands for a single record.

use anyhow::Result;
use dialoguer::{Confirm, Input};

use super::args::{ChatCliArgs, DeleteCliArgs, SummarizeCliArgs, TranscribeCliArgs};
use super::upload::spinner;
use crate::api::{SummaryResult, Transcript};
use crate::pipeline::{ChatThread, MeetingPipeline, PipelineError, SummaryOutcome};
use crate::playback::format_clock;
use crate::summarize::ExternalSummarizer;

fn print_transcript(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("The transcript is empty.");
        return;
    }
    if let Some(name) = &transcript.audio_name {
        println!("Transcript of {name}:");
    }
    for segment in &transcript.segments {
        let speaker = segment.speaker.as_deref().unwrap_or("Speaker");
        println!(
            "[{} - {}] {}: {}",
            format_clock(segment.start),
            format_clock(segment.end),
            speaker,
            segment.text.trim()
        );
    }
    let speakers = transcript.speakers();
    if speakers.len() > 1 {
        println!("\nSpeakers: {}", speakers.join(", "));
    }
}

fn print_summary(summary: &SummaryResult) {
    if !summary.narrative.is_empty() {
        println!("{}\n", summary.narrative);
    }
    if !summary.agendas.is_empty() {
        println!("Agenda:");
        for agenda in &summary.agendas {
            println!("  {}", agenda.name);
            for point in &agenda.points {
                println!("    - {point}");
            }
        }
    }
    if !summary.action_items.is_empty() {
        println!("Action items:");
        for item in &summary.action_items {
            println!("  - {}", item.task);
        }
    }
}

pub async fn handle_transcribe_command(args: TranscribeCliArgs) -> Result<()> {
    let (config, client) = super::authed_client()?;
    let language = args
        .language
        .unwrap_or_else(|| config.backend.language.clone());

    let pipeline = MeetingPipeline::new(client, &language);
    pipeline.attach_record(&args.record_id);

    let bar = spinner("Transcribing...");
    let result = pipeline.transcribe().await;
    bar.finish_and_clear();

    match result {
        Ok(transcript) => {
            print_transcript(&transcript);
            Ok(())
        }
        Err(PipelineError::Api(e)) => {
            eprintln!("Transcription failed: {}", e.user_message());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_summarize_command(args: SummarizeCliArgs) -> Result<()> {
    let (config, client) = super::authed_client()?;
    let language = args
        .language
        .unwrap_or_else(|| config.backend.language.clone());

    let pipeline = MeetingPipeline::new(client, &language);
    pipeline.attach_record(&args.record_id);

    // Summarization needs a transcript; fetch the stored one first so the
    // guard can explain what is missing instead of a server error.
    let bar = spinner("Fetching transcript...");
    let fetched = pipeline.fetch_transcript().await;
    bar.finish_and_clear();
    if let Err(PipelineError::Api(e)) = fetched {
        eprintln!("Could not load the transcript: {}", e.user_message());
        eprintln!("Transcribe the record first: voxminute transcribe {}", args.record_id);
        return Err(e.into());
    }

    if args.external {
        return summarize_external(&config, &pipeline, &language).await;
    }

    let bar = spinner("Summarizing...");
    let result = pipeline.summarize().await;
    bar.finish_and_clear();

    match result {
        Ok(SummaryOutcome::TooShort) => {
            println!("Audio is too short to summarize.");
            Ok(())
        }
        Ok(SummaryOutcome::Ready(summary)) => {
            print_summary(&summary);
            Ok(())
        }
        Err(PipelineError::Guard(message)) => {
            eprintln!("{message}");
            anyhow::bail!("nothing to summarize");
        }
        Err(PipelineError::Api(e)) => {
            eprintln!("Summarization failed: {}", e.user_message());
            Err(e.into())
        }
    }
}

async fn summarize_external(
    config: &crate::config::Config,
    pipeline: &MeetingPipeline,
    language: &str,
) -> Result<()> {
    let Some(endpoint) = config.summarizer.endpoint.as_deref() else {
        anyhow::bail!("No external summarizer endpoint configured (summarizer.endpoint)");
    };
    let Some(transcript) = pipeline.transcript() else {
        anyhow::bail!("a transcript is required before summarizing");
    };
    if transcript.is_empty() {
        eprintln!("a transcript is required before summarizing");
        anyhow::bail!("nothing to summarize");
    }

    let summarizer = ExternalSummarizer::new(endpoint, config.summarizer.api_key.as_deref());
    let bar = spinner("Summarizing (external)...");
    let result = summarizer
        .summarize(&transcript.plain_text(), Some(language))
        .await;
    bar.finish_and_clear();

    match result {
        Ok(summary) if summary.is_too_short() => {
            println!("Audio is too short to summarize.");
            Ok(())
        }
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("Summarization failed: {}", e.user_message());
            Err(e.into())
        }
    }
}

/// An empty or whitespace-only line ends the interactive chat loop.
fn chat_input_is_exit(question: &str) -> bool {
    question.trim().is_empty()
}

pub async fn handle_chat_command(args: ChatCliArgs) -> Result<()> {
    let (_, client) = super::authed_client()?;
    let mut thread = ChatThread::new();

    if let Some(question) = args.question {
        let id = thread.begin(&question);
        let result = client.chat(&args.record_id, &question).await;
        thread.complete(id, result);
        if let Some(reply) = thread.messages().last() {
            println!("{}", reply.content);
        }
        return Ok(());
    }

    println!("Ask about this meeting. Empty input exits.");
    loop {
        let question: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        if chat_input_is_exit(&question) {
            break;
        }
        let id = thread.begin(&question);
        let result = client.chat(&args.record_id, &question).await;
        thread.complete(id, result);
        if let Some(reply) = thread.messages().last() {
            println!("Assistant: {}", reply.content);
        }
    }
    Ok(())
}

pub async fn handle_delete_command(args: DeleteCliArgs) -> Result<()> {
    let (_, client) = super::authed_client()?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete record {}?", args.record_id))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    match client.delete_record(&args.record_id).await {
        Ok(()) => {
            println!("Deleted record {}.", args.record_id);
            Ok(())
        }
        Err(e) => {
            eprintln!("Delete failed: {}", e.user_message());
            Err(e.into())
        }
    }
}
