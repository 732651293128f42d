use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "voxminute")]
#[command(about = "Record, transcribe and summarize meetings", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Create a new account on the backend
    Signup(AuthCliArgs),
    /// Log in and store the session token
    Login(AuthCliArgs),
    /// Log out and remove the stored session
    Logout,
    /// Record a meeting from the microphone and optionally upload it
    Record(RecordCliArgs),
    /// Upload an existing audio file
    Upload(UploadCliArgs),
    /// List uploaded records and their processing status
    Status(StatusCliArgs),
    /// Transcribe an uploaded record
    Transcribe(TranscribeCliArgs),
    /// Summarize a transcribed record
    Summarize(SummarizeCliArgs),
    /// Ask questions about a record's transcript
    Chat(ChatCliArgs),
    /// Play back a record or local audio file with transcript sync
    Play(PlayCliArgs),
    /// Delete an uploaded record
    Delete(DeleteCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct AuthCliArgs {
    /// Username (prompted when omitted)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct RecordCliArgs {
    /// Transcription language (defaults to the configured language)
    #[arg(short, long)]
    pub language: Option<String>,
    /// Enable speaker diarization for this recording
    #[arg(short, long)]
    pub diarization: bool,
    /// Domain term to bias transcription toward (repeatable)
    #[arg(long = "hotword")]
    pub hotwords: Vec<String>,
    /// Write the finished WAV to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Skip the upload step after recording
    #[arg(long)]
    pub no_upload: bool,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Audio file to upload
    pub file: PathBuf,
    /// Transcription language (defaults to the configured language)
    #[arg(short, long)]
    pub language: Option<String>,
    /// Enable speaker diarization
    #[arg(short, long)]
    pub diarization: bool,
    /// Domain term to bias transcription toward (repeatable)
    #[arg(long = "hotword")]
    pub hotwords: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct StatusCliArgs {
    /// Keep polling until every record finishes processing
    #[arg(short, long)]
    pub watch: bool,
}

#[derive(ClapArgs, Debug)]
pub struct TranscribeCliArgs {
    /// Record to transcribe
    pub record_id: String,
    /// Transcription language (defaults to the configured language)
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct SummarizeCliArgs {
    /// Record to summarize
    pub record_id: String,
    /// Summary language (defaults to the configured language)
    #[arg(short, long)]
    pub language: Option<String>,
    /// Use the configured external summarization endpoint
    #[arg(long)]
    pub external: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ChatCliArgs {
    /// Record whose transcript to chat about
    pub record_id: String,
    /// One-shot question (interactive when omitted)
    #[arg(short, long)]
    pub question: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct PlayCliArgs {
    /// Record to play (downloads its audio)
    #[arg(conflicts_with = "file")]
    pub record_id: Option<String>,
    /// Local audio file to play instead of a record
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Playback volume, 0.0 to 2.0
    #[arg(long, default_value = "1.0")]
    pub volume: f32,
    /// Playback speed, 0.25 to 4.0
    #[arg(long, default_value = "1.0")]
    pub speed: f32,
    /// Start position as a fraction of the total duration, 0.0 to 1.0
    #[arg(long)]
    pub seek: Option<f64>,
}

#[derive(ClapArgs, Debug)]
pub struct DeleteCliArgs {
    /// Record to delete
    pub record_id: String,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}
