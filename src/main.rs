use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hotbound_api::{payload, ApiClient, ApiHost, Operation};
use hotbound_call::{CallSessionAdapter, ScriptedSdk, VoiceSdk};
use hotbound_core::{
    Action, AnalysisRequest, AppConfig, CallEvent, Effect, SimulationState, Step,
    TranscriptionRequest,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotbound", about = "Sales call simulator client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze prospect profile screenshots
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Transcribe a WAV recording of call context
    Transcribe { audio: PathBuf },
    /// Practice a conversation turn by turn on stdin
    Chat,
    /// Run a voice call and print its events
    Call {
        /// JSON-lines signal recording to play back
        #[arg(long)]
        replay: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    init_tracing(&config.general.log_level)?;
    tracing::info!("hotbound starting");

    match cli.command {
        Command::Analyze { images } => analyze(&config, &images).await,
        Command::Transcribe { audio } => transcribe(&config, &audio).await,
        Command::Chat => chat(&config).await,
        Command::Call { replay } => call(&config, replay).await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn client(config: &AppConfig) -> Result<ApiClient> {
    ApiClient::from_config(&config.api).context("failed to build API client")
}

async fn analyze(config: &AppConfig, images: &[PathBuf]) -> Result<()> {
    let limit = config.api.max_profile_images;
    if images.len() > limit {
        bail!("at most {limit} screenshots can be analyzed, got {}", images.len());
    }

    let images = images
        .iter()
        .map(|path| payload::jpeg_from_path(path, config.api.jpeg_quality))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to prepare screenshots")?;

    let mut state = SimulationState::new();
    state.apply(Action::AnalysisStarted);
    let result = client(config)?
        .analyze_profile(AnalysisRequest { images })
        .await;
    state.apply(Action::AnalysisFinished(result));

    match (&state.analysis, &state.last_error) {
        (Some(analysis), _) => {
            println!("{analysis}");
            Ok(())
        }
        (None, Some(err)) => bail!("analysis failed: {err}"),
        (None, None) => bail!("analysis produced no result"),
    }
}

async fn transcribe(config: &AppConfig, audio: &Path) -> Result<()> {
    let audio = tokio::fs::read(audio)
        .await
        .with_context(|| format!("failed to read {}", audio.display()))?;

    let transcript = client(config)?
        .transcribe_audio(TranscriptionRequest { audio })
        .await
        .context("transcription failed")?;
    println!("{transcript}");
    Ok(())
}

async fn chat(config: &AppConfig) -> Result<()> {
    let mut host = ApiHost::new(client(config)?);
    let mut completions = host
        .take_completion_receiver()
        .context("completion receiver already taken")?;

    let mut state = SimulationState::new();
    state.step = Step::Call;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    eprintln!("type a line to the prospect; empty input or EOF ends the session");

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(Effect::SimulateConversation(turn)) = state.apply(Action::SubmitMessage(line))
        else {
            break;
        };
        host.submit(Operation::SimulateConversation(turn));

        let Some(completion) = completions.recv().await else {
            break;
        };
        state.apply(Action::ReplyReceived(completion.result));

        if let Some(err) = state.last_error.take() {
            eprintln!("error: {err}");
        } else if let Some(reply) = state.conversation.messages().last() {
            println!("prospect: {}", reply.content);
        }
    }

    host.shutdown().await;
    tracing::info!(turns = state.conversation.len(), "chat finished");
    Ok(())
}

async fn call(config: &AppConfig, replay: Option<PathBuf>) -> Result<()> {
    let call_config = config.call.clone().unwrap_or_default();
    let replay = replay.or(call_config.replay.clone());

    let sdk: Option<Box<dyn VoiceSdk>> = if call_config.has_credential() {
        let Some(path) = replay else {
            bail!("no live voice SDK is bundled; pass --replay <recording.jsonl>");
        };
        Some(Box::new(ScriptedSdk::from_jsonl_file(&path)?))
    } else {
        None
    };

    let mut adapter = CallSessionAdapter::new(sdk);
    let mut events = adapter
        .take_event_receiver()
        .context("event receiver already taken")?;
    adapter.start();

    let mut state = SimulationState::new();
    state.step = Step::Call;

    let started = adapter
        .start_call(&call_config.assistant_id, serde_json::Map::new())
        .await;
    if let Err(e) = started {
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }
        adapter.shutdown().await;
        bail!("call failed to start: {e}");
    }
    // A recording has no live party; hang up once it has been queued.
    adapter.stop_call().await.context("failed to end call")?;

    while let Some(event) = events.recv().await {
        print_event(&event);
        let ended = event == CallEvent::CallEnded;
        state.apply(Action::Call(event));
        if ended {
            break;
        }
    }

    adapter.shutdown().await;
    state.apply(Action::EndCall);
    tracing::info!("call finished");
    Ok(())
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::CallStarted => println!("[call started]"),
        CallEvent::CallEnded => println!("[call ended]"),
        CallEvent::SpeechStarted => println!("[assistant speaking]"),
        CallEvent::SpeechEnded => println!("[assistant silent]"),
        CallEvent::PartialTranscript(text) => println!("... {text}"),
        CallEvent::FinalTranscript(text) => println!("> {text}"),
        CallEvent::FunctionCall(call) => println!("[function] {}", call.name()),
        CallEvent::Error(message) => eprintln!("error: {message}"),
    }
}
