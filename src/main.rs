//! Sound Graph Player - plays a graph description on an audio output device.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sound_graph::config::GraphConfig;
use sound_graph::dsp::{Identifier, NodeRegistry};
use sound_graph::engine::{
    AudioEngine, ControlHandle, SoundGraphVoice, VoiceChannels, VoiceCommand, VoiceEvent,
};
use sound_graph::persistence::GraphDescription;

const OFFLINE_BLOCK_FRAMES: usize = 512;

#[derive(Parser)]
#[command(name = "sound-graph-play")]
#[command(author, version, about = "Play a sound graph description", long_about = None)]
struct Cli {
    /// Graph description (JSON)
    #[arg(value_name = "GRAPH", required_unless_present_any = ["list_nodes", "list_devices"])]
    graph: Option<PathBuf>,

    /// Engine config (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum playback length in seconds
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f32,

    /// Graph input values (e.g., "Volume=0.5")
    #[arg(long = "set", value_parser = parse_key_val, number_of_values = 1)]
    set: Vec<(String, f32)>,

    /// Render without an audio device and report the peak level
    #[arg(long)]
    offline: bool,

    /// Output device index (see --list-devices)
    #[arg(short, long, conflicts_with = "offline")]
    device: Option<usize>,

    /// List registered node types
    #[arg(long)]
    list_nodes: bool,

    /// List audio output devices
    #[arg(long)]
    list_devices: bool,
}

fn parse_key_val(s: &str) -> Result<(String, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid input format: '{}' (expected name=value)", s))?;
    let value = value
        .parse()
        .map_err(|_| format!("Invalid number for '{}': '{}'", key, value))?;
    Ok((key.to_string(), value))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if cli.list_nodes {
        list_nodes();
        return Ok(());
    }
    if cli.list_devices {
        return list_devices();
    }

    let mut config = match &cli.config {
        Some(path) => GraphConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => GraphConfig::default(),
    };
    let Some(path) = &cli.graph else {
        bail!("no graph description given");
    };
    let description = GraphDescription::load(path).with_context(|| format!("loading {}", path.display()))?;

    if cli.offline {
        return render_offline(&cli, &description, config);
    }

    let mut engine = AudioEngine::new()?;
    if let Some(index) = cli.device {
        engine
            .select_device(index)
            .with_context(|| format!("selecting output device {}", index))?;
    }
    config.sample_rate = engine.sample_rate() as f32;
    let (voice, mut control) = build_voice(&cli, &description, config)?;

    engine.start(voice)?;
    tracing::info!("playing '{}' on {}", description.name, engine.current_device_name());
    control
        .send_command(VoiceCommand::Play)
        .map_err(|_| anyhow!("voice command queue is full"))?;

    let deadline = Instant::now() + Duration::from_secs_f32(cli.seconds.max(0.0));
    'playing: while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
        for event in control.drain_events() {
            if report(event) {
                break 'playing;
            }
        }
    }

    engine.stop()?;
    Ok(())
}

fn build_voice(
    cli: &Cli,
    description: &GraphDescription,
    config: GraphConfig,
) -> anyhow::Result<(SoundGraphVoice, ControlHandle)> {
    let channels = VoiceChannels::from_config(&config);
    let mut graph = description.build(NodeRegistry::global(), config)?;
    for (name, value) in &cli.set {
        if !graph.set_input(Identifier::intern(name), *value) {
            bail!("graph '{}' has no input '{}'", description.name, name);
        }
    }

    let (control, handle) = channels.split();
    Ok((SoundGraphVoice::new(graph, handle)?, control))
}

fn render_offline(cli: &Cli, description: &GraphDescription, config: GraphConfig) -> anyhow::Result<()> {
    let total_frames = (cli.seconds.max(0.0) * config.sample_rate) as usize;
    let channels = description.outputs.len().max(1);
    let (mut voice, mut control) = build_voice(cli, description, config)?;
    control
        .send_command(VoiceCommand::Play)
        .map_err(|_| anyhow!("voice command queue is full"))?;

    let mut block = vec![0.0; OFFLINE_BLOCK_FRAMES * channels];
    let mut peak = 0.0_f32;
    let mut rendered = 0;
    let mut finished = false;
    while rendered < total_frames && !finished {
        voice.process(&mut block, channels);
        peak = block.iter().fold(peak, |peak, sample| peak.max(sample.abs()));
        rendered += OFFLINE_BLOCK_FRAMES;
        finished = control.drain_events().fold(false, |done, event| report(event) || done);
    }

    println!(
        "{}: rendered {} frames, peak {:.3}",
        description.name,
        rendered.min(total_frames),
        peak
    );
    Ok(())
}

/// Logs a voice event. Returns true once the graph finished.
fn report(event: VoiceEvent) -> bool {
    match event {
        VoiceEvent::Started => tracing::info!("playing"),
        VoiceEvent::Stopped => tracing::info!("stopped"),
        VoiceEvent::Finished => {
            tracing::info!("graph finished");
            return true;
        }
        VoiceEvent::GraphEvent { frame, endpoint, value } => {
            tracing::info!("frame {}: {} = {}", frame, endpoint, value)
        }
        VoiceEvent::UnknownEndpoint(id) => tracing::warn!("graph has no endpoint '{}'", id),
    }
    false
}

fn list_nodes() {
    let registry = NodeRegistry::global();
    println!("Registered Node Types");
    println!("=====================\n");
    for info in registry.list_nodes() {
        let alias = if info.is_alias { " (alias)" } else { "" };
        println!("  {:<28} {}{}", info.name, info.category.name(), alias);
    }
    println!("\nTotal: {} types", registry.len());
}

fn list_devices() -> anyhow::Result<()> {
    let engine = AudioEngine::new()?;
    println!("Output Devices:");
    for device in engine.enumerate_devices() {
        let default = if device.is_default { " (default)" } else { "" };
        println!("  [{}] {}{}", device.index, device.name, default);
    }
    Ok(())
}
