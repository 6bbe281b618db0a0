use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sekhub_lib::color::preset_hue_saturation;
use sekhub_lib::constants::{DEVICE_NAME_PREFIX, FRAME_MAGIC, NOTIFY_CHARACTERISTIC_UUID, WRITE_CHARACTERISTIC_UUID};
use sekhub_lib::session::{DEMO_COLORS, SessionOutcome, drive_hubs};
use sekhub_lib::sim::{Reply, SimulatedHub};
use sekhub_lib::{ColorPreset, CommandId, FrameCodec, HubConfig, color_command_payload, color_index_for};

/// Hubs driven in one run, as the vendor app does
const MAX_HUBS: u8 = 2;

/// Frame tooling and session runner for Smart Exterior Kit LED hubs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with key, password and response timeout (factory values if omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an enciphered frame and print it as hex.
    Encode {
        #[command(subcommand)]
        frame: EncodeFrame,
        /// Sequence number the frame is built after (the frame gets this + 1).
        #[arg(long, default_value_t = 0, global = true)]
        after_sequence: u8,
    },
    /// Decipher a 20-byte frame given as hex and print its fields.
    Decode {
        /// 40 hex characters, spaces allowed.
        hex: Vec<String>,
    },
    /// Find the preset index closest to an RGB color.
    Match { r: u8, g: u8, b: u8 },
    /// Print the hub's fixed protocol identifiers.
    Info,
    /// Run the demo session against simulated hubs.
    Simulate {
        /// Number of hubs to drive one after another (at most two per run).
        #[arg(long, default_value_t = MAX_HUBS, value_parser = clap::value_parser!(u8).range(1..=MAX_HUBS as i64))]
        hubs: u8,
        /// Simulated hubs reject every password.
        #[arg(long, conflicts_with = "silent")]
        reject: bool,
        /// Simulated hubs never answer the password.
        #[arg(long)]
        silent: bool,
        /// Time each color is held, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeFrame {
    /// Static color by preset index.
    Color {
        #[arg(short, long)]
        index: u8,
        #[arg(short, long, default_value_t = 100)]
        brightness: u8,
    },
    /// Static color closest to an RGB value.
    Rgb {
        r: u8,
        g: u8,
        b: u8,
        #[arg(short, long, default_value_t = 100)]
        brightness: u8,
    },
    /// Static color by name (red, orange, ..., white, off).
    Preset {
        name: String,
        #[arg(short, long, default_value_t = 100)]
        brightness: u8,
    },
    /// Password submission with the configured password.
    Password,
}

/// Console logs go to stderr so `encode`/`decode` output can be piped.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    // -v adds the TX/RX frame dumps, -q hides progress
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbose.tracing_level_filter().into())
        .from_env_lossy();
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let mut guard = None;
    let file = match &cli.log_file {
        Some(path) => {
            let log_file =
                File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
            let (writer, worker) = tracing_appender::non_blocking(log_file);
            guard = Some(worker);
            Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(guard)
}

fn load_config(path: Option<&PathBuf>) -> Result<HubConfig> {
    match path {
        Some(path) => HubConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => Ok(HubConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli)?;

    if let Err(e) = run(cli).await {
        error!("{:?}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Encode { frame, after_sequence } => encode(&config, frame, after_sequence),
        Command::Decode { hex } => decode(&config, &hex.concat()),
        Command::Match { r, g, b } => {
            let index = color_index_for(r, g, b);
            let (hue, saturation) = preset_hue_saturation(index);
            println!("RGB({},{},{}) -> index {} (hue {:.0}°, saturation {:.0}%)", r, g, b, index, hue, saturation);
            Ok(())
        }
        Command::Info => {
            println!("device name prefix:    {}", DEVICE_NAME_PREFIX);
            println!("write characteristic:  {}", WRITE_CHARACTERISTIC_UUID);
            println!("notify characteristic: {}", NOTIFY_CHARACTERISTIC_UUID);
            println!("frame magic:           {:#04x}", FRAME_MAGIC);
            println!("response timeout:      {:?}", config.response_timeout);
            Ok(())
        }
        Command::Simulate {
            hubs,
            reject,
            silent,
            interval_ms,
        } => simulate(&config, hubs, reject, silent, Duration::from_millis(interval_ms)).await,
    }
}

fn encode(config: &HubConfig, frame: EncodeFrame, after_sequence: u8) -> Result<()> {
    let counter = std::sync::Arc::new(sekhub_lib::SequenceCounter::starting_at(after_sequence));
    let codec = FrameCodec::with_counter(&config.key, counter);

    let wire = match frame {
        EncodeFrame::Color { index, brightness } => {
            codec.build_frame(CommandId::SetStaticColor, &color_command_payload(index, brightness)?)?
        }
        EncodeFrame::Rgb { r, g, b, brightness } => {
            let index = color_index_for(r, g, b);
            info!("RGB({},{},{}) -> color index {}", r, g, b, index);
            codec.build_frame(CommandId::SetStaticColor, &color_command_payload(index, brightness)?)?
        }
        EncodeFrame::Preset { name, brightness } => {
            let preset: ColorPreset = name.parse()?;
            let payload = color_command_payload(preset.index(), preset.effective_brightness(brightness))?;
            codec.build_frame(CommandId::SetStaticColor, &payload)?
        }
        EncodeFrame::Password => codec.build_frame(CommandId::Password, config.password.as_bytes())?,
    };

    println!("{}", hex::encode(wire));
    Ok(())
}

fn decode(config: &HubConfig, text: &str) -> Result<()> {
    let bytes = hex::decode(text.replace(' ', "")).context("Input is not valid hex")?;
    let codec = FrameCodec::new(&config.key);
    let frame = codec.parse_frame(&bytes)?;

    println!("magic:    {:#04x} ({})", frame.magic, if frame.has_valid_magic() { "ok" } else { "unexpected" });
    println!("sequence: {}", frame.sequence);
    println!("command:  {:?} ({:#04x})", frame.command, u8::from(frame.command));
    println!("payload:  {}", hex::encode(frame.payload));
    println!(
        "checksum: {:#04x} ({})",
        frame.checksum,
        if frame.checksum_matches() {
            "ok".to_string()
        } else {
            format!("expected {:#04x}", frame.computed_checksum())
        }
    );
    Ok(())
}

async fn simulate(config: &HubConfig, hubs: u8, reject: bool, silent: bool, hold: Duration) -> Result<()> {
    let reply = if silent {
        Reply::Silent
    } else if reject {
        Reply::Reject(0x01)
    } else {
        Reply::Verify
    };

    let transports = (1..=hubs).map(|i| (format!("hub#{} (simulated)", i), SimulatedHub::new(config).with_reply(reply)));
    let reports = drive_hubs(transports, config, &DEMO_COLORS, hold).await;

    let mut failures = 0;
    for report in &reports {
        match &report.outcome {
            SessionOutcome::Completed { indices } => println!("{}: completed, indices {:?}", report.name, indices),
            SessionOutcome::AuthFailed(outcome) => {
                failures += 1;
                println!("{}: password not accepted ({:?})", report.name, outcome);
            }
            SessionOutcome::Failed(reason) => {
                failures += 1;
                println!("{}: failed - {}", report.name, reason);
            }
        }
    }
    if failures == reports.len() {
        bail!("no hub completed its session");
    }
    Ok(())
}
