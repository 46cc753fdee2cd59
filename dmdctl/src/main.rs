/*!
# dmdctl

Command-line control of a DLPC900 DMD controller over USB HID.

## Usage

### Inspect the controller
```bash
dmdctl info
dmdctl status --json
```

### Switch display mode
```bash
dmdctl mode video
dmdctl mode            # print the current mode
```

### Show an external source through the pattern LUT
```bash
dmdctl video-pattern --source displayport --hold
```

Talking to hardware needs the `hid` feature:
```bash
cargo run -p dmdctl --features hid -- status
```
*/

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dlpc900::{DisplayMode, Dmd, SourceLock, Transport};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "dmdctl")]
#[command(about = "Control a DLPC900 DMD controller over USB")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "dmdctl.toml")]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log every command exchanged with the controller
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show product and firmware information
    Info,

    /// Show hardware, main, system and communication status
    Status,

    /// Print the display mode, or switch to MODE
    Mode { mode: Option<DisplayMode> },

    /// Print the power state, or apply ACTION
    Power { action: Option<PowerAction> },

    /// Print the source lock, or lock to SOURCE
    Source { source: Option<SourceArg> },

    /// Control the pattern sequence
    Pattern { action: PatternAction },

    /// Set an image flip
    Flip { axis: Axis, state: Toggle },

    /// Display an external source through a single-entry pattern LUT
    VideoPattern {
        /// Source to lock to
        #[arg(long, value_enum, default_value = "displayport")]
        source: SourceArg,

        /// Keep displaying until Ctrl+C, then put the controller in standby
        #[arg(long)]
        hold: bool,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "dmdctl.toml")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PowerAction {
    Standby,
    Wakeup,
    Reset,
    IdleOn,
    IdleOff,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Hdmi,
    #[value(name = "displayport")]
    DisplayPort,
    Release,
}

impl From<SourceArg> for SourceLock {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Hdmi => SourceLock::Hdmi,
            SourceArg::DisplayPort => SourceLock::DisplayPort,
            SourceArg::Release => SourceLock::Unlocked,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatternAction {
    Start,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Axis {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Commands::Config { output } = &cli.command {
        return generate_config_file(output);
    }

    let config = AppConfig::load_or_default(&cli.config)?;
    let mut dmd = open_device(&config)?;
    run_command(&mut dmd, cli.command, &config, cli.json)
}

#[cfg(feature = "hid")]
fn open_device(config: &AppConfig) -> Result<Dmd<dlpc900::HidTransport>> {
    use anyhow::Context;

    let transport = dlpc900::HidTransport::open(
        config.device.vendor_id,
        config.device.product_id,
        config.device.read_timeout(),
    )
    .with_context(|| {
        format!(
            "Failed to open controller {:04X}:{:04X}",
            config.device.vendor_id, config.device.product_id
        )
    })?;

    Ok(Dmd::new(transport, config.session.clone()))
}

#[cfg(not(feature = "hid"))]
fn open_device(_config: &AppConfig) -> Result<Dmd<dlpc900::ScriptedTransport>> {
    anyhow::bail!("dmdctl was built without USB support; rebuild with `--features hid` to talk to a controller")
}

fn run_command<T: Transport>(dmd: &mut Dmd<T>, command: Commands, config: &AppConfig, json: bool) -> Result<()> {
    match command {
        Commands::Info => {
            let hw = dmd.hardware_info()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hw)?);
            } else {
                println!("🔍 Product: {}", hw.product);
                println!("   Firmware tag: {}", hw.firmware_tag);
            }
        }

        Commands::Status => print_status(dmd, json)?,

        Commands::Mode { mode: Some(mode) } => {
            dmd.set_display_mode(mode)?;
            println!("✅ Display mode set to {}", mode);
        }
        Commands::Mode { mode: None } => {
            let mode = dmd.get_display_mode()?;
            if json {
                println!("{}", serde_json::to_string(&mode)?);
            } else {
                println!("{}", mode);
            }
        }

        Commands::Power { action: Some(action) } => {
            match action {
                PowerAction::Standby => dmd.standby()?,
                PowerAction::Wakeup => dmd.wakeup()?,
                PowerAction::Reset => dmd.reset()?,
                PowerAction::IdleOn => dmd.idle_on()?,
                PowerAction::IdleOff => dmd.idle_off()?,
            }
            println!("✅ Power action {:?} sent", action);
        }
        Commands::Power { action: None } => {
            let power = dmd.power_mode()?;
            if json {
                println!("{}", serde_json::to_string(&power)?);
            } else {
                println!("{}", power);
            }
        }

        Commands::Source { source: Some(source) } => {
            dmd.lock_source(source.into())?;
            println!("✅ Source lock set to {}", SourceLock::from(source));
        }
        Commands::Source { source: None } => {
            let lock = dmd.source_lock()?;
            if json {
                println!("{}", serde_json::to_string(&lock)?);
            } else {
                println!("{}", lock);
            }
        }

        Commands::Pattern { action } => match action {
            PatternAction::Start => dmd.start_pattern()?,
            PatternAction::Pause => dmd.pause_pattern()?,
            PatternAction::Stop => dmd.stop_pattern()?,
        },

        Commands::Flip { axis, state } => {
            let flip = matches!(state, Toggle::On);
            match axis {
                Axis::Long => dmd.set_long_axis_flip(flip)?,
                Axis::Short => dmd.set_short_axis_flip(flip)?,
            }
        }

        Commands::VideoPattern { source, hold } => run_video_pattern(dmd, config, source.into(), hold)?,

        Commands::Config { output } => generate_config_file(&output)?,
    }

    Ok(())
}

fn print_status<T: Transport>(dmd: &mut Dmd<T>, json: bool) -> Result<()> {
    let hardware = dmd.hardware_status()?;
    let main = dmd.main_status()?;
    let system = dmd.check_system_status();
    let communication = dmd.check_communication_status();

    if json {
        let value = serde_json::json!({
            "hardware": hardware,
            "main": main,
            "system_ok": system.is_ok(),
            "communication_ok": communication.is_ok(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{}", hardware.report());
    println!("Mirrors parked: {}", main.mirrors_parked);
    println!("Sequencer running: {}", main.sequencer_running);
    println!("Video frozen: {}", main.video_frozen);
    println!("External source locked: {}", main.source_locked);
    println!("Port 1 sync valid: {}", main.port1_sync_valid);
    println!("Port 2 sync valid: {}", main.port2_sync_valid);
    match system {
        Ok(()) => println!("✅ Internal memory test passed"),
        Err(e) => println!("❌ {}", e),
    }
    match communication {
        Ok(()) => println!("✅ Controller to DMD communication is healthy"),
        Err(e) => println!("❌ {}", e),
    }
    Ok(())
}

/// Lock to an external source and show it through a one-entry pattern LUT
fn run_video_pattern<T: Transport>(dmd: &mut Dmd<T>, config: &AppConfig, source: SourceLock, hold: bool) -> Result<()> {
    info!("🚀 Setting up video-pattern display from {}", source);

    dmd.set_display_mode(DisplayMode::Video)?;
    dmd.set_dual_pixel_mode()?;
    dmd.set_display_to_parallel()?;
    dmd.lock_source(source)?;

    let locked = dmd.source_lock()?;
    info!("Locked to source [{}]", locked);

    dmd.set_display_mode(DisplayMode::VideoPattern)?;
    dmd.setup_video_pattern_lut(&config.video_pattern)?;
    dmd.start_pattern()?;
    println!("✅ Video-pattern display running");

    if !hold {
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;

    println!("⏸️ Press Ctrl+C to stop");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("\n🛑 Received Ctrl+C, putting the controller in standby...");
    dmd.standby()?;
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: &Path) -> Result<()> {
    let config = AppConfig::default();
    config.save_to_file(output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   dmdctl --config {} status", output_path.display());

    Ok(())
}
