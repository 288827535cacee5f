//! tonepool - play tone snapshots read from stdin
//!
//! Each stdin line is a JSON array of tones that should be sounding. Stdout
//! carries one `{"audioSupported":...}` line, then scope frames. Logs go to
//! stderr.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use clap::Parser;
use tonepool::port::{self, Capabilities};
use tonepool::{Error, OutputDevice, Session, SessionConfig};

/// Samples per processed block
const BLOCK: f64 = 64.0;
/// Blocks rendered ahead of the wall clock
const LEAD_BLOCKS: u64 = 4;

#[derive(Parser)]
#[command(name = "tonepool")]
#[command(about = "Polyphonic tone generator driven by JSON snapshots on stdin", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device name (overrides the config file)
    #[arg(short, long)]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if cli.device.is_some() {
        config.output.device = cli.device.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();

    if cli.list_devices {
        for (i, device) in OutputDevice::list_outputs().iter().enumerate() {
            writeln!(
                stdout,
                "[{}] {} ({} Hz, {} ch)",
                i,
                device.name(),
                device.sample_rate(),
                device.channels()
            )?;
        }
        return Ok(());
    }

    let mut session = Session::open(&config)?;
    writeln!(
        stdout,
        "{}",
        port::to_json_line(&Capabilities { audio_supported: session.audio_supported() })?
    )?;
    stdout.flush()?;

    let (lines_tx, lines_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });

    let rate = session
        .engine()
        .map(|engine| engine.sample_rate() as f64)
        .unwrap_or(48_000.0);
    let scope_interval = Duration::from_millis(config.scope.interval_ms);

    let start = Instant::now();
    let mut last_frame = start;
    let mut blocks = 0u64;
    let mut input_closed = false;

    loop {
        loop {
            match lines_rx.try_recv() {
                Ok(line) => match port::parse_snapshot(&line) {
                    Ok(tones) => session.apply(&tones),
                    Err(err) => tracing::warn!(%err, "ignoring snapshot"),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !input_closed {
                        tracing::info!("input closed, fading out");
                        session.apply(&[]);
                        input_closed = true;
                    }
                    break;
                }
            }
        }

        if input_closed && session.pool().map_or(true, |pool| pool.fading_len() == 0) {
            break;
        }

        // Stay a few blocks ahead to prevent underruns
        let target = (start.elapsed().as_secs_f64() * rate / BLOCK) as u64 + LEAD_BLOCKS;
        if target > blocks {
            session.render((target - blocks) as usize);
            blocks = target;
        }

        if last_frame.elapsed() >= scope_interval {
            last_frame = Instant::now();
            if let Some(frame) = session.scope_frame() {
                writeln!(stdout, "{}", port::to_json_line(&frame)?)?;
                stdout.flush()?;
            }
        }

        std::thread::sleep(Duration::from_micros(500));
    }

    Ok(())
}
