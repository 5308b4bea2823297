use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};

use stepgrid::audio::{self, MicCapture};
use stepgrid::config;
use stepgrid::pipeline::{ExportFormat, SequencerEngine};
use stepgrid::shared::loop_duration;

const USAGE: &str = "usage: stepgrid [project_dir] [wav|mp3|raw] [--record TRACK]";

struct Args {
    project_dir: PathBuf,
    format: ExportFormat,
    record_track: Option<usize>,
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).parse_default_env().init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut record_track = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--record" => {
                let track = args.next().context(USAGE)?;
                record_track = Some(track.parse().with_context(|| format!("bad track {:?}", track))?);
            }
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }
    if positional.len() > 2 {
        bail!(USAGE);
    }
    let mut positional = positional.into_iter();
    let project_dir = match positional.next() {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("no current directory")?,
    };
    let format = match positional.next() {
        Some(name) => name.parse()?,
        None => ExportFormat::Wav,
    };
    Ok(Args { project_dir, format, record_track })
}

fn run() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = config::load_config(&args.project_dir)
        .with_context(|| format!("loading config from {}", args.project_dir.display()))?;

    let host = audio::start_audio(config.master_gain)?;
    let mut engine = SequencerEngine::new(host, config)?;
    engine
        .load_samples_from_dir(&args.project_dir)
        .with_context(|| format!("loading samples from {}", args.project_dir.display()))?;

    let tick = engine.tick_interval();
    if let Some(track) = args.record_track {
        let mut mic = MicCapture::new();
        let pending = engine.arm_recording(track, &mut mic)?;
        // nobody is around to press stop, so wait for the auto-stop
        while !pending.is_due() {
            std::thread::sleep(tick);
        }
        engine.finish_recording(pending, &mut mic)?;
    }

    let config = engine.config();
    let play_for = Duration::from_secs_f64(loop_duration(config.tempo_bpm, config.loop_count));
    engine.start()?;
    let started = Instant::now();
    while started.elapsed() < play_for {
        std::thread::sleep(tick);
        engine.tick();
    }
    engine.stop();

    let bytes = engine.render_and_export(args.format)?;
    let out = args.project_dir.join(args.format.file_name());
    std::fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    log::info!("wrote {}", out.display());
    Ok(())
}
