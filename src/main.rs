mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use cli::Cli;
use spectral_stream::audio::decode::decode_audio;
use spectral_stream::config::{self, Config};
use spectral_stream::StreamAnalyzer;

/// First line of the output: everything that stays fixed for the stream
#[derive(Serialize)]
struct Header<'a> {
    sample_rate_hz: u32,
    window_size: usize,
    frame_size: usize,
    frequencies: &'a [f32],
    bin_centres: &'a [f32],
}

#[derive(Serialize)]
struct Record<'a> {
    time: f32,
    strongest_frequency: f32,
    bin_energies: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    equalizer_means: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spectrum: Option<&'a [f32]>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect spectral-stream.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("spectral-stream.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("spectral-stream").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("spectral-stream").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    let mut config = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };
    apply_overrides(&cli, &mut config);

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("Decoding {}...", input.display());
    let audio = decode_audio(input)?;
    config.analyzer.sample_rate_hz = audio.sample_rate;

    let mut analyzer = StreamAnalyzer::new(config.analyzer.clone())
        .context("Invalid analyzer configuration")?;
    let frame_size = analyzer.frame_size();
    let every = config.output.every.unwrap_or(1).max(1);

    let sink: Box<dyn Write> = match cli.output {
        Some(ref path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);

    {
        let frame = analyzer.features();
        let header = Header {
            sample_rate_hz: audio.sample_rate,
            window_size: analyzer.dimensions().window_size,
            frame_size,
            frequencies: frame.frequencies,
            bin_centres: frame.bin_centres,
        };
        serde_json::to_writer(&mut out, &header)?;
        writeln!(out)?;
    }

    let total_frames = audio.frame_count(frame_size);
    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total_frames as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let mut records = 0usize;
    for (frame_idx, samples) in audio.frames(frame_size).enumerate() {
        analyzer.append_data(&samples)?;

        if (frame_idx + 1) % every == 0 {
            let time = ((frame_idx + 1) * frame_size) as f32 / audio.sample_rate as f32;
            analyzer.refresh();
            let features = analyzer.features();
            let record = Record {
                time,
                strongest_frequency: analyzer.strongest_frequency(),
                bin_energies: features.bin_energies,
                equalizer_means: config.output.equalizer.then(|| analyzer.equalizer_means()),
                spectrum: config.output.spectrum.then_some(features.spectrum),
            };
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
            records += 1;
        }

        pb.set_position(frame_idx as u64 + 1);
    }

    out.flush()?;
    pb.finish_with_message("Analysis complete");

    log::info!(
        "Done! {} frames, {} records, {} spectra over {:.1}s of audio",
        total_frames,
        records,
        analyzer.fft_count(),
        audio.duration()
    );
    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(cli: &Cli, config: &mut Config) {
    let analyzer = &mut config.analyzer;
    if let Some(ms) = cli.fft_window_ms {
        analyzer.fft_window_ms = ms;
    }
    if let Some(ups) = cli.updates_per_second {
        analyzer.updates_per_second = ups;
    }
    if let Some(ms) = cli.smoothing_ms {
        analyzer.smoothing_length_ms = ms;
    }
    if let Some(bins) = cli.bins {
        analyzer.frequency_bin_count = bins;
    }
    if let Some(strength) = cli.equalizer_strength {
        analyzer.equalizer_strength = strength;
    }
    if cli.no_frequency_smoothing {
        analyzer.apply_frequency_smoothing = false;
    }
    if cli.log_scale {
        analyzer.log_scale = true;
    }

    let output = &mut config.output;
    if cli.every.is_some() {
        output.every = cli.every;
    }
    output.equalizer |= cli.equalizer;
    output.spectrum |= cli.spectrum;
}
