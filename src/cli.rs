use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "spectral-stream",
    about = "Stream an audio file through a log-binned spectral feature analyzer"
)]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Write JSON lines here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to spectral-stream.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FFT window length in milliseconds
    #[arg(long)]
    pub fft_window_ms: Option<f32>,

    /// Frames appended per second of audio
    #[arg(long)]
    pub updates_per_second: Option<f32>,

    /// Temporal smoothing length in milliseconds (0 disables)
    #[arg(long)]
    pub smoothing_ms: Option<f32>,

    /// Number of log-spaced frequency bins
    #[arg(short, long)]
    pub bins: Option<usize>,

    /// Equalizer strength (0.0-1.0)
    #[arg(long)]
    pub equalizer_strength: Option<f32>,

    /// Disable the cross-bin polynomial smoothing
    #[arg(long)]
    pub no_frequency_smoothing: bool,

    /// Use dB magnitudes instead of linear ones
    #[arg(long)]
    pub log_scale: bool,

    /// Poll features every N appended frames
    #[arg(long)]
    pub every: Option<usize>,

    /// Include the equalizer means in each record
    #[arg(long)]
    pub equalizer: bool,

    /// Include the full spectrum in each record
    #[arg(long)]
    pub spectrum: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "spectral-stream",
            "song.flac",
            "--bins",
            "64",
            "--smoothing-ms",
            "0",
            "--no-frequency-smoothing",
            "--every",
            "3",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("song.flac")));
        assert_eq!(cli.bins, Some(64));
        assert_eq!(cli.smoothing_ms, Some(0.0));
        assert!(cli.no_frequency_smoothing);
        assert!(!cli.log_scale);
        assert_eq!(cli.every, Some(3));
        assert!(cli.output.is_none());
    }
}
