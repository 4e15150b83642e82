use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};
use tachy_lib::{
    config::{Settings, DEFAULT_MEDIAN_LENGTH, DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_STEP},
    detectors::{ecg::detect_series, EcgDetectorConfig, PanTompkinsDetector},
    filters::median_filter,
    io::{CsvColumnSource, QuantumLeapSource, SampleSource, TextSource, WfdbSource},
    metrics::RrIntervalRate,
    pipeline::{EmptyWindowPolicy, Pipeline, PipelineConfig},
    synth::{synthetic_ecg, RateSegment, SynthSpec, MAX_SYNTH_BPM},
    windows::WindowSpec,
};

#[derive(Parser)]
#[command(
    name = "tachy",
    version,
    about = "Windowed heart-rate extraction and abnormal-rate detection for ECG streams"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EmptyWindow {
    Abort,
    Skip,
}

impl From<EmptyWindow> for EmptyWindowPolicy {
    fn from(value: EmptyWindow) -> Self {
        match value {
            EmptyWindow::Abort => EmptyWindowPolicy::Abort,
            EmptyWindow::Skip => EmptyWindowPolicy::Skip,
        }
    }
}

/// Where the samples come from. Newline text on stdin when nothing is given.
#[derive(Args, Debug)]
struct InputArgs {
    /// Sampling rate in Hz for text, CSV and QuantumLeap input
    #[arg(long)]
    fs: Option<f64>,
    /// Newline-delimited samples (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Delimited file with a header row
    #[arg(long, conflicts_with_all = ["input", "wfdb_header", "quantumleap"])]
    csv: Option<PathBuf>,
    /// Column holding the ECG samples
    #[arg(long, default_value = "ecg")]
    column: String,
    /// Field delimiter for --csv
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// WFDB header (.hea); the sampling rate is read from the record
    #[arg(long, conflicts_with_all = ["input", "quantumleap"])]
    wfdb_header: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    wfdb_lead: usize,
    /// Saved QuantumLeap entity response (JSON)
    #[arg(long, conflicts_with = "input")]
    quantumleap: Option<PathBuf>,
    /// Attribute name holding the ECG samples
    #[arg(long, default_value = "ecg")]
    attribute: String,
}

const FALLBACK_FS: f64 = 250.0;

impl InputArgs {
    fn source(&self, settings_fs: Option<f64>) -> Result<Box<dyn SampleSource>> {
        let fs = self.fs.or(settings_fs).unwrap_or(FALLBACK_FS);
        if let Some(header) = &self.wfdb_header {
            return Ok(Box::new(WfdbSource::new(header, self.wfdb_lead)));
        }
        if let Some(path) = &self.csv {
            let delimiter = u8::try_from(self.delimiter)
                .map_err(|_| anyhow!("delimiter must be a single-byte character"))?;
            return Ok(Box::new(
                CsvColumnSource::new(path, &self.column, fs).with_delimiter(delimiter),
            ));
        }
        if let Some(path) = &self.quantumleap {
            return Ok(Box::new(QuantumLeapSource::new(path, &self.attribute, fs)));
        }
        Ok(Box::new(TextSource::new(self.input.clone(), fs)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the windowed heart-rate pipeline and report whether the rate is abnormal
    Evaluate {
        #[command(flatten)]
        input: InputArgs,
        /// TOML settings file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        window_size: Option<usize>,
        #[arg(long)]
        window_step: Option<usize>,
        #[arg(long)]
        window_offset: Option<usize>,
        /// Inclusive last sample index a window may cover
        #[arg(long)]
        end_index: Option<usize>,
        /// Odd median filter length over the window-rate timeline
        #[arg(long)]
        median_length: Option<usize>,
        /// Heart rate (bpm) above which the verdict is raised; required here or in --config
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long, value_enum)]
        on_empty_window: Option<EmptyWindow>,
        /// Refractory period for the R-peak detector (seconds)
        #[arg(long)]
        min_rr_s: Option<f64>,
        /// Print only `true` or `false`
        #[arg(long)]
        verdict_only: bool,
    },
    /// Detect R-peaks over the whole stream and print them as JSON
    Detect {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 0.25)]
        min_rr_s: f64,
    },
    /// Median-filter newline-delimited values and print them as a JSON array
    Smooth {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        length: usize,
    },
    /// Print a synthetic ECG as newline-delimited samples
    Synth {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        /// Constant-rate stretch as SECONDS:BPM; repeat for several stretches
        #[arg(long = "segment", value_parser = parse_segment, required = true)]
        segments: Vec<RateSegment>,
        /// Peak amplitude of uniform noise
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::Evaluate {
            input,
            config,
            window_size,
            window_step,
            window_offset,
            end_index,
            median_length,
            threshold,
            on_empty_window,
            min_rr_s,
            verdict_only,
        } => {
            let overrides = Overrides {
                window_size,
                window_step,
                window_offset,
                end_index,
                median_length,
                threshold,
                on_empty_window,
                min_rr_s,
            };
            cmd_evaluate(&input, config.as_deref(), &overrides, verdict_only)?
        }
        Commands::Detect { input, min_rr_s } => cmd_detect(&input, min_rr_s)?,
        Commands::Smooth { input, length } => cmd_smooth(input.as_deref(), length)?,
        Commands::Synth {
            fs,
            segments,
            noise,
            seed,
        } => cmd_synth(fs, segments, noise, seed)?,
    }
    Ok(())
}

fn parse_segment(raw: &str) -> Result<RateSegment, String> {
    let (secs, bpm) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected SECONDS:BPM, got '{raw}'"))?;
    let duration_s: f64 = secs
        .trim()
        .parse()
        .map_err(|_| format!("'{secs}' is not a duration in seconds"))?;
    let bpm: f64 = bpm
        .trim()
        .parse()
        .map_err(|_| format!("'{bpm}' is not a heart rate"))?;
    if !(duration_s.is_finite() && duration_s > 0.0) || !(bpm.is_finite() && bpm > 0.0) {
        return Err(format!("duration and rate must be positive and finite in '{raw}'"));
    }
    if bpm > MAX_SYNTH_BPM {
        return Err(format!("rate {bpm} exceeds {MAX_SYNTH_BPM} bpm"));
    }
    Ok(RateSegment { duration_s, bpm })
}

struct Overrides {
    window_size: Option<usize>,
    window_step: Option<usize>,
    window_offset: Option<usize>,
    end_index: Option<usize>,
    median_length: Option<usize>,
    threshold: Option<f64>,
    on_empty_window: Option<EmptyWindow>,
    min_rr_s: Option<f64>,
}

/// Merge the settings file (if any) with command line overrides.
fn resolve_config(
    settings: Option<&Settings>,
    o: &Overrides,
) -> Result<(PipelineConfig, EcgDetectorConfig)> {
    let base_window = settings
        .map(Settings::window_spec)
        .unwrap_or_else(|| WindowSpec::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_STEP));
    let window = WindowSpec {
        size: o.window_size.unwrap_or(base_window.size),
        step: o.window_step.unwrap_or(base_window.step),
        offset: o.window_offset.unwrap_or(base_window.offset),
        end: o.end_index.or(base_window.end),
    };
    let median = o
        .median_length
        .or(settings.map(|s| s.filter.median_length))
        .unwrap_or(DEFAULT_MEDIAN_LENGTH);
    let Some(threshold) = o.threshold.or(settings.map(|s| s.alert.threshold_bpm)) else {
        bail!("no threshold: pass --threshold or set alert.threshold_bpm in --config");
    };
    let policy = o
        .on_empty_window
        .map(EmptyWindowPolicy::from)
        .or(settings.map(|s| s.alert.on_empty_window))
        .unwrap_or_default();

    let mut detector = settings.map(|s| s.detector).unwrap_or_default();
    if let Some(min_rr_s) = o.min_rr_s {
        detector.min_rr_s = min_rr_s;
    }

    let config = PipelineConfig::new(window, median, threshold).with_empty_window_policy(policy);
    Ok((config, detector))
}

fn cmd_evaluate(
    input: &InputArgs,
    config_path: Option<&Path>,
    overrides: &Overrides,
    verdict_only: bool,
) -> Result<()> {
    let settings = config_path.map(Settings::load).transpose()?;
    let (config, detector_cfg) = resolve_config(settings.as_ref(), overrides)?;
    info!("pipeline config: {:?}", config);

    let pipeline = Pipeline::new(config, PanTompkinsDetector::new(detector_cfg), RrIntervalRate)?;
    let source = input.source(settings.as_ref().and_then(|s| s.input.fs))?;
    let report = pipeline.run_source(&source)?;

    if verdict_only {
        println!("{}", report.abnormal);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn cmd_detect(input: &InputArgs, min_rr_s: f64) -> Result<()> {
    let ts = input.source(None)?.acquire()?;
    let cfg = PanTompkinsDetector::with_min_rr(min_rr_s).config().to_owned();
    let events = detect_series(&ts, &cfg);
    info!("{} beat(s) in {:.1} s", events.len(), ts.duration());
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

fn cmd_smooth(input: Option<&Path>, length: usize) -> Result<()> {
    let values = TextSource::new(input.map(Path::to_path_buf), FALLBACK_FS)
        .acquire()
        .context("reading values to smooth")?
        .data;
    let smoothed = median_filter(&values, length)?;
    println!("{}", serde_json::to_string(&smoothed)?);
    Ok(())
}

fn cmd_synth(fs: f64, segments: Vec<RateSegment>, noise: f64, seed: u64) -> Result<()> {
    if !(fs.is_finite() && fs > 0.0) {
        bail!("--fs must be positive");
    }
    if !(noise.is_finite() && noise >= 0.0) {
        bail!("--noise must be a finite, non-negative amplitude");
    }
    let ecg = synthetic_ecg(&SynthSpec {
        fs,
        segments,
        noise,
        seed,
    });
    info!("{} sample(s), {} beat(s)", ecg.series.len(), ecg.beats.len());
    let mut out = String::with_capacity(ecg.series.len() * 12);
    for v in &ecg.series.data {
        out.push_str(&format!("{v:.6}\n"));
    }
    print!("{out}");
    Ok(())
}
