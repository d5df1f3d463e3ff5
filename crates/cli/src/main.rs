use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use facemood_core::capture::infrastructure::image_file_reader::ImageFileReader;
use facemood_core::capture::infrastructure::image_file_writer::ImageFileWriter;
use facemood_core::capture::infrastructure::image_sequence_reader::ImageSequenceReader;
use facemood_core::capture::infrastructure::is_image;
use facemood_core::detection::infrastructure::cascade_locator::CascadeSet;
use facemood_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use facemood_core::pipeline::emotion_detector::EmotionDetector;
use facemood_core::pipeline::live_session_use_case::LiveSessionUseCase;
use facemood_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facemood_core::shared::detector_settings::DetectorSettings;
use facemood_core::storage::domain::emotion_store::EmotionStore;
use facemood_core::storage::domain::frequency_report::{CountsChart, FrequencyReport};
use facemood_core::storage::infrastructure::sqlite_emotion_store::SqliteEmotionStore;

/// Facial emotion detection for images and frame sequences.
#[derive(Parser)]
#[command(name = "facemood")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect faces and label their emotion.
    Detect {
        /// Input image, or a directory of frames to process as a live feed.
        input: PathBuf,

        /// Output image, or output directory for a frame sequence.
        output: Option<PathBuf>,

        /// Detector settings JSON (defaults to the user config file).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the cascade XML files; missing ones are
        /// downloaded to the cache.
        #[arg(long)]
        cascade_dir: Option<PathBuf>,

        /// SQLite database to append detected labels to.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print per-emotion counts when done.
        #[arg(long)]
        stats: bool,
    },

    /// Print the frequency of stored labels.
    Report {
        /// SQLite database written by `detect --store`.
        #[arg(long)]
        store: PathBuf,
    },

    /// Print the default detector settings as JSON.
    Config {
        /// Also write them to the user config file.
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Detect {
            input,
            output,
            config,
            cascade_dir,
            store,
            stats,
        } => {
            let output = validate(&input, output)?;
            let settings = match config {
                Some(path) => DetectorSettings::load_from(&path)?,
                None => DetectorSettings::load()?,
            };
            log::debug!("Detector settings: {settings:?}");
            let detector = build_detector(cascade_dir.as_deref(), settings)?;
            let store = open_store(store.as_deref())?;
            let counter = detector.counter();

            if input.is_dir() {
                run_live_session(&input, &output, detector, store)?;
            } else {
                run_image(&input, &output, detector, store)?;
            }

            if stats {
                println!("{}", CountsChart(&counter.snapshot()).render());
            }
        }
        Command::Report { store } => {
            if !store.exists() {
                return Err(format!("Store not found: {}", store.display()).into());
            }
            let store = SqliteEmotionStore::open(&store)?;
            let report = FrequencyReport::tally(&store.labels()?);
            println!("{}", report.render());
        }
        Command::Config { write } => {
            let settings = DetectorSettings::default();
            println!("{}", settings.to_json()?);
            if write {
                let path = DetectorSettings::config_path()
                    .ok_or("could not determine config directory")?;
                settings.save_to(&path)?;
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn run_image(
    input: &Path,
    output: &Path,
    detector: EmotionDetector,
    store: Option<Box<dyn EmotionStore>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = AnnotateImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        detector,
        store,
    );
    let detections = use_case.execute(input, output)?;
    if detections.is_empty() {
        println!("No faces found");
    }
    for d in &detections {
        let r = d.region;
        println!(
            "{} ({:.0}%) at {},{} {}x{}",
            d.emotion, d.confidence, r.x, r.y, r.width, r.height
        );
    }
    Ok(())
}

fn run_live_session(
    input: &Path,
    output: &Path,
    detector: EmotionDetector,
    store: Option<Box<dyn EmotionStore>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = LiveSessionUseCase::new(
        Box::new(ImageSequenceReader::new()),
        Box::new(ImageFileWriter::new()),
        detector,
        store,
        Box::new(StdoutPipelineLogger::default()),
    );
    let report = use_case.execute(input, output)?;
    println!(
        "{} frames processed, {} skipped, {} faces",
        report.frames_processed, report.frames_skipped, report.faces
    );
    Ok(())
}

fn build_detector(
    cascade_dir: Option<&Path>,
    settings: DetectorSettings,
) -> Result<EmotionDetector, Box<dyn std::error::Error>> {
    let cascades = CascadeSet::resolve(cascade_dir, Some(download_progress))?;
    Ok(EmotionDetector::with_cascades(cascades, settings))
}

fn open_store(
    path: Option<&Path>,
) -> Result<Option<Box<dyn EmotionStore>>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(Box::new(SqliteEmotionStore::open(path)?))),
        None => Ok(None),
    }
}

fn validate(input: &Path, output: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input not found: {}", input.display()).into());
    }
    let output = output.ok_or("Output path is required")?;
    if input.is_dir() {
        if output.is_file() {
            return Err(format!(
                "Output must be a directory for frame sequences: {}",
                output.display()
            )
            .into());
        }
    } else {
        if !is_image(input) {
            return Err(format!("Unsupported input format: {}", input.display()).into());
        }
        if !is_image(&output) {
            return Err(format!(
                "Output needs an image extension: {}",
                output.display()
            )
            .into());
        }
    }
    Ok(output)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_detect_with_options() {
        let cli = Cli::try_parse_from([
            "facemood", "detect", "in.png", "out.png", "--store", "e.db", "--stats",
        ])
        .unwrap();
        match cli.command {
            Command::Detect {
                input,
                output,
                store,
                stats,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.png"));
                assert_eq!(output, Some(PathBuf::from("out.png")));
                assert_eq!(store, Some(PathBuf::from("e.db")));
                assert!(stats);
            }
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_report_requires_store() {
        assert!(Cli::try_parse_from(["facemood", "report"]).is_err());
    }

    #[test]
    fn test_validate_missing_input() {
        let result = validate(Path::new("/nonexistent/in.png"), Some("out.png".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"").unwrap();
        assert!(validate(&input, None).is_err());
    }

    #[test]
    fn test_validate_image_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"").unwrap();
        assert!(validate(&input, Some(dir.path().join("out.txt"))).is_err());
        assert!(validate(&input, Some(dir.path().join("out.jpg"))).is_ok());
    }

    #[test]
    fn test_validate_directory_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("annotated");
        assert_eq!(validate(dir.path(), Some(out.clone())).unwrap(), out);
    }
}
