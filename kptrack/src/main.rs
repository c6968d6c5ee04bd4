use feature_track::provider::{NoObserver, Observer};
use feature_track::{evaluate, evaluation_plan, RunOutcome, Strategy, TrackerSettings};
use kptrack::{DefaultProviders, ImageSequence, OverlayObserver};
use log::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kptrack",
    about = "A tool to compare keypoint detectors and descriptors on an image sequence"
)]
struct Opt {
    /// The file where settings are specified.
    ///
    /// This is in the format of `feature_track::TrackerSettings`. If it doesn't exist,
    /// the default settings are used.
    #[structopt(short, long, default_value = "kptrack-settings.json")]
    settings: PathBuf,
    /// The directory containing the image sequence.
    #[structopt(short, long, default_value = "images/KITTI/2011_09_26/image_00/data")]
    images: PathBuf,
    /// The part of every file name before the frame number.
    #[structopt(long, default_value = "000000")]
    prefix: String,
    /// The image file extension.
    #[structopt(long, default_value = "png")]
    extension: String,
    /// The number of digits the frame number is zero padded to.
    #[structopt(long, default_value = "4")]
    fill_width: usize,
    /// The detector to run (SHITOMASI, HARRIS, FAST, BRISK, ORB, AKAZE, SIFT).
    ///
    /// Give both a detector and a descriptor for a single run, otherwise every
    /// strategy is evaluated.
    #[structopt(short, long, requires = "descriptor")]
    detector: Option<String>,
    /// The descriptor to run (BRISK, BRIEF, ORB, FREAK, AKAZE, SIFT).
    #[structopt(short = "D", long, requires = "detector")]
    descriptor: Option<String>,
    /// The akaze threshold to use.
    ///
    /// 0.01 will be very sparse and 0.0001 will be very dense.
    #[structopt(long, default_value = "0.001")]
    akaze_threshold: f64,
    /// Overrides the first frame index.
    #[structopt(long)]
    first: Option<usize>,
    /// Overrides the last frame index (inclusive).
    #[structopt(long)]
    last: Option<usize>,
    /// Show keypoints and matches after every frame.
    #[structopt(long)]
    visualize: bool,
    /// Don't print the per-frame breakdown.
    #[structopt(long)]
    no_per_frame_report: bool,
    /// Don't print the summary line.
    #[structopt(long)]
    no_summary_report: bool,
}

fn load_settings(path: &Path) -> Result<TrackerSettings, String> {
    match std::fs::File::open(path) {
        Ok(file) => {
            let settings = serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|e| format!("invalid settings file {}: {}", path.display(), e))?;
            info!("loaded settings from {}", path.display());
            Ok(settings)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("used default settings");
            Ok(TrackerSettings::default())
        }
        Err(e) => Err(format!("unable to read {}: {}", path.display(), e)),
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let mut settings = match load_settings(&opt.settings) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(first) = opt.first {
        settings.first_frame = first;
    }
    if let Some(last) = opt.last {
        settings.last_frame = last;
    }
    settings.visualize |= opt.visualize;
    settings.print_per_frame_report &= !opt.no_per_frame_report;
    settings.print_summary_report &= !opt.no_summary_report;

    let plan = match (&opt.detector, &opt.descriptor) {
        (Some(detector), Some(descriptor)) => match Strategy::from_names(detector, descriptor) {
            Ok(strategy) => vec![strategy],
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        _ => evaluation_plan(),
    };

    let mut source = ImageSequence::new(opt.images)
        .prefix(opt.prefix)
        .extension(&opt.extension)
        .fill_width(opt.fill_width);
    info!("reading frames from {}", source.dir().display());
    let mut providers = DefaultProviders::with_akaze_threshold(opt.akaze_threshold);
    let mut observer: Box<dyn Observer> = if settings.visualize {
        Box::new(OverlayObserver)
    } else {
        Box::new(NoObserver)
    };

    let stdout = std::io::stdout();
    let outcomes = match evaluate(
        &plan,
        &settings,
        &mut providers,
        &mut source,
        observer.as_mut(),
        &mut stdout.lock(),
    ) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("unable to write the report: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let failed: Vec<&RunOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    if failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        warn!("{} of {} runs failed", failed.len(), outcomes.len());
        ExitCode::FAILURE
    }
}
