use clap::{crate_name, crate_version, Arg, ArgAction, Command};
use parrot_maker::progress::{NoProgress, ProgressReporter};
use parrot_maker::{Config, ParrotResult, Report};
use std::io::Stderr;
use std::time::Duration;
use tracing::{error, warn, Level};

mod error;
use crate::error::BinResult;

/// Newtype so the progress bar can report frames
struct ProgressBar(pbr::ProgressBar<Stderr>);

impl ProgressBar {
    fn new(frames: u64) -> Self {
        let mut pb = pbr::ProgressBar::on(std::io::stderr(), frames);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        Self(pb)
    }
}

impl ProgressReporter for ProgressBar {
    fn increase(&mut self) -> bool {
        self.0.inc();
        true
    }

    fn done(&mut self, msg: &str) {
        self.0.finish_print(msg);
    }
}

fn main() {
    // Failures are reported, but don't change the exit code
    if let Err(e) = bin_main() {
        error!("{e}");
    }
}

fn bin_main() -> BinResult<()> {
    let matches = Command::new(crate_name!())
        .version(crate_version!())
        .about("Puts input.png on the party parrot frames/ and writes output/animation.gif")
        .arg(Arg::new("quiet")
            .long("quiet")
            .short('q')
            .action(ArgAction::SetTrue)
            .conflicts_with("verbose")
            .help("Do not show a progress bar, only errors"))
        .arg(Arg::new("verbose")
            .long("verbose")
            .short('v')
            .action(ArgAction::Count)
            .help("More logging (repeat for even more)"))
        .get_matches_from(wild::args_os());

    let quiet = matches.get_flag("quiet");
    let level = match (quiet, matches.get_count("verbose")) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::default();
    let mut progress: Box<dyn ProgressReporter> = if quiet {
        Box::new(NoProgress {})
    } else {
        Box::new(ProgressBar::new(config.positions.len() as u64))
    };

    let report = run(&config, &mut *progress)?;
    for skipped in report.skipped_frames.iter().chain(&report.skipped_intermediates) {
        warn!("frame {} is missing from the animation: {}", skipped.index, skipped.error);
    }
    Ok(())
}

/// Like `make`, but the progress bar is finished on errors too, so the log doesn't land in the middle of it
fn run(config: &Config, progress: &mut dyn ProgressReporter) -> ParrotResult<Report> {
    parrot_maker::make(config, progress).map_err(|err| {
        progress.done("parrot-maker failed");
        err
    })
}
