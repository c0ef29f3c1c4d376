use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use posture_engine::{
    validate::Requirement, Analysis, Config, Detection, Engine, ErrorKind, ErrorReport, Version,
};
use serde::Serialize;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;

#[derive(structopt::StructOpt)]
#[structopt(about = "Assess standing posture from pose-estimator detection documents")]
struct Opt {
    /// Detection documents (JSON) produced by the pose estimator.
    #[structopt(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML configuration file; flags below override it.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// Algorithm version: legacy, enhanced or comprehensive.
    #[structopt(short, long)]
    algorithm: Option<Version>,

    /// Landmark visibility threshold.
    #[structopt(short, long)]
    threshold: Option<f32>,

    /// Also require knees and ankles to be confidently detected.
    #[structopt(short, long)]
    extended: bool,

    /// Number of worker threads.
    #[structopt(short, long, default_value = "1")]
    jobs: usize,

    /// Include the exercise narration text for each analysis.
    #[structopt(short, long)]
    narrate: bool,

    /// Write results here instead of stdout.
    #[structopt(short, long)]
    output: Option<PathBuf>,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,
}

impl Opt {
    fn engine_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).context("failed loading config")?,
            None => Config::default(),
        };
        if let Some(version) = self.algorithm {
            config.version = version;
        }
        if let Some(threshold) = self.threshold {
            config.confidence_threshold = threshold;
        }
        if self.extended {
            config.requirement = Requirement::Extended;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Outcome {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

impl Outcome {
    fn failed(input: &Path, error: ErrorReport) -> Self {
        Self {
            input: input.to_owned(),
            summary: None,
            narrative: None,
            result: None,
            error: Some(error),
        }
    }
}

fn read_detection(path: &Path) -> Result<Detection> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed parsing detection document {}", path.display()))
}

fn process(engine: &Engine, path: &Path, narrate: bool) -> Outcome {
    let detection = match read_detection(path) {
        Ok(detection) => detection,
        Err(e) => {
            warn!(message = "unreadable input", input = %path.display(), error = %e);
            return Outcome::failed(
                path,
                ErrorReport {
                    kind: ErrorKind::Input,
                    message: format!("{:#}", e),
                },
            );
        }
    };

    match engine.analyze_detection(&detection) {
        Ok(analysis) => Outcome {
            input: path.to_owned(),
            summary: Some(analysis.summary_text()),
            narrative: if narrate {
                Some(analysis.narrative())
            } else {
                None
            },
            result: Some(analysis),
            error: None,
        },
        Err(e) => {
            warn!(message = "analysis failed", input = %path.display(), error = %e);
            Outcome::failed(path, ErrorReport::from(&e))
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let config = opt.engine_config()?;

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(opt.log_level),
    )?;

    let engine = Engine::new(config).context("failed constructing engine")?;
    let jobs = opt.jobs.max(1).min(opt.inputs.len());
    info!(
        message = "starting analysis",
        inputs = opt.inputs.len(),
        jobs,
        version = %engine.config().version
    );

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new(opt.inputs.len() as u64).with_style(
                ProgressStyle::default_bar()
                    .template("{prefix:.bold.dim} {bar:40} {pos}/{len} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let (jobs_tx, jobs_rx) = crossbeam::channel::unbounded();
    let (outcomes_tx, outcomes_rx) = crossbeam::channel::unbounded();
    for job in opt.inputs.iter().enumerate() {
        jobs_tx
            .send(job)
            .map_err(|_| anyhow!("job queue closed early"))?;
    }
    drop(jobs_tx);

    let narrate = opt.narrate;
    crossbeam::thread::scope(|scope| {
        let workers = (0..jobs)
            .map(|_| {
                let jobs_rx = jobs_rx.clone();
                let outcomes_tx = outcomes_tx.clone();
                let engine = &engine;
                let progress = progress.as_ref();
                scope.spawn(move |_| {
                    for (index, path) in jobs_rx {
                        let outcome = process(engine, path, narrate);
                        if let Some(progress) = progress {
                            progress.set_message(path.display().to_string());
                            progress.inc(1);
                        }
                        outcomes_tx.send((index, outcome))?;
                    }
                    Ok::<_, anyhow::Error>(())
                })
            })
            .collect::<Vec<_>>();

        workers.into_iter().try_for_each(|worker| {
            worker
                .join()
                .map_err(|_| anyhow!("analysis worker panicked"))?
        })
    })
    .map_err(|_| anyhow!("analysis worker panicked"))??;
    drop(outcomes_tx);

    if let Some(progress) = &progress {
        progress.finish_with_message("done");
    }

    let mut outcomes = outcomes_rx.into_iter().collect::<Vec<_>>();
    outcomes.sort_by_key(|&(index, _)| index);
    let outcomes = outcomes
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect::<Vec<_>>();

    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
    info!(
        message = "finished analysis",
        analyzed = outcomes.len() - failures,
        failed = failures
    );

    match &opt.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed creating {}", path.display()))?;
            serde_json::to_writer_pretty(io::BufWriter::new(file), &outcomes)
                .context("failed writing results")?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &outcomes)
                .context("failed writing results")?;
            writeln!(handle)?;
        }
    }

    Ok(())
}
