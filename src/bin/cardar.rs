use std::path::{Path, PathBuf};

use cardar::camera::ReplayCamera;
use cardar::config::RecognizerConfig;
use cardar::features::OrbExtractor;
use cardar::io::{object_to_json, write_session_report};
use cardar::overlay::{AssetCatalog, HeadlessOverlay};
use cardar::preprocess::{Normalizer, ReferenceTemplate};
use cardar::runtime::{Controller, command_channel, start};
use cardar::status::LogStatus;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(version, about, author)]
struct CardarCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a replayed camera feed until the card is recognized.
    /// Type `r` to reset, `q` to quit.
    Run {
        /// Reference card image
        #[arg(short, long)]
        template: PathBuf,

        /// Folder of camera frames (png/jpg), played in name order
        #[arg(short, long)]
        frames: PathBuf,

        /// Recognizer config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the recognition threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Overlay asset catalog JSON
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Folder holding the overlay model files
        #[arg(long)]
        asset_root: Option<PathBuf>,

        /// Seed for overlay selection
        #[arg(long)]
        seed: Option<u64>,

        /// Start over from the first frame when the replay ends
        #[arg(long, default_value_t = false)]
        loop_frames: bool,

        /// Write a session report JSON on exit
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write the reference card's keypoints and descriptors as JSON.
    ExportFeatures {
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "features.json")]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<RecognizerConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => RecognizerConfig::from_json_file(p)?,
        None => RecognizerConfig::default(),
    })
}

async fn forward_stdin(controller: Controller) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match line.trim() {
                "r" | "reset" => {
                    if !controller.reset() {
                        break;
                    }
                }
                "q" | "quit" => {
                    controller.shutdown();
                    break;
                }
                "" => {}
                other => println!("unknown command {:?}; use r or q", other),
            },
            Ok(None) | Err(_) => {
                controller.shutdown();
                break;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    template: &Path,
    frames: &Path,
    config: Option<&Path>,
    threshold: Option<f32>,
    assets: Option<&Path>,
    asset_root: Option<PathBuf>,
    seed: Option<u64>,
    loop_frames: bool,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config)?;
    if let Some(t) = threshold {
        config = config.with_threshold(t);
    }
    let catalog = match assets {
        Some(p) => AssetCatalog::from_json_file(p)?,
        None => AssetCatalog::builtin()?,
    };
    let rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        let camera = ReplayCamera::new(frames, loop_frames);
        let overlay = HeadlessOverlay::new(asset_root);
        let recognition = start(&config, template, camera, overlay, LogStatus, catalog, rng).await?;
        let (controller, commands) = command_channel();
        tokio::spawn(forward_stdin(controller));
        Ok::<_, Box<dyn std::error::Error>>(recognition.run(commands).await)
    });
    // stdin reads block; do not wait for them
    runtime.shutdown_background();

    let session = result?;
    println!(
        "best similarity {:.2} after {} ticks ({} skipped), recognized: {}",
        session.best_similarity, session.ticks, session.skipped_ticks, session.recognized
    );
    if let Some(path) = report {
        write_session_report(path, &session)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = CardarCli::parse();

    match cli.command {
        Commands::Run {
            template,
            frames,
            config,
            threshold,
            assets,
            asset_root,
            seed,
            loop_frames,
            report,
        } => run(
            &template,
            &frames,
            config.as_deref(),
            threshold,
            assets.as_deref(),
            asset_root,
            seed,
            loop_frames,
            report.as_deref(),
        ),
        Commands::ExportFeatures {
            template,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let normalizer = Normalizer::from_config(&config);
            let extractor = OrbExtractor::from_config(&config);
            let reference = ReferenceTemplate::load(&template, &normalizer, &extractor)?;
            object_to_json(&output, &reference.features().export())?;
            println!(
                "wrote {} features to {}",
                reference.feature_count(),
                output.display()
            );
            Ok(())
        }
    }
}
