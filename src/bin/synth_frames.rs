use std::path::Path;

use cardar::config::RecognizerConfig;
use cardar::imgproc::resize_area;
use cardar::io::load_rgba;
use clap::{Parser, Subcommand};
use image::{Rgba, RgbaImage};
use indicatif::ParallelProgressIterator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a replay folder: empty frames, then frames showing the card
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Reference card image
        #[arg(short, long)]
        template: String,

        /// Recognizer config JSON, for the region of interest
        #[arg(short, long)]
        config: Option<String>,

        /// Frames before the card appears
        #[arg(long, default_value = "10")]
        blank_frames: usize,

        /// Frames showing the card
        #[arg(long, default_value = "10")]
        card_frames: usize,

        /// Image width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Image height
        #[arg(long, default_value = "480")]
        height: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            template,
            config,
            blank_frames,
            card_frames,
            width,
            height,
        } => {
            generate_frames(
                &output,
                &template,
                config.as_deref(),
                blank_frames,
                card_frames,
                width,
                height,
            )?;
        }
    }

    Ok(())
}

/// Low contrast noise standing in for an empty scene.
fn background(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |_, _| {
        let v = rng.random_range(96..=112u8);
        Rgba([v, v, v, 255])
    })
}

fn generate_frames(
    output_dir: &str,
    template_path: &str,
    config_path: Option<&str>,
    blank_frames: usize,
    card_frames: usize,
    width: u32,
    height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(p) => RecognizerConfig::from_json_file(p)?,
        None => RecognizerConfig::default(),
    };
    let roi = config.region_of_interest;
    if !roi.fits_within(width, height) {
        return Err(format!("region of interest {} does not fit {}x{}", roi, width, height).into());
    }

    let card = resize_area(&load_rgba(template_path)?, roi.width, roi.height);
    std::fs::create_dir_all(output_dir)?;

    let total = blank_frames + card_frames;
    let written: Result<Vec<()>, image::ImageError> = (0..total)
        .into_par_iter()
        .progress_count(total as u64)
        .map(|idx| {
            let mut frame = background(width, height, idx as u64);
            if idx >= blank_frames {
                image::imageops::replace(&mut frame, &card, roi.x as i64, roi.y as i64);
            }
            let filename = format!("{:06}.png", idx);
            frame.save(Path::new(output_dir).join(filename))
        })
        .collect();
    written?;

    log::info!(
        "generated {} blank and {} card frames in {}",
        blank_frames,
        card_frames,
        output_dir
    );
    Ok(())
}
