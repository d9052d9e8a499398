use crate::{explore::Policy, games::SupportedGames, stream::ScreenStream};
use anyhow::{anyhow, Result};
use clap::Parser;
use opencv::core::{get_num_threads, set_num_threads};
use std::{path::PathBuf, thread::available_parallelism};

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

pub mod automation;
pub mod env;
pub mod explore;
pub mod games;
pub mod img;
pub mod input;
pub mod landmark;
pub mod pipeline;
pub mod roi;
pub mod state;
pub mod stream;
pub mod vision;

#[cfg(test)]
mod testing;

/// Flash game player
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    /// The game to play.
    #[clap(short, long, arg_enum)]
    pub game: SupportedGames,

    /// Directory holding one PNG template per landmark.
    #[clap(short, long)]
    pub images: PathBuf,

    /// Minimum normalized correlation for a template to count as found.
    #[clap(long, default_value_t = 0.9)]
    pub threshold: f64,

    /// Processed frames between full state re-detections.
    #[clap(long, default_value_t = 200)]
    pub adjust_interval: u32,

    /// Exploration probability handed to randomize_action.
    #[clap(long, default_value_t = 0.1)]
    pub exploration: f64,

    #[clap(long, arg_enum, default_value = "walk")]
    pub policy: Policy,

    #[clap(long)]
    pub seed: Option<u64>,

    /// Multiplier on every settle delay after clicks.
    #[clap(long, default_value_t = 1.0)]
    pub delay_scale: f64,

    /// ffmpeg capture device.
    #[clap(long, default_value = "x11grab")]
    pub capture_format: String,

    /// Display (or device input) to capture.
    #[clap(long, default_value = ":0.0")]
    pub display: String,

    #[clap(long, default_value_t = 30)]
    pub capture_framerate: u32,

    /// Capture size, e.g. 1920x1080; the device default when omitted.
    #[clap(long)]
    pub video_size: Option<String>,

    /// Process one of every this many captured frames.
    #[clap(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(1..))]
    pub process_frame_rate: i64,

    #[clap(long, default_value_t = 0)]
    pub num_opencv_threads: i32,

    /// Show processed frames in a window
    #[clap(short, long)]
    pub show_frames: bool,

    /// Write the frame of every terminal observation here.
    #[clap(long)]
    pub dump_dir: Option<PathBuf>,

    /// Stop after this many processed frames.
    #[clap(long)]
    pub max_frames: Option<u64>,

    #[clap(long, default_value = "models/crnn.onnx")]
    pub ocr_model: PathBuf,

    #[clap(long, default_value = "models/alphabet_36.txt")]
    pub ocr_vocabulary: PathBuf,

    /// Gray level above which counter pixels count as ink.
    #[clap(long, default_value_t = 170.0)]
    pub ocr_threshold: f64,

    #[clap(long)]
    pub ocr_cuda: bool,
}

impl Config {
    pub fn game_config(&self) -> games::GameConfig {
        games::GameConfig {
            adjust_interval: self.adjust_interval,
            delay_scale: self.delay_scale,
            policy: self.policy,
            seed: self.seed,
        }
    }
}

pub async fn start() -> Result<()> {
    pretty_env_logger::init_timed();

    let mut config = Config::parse();

    if config.num_opencv_threads == 0 {
        let total_threads = available_parallelism()?.get() as i32 / 2;
        config.num_opencv_threads = total_threads.max(1);
    }

    if !opencv::core::use_optimized()? {
        debug!("changing opencv to use optimized code");
        opencv::core::set_use_optimized(true)?;
    } else {
        debug!("opencv is using optimized code")
    }

    set_num_threads(config.num_opencv_threads)?;

    let opencv_threads = get_num_threads()?;
    debug!("opencv is using {} threads", opencv_threads);

    if let Some(dir) = &config.dump_dir {
        std::fs::create_dir_all(dir)?;
    }

    let (mut pipe, frame_sender) = pipeline::new(config.clone());
    if config.show_frames {
        pipe.start_preview_thread();
    }

    let vision = pipeline::make_vision(&config)?;
    let agent = pipe.start_agent(vision);

    let mut stream = ScreenStream::new(config, frame_sender);
    let captured = stream.capture().await;
    drop(stream);

    let summary = agent
        .join()
        .map_err(|_| anyhow!("agent thread panicked"))??;
    info!("{}", summary);

    captured
}
