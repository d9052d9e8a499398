extern crate ffmpeg_next as ffmpeg;

use crate::img::frame::Frame;
use crate::Config;
use anyhow::{anyhow, Context, Result};
use ffmpeg::format::{Format, Pixel};
use ffmpeg::frame::Video;
use ffmpeg::software::scaling::{context::Context as FFContext, flag::Flags};
use ffmpeg::sys::{av_log_set_level, AV_LOG_QUIET};
use ffmpeg::Dictionary;
use flume::{Sender, TrySendError};
use opencv::core::{Mat, CV_8UC3};
use opencv::prelude::MatTraitConst;
use std::ffi::c_void;

/// Grabs the desktop through an ffmpeg capture device and forwards every
/// `process_frame_rate`-th frame.
pub struct ScreenStream {
    pub capturing: bool,
    pub frame_index: i64,
    pub dropped: u64,
    scaler: Option<FFContext>,
    sender: Sender<Frame>,
    config: Config,
}

impl ScreenStream {
    pub fn new(config: Config, sender: Sender<Frame>) -> Self {
        ScreenStream {
            capturing: false,
            frame_index: 0,
            dropped: 0,
            scaler: None,
            sender,
            config,
        }
    }

    fn open_device(&self) -> Result<ffmpeg::format::context::Input> {
        let device = ffmpeg::device::input::video()
            .find(|format| format.name() == self.config.capture_format)
            .ok_or_else(|| anyhow!("no capture device named {}", self.config.capture_format))?;

        let mut options = Dictionary::new();
        options.set("framerate", &self.config.capture_framerate.to_string());
        if let Some(size) = &self.config.video_size {
            options.set("video_size", size);
        }

        let context = ffmpeg::format::open_with(&self.config.display, &Format::Input(device), options)
            .with_context(|| format!("opening display {}", self.config.display))?;

        Ok(context.input())
    }

    pub async fn capture(&mut self) -> Result<()> {
        ffmpeg::init().context("initializing ffmpeg")?;
        ffmpeg::device::register_all();

        unsafe { av_log_set_level(AV_LOG_QUIET) }

        info!("****setting up capture*****");
        let mut ictx = self.open_device()?;

        let input = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("capture device has no video stream"))?;
        let video_stream_index = input.index();

        let context_decoder = ffmpeg::codec::context::Context::from_parameters(input.parameters())?;
        let mut decoder = context_decoder.decoder().video()?;

        self.scaler = Some(FFContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::BGR24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )?);

        info!(
            "capturing {} {}x{}",
            self.config.display,
            decoder.width(),
            decoder.height()
        );
        self.capturing = true;

        for (stream, packet) in ictx.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            match decoder.send_packet(&packet) {
                Ok(_) => {
                    if !self.receive_and_forward_frames(&mut decoder).await? {
                        break;
                    }
                }
                Err(error) => error!("{}", error),
            }
        }

        decoder.send_eof()?;
        self.receive_and_forward_frames(&mut decoder).await?;

        self.capturing = false;
        info!("capture stopped after {} frames", self.frame_index);
        Ok(())
    }

    /// Returns false once the receiving side is gone.
    async fn receive_and_forward_frames(
        &mut self,
        decoder: &mut ffmpeg::decoder::Video,
    ) -> Result<bool> {
        let mut decoded = Video::empty();

        while decoder.receive_frame(&mut decoded).is_ok() {
            if self.frame_index.rem_euclid(self.config.process_frame_rate) != 0 {
                self.frame_index += 1;
                continue;
            }

            let mut bgr_frame = Video::empty();
            self.scaler
                .as_mut()
                .ok_or_else(|| anyhow!("scaler not initialized"))?
                .run(&decoded, &mut bgr_frame)?;

            let bgr_mat: Mat;

            unsafe {
                let raw_bgr_frame = bgr_frame
                    .as_ptr()
                    .as_ref()
                    .ok_or_else(|| anyhow!("empty scaled frame"))?;

                // borrowed from the ffmpeg frame, copied below
                let borrowed = Mat::new_rows_cols_with_data(
                    raw_bgr_frame.height,
                    raw_bgr_frame.width,
                    CV_8UC3,
                    raw_bgr_frame.data[0] as *mut c_void,
                    raw_bgr_frame.linesize[0].try_into()?,
                )?;
                bgr_mat = borrowed.try_clone()?;
            }

            let frame = Frame::new(bgr_mat, self.frame_index);

            match self.sender.try_send(frame) {
                Ok(_) => {}
                Err(TrySendError::Full(frame)) => {
                    self.dropped += 1;
                    trace!("frame {}\tdropped, consumer busy", frame.num);
                }
                Err(TrySendError::Disconnected(_)) => return Ok(false),
            }

            self.frame_index += 1;
            tokio::task::yield_now().await;
        }

        Ok(true)
    }
}
