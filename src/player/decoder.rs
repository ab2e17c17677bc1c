use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::decoder;
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as Resampler;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleLayout};
use ffmpeg_next::{codec, Packet, Rational};
use log::{debug, error, warn};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::sample_ring::SampleRing;

/// Sleep between polls while paused or parked at end of stream.
const IDLE_WAIT: Duration = Duration::from_millis(10);
/// Sleep while the frame channel is full.
const BACKPRESSURE_WAIT: Duration = Duration::from_millis(1);
/// Consecutive unreadable packets tolerated before giving up on the file.
const MAX_READ_ERRORS: u32 = 64;
/// Audio leaves the decoder as interleaved stereo f32.
pub const OUTPUT_CHANNELS: u16 = 2;
const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// An RGBA frame ready for upload.
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts_ms: u64,
}

/// Engine -> decoder thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCommand {
    Seek(u64),
    Pause,
    Resume,
    Stop,
}

/// Decoder thread -> engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderSignal {
    EndOfStream,
    Failed(String),
}

/// What the engine needs to know before decoding starts.
#[derive(Debug, Clone, Copy)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub has_audio: bool,
}

/// Channels connecting a decoder thread to its engine.
pub struct DecoderLinks {
    pub frames: Sender<DecodedFrame>,
    /// Absent when nothing will play the audio; the track is then skipped.
    pub samples: Option<Arc<SampleRing>>,
    pub commands: Receiver<DecoderCommand>,
    pub signals: Sender<DecoderSignal>,
}

/// Opens `path` far enough to read stream parameters.
pub fn probe(path: &Path) -> Result<MediaInfo> {
    let input = ffmpeg_next::format::input(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let video_stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("{} has no video stream", path.display()))?;
    let video = codec::Context::from_parameters(video_stream.parameters())?
        .decoder()
        .video()
        .context("unsupported video codec")?;

    let sample_rate = match input.streams().best(Type::Audio) {
        Some(stream) => Some(
            codec::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()
                .context("unsupported audio codec")?
                .rate(),
        ),
        None => None,
    };

    let duration_ms = if input.duration() > 0 {
        (input.duration() as f64 * 1_000.0 / ffmpeg_next::ffi::AV_TIME_BASE as f64) as u64
    } else {
        0
    };

    Ok(MediaInfo {
        width: video.width(),
        height: video.height(),
        duration_ms,
        sample_rate: sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
        has_audio: sample_rate.is_some(),
    })
}

/// Starts decoding `path` on its own thread. Failures inside the thread are
/// logged and reported through [`DecoderSignal::Failed`].
pub fn spawn_decoder(path: &Path, output_rate: u32, links: DecoderLinks) -> Result<JoinHandle<()>> {
    let path = path.to_path_buf();
    thread::Builder::new()
        .name("video-decoder".into())
        .spawn(move || {
            let signals = links.signals.clone();
            let outcome = Session::open(&path, output_rate, links).and_then(Session::run);
            if let Err(e) = outcome {
                error!("decoder for {} stopped: {e:#}", path.display());
                let _ = signals.send(DecoderSignal::Failed(format!("{e:#}")));
            }
        })
        .context("failed to spawn decoder thread")
}

enum Flow {
    Continue,
    Exit,
}

struct AudioPath {
    index: usize,
    decoder: decoder::Audio,
    resampler: Resampler,
}

impl AudioPath {
    fn decode(&mut self, packet: &Packet, ring: &SampleRing) {
        if let Err(e) = self.decoder.send_packet(packet) {
            debug!("audio decoder rejected packet: {e}");
            return;
        }

        let mut decoded = AudioFrame::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut resampled = AudioFrame::empty();
            if self.resampler.run(&decoded, &mut resampled).is_err() {
                continue;
            }
            let bytes = resampled.data(0);
            let len = (resampled.samples() * OUTPUT_CHANNELS as usize * 4).min(bytes.len());
            let samples: Vec<f32> = bytes[..len]
                .chunks_exact(4)
                .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            ring.extend(&samples);
        }
    }
}

/// One open file plus the decode loop's state.
struct Session {
    input: Input,
    video_index: usize,
    video_time_base: Rational,
    video: decoder::Video,
    scaler: Scaler,
    audio: Option<AudioPath>,
    links: DecoderLinks,
    paused: bool,
    /// A seek happened; deliver one frame even while paused.
    preview_pending: bool,
    pending_seek: Option<u64>,
    at_eof: bool,
    read_errors: u32,
}

impl Session {
    fn open(path: &Path, output_rate: u32, links: DecoderLinks) -> Result<Self> {
        let input = ffmpeg_next::format::input(path)
            .with_context(|| format!("cannot open {}", path.display()))?;

        let (video_index, video_time_base, video_params) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| anyhow!("no video stream"))?;
            (stream.index(), stream.time_base(), stream.parameters())
        };
        let audio_params = input
            .streams()
            .best(Type::Audio)
            .filter(|_| links.samples.is_some())
            .map(|stream| (stream.index(), stream.parameters()));

        let video = codec::Context::from_parameters(video_params)?
            .decoder()
            .video()?;

        let scaler = Scaler::get(
            video.format(),
            video.width(),
            video.height(),
            Pixel::RGBA,
            video.width(),
            video.height(),
            Flags::BILINEAR,
        )
        .context("cannot create RGBA scaler")?;

        let audio = match audio_params {
            Some((index, params)) => {
                let decoder = codec::Context::from_parameters(params)?.decoder().audio()?;
                let resampler = Resampler::get(
                    decoder.format(),
                    decoder.channel_layout(),
                    decoder.rate(),
                    Sample::F32(SampleLayout::Packed),
                    ChannelLayout::STEREO,
                    output_rate,
                )
                .context("cannot create audio resampler")?;
                Some(AudioPath {
                    index,
                    decoder,
                    resampler,
                })
            }
            None => None,
        };

        Ok(Self {
            input,
            video_index,
            video_time_base,
            video,
            scaler,
            audio,
            links,
            paused: true,
            preview_pending: false,
            pending_seek: None,
            at_eof: false,
            read_errors: 0,
        })
    }

    fn run(mut self) -> Result<()> {
        loop {
            if let Flow::Exit = self.drain_commands() {
                return Ok(());
            }

            if let Some(target) = self.pending_seek.take() {
                self.seek(target);
            }

            if self.at_eof || (self.paused && !self.preview_pending) {
                thread::sleep(IDLE_WAIT);
                continue;
            }

            let mut packet = Packet::empty();
            let flow = match packet.read(&mut self.input) {
                Ok(()) => {
                    self.read_errors = 0;
                    self.decode_packet(&packet)?
                }
                Err(ffmpeg_next::Error::Eof) => self.finish_stream()?,
                Err(e) => {
                    self.read_errors += 1;
                    if self.read_errors >= MAX_READ_ERRORS {
                        return Err(anyhow!("giving up after repeated read errors: {e}"));
                    }
                    debug!("skipping unreadable packet: {e}");
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                return Ok(());
            }
        }
    }

    fn drain_commands(&mut self) -> Flow {
        loop {
            match self.links.commands.try_recv() {
                Ok(command) => {
                    if let Flow::Exit = self.apply(command) {
                        return Flow::Exit;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }
        }
    }

    fn apply(&mut self, command: DecoderCommand) -> Flow {
        match command {
            DecoderCommand::Stop => return Flow::Exit,
            DecoderCommand::Pause => self.paused = true,
            DecoderCommand::Resume => self.paused = false,
            DecoderCommand::Seek(target_ms) => self.pending_seek = Some(target_ms),
        }
        Flow::Continue
    }

    fn seek(&mut self, target_ms: u64) {
        let ts = target_ms as i64 * (ffmpeg_next::ffi::AV_TIME_BASE as i64 / 1_000);
        match self.input.seek(ts, ..ts) {
            Ok(()) => {
                self.video.flush();
                if let Some(audio) = self.audio.as_mut() {
                    audio.decoder.flush();
                }
            }
            Err(e) => warn!("seek to {target_ms} ms failed: {e}"),
        }
        self.at_eof = false;
        self.preview_pending = true;
    }

    fn decode_packet(&mut self, packet: &Packet) -> Result<Flow> {
        let stream = packet.stream();
        if stream == self.video_index {
            if let Err(e) = self.video.send_packet(packet) {
                debug!("video decoder rejected packet: {e}");
                return Ok(Flow::Continue);
            }
            return self.drain_video();
        }

        if let (Some(audio), Some(ring)) = (
            self.audio.as_mut().filter(|audio| audio.index == stream),
            self.links.samples.as_ref(),
        ) {
            audio.decode(packet, ring);
        }
        Ok(Flow::Continue)
    }

    fn drain_video(&mut self) -> Result<Flow> {
        let mut decoded = VideoFrame::empty();
        while self.video.receive_frame(&mut decoded).is_ok() {
            let frame = self.to_rgba(&decoded)?;
            if let Flow::Exit = self.deliver(frame) {
                return Ok(Flow::Exit);
            }
            if self.pending_seek.is_some() {
                break;
            }
        }
        Ok(Flow::Continue)
    }

    fn to_rgba(&mut self, decoded: &VideoFrame) -> Result<DecodedFrame> {
        let mut rgba = VideoFrame::empty();
        self.scaler
            .run(decoded, &mut rgba)
            .context("RGBA conversion failed")?;

        let width = rgba.width();
        let height = rgba.height();
        let row = width as usize * 4;
        let stride = rgba.stride(0);
        let data = rgba.data(0);
        let mut pixels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            pixels.extend_from_slice(&data[y * stride..y * stride + row]);
        }

        let ts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
        let seconds = ts as f64 * f64::from(self.video_time_base);
        Ok(DecodedFrame {
            rgba: pixels,
            width,
            height,
            pts_ms: (seconds * 1_000.0).max(0.0) as u64,
        })
    }

    /// Hands a frame to the engine, waiting out a full channel while still
    /// answering commands. A seek abandons the frame.
    fn deliver(&mut self, mut frame: DecodedFrame) -> Flow {
        loop {
            match self.links.commands.try_recv() {
                Ok(command) => {
                    if let Flow::Exit = self.apply(command) {
                        return Flow::Exit;
                    }
                    if self.pending_seek.is_some() {
                        return Flow::Continue;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }

            match self.links.frames.try_send(frame) {
                Ok(()) => {
                    self.preview_pending = false;
                    return Flow::Continue;
                }
                Err(TrySendError::Full(returned)) => {
                    frame = returned;
                    thread::sleep(BACKPRESSURE_WAIT);
                }
                Err(TrySendError::Disconnected(_)) => return Flow::Exit,
            }
        }
    }

    /// Drains the decoder's delayed frames and parks until the next seek.
    fn finish_stream(&mut self) -> Result<Flow> {
        if let Err(e) = self.video.send_eof() {
            debug!("video decoder refused EOF: {e}");
        }
        if let Flow::Exit = self.drain_video()? {
            return Ok(Flow::Exit);
        }
        if self.pending_seek.is_some() {
            return Ok(Flow::Continue);
        }
        self.at_eof = true;
        self.preview_pending = false;
        debug!("decoder reached end of stream");
        let _ = self.links.signals.send(DecoderSignal::EndOfStream);
        Ok(Flow::Continue)
    }
}
