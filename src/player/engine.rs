use anyhow::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use egui::{Color32, ColorImage, Context, TextureHandle, TextureOptions};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use super::audio::{AudioOutput, DeviceFeed};
use super::clock::PlaybackClock;
use super::cursor::PlayCursor;
use super::decoder::{
    probe, spawn_decoder, DecodedFrame, DecoderCommand, DecoderLinks, DecoderSignal,
    OUTPUT_CHANNELS,
};
use super::events::{EngineEvent, EventHub, MediaStatus};
use super::sample_ring::SampleRing;
use super::video::FrameQueue;
use super::{PlaybackEngine, VideoSurface};

const FRAME_QUEUE_DEPTH: usize = 30;
const COMMAND_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Stopped,
    Playing,
    Paused,
}

/// Opens audio output for a file that has something to hear. A missing
/// device only costs the sound.
fn output_for<T>(has_audio: bool, path: &Path, open: impl FnOnce() -> Result<T>) -> Option<T> {
    if !has_audio {
        return None;
    }
    match open() {
        Ok(output) => Some(output),
        Err(e) => {
            warn!("{e:#}; playing {} without sound", path.display());
            None
        }
    }
}

/// Everything that exists only while a source is open.
struct Pipeline {
    decoder: Option<JoinHandle<()>>,
    commands: Sender<DecoderCommand>,
    signals: Receiver<DecoderSignal>,

    /// `None` for silent files and when no output device is available.
    audio: Option<AudioOutput>,
    clock: PlaybackClock,
    cursor: PlayCursor,

    frames: FrameQueue,
    texture: TextureHandle,
    size: [u32; 2],
}

impl Pipeline {
    fn open(path: &Path, ctx: &Context, gain: f32) -> Result<Self> {
        let info = probe(path)?;
        debug!(
            "probed {}: {}x{}, {} ms, audio: {}",
            path.display(),
            info.width,
            info.height,
            info.duration_ms,
            info.has_audio
        );

        let audio = output_for(info.has_audio, path, || AudioOutput::open(gain));

        let (clock, samples) = match audio.as_ref() {
            Some(output) => {
                let clock = PlaybackClock::device(info.sample_rate, OUTPUT_CHANNELS);
                let ring = SampleRing::for_stream(info.sample_rate, OUTPUT_CHANNELS);
                output.attach(DeviceFeed::new(
                    ring.clone(),
                    clock.clone(),
                    info.sample_rate,
                    OUTPUT_CHANNELS,
                ));
                (clock, Some(ring))
            }
            None => (PlaybackClock::wall(), None),
        };
        debug!("clock drive: {:?}", clock.drive());

        let (frame_tx, frame_rx) = bounded(FRAME_QUEUE_DEPTH);
        let (command_tx, command_rx) = bounded(COMMAND_QUEUE_DEPTH);
        let (signal_tx, signal_rx) = unbounded();

        let decoder = spawn_decoder(
            path,
            info.sample_rate,
            DecoderLinks {
                frames: frame_tx,
                samples,
                commands: command_rx,
                signals: signal_tx,
            },
        )?;

        let texture = ctx.load_texture(
            "video_frame",
            ColorImage::new(
                [info.width as usize, info.height as usize],
                Color32::BLACK,
            ),
            TextureOptions::LINEAR,
        );

        Ok(Self {
            decoder: Some(decoder),
            commands: command_tx,
            signals: signal_rx,
            audio,
            clock,
            cursor: PlayCursor::new(info.duration_ms),
            frames: FrameQueue::new(frame_rx, FRAME_QUEUE_DEPTH),
            texture,
            size: [info.width, info.height],
        })
    }

    fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            debug!("decoder already gone, dropped {command:?}");
        }
    }

    /// Freezes output and the clock until the seek lands. Returns the
    /// clamped target.
    fn seek(&mut self, target_ms: u64) -> u64 {
        let target = self.cursor.begin_seek(target_ms);
        self.silence();
        self.frames.clear();
        self.clock.jump_to_ms(target);
        self.send(DecoderCommand::Seek(target));
        target
    }

    fn silence(&self) {
        if let Some(audio) = self.audio.as_ref() {
            audio.pause();
        }
        self.clock.halt();
    }

    fn resume_output(&self) {
        if let Some(audio) = self.audio.as_ref() {
            audio.play();
        }
        self.clock.start();
    }

    fn halt(&mut self) {
        self.silence();
        self.send(DecoderCommand::Pause);
    }

    fn set_gain(&self, gain: f32) {
        if let Some(audio) = self.audio.as_ref() {
            audio.set_gain(gain);
        }
    }

    fn show(&mut self, frame: DecodedFrame) {
        let image = ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.rgba,
        );
        self.texture.set(image, TextureOptions::LINEAR);
        self.size = [frame.width, frame.height];
    }

    fn position_ms(&self) -> u64 {
        self.cursor.position_ms(self.clock.position_ms())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let _ = self.commands.send(DecoderCommand::Stop);
        if let Some(handle) = self.decoder.take() {
            let _ = handle.join();
        }
    }
}

/// [`PlaybackEngine`] backed by FFmpeg and rodio.
///
/// Volume and mute belong to the engine rather than the open source, so they
/// carry over when a new file is loaded.
pub struct FfmpegEngine {
    ctx: Context,
    hub: EventHub,
    source: Option<PathBuf>,
    pipeline: Option<Pipeline>,
    transport: Transport,
    volume: f32,
    muted: bool,
    last_position: Option<u64>,
}

impl FfmpegEngine {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            hub: EventHub::new(),
            source: None,
            pipeline: None,
            transport: Transport::Stopped,
            volume: 1.0,
            muted: false,
            last_position: None,
        }
    }

    fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    fn apply_gain(&mut self) {
        let gain = self.gain();
        if let Some(pipeline) = self.pipeline.as_ref() {
            pipeline.set_gain(gain);
        }
    }

    fn report_position(&mut self, position: u64) {
        if self.last_position != Some(position) {
            self.last_position = Some(position);
            self.hub.emit(EngineEvent::PositionChanged(position));
        }
    }
}

impl PlaybackEngine for FfmpegEngine {
    fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.hub.subscribe()
    }

    fn load_source(&mut self, path: &Path) {
        // Join the old decoder before opening the new file.
        self.pipeline = None;
        self.transport = Transport::Stopped;
        self.last_position = None;
        self.source = Some(path.to_path_buf());
        self.hub
            .emit(EngineEvent::MediaStatusChanged(MediaStatus::Loading));

        match Pipeline::open(path, &self.ctx, self.gain()) {
            Ok(mut pipeline) => {
                info!("opened {}", path.display());
                let duration = pipeline.cursor.duration_ms();
                pipeline.seek(0);
                self.pipeline = Some(pipeline);
                self.hub.emit(EngineEvent::DurationChanged(duration));
                self.report_position(0);
            }
            Err(e) => {
                error!("failed to open {}: {e:#}", path.display());
                self.hub.emit(EngineEvent::Error(format!("{e:#}")));
                self.hub
                    .emit(EngineEvent::MediaStatusChanged(MediaStatus::InvalidMedia));
            }
        }
    }

    fn stop(&mut self) {
        self.transport = Transport::Stopped;
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.halt();
            pipeline.seek(0);
            self.report_position(0);
        }
    }

    fn play(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            warn!("play requested without an open source");
            return;
        };
        if self.transport == Transport::Playing {
            return;
        }
        self.transport = Transport::Playing;
        if !pipeline.cursor.is_seeking() {
            pipeline.resume_output();
        }
        pipeline.send(DecoderCommand::Resume);
    }

    fn pause(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        self.transport = Transport::Paused;
        pipeline.halt();
    }

    fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    fn seek(&mut self, position_ms: u64) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        let target = pipeline.seek(position_ms);
        self.report_position(target);
    }

    fn position(&self) -> u64 {
        self.pipeline.as_ref().map_or(0, Pipeline::position_ms)
    }

    fn duration(&self) -> u64 {
        self.pipeline.as_ref().map_or(0, |p| p.cursor.duration_ms())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_gain();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gain();
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn source_is_valid(&self) -> bool {
        self.source.is_some()
    }

    fn update(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        let mut events = Vec::new();

        while let Ok(signal) = pipeline.signals.try_recv() {
            match signal {
                DecoderSignal::EndOfStream => pipeline.cursor.mark_end_of_stream(),
                DecoderSignal::Failed(reason) => {
                    self.transport = Transport::Stopped;
                    pipeline.silence();
                    events.push(EngineEvent::Error(reason));
                }
            }
        }

        let playing = self.transport == Transport::Playing;
        let clock_ms = pipeline.clock.position_ms();
        let step = pipeline.cursor.step(&mut pipeline.frames, playing, clock_ms);

        if let Some(frame) = step.frame {
            if step.landed {
                pipeline.clock.jump_to_ms(frame.pts_ms);
            }
            pipeline.show(frame);
        }
        if step.landed && playing {
            pipeline.resume_output();
        }
        if step.loaded {
            events.push(EngineEvent::MediaStatusChanged(MediaStatus::LoadedMedia));
        }
        if step.ended {
            info!("end of media");
            self.transport = Transport::Stopped;
            pipeline.halt();
            events.push(EngineEvent::MediaStatusChanged(MediaStatus::EndOfMedia));
        } else if playing || pipeline.cursor.is_seeking() {
            self.ctx.request_repaint();
        }

        let position = pipeline.position_ms();
        self.report_position(position);
        for event in events {
            self.hub.emit(event);
        }
    }

    fn surface(&self) -> Option<VideoSurface> {
        self.pipeline.as_ref().map(|p| VideoSurface {
            texture: p.texture.id(),
            size: p.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    #[test]
    fn missing_device_plays_without_sound() {
        let output: Option<()> = output_for(true, Path::new("clip.mp4"), || {
            Err(anyhow!("no audio output device"))
        });
        assert!(output.is_none());
    }

    #[test]
    fn silent_file_never_opens_a_device() {
        let opened = Cell::new(false);
        let output = output_for(false, Path::new("silent.mp4"), || {
            opened.set(true);
            Ok(())
        });
        assert!(output.is_none());
        assert!(!opened.get());
    }

    #[test]
    fn file_with_audio_gets_the_device() {
        let output = output_for(true, Path::new("clip.mp4"), || Ok(7));
        assert_eq!(output, Some(7));
    }
}
