use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, AudioSink};

mod envelope;
mod filter;
mod frame;
mod render;
mod voice;

pub use frame::StereoFrame;
pub use render::{MAX_VOICES, RenderEngine};
pub use voice::RenderVoice;

// Control-thread handle to the running streams. Dropping it tears both
// streams down, which silences everything.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    sample_rate: u32,
    input_rx: Option<Receiver<Vec<StereoFrame>>>,
    _output_stream: cpal::Stream,
    _input_stream: Option<cpal::Stream>, // None when no mic available
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // The mic frame channel, for the capture capability. Single shared
    // handle: can only be taken once.
    pub fn take_input(&mut self) -> Option<Receiver<Vec<StereoFrame>>> {
        self.input_rx.take()
    }
}

impl AudioSink for AudioHandle {
    fn send(&mut self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    if channels != 2 {
        anyhow::bail!("expected a stereo output device, got {channels} channels");
    }

    let (input_tx, input_rx) = crossbeam_channel::bounded::<Vec<StereoFrame>>(4096);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, channels)?;
            output_stream.play().context("failed to play output stream")?;

            let input_stream = try_build_input_stream(&host, sample_rate, input_tx);

            Ok(AudioHandle {
                tx,
                sample_rate,
                input_rx: Some(input_rx),
                _output_stream: output_stream,
                _input_stream: input_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = RenderEngine::new(config.sample_rate);

    let err_fn = |err| eprintln!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            // drain pending commands first so a stop lands before this block
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            // interleaved stereo f32 reinterpreted as frames
            let frames: &mut [StereoFrame] = unsafe {
                std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
            };
            engine.render_block(frames);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn try_build_input_stream(
    host: &cpal::Host,
    target_sample_rate: cpal::SampleRate,
    tx: Sender<Vec<StereoFrame>>,
) -> Option<cpal::Stream> {
    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            eprintln!("phrasepad: no default input device, recording disabled");
            return None;
        }
    };

    let supported = device.default_input_config().ok()?;
    let mut stream_config: cpal::StreamConfig = supported.into();
    stream_config.sample_rate = target_sample_rate;

    let in_channels = stream_config.channels as usize;

    let err_fn = |err| eprintln!("audio input stream error: {err}");

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let frames: Vec<StereoFrame> = if in_channels == 1 {
                    data.iter().map(|&s| StereoFrame::mono(s)).collect()
                } else {
                    data.chunks_exact(in_channels)
                        .map(|c| StereoFrame {
                            left: c[0],
                            right: if c.len() > 1 { c[1] } else { c[0] },
                        })
                        .collect()
                };

                let _ = tx.try_send(frames);
            },
            err_fn,
            None,
        )
        .ok()?;

    if let Err(e) = stream.play() {
        eprintln!("phrasepad: could not start input stream: {e}");
        return None;
    }

    Some(stream)
}
