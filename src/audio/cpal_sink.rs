//! Device output through cpal
//!
//! cpal streams are not `Send` on every platform, so the stream lives on a
//! dedicated thread. The sink only holds channel ends: cues travel to the
//! device callback as voices and are mixed there.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::error::AudioError;

use super::sink::AudioSink;

struct Voice {
    samples: Arc<[f32]>,
    gain: f32,
    /// Source samples advanced per device frame
    step: f64,
    pos: f64,
}

impl Voice {
    fn finished(&self) -> bool {
        self.pos as usize >= self.samples.len()
    }
}

enum Control {
    Resume,
}

/// [`AudioSink`] playing on the default output device
pub struct CpalSink {
    voices: Sender<Voice>,
    control: Sender<Control>,
    device_rate: u32,
    ready: bool,
    _thread: JoinHandle<()>,
}

impl CpalSink {
    /// Open the default output device, suspended
    pub fn open() -> Result<Self, AudioError> {
        let (voice_tx, voice_rx) = mpsc::channel();
        let (control_tx, control_rx) = mpsc::channel();
        let (setup_tx, setup_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("camwatch-audio".into())
            .spawn(move || match open_output(voice_rx) {
                Ok((stream, rate)) => {
                    let _ = setup_tx.send(Ok(rate));
                    // Runs until the sink drops its control sender
                    while let Ok(Control::Resume) = control_rx.recv() {
                        if let Err(e) = stream.play() {
                            tracing::warn!(error = %e, "Failed to start audio stream");
                        }
                    }
                }
                Err(e) => {
                    let _ = setup_tx.send(Err(e));
                }
            })
            .map_err(|e| AudioError::Output(e.to_string()))?;

        let device_rate = setup_rx
            .recv()
            .map_err(|_| AudioError::Output("audio thread exited during setup".into()))??;

        tracing::info!(sample_rate = device_rate, "Audio output opened");

        Ok(Self {
            voices: voice_tx,
            control: control_tx,
            device_rate,
            ready: false,
            _thread: thread,
        })
    }

    /// Sample rate of the output device
    pub fn device_rate(&self) -> u32 {
        self.device_rate
    }
}

impl AudioSink for CpalSink {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.control
            .send(Control::Resume)
            .map_err(|_| AudioError::Output("audio thread stopped".into()))?;
        self.ready = true;
        Ok(())
    }

    fn play(&mut self, samples: Arc<[f32]>, sample_rate: u32, gain: f32) -> Result<(), AudioError> {
        if !self.ready {
            return Err(AudioError::NotInitialized);
        }

        let voice = Voice {
            samples,
            gain,
            step: f64::from(sample_rate) / f64::from(self.device_rate.max(1)),
            pos: 0.0,
        };
        self.voices
            .send(voice)
            .map_err(|_| AudioError::Output("audio thread stopped".into()))
    }
}

fn open_output(voices: Receiver<Voice>) -> Result<(Stream, u32), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Output("no output device".into()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Output(e.to_string()))?;

    let format = supported.sample_format();
    let config: StreamConfig = supported.config();

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, voices)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, voices)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, voices)?,
        other => {
            return Err(AudioError::Output(format!("unsupported sample format {:?}", other)));
        }
    };

    Ok((stream, config.sample_rate.0))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    incoming: Receiver<Voice>,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels.max(1));
    let mut active: Vec<Voice> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                while let Ok(voice) = incoming.try_recv() {
                    active.push(voice);
                }
                mix_into(data, channels, &mut active);
            },
            |e| tracing::warn!(error = %e, "Audio stream error"),
            None,
        )
        .map_err(|e| AudioError::Output(e.to_string()))
}

fn mix_into<T>(data: &mut [T], channels: usize, active: &mut Vec<Voice>)
where
    T: SizedSample + FromSample<f32>,
{
    for frame in data.chunks_mut(channels) {
        let mut mix = 0.0f32;
        for voice in active.iter_mut() {
            if let Some(sample) = voice.samples.get(voice.pos as usize) {
                mix += sample * voice.gain;
            }
            voice.pos += voice.step;
        }

        let value = T::from_sample(mix.clamp(-1.0, 1.0));
        for slot in frame.iter_mut() {
            *slot = value;
        }
    }

    active.retain(|voice| !voice.finished());
}
