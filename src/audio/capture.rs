use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{Sender, TrySendError};

use crate::config::AudioConfig;
use crate::error::{CaptureError, Result};

/// Live input stream on the default audio device.
///
/// The device callback forwards each chunk of mono i16 samples into a
/// bounded channel. When the reader falls behind and the channel is full,
/// the chunk is discarded and counted as an overrun.
pub struct AudioCapture {
    stream: cpal::Stream,
    overruns: Arc<AtomicUsize>,
    _rt_handle: Option<RtPriorityHandle>,
}

impl AudioCapture {
    pub fn new(config: &AudioConfig, tx: Sender<Vec<i16>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let sample_format = device
            .default_input_config()
            .map_err(|e| CaptureError::AudioDevice(format!("{}", e)))?
            .sample_format();

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_length as u32),
        };

        let overruns = Arc::new(AtomicUsize::new(0));

        let stream = match sample_format {
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, tx, overruns.clone())
            }
            cpal::SampleFormat::I32 => {
                build_stream::<i32>(&device, &stream_config, tx, overruns.clone())
            }
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, tx, overruns.clone())
            }
            other => Err(CaptureError::AudioDevice(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }?;

        let rt_handle = audio_thread_priority::promote_current_thread_to_real_time(
            config.buffer_length as u32,
            config.sample_rate,
        );

        let rt_handle = match rt_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            stream,
            overruns,
            _rt_handle: rt_handle,
        })
    }

    /// Chunks discarded because the reader fell behind
    pub fn overruns(&self) -> usize {
        self.overruns.load(Ordering::Relaxed)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    tx: Sender<Vec<i16>>,
    overruns: Arc<AtomicUsize>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    device
        .build_input_stream(
            stream_config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let chunk: Vec<i16> = data.iter().map(|&s| s.to_sample::<i16>()).collect();
                match tx.try_send(chunk) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        overruns.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        log::warn!("Audio receiver dropped");
                    }
                }
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::AudioStream(format!("{}", e)))
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
