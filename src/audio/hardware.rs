//! Real microphone capture (cpal) and speaker playback (rodio).
//!
//! Both cpal streams and rodio output streams are `!Send`, so each lives on
//! a dedicated thread; the async side talks to it through channels.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::backend::{
    AudioFrame, AudioSpec, CaptureBackend, PlaybackBackend, PlaybackDone, PlaybackFinisher,
};
use crate::error::DeviceError;

/// Default-input-device microphone capture.
pub struct CpalCapture {
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self { stop_tx: None }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for CpalCapture {
    async fn start(&mut self, spec: AudioSpec) -> Result<mpsc::Receiver<AudioFrame>, DeviceError> {
        // Tear down any previous capture thread first.
        self.stop_tx = None;

        let (frame_tx, frame_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        std::thread::spawn(move || capture_thread(spec, frame_tx, ready_tx, stop_rx));

        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                Ok(frame_rx)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeviceError::Backend(
                "capture thread exited before reporting status".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        // Dropping the sender unblocks the thread's recv and closes the frame
        // stream.
        self.stop_tx = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "cpal-capture"
    }
}

fn capture_thread(
    spec: AudioSpec,
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: oneshot::Sender<Result<(), DeviceError>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(DeviceError::Unavailable(
                "no default input device".to_string(),
            )));
            return;
        }
    };

    let config = cpal::StreamConfig {
        channels: spec.channels,
        sample_rate: cpal::SampleRate(spec.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let sample_rate = spec.sample_rate;
    let channels = spec.channels;
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let samples: Vec<i16> = data
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .collect();
            // Runs on the audio callback thread; drop the frame rather than
            // block if the consumer falls behind.
            let _ = frame_tx.try_send(AudioFrame {
                samples,
                sample_rate,
                channels,
            });
        },
        |err| warn!("Capture stream error: {}", err),
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(DeviceError::Unavailable(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(DeviceError::Backend(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    debug!("Capture stream running at {} Hz", sample_rate);

    // Block until stop() drops the sender (or the controller goes away).
    let _ = stop_rx.recv();
    drop(stream);
    debug!("Capture stream closed");
}

/// Default-output-device playback.
pub struct RodioPlayback {
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl RodioPlayback {
    pub fn new() -> Self {
        Self { stop_tx: None }
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for RodioPlayback {
    async fn play(
        &mut self,
        samples: Vec<i16>,
        spec: AudioSpec,
    ) -> Result<PlaybackDone, DeviceError> {
        // Replace any previous playback thread.
        self.stop_tx = None;

        let (finisher, done) = PlaybackDone::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        std::thread::spawn(move || playback_thread(samples, spec, finisher, ready_tx, stop_rx));

        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                Ok(done)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeviceError::Backend(
                "playback thread exited before reporting status".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        self.stop_tx = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "rodio-playback"
    }
}

fn playback_thread(
    samples: Vec<i16>,
    spec: AudioSpec,
    finisher: PlaybackFinisher,
    ready_tx: oneshot::Sender<Result<(), DeviceError>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(out) => out,
        Err(e) => {
            let _ = ready_tx.send(Err(DeviceError::Unavailable(e.to_string())));
            return;
        }
    };

    let sink = match rodio::Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready_tx.send(Err(DeviceError::Backend(e.to_string())));
            return;
        }
    };

    sink.append(rodio::buffer::SamplesBuffer::new(
        spec.channels,
        spec.sample_rate,
        samples,
    ));

    let _ = ready_tx.send(Ok(()));

    loop {
        match stop_rx.recv_timeout(Duration::from_millis(50)) {
            // Explicit stop, or the backend replaced/dropped this playback.
            Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                sink.stop();
                break;
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                if sink.empty() {
                    break; // reached end-of-file
                }
            }
        }
    }

    finisher.finish();
}
