// Integration tests for the audio session controller
//
// These run against the in-memory capture/playback backends and verify the
// recording/playback exclusivity rules and the best-effort failure handling.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use voicebank::audio::{
    AudioClip, AudioSessionController, AudioSpec, MemoryCapture, MemoryPlayback,
    MemoryPlaybackMonitor, PlaybackEvent,
};

fn test_controller(
    temp: &TempDir,
    capture_samples: Vec<i16>,
) -> (AudioSessionController, MemoryPlaybackMonitor) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (playback, monitor) = MemoryPlayback::new();
    let controller = AudioSessionController::new(
        Box::new(MemoryCapture::new(capture_samples)),
        Box::new(playback),
        AudioSpec::default(),
        temp.path().join("scratch"),
    );
    (controller, monitor)
}

fn write_wav(path: &Path, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 24000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_record_stop_produces_wav_with_captured_samples() -> Result<()> {
    let temp = TempDir::new()?;
    let captured: Vec<i16> = (0..4800).map(|i| (i % 1000) as i16).collect();
    let (mut controller, _monitor) = test_controller(&temp, captured.clone());

    let handle = controller.start_recording().await;
    assert!(handle.is_some(), "start_recording should yield a handle");
    assert!(controller.is_recording());

    let path = controller.stop_recording().await;
    assert!(!controller.is_recording());

    let path = path.expect("stop should return the recorded file");
    assert!(path.exists());

    let clip = AudioClip::open(&path)?;
    assert_eq!(clip.spec.sample_rate, 24000);
    assert_eq!(clip.spec.channels, 1);
    assert_eq!(clip.samples, captured, "recorded samples should round-trip");
    assert!(clip.path.ends_with(".wav"));
    // 4800 mono samples at 24 kHz
    assert!((clip.duration_seconds() - 0.2).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_stop_recording_when_idle_returns_none() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, _monitor) = test_controller(&temp, vec![0i16; 100]);

    assert!(controller.stop_recording().await.is_none());
    assert!(!controller.is_recording());

    Ok(())
}

#[tokio::test]
async fn test_unavailable_device_fails_soft() -> Result<()> {
    let temp = TempDir::new()?;
    let (playback, _monitor) = MemoryPlayback::new();
    let mut controller = AudioSessionController::new(
        Box::new(MemoryCapture::unavailable()),
        Box::new(playback),
        AudioSpec::default(),
        temp.path().join("scratch"),
    );

    // No error surfaces; the caller just observes "it didn't start".
    assert!(controller.start_recording().await.is_none());
    assert!(!controller.is_recording());
    assert!(controller.stop_recording().await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_restarting_recording_replaces_previous_capture() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, _monitor) = test_controller(&temp, vec![7i16; 2400]);

    let first = controller.start_recording().await.expect("first start");
    let second = controller.start_recording().await.expect("second start");
    assert_ne!(first.id, second.id);
    assert!(controller.is_recording());

    // Exactly one stop, exactly one file location.
    let path = controller.stop_recording().await;
    assert!(path.is_some());
    assert!(controller.stop_recording().await.is_none());

    // The superseded recording's temp file was deleted, so the scratch
    // directory holds only the surviving recording.
    let scratch_files: Vec<PathBuf> = fs::read_dir(temp.path().join("scratch"))?
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(scratch_files.len(), 1, "only one capture file should remain");
    assert_eq!(scratch_files[0], path.unwrap());

    Ok(())
}

#[tokio::test]
async fn test_playback_exclusivity() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, monitor) = test_controller(&temp, Vec::new());

    let clip_a = temp.path().join("a.wav");
    let clip_b = temp.path().join("b.wav");
    write_wav(&clip_a, &[1i16; 240])?;
    write_wav(&clip_b, &[2i16; 480])?;

    controller.play(&clip_a).await;
    assert!(controller.is_playing());
    assert_eq!(
        monitor.events(),
        vec![PlaybackEvent::Play { sample_count: 240 }]
    );

    // Playing B stops A first, and the flag is true once play() returns.
    controller.play(&clip_b).await;
    assert!(controller.is_playing());
    assert_eq!(
        monitor.events(),
        vec![
            PlaybackEvent::Play { sample_count: 240 },
            PlaybackEvent::Stop,
            PlaybackEvent::Play { sample_count: 480 },
        ]
    );

    // The superseded playback's completion fired during the switch; give the
    // completion task time to run and confirm it did not clear the flag.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        controller.is_playing(),
        "stale completion must not clear is_playing"
    );

    controller.stop_playback().await;
    assert!(!controller.is_playing());

    Ok(())
}

#[tokio::test]
async fn test_playback_completion_clears_flag() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, monitor) = test_controller(&temp, Vec::new());

    let clip = temp.path().join("clip.wav");
    write_wav(&clip, &[3i16; 240])?;

    controller.play(&clip).await;
    assert!(controller.is_playing());

    // Simulate the platform reaching end-of-file.
    monitor.finish_current();
    assert!(
        wait_until(|| !controller.is_playing()).await,
        "is_playing should flip false at end-of-file"
    );

    Ok(())
}

#[tokio::test]
async fn test_play_undecodable_file_fails_soft() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, monitor) = test_controller(&temp, Vec::new());

    let garbage = temp.path().join("not-audio.wav");
    fs::write(&garbage, b"definitely not a wav file")?;

    controller.play(&garbage).await;
    assert!(!controller.is_playing());
    assert!(monitor.events().is_empty(), "backend should not be touched");

    controller.play(temp.path().join("missing.wav")).await;
    assert!(!controller.is_playing());

    Ok(())
}

#[tokio::test]
async fn test_stop_playback_is_idempotent() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut controller, _monitor) = test_controller(&temp, Vec::new());

    controller.stop_playback().await;
    controller.stop_playback().await;
    assert!(!controller.is_playing());

    Ok(())
}
