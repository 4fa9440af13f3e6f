//! Integration tests for playback timing, looping and cancellation.
//!
//! All timing tests run on a paused tokio clock, so elapsed times are
//! exact virtual milliseconds rather than wall-clock measurements.

use std::sync::Arc;
use std::time::Duration;

use macro_replay::player::{PlaybackOptions, PlaybackReport, Player, PlayerEvent};
use macro_replay::{MacroEvent, Recording};
use tokio::time::Instant;

const TOLERANCE: Duration = Duration::from_millis(2);

fn recording_at(timestamps: &[f64]) -> Recording {
    let events = timestamps
        .iter()
        .enumerate()
        .map(|(i, t)| MacroEvent::pointer_move(i as i32, i as i32 * 10, *t))
        .collect();
    Recording::from_events("timed", events)
}

fn assert_near(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(diff <= TOLERANCE, "expected ~{expected:?}, got {actual:?}");
}

/// Everything observed during one playback.
struct Observed {
    simulated: Vec<(MacroEvent, Duration)>,
    notifications: Vec<PlayerEvent>,
    report: PlaybackReport,
}

impl Observed {
    fn times(&self) -> Vec<Duration> {
        self.simulated.iter().map(|(_, t)| *t).collect()
    }
}

/// Play to completion, timestamping every simulate-input request.
async fn observe(
    player: &Arc<Player>,
    recording: &Recording,
    options: PlaybackOptions,
) -> Observed {
    let mut rx = player.subscribe();
    let start = Instant::now();
    let handle = {
        let player = Arc::clone(player);
        let recording = recording.clone();
        tokio::spawn(async move { player.play_with(&recording, options).await })
    };

    let mut simulated = Vec::new();
    let mut notifications = Vec::new();
    while let Some(event) = rx.recv().await {
        if let PlayerEvent::SimulateInput(e) = &event {
            simulated.push((*e, start.elapsed()));
        }
        let done = event == PlayerEvent::Stopped;
        notifications.push(event);
        if done {
            break;
        }
    }

    let report = handle.await.unwrap().unwrap();
    Observed {
        simulated,
        notifications,
        report,
    }
}

#[tokio::test(start_paused = true)]
async fn loop_count_two_replays_in_order() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 100.0]);
    recording.set_loop_count(2);
    let e0 = recording.events()[0];
    let e1 = recording.events()[1];

    let observed = observe(&player, &recording, PlaybackOptions::default()).await;

    let order: Vec<_> = observed.simulated.iter().map(|(e, _)| *e).collect();
    assert_eq!(order, vec![e0, e1, e0, e1]);

    let t = observed.times();
    assert!(t[1] - t[0] >= Duration::from_millis(100));
    assert!(t[3] - t[2] >= Duration::from_millis(100));
    assert_near(t[1], 100);
    assert_near(t[3], 200);

    assert_eq!(observed.report.events_played, 4);
    assert_eq!(observed.report.passes_completed, 2);
    assert!(!observed.report.cancelled);
}

#[tokio::test(start_paused = true)]
async fn double_speed_halves_delays() {
    let player = Arc::new(Player::new());
    let recording = recording_at(&[0.0, 100.0, 300.0, 700.0]);

    let normal = observe(&player, &recording, PlaybackOptions::new().speed(1.0)).await;
    let fast = observe(&player, &recording, PlaybackOptions::new().speed(2.0)).await;

    let normal = normal.times();
    let fast = fast.times();
    for i in 1..normal.len() {
        let normal_gap = normal[i] - normal[i - 1];
        let fast_gap = fast[i] - fast[i - 1];
        assert_near(fast_gap * 2, normal_gap.as_millis() as u64);
    }
    assert_near(fast[3], 350);
}

#[tokio::test(start_paused = true)]
async fn recording_speed_is_used_without_override() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 400.0]);
    recording.set_playback_speed(4.0).unwrap();

    let observed = observe(&player, &recording, PlaybackOptions::default()).await;
    assert_near(observed.times()[1], 100);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_playback_halts_promptly() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 1000.0, 2000.0]);
    recording.set_loop_count(3);

    let mut rx = player.subscribe();
    let start = Instant::now();
    let handle = {
        let player = Arc::clone(&player);
        tokio::spawn(async move { player.play(&recording).await })
    };

    let mut simulated = 0;
    let mut stopped = 0;
    while let Some(event) = rx.recv().await {
        match event {
            PlayerEvent::SimulateInput(_) => {
                simulated += 1;
                if simulated == 1 {
                    player.stop();
                }
            }
            PlayerEvent::Stopped => {
                stopped += 1;
                break;
            }
            _ => {}
        }
    }
    assert!(start.elapsed() < Duration::from_millis(1000));

    let report = handle.await.unwrap().unwrap();
    assert!(report.cancelled);
    assert_eq!(report.events_played, 1);
    assert_eq!(report.passes_completed, 0);

    // Nothing further arrives once the task has finished.
    tokio::time::sleep(Duration::from_secs(10)).await;
    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, PlayerEvent::SimulateInput(_)));
        if event == PlayerEvent::Stopped {
            stopped += 1;
        }
    }
    assert_eq!(simulated, 1);
    assert_eq!(stopped, 1);
    assert!(!player.is_playing());
}

#[tokio::test(start_paused = true)]
async fn zero_loop_count_repeats_until_stopped() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 10.0, 20.0]);
    recording.set_loop_count(0);

    let mut rx = player.subscribe();
    let handle = {
        let player = Arc::clone(&player);
        tokio::spawn(async move { player.play(&recording).await })
    };

    let mut simulated = 0;
    while let Some(event) = rx.recv().await {
        match event {
            PlayerEvent::SimulateInput(_) => {
                simulated += 1;
                if simulated == 10 {
                    player.stop();
                }
            }
            PlayerEvent::Stopped => break,
            _ => {}
        }
    }

    let report = handle.await.unwrap().unwrap();
    assert!(report.cancelled);
    assert_eq!(report.events_played, 10);
    assert_eq!(report.passes_completed, 3);
}

#[tokio::test(start_paused = true)]
async fn notifications_bracket_playback() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 50.0, 100.0]);
    recording.set_loop_count(2);

    let observed = observe(&player, &recording, PlaybackOptions::default()).await;
    let notes = &observed.notifications;

    assert_eq!(notes[0], PlayerEvent::Started { id: recording.id });
    assert_eq!(notes.last(), Some(&PlayerEvent::Stopped));
    assert_eq!(
        notes.iter().filter(|n| **n == PlayerEvent::Stopped).count(),
        1
    );

    // EventPlaying, SimulateInput and Progress arrive together per event.
    for chunk in notes[1..notes.len() - 1].chunks(3) {
        assert!(matches!(chunk[0], PlayerEvent::EventPlaying(_)));
        assert!(matches!(chunk[1], PlayerEvent::SimulateInput(_)));
        assert!(matches!(chunk[2], PlayerEvent::Progress { .. }));
    }
}

#[tokio::test(start_paused = true)]
async fn progress_is_per_pass() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 10.0, 20.0, 30.0]);
    recording.set_loop_count(2);

    let observed = observe(&player, &recording, PlaybackOptions::default()).await;
    let progress: Vec<(f64, u32)> = observed
        .notifications
        .iter()
        .filter_map(|n| match n {
            PlayerEvent::Progress { fraction, pass } => Some((*fraction, *pass)),
            _ => None,
        })
        .collect();

    assert_eq!(
        progress,
        vec![
            (0.25, 1),
            (0.5, 1),
            (0.75, 1),
            (1.0, 1),
            (0.25, 2),
            (0.5, 2),
            (0.75, 2),
            (1.0, 2),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn set_speed_applies_from_next_event() {
    let player = Arc::new(Player::new());
    let recording = recording_at(&[0.0, 1000.0, 2000.0]);

    let mut rx = player.subscribe();
    let start = Instant::now();
    let handle = {
        let player = Arc::clone(&player);
        tokio::spawn(async move { player.play(&recording).await })
    };

    let mut times = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            PlayerEvent::SimulateInput(_) => {
                times.push(start.elapsed());
                if times.len() == 1 {
                    player.set_speed(2.0).unwrap();
                }
            }
            PlayerEvent::Stopped => break,
            _ => {}
        }
    }
    handle.await.unwrap().unwrap();

    // The pending sleep for the second event was computed at speed 1.0.
    assert_near(times[1], 1000);
    assert_near(times[2], 1000);
}

/// A pass that falls behind schedule is not compensated.
///
/// Late events fire immediately, back to back, and the next pass starts a
/// fresh clock from the moment it begins rather than from where the
/// schedule says it should have begun. This drift is deliberate.
#[tokio::test(start_paused = true)]
async fn lag_is_not_compensated() {
    let player = Arc::new(Player::new());
    let mut recording = recording_at(&[0.0, 1000.0, 2000.0]);
    recording.set_loop_count(2);

    let mut rx = player.subscribe();
    let start = Instant::now();
    let handle = {
        let player = Arc::clone(&player);
        tokio::spawn(async move { player.play(&recording).await })
    };

    let mut times = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            PlayerEvent::SimulateInput(_) => {
                times.push(start.elapsed());
                if times.len() == 1 {
                    // Stall the first pass well past the second and third events.
                    tokio::time::advance(Duration::from_millis(2500)).await;
                }
            }
            PlayerEvent::Stopped => break,
            _ => {}
        }
    }
    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.events_played, 6);

    assert_near(times[0], 0);
    assert_near(times[1], 2500);
    assert_near(times[2], 2500);
    // Second pass: a fresh clock from 2500ms, not from the scheduled 2000ms.
    assert_near(times[3], 2500);
    assert_near(times[4], 3500);
    assert_near(times[5], 4500);
}
