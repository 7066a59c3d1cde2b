//! Integration test: a pomodoro work interval only counts once the candidate confirms it.

use rio_core::timer::{drive, Countdown, Pomodoro, PomodoroConfig, TimerEvent, TimerMode, TimerState};
use rio_core::{Cue, ProfileStore, RecordingCuePlayer, SoundCues, StudySession};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn confirmed_work_interval_is_credited() {
    let recorder = Arc::new(RecordingCuePlayer::default());
    let cues = SoundCues::new(recorder.clone(), false);
    let mut session = StudySession::new(ProfileStore::in_memory(), cues.clone());
    session.login("rodrigo").unwrap();

    let config = PomodoroConfig {
        work_minutes: 2,
        break_minutes: 1,
    };
    let (mut timer, mut events) = Pomodoro::new(config, cues);
    timer.select_topic(Some("eco-1".into())).unwrap();
    timer.start().unwrap();

    assert_eq!(drive(&mut timer).await, TimerState::Completed);
    assert_eq!(timer.mode(), TimerMode::Break);

    // nothing credited before confirmation
    assert_eq!(session.state().unwrap().topic("eco-1").study_minutes, 0);

    let requested = std::iter::from_fn(|| events.try_recv().ok())
        .any(|e| e == TimerEvent::CommitRequested { topic_id: "eco-1".into(), minutes: 2 });
    assert!(requested);

    let commit = timer.confirm_commit().expect("commit pending");
    let update = session.commit_study(&commit).unwrap();
    assert_eq!(update.xp, 1);
    assert_eq!(session.state().unwrap().topic("eco-1").study_minutes, 2);

    assert_eq!(
        recorder.played(),
        vec![Cue::Meow, Cue::TimerEnd, Cue::Purr, Cue::Success]
    );
}

#[tokio::test(start_paused = true)]
async fn dismissed_interval_is_not_credited() {
    let mut session = StudySession::new(ProfileStore::in_memory(), SoundCues::default());
    session.login("rodrigo").unwrap();

    let (mut timer, _events) = Pomodoro::new(
        PomodoroConfig {
            work_minutes: 1,
            break_minutes: 1,
        },
        SoundCues::default(),
    );
    timer.select_topic(Some("eco-1".into())).unwrap();
    timer.start().unwrap();
    drive(&mut timer).await;

    assert!(timer.dismiss_commit().is_some());
    assert_eq!(session.state().unwrap().xp, 0);

    // break runs without a topic requirement and hands back to work
    timer.start().unwrap();
    drive(&mut timer).await;
    assert_eq!(timer.mode(), TimerMode::Work);
    assert_eq!(timer.remaining_secs(), 60);
}
