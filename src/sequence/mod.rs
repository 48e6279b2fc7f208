//! Action sequencing
//!
//! [`ActionSequencer`] runs [`Action`]s one after another with humanized
//! pacing between them:
//! - a pre-action delay per action type, scaled by the profile and jittered
//! - occasional think pauses between actions
//! - fatigue, which stretches both as the session gets older
//!
//! Sessions open lazily on the first action or explicitly through
//! [`ActionSequencer::start_sequence`], and close on
//! [`ActionSequencer::end_sequence`]. Failures are logged and returned as
//! [`ActionError`] values; the sequencer stays usable afterwards.

pub mod action;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::input::{InputBackend, InputError, MouseButton, Point};
use crate::keyboard::{KeyboardSynthesizer, TypingStats};
use crate::mouse::{ClickRequest, MouseSynthesizer, MovementStats};
use crate::profile::ActionSequenceProfile;
use crate::stealth::Humanizer;

pub use action::{parse_script, Action, ActionKind, BreakKind, CustomAction, CustomError};

/// Largest slowdown fatigue applies to pre-action delays
const MAX_DELAY_FATIGUE: f64 = 2.0;
/// Largest stretch fatigue applies to think pauses
const MAX_THINK_FATIGUE: f64 = 3.0;
/// Think pauses tire twice as fast as delays
const THINK_FATIGUE_MULTIPLIER: f64 = 2.0;
const MIN_THINK_SECONDS: f64 = 0.5;
const MAX_THINK_SECONDS: f64 = 2.0;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Input failed: {0}")]
    Input(#[from] InputError),

    #[error("Custom action failed: {0}")]
    Custom(String),

    #[error("Custom action {0} reported failure")]
    CustomDeclined(String),
}

/// State of an open session, times measured on the humanizer's clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    started_at: Duration,
    last_action_at: Duration,
    action_count: u64,
}

impl Session {
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn last_action_at(&self) -> Duration {
        self.last_action_at
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }
}

/// What a closed session did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub action_count: u64,
    pub elapsed: Duration,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} actions in {:.2}s", self.action_count, self.elapsed.as_secs_f64())
    }
}

/// Everything a sequencer has counted, in one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    /// The open session so far, or else the last closed one
    pub session: Option<SessionSummary>,
    pub mouse: MovementStats,
    pub keyboard: TypingStats,
}

/// Runs actions through a mouse and a keyboard synthesizer sharing one backend.
///
/// One sequencer is driven by one thread at a time. Use separate
/// sequencers for independent input streams.
pub struct ActionSequencer {
    profile: ActionSequenceProfile,
    humanizer: Humanizer,
    mouse: MouseSynthesizer,
    keyboard: KeyboardSynthesizer,
    session: Option<Session>,
    last_summary: Option<SessionSummary>,
}

impl ActionSequencer {
    /// Sequencer with an OS-seeded humanizer on the system clock
    pub fn new(profile: ActionSequenceProfile, backend: Arc<dyn InputBackend>) -> Self {
        Self::with_humanizer(profile, backend, Humanizer::new())
    }

    /// Sequencer drawing all randomness and time from `humanizer`
    pub fn with_humanizer(
        profile: ActionSequenceProfile,
        backend: Arc<dyn InputBackend>,
        humanizer: Humanizer,
    ) -> Self {
        let mouse = MouseSynthesizer::new(Arc::clone(&backend), profile.mouse().clone());
        let keyboard = KeyboardSynthesizer::new(backend, profile.keyboard().clone());
        Self {
            profile,
            humanizer,
            mouse,
            keyboard,
            session: None,
            last_summary: None,
        }
    }

    /// Pacing profile in use
    pub fn profile(&self) -> &ActionSequenceProfile {
        &self.profile
    }

    /// Swap the profile, handing its sub-profiles to both synthesizers
    pub fn set_profile(&mut self, profile: ActionSequenceProfile) {
        log::debug!(
            "Action sequence profile set: delay_factor={}, variability={}, think_prob={}, fatigue_rate={}",
            profile.action_delay_factor(),
            profile.action_delay_variability(),
            profile.think_probability(),
            profile.fatigue_rate()
        );
        self.mouse.set_profile(profile.mouse().clone());
        self.keyboard.set_profile(profile.keyboard().clone());
        self.profile = profile;
    }

    /// Mouse synthesizer the sequencer drives
    pub fn mouse(&self) -> &MouseSynthesizer {
        &self.mouse
    }

    /// Keyboard synthesizer the sequencer drives
    pub fn keyboard(&self) -> &KeyboardSynthesizer {
        &self.keyboard
    }

    pub fn humanizer(&self) -> &Humanizer {
        &self.humanizer
    }

    /// The open session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Summary of the most recently closed session
    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.last_summary
    }

    /// Session progress together with the mouse and keyboard counters
    pub fn statistics(&self) -> SessionStats {
        let session = match self.session {
            Some(session) => Some(SessionSummary {
                action_count: session.action_count,
                elapsed: self.humanizer.now().saturating_sub(session.started_at),
            }),
            None => self.last_summary,
        };
        SessionStats {
            session,
            mouse: self.mouse.stats(),
            keyboard: self.keyboard.stats(),
        }
    }

    /// Open a fresh session, discarding any open one
    pub fn start_sequence(&mut self) {
        let now = self.humanizer.now();
        self.session = Some(Session {
            started_at: now,
            last_action_at: now,
            action_count: 0,
        });
        log::debug!("Starting new action sequence");
    }

    /// Close the session, if one is open
    pub fn end_sequence(&mut self) -> Option<SessionSummary> {
        let session = self.session.take()?;
        let summary = SessionSummary {
            action_count: session.action_count,
            elapsed: self.humanizer.now().saturating_sub(session.started_at),
        };
        log::debug!("Ending action sequence: {}", summary);
        self.last_summary = Some(summary);
        Some(summary)
    }

    fn elapsed_minutes(&self) -> Option<f64> {
        self.session
            .map(|s| self.humanizer.now().saturating_sub(s.started_at).as_secs_f64() / 60.0)
    }

    /// Seconds to wait before an action of `kind`
    fn action_delay(&mut self, kind: ActionKind) -> f64 {
        let mut delay = kind.base_delay()
            * self.profile.action_delay_factor()
            * self.humanizer.variability_factor(self.profile.action_delay_variability());

        let rate = self.profile.fatigue_rate();
        if rate > 0.0 {
            if let Some(minutes) = self.elapsed_minutes() {
                delay *= (1.0 + minutes * rate).min(MAX_DELAY_FATIGUE);
            }
        }
        delay
    }

    /// Seconds of a sampled think pause
    fn think_duration(&mut self) -> f64 {
        let mut duration = self.humanizer.uniform(MIN_THINK_SECONDS, MAX_THINK_SECONDS)
            * self.profile.think_duration_factor();

        let rate = self.profile.fatigue_rate();
        if rate > 0.0 {
            if let Some(minutes) = self.elapsed_minutes() {
                duration *= (1.0 + minutes * rate * THINK_FATIGUE_MULTIPLIER).min(MAX_THINK_FATIGUE);
            }
        }
        duration
    }

    /// Run one action with its pre-action pacing.
    ///
    /// The session's action count and last-action time advance whether or
    /// not the action succeeded.
    pub fn execute_action(&mut self, action: Action) -> Result<(), ActionError> {
        if self.session.is_none() {
            self.start_sequence();
        }

        let kind = action.kind();
        let delay = self.action_delay(kind);

        let action_count = self.session.map_or(0, |s| s.action_count);
        if action_count > 0 && self.humanizer.chance(self.profile.think_probability()) {
            let think = self.think_duration();
            log::debug!("Adding thinking pause: {:.2}s", think);
            self.humanizer.pause(think);
        }

        self.humanizer.pause(delay);

        let result = self.dispatch(action);

        let now = self.humanizer.now();
        if let Some(session) = self.session.as_mut() {
            session.last_action_at = now;
            session.action_count += 1;
        }

        if let Err(e) = &result {
            log::error!("Error executing {} action: {}", kind, e);
        }
        result
    }

    fn dispatch(&mut self, action: Action) -> Result<(), ActionError> {
        let humanizer = &mut self.humanizer;
        match action {
            Action::MouseMove { target, duration } => self.mouse.move_to(humanizer, target, duration)?,
            Action::MouseClick(request) => self.mouse.click(humanizer, &request)?,
            Action::MouseDrag {
                target,
                button,
                duration,
            } => self.mouse.drag_to(humanizer, target, button, duration)?,
            Action::KeyPress { key, hold_time } => self.keyboard.press_key(humanizer, &key, hold_time)?,
            Action::KeyHotkey { keys } => self.keyboard.press_hotkey(humanizer, &keys)?,
            Action::TypeText {
                text,
                error_correction,
            } => self.keyboard.type_string(humanizer, &text, error_correction)?,
            Action::Wait { duration } => humanizer.pause(duration.as_secs_f64()),
            Action::Think { duration } => {
                let seconds = match duration {
                    Some(duration) => duration.as_secs_f64(),
                    None => self.think_duration(),
                };
                self.humanizer.pause(seconds);
            }
            Action::Break { kind, duration } => {
                let seconds = match duration {
                    Some(duration) => duration.as_secs_f64(),
                    None => {
                        let (low, high) = kind.seconds_range();
                        self.humanizer.uniform(low, high)
                    }
                };
                log::info!("Taking a {} break for {:.1}s", kind, seconds);
                self.humanizer.pause(seconds);
            }
            Action::Custom { mut handler, args } => match handler.invoke(&args) {
                Ok(true) => {}
                Ok(false) => return Err(ActionError::CustomDeclined(handler.name().to_string())),
                Err(e) => return Err(ActionError::Custom(format!("{}: {}", handler.name(), e))),
            },
        }
        Ok(())
    }

    /// Parse and run one JSON action record.
    ///
    /// A record that does not parse opens the session but runs nothing.
    pub fn execute_record(&mut self, record: &Value) -> Result<(), ActionError> {
        if self.session.is_none() {
            self.start_sequence();
        }

        let action = Action::from_record(record).map_err(|e| {
            log::error!("Rejected action record: {}", e);
            e
        })?;
        self.execute_action(action)
    }

    /// Run `actions` in a fresh session, stopping at the first failure.
    ///
    /// The session is closed on every outcome.
    pub fn execute_sequence<I>(&mut self, actions: I) -> Result<(), ActionError>
    where
        I: IntoIterator<Item = Action>,
    {
        self.start_sequence();

        let mut result = Ok(());
        for action in actions {
            if let Err(e) = self.execute_action(action) {
                result = Err(e);
                break;
            }
        }

        self.end_sequence();
        result
    }

    pub fn move_to(&mut self, x: i32, y: i32, duration: Option<Duration>) -> Result<(), ActionError> {
        self.execute_action(Action::MouseMove {
            target: Point::new(x, y),
            duration,
        })
    }

    pub fn click(&mut self, request: ClickRequest) -> Result<(), ActionError> {
        self.execute_action(Action::MouseClick(request))
    }

    pub fn drag_to(
        &mut self,
        x: i32,
        y: i32,
        button: MouseButton,
        duration: Option<Duration>,
    ) -> Result<(), ActionError> {
        self.execute_action(Action::MouseDrag {
            target: Point::new(x, y),
            button,
            duration,
        })
    }

    pub fn press_key(&mut self, key: &str, hold_time: Option<Duration>) -> Result<(), ActionError> {
        self.execute_action(Action::KeyPress {
            key: key.to_string(),
            hold_time,
        })
    }

    pub fn press_hotkey(&mut self, keys: &str) -> Result<(), ActionError> {
        self.execute_action(Action::KeyHotkey { keys: keys.to_string() })
    }

    pub fn type_string(&mut self, text: &str, error_correction: bool) -> Result<(), ActionError> {
        self.execute_action(Action::TypeText {
            text: text.to_string(),
            error_correction,
        })
    }

    pub fn wait(&mut self, duration: Duration) -> Result<(), ActionError> {
        self.execute_action(Action::Wait { duration })
    }

    pub fn think(&mut self, duration: Option<Duration>) -> Result<(), ActionError> {
        self.execute_action(Action::Think { duration })
    }

    pub fn take_break(&mut self, kind: BreakKind, duration: Option<Duration>) -> Result<(), ActionError> {
        self.execute_action(Action::Break { kind, duration })
    }

    pub fn custom_action(
        &mut self,
        handler: impl CustomAction + 'static,
        args: Vec<Value>,
    ) -> Result<(), ActionError> {
        self.execute_action(Action::custom(handler, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RecordingBackend;
    use crate::profile::{KeyboardPreset, MouseMovementProfile, SequencePreset};
    use crate::stealth::ManualClock;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// No think pauses, no fatigue, minimal delay jitter
    fn calm() -> ActionSequenceProfile {
        ActionSequenceProfile::new(
            1.0,
            0.1,
            0.0,
            1.0,
            0.0,
            MouseMovementProfile::default(),
            KeyboardPreset::Precise.profile(),
        )
    }

    fn setup(
        profile: ActionSequenceProfile,
        seed: u64,
    ) -> (ActionSequencer, Arc<RecordingBackend>, Arc<ManualClock>) {
        let backend = Arc::new(RecordingBackend::new());
        let clock = Arc::new(ManualClock::new());
        let humanizer = Humanizer::seeded(seed, clock.clone());
        (
            ActionSequencer::with_humanizer(profile, backend.clone(), humanizer),
            backend,
            clock,
        )
    }

    fn key(name: &str) -> Action {
        Action::KeyPress {
            key: name.to_string(),
            hold_time: None,
        }
    }

    fn approx(value: f64, expected: f64) -> bool {
        (value - expected).abs() <= expected * 0.031
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let (mut seq, backend, _) = setup(calm(), 1);
        backend.fail_key_down("b");

        let result = seq.execute_sequence(vec![key("a"), key("b"), key("c")]);

        assert!(matches!(result, Err(ActionError::Input(InputError::Backend(_)))));
        assert_eq!(backend.key_downs(), vec!["a"]);
        assert!(!seq.is_active());
        assert_eq!(seq.last_summary().map(|s| s.action_count), Some(2));

        // still usable afterwards
        seq.execute_sequence(vec![key("c")]).unwrap();
        assert_eq!(backend.key_downs(), vec!["a", "c"]);
    }

    #[test]
    fn test_declined_custom_action_stops_sequence() {
        let (mut seq, backend, _) = setup(calm(), 2);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let declining = move |_: &[Value]| -> Result<bool, CustomError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        };
        let result = seq.execute_sequence(vec![key("a"), Action::custom(declining, vec![]), key("c")]);

        assert!(matches!(result, Err(ActionError::CustomDeclined(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.key_downs(), vec!["a"]);
        assert!(!seq.is_active());
    }

    #[test]
    fn test_custom_action_receives_args() {
        let (mut seq, _, _) = setup(calm(), 3);

        seq.custom_action(
            |args: &[Value]| -> Result<bool, CustomError> { Ok(args == [json!(7), json!("x")]) },
            vec![json!(7), json!("x")],
        )
        .unwrap();

        let failing = |_: &[Value]| -> Result<bool, CustomError> { Err("boom".into()) };
        assert!(matches!(
            seq.custom_action(failing, vec![]),
            Err(ActionError::Custom(msg)) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_invalid_record_runs_nothing() {
        let (mut seq, backend, clock) = setup(calm(), 4);

        let result = seq.execute_record(&json!({"x": 10, "y": 20}));

        assert!(matches!(result, Err(ActionError::InvalidAction(_))));
        assert!(backend.events().is_empty());
        assert!(clock.sleeps().is_empty());
        assert_eq!(seq.session().map(Session::action_count), Some(0));
    }

    #[test]
    fn test_record_is_dispatched() {
        let (mut seq, backend, _) = setup(calm(), 5);
        seq.execute_record(&json!({"type": "key_hotkey", "keys": "ctrl+v"}))
            .unwrap();
        assert_eq!(backend.key_downs(), vec!["ctrl", "v"]);
        assert_eq!(seq.session().map(Session::action_count), Some(1));
    }

    #[test]
    fn test_wait_sleeps_delay_then_duration() {
        let (mut seq, _, clock) = setup(calm(), 6);

        seq.wait(Duration::from_millis(1500)).unwrap();

        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 2);
        assert!(approx(sleeps[0].as_secs_f64(), 0.2));
        assert_eq!(sleeps[1], Duration::from_millis(1500));
    }

    #[test]
    fn test_session_counts_actions() {
        let (mut seq, backend, _) = setup(calm(), 7);
        backend.fail_key_down("z");

        seq.wait(Duration::from_millis(10)).unwrap();
        assert!(seq.press_key("z", None).is_err());
        seq.think(Some(Duration::from_millis(10))).unwrap();

        let session = *seq.session().unwrap();
        assert_eq!(session.action_count(), 3);
        assert!(session.last_action_at() > session.started_at());

        let summary = seq.end_sequence().unwrap();
        assert_eq!(summary.action_count, 3);
        assert!(summary.elapsed > Duration::ZERO);
        assert!(seq.end_sequence().is_none());
        assert_eq!(seq.last_summary(), Some(summary));
    }

    #[test]
    fn test_first_action_never_thinks() {
        let profile = ActionSequenceProfile::new(
            1.0,
            0.1,
            0.5,
            1.0,
            0.0,
            MouseMovementProfile::default(),
            KeyboardPreset::Precise.profile(),
        );

        let mut thought = false;
        for seed in 0..20 {
            let (mut seq, _, clock) = setup(profile.clone(), seed);
            seq.wait(Duration::from_millis(1)).unwrap();
            assert_eq!(clock.sleeps().len(), 2);

            seq.wait(Duration::from_millis(1)).unwrap();
            thought |= clock.sleeps().len() == 5;
        }
        assert!(thought);
    }

    #[test]
    fn test_fatigue_slows_delays() {
        let profile = ActionSequenceProfile::new(
            1.0,
            0.1,
            0.0,
            1.0,
            0.1,
            MouseMovementProfile::default(),
            KeyboardPreset::Precise.profile(),
        );
        let (mut seq, _, clock) = setup(profile, 8);

        assert!(approx(seq.action_delay(ActionKind::MouseMove), 0.1));

        seq.start_sequence();
        clock.advance(Duration::from_secs(5 * 60));
        assert!(approx(seq.action_delay(ActionKind::MouseMove), 0.15));

        clock.advance(Duration::from_secs(60 * 60));
        assert!(approx(seq.action_delay(ActionKind::MouseMove), 0.2));

        let think = seq.think_duration();
        assert!((1.5..=6.0).contains(&think));
    }

    #[test]
    fn test_think_fatigue_is_capped() {
        let profile = ActionSequenceProfile::new(
            1.0,
            0.1,
            0.0,
            1.0,
            0.1,
            MouseMovementProfile::default(),
            KeyboardPreset::Precise.profile(),
        );
        let (mut seq, _, clock) = setup(profile, 11);
        let mut twin = Humanizer::seeded(11, Arc::new(ManualClock::new()));

        seq.start_sequence();
        clock.advance(Duration::from_secs(5 * 60));
        // 5 minutes at rate 0.1, doubled for thinking
        let expected = twin.uniform(MIN_THINK_SECONDS, MAX_THINK_SECONDS) * 2.0;
        assert!((seq.think_duration() - expected).abs() < 1e-9);

        clock.advance(Duration::from_secs(60 * 60));
        let expected = twin.uniform(MIN_THINK_SECONDS, MAX_THINK_SECONDS) * MAX_THINK_FATIGUE;
        assert!((seq.think_duration() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_failed_move_closes_the_session() {
        let (mut seq, backend, _) = setup(calm(), 12);
        backend.fail_moves(true);

        let result = seq.execute_sequence(vec![
            key("a"),
            Action::MouseMove {
                target: Point::new(500, 500),
                duration: None,
            },
            key("c"),
        ]);

        assert!(matches!(result, Err(ActionError::Input(InputError::Backend(_)))));
        assert_eq!(backend.key_downs(), vec!["a"]);
        assert!(!seq.is_active());
        assert_eq!(seq.last_summary().map(|s| s.action_count), Some(2));
    }

    #[test]
    fn test_break_sleeps_for_its_kind() {
        let (mut seq, _, clock) = setup(calm(), 13);

        seq.take_break(BreakKind::Short, None).unwrap();
        seq.take_break(BreakKind::Micro, Some(Duration::from_secs(2))).unwrap();

        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 4);
        assert!(approx(sleeps[0].as_secs_f64(), 0.2));
        assert!((30.0..=120.0).contains(&sleeps[1].as_secs_f64()));
        assert_eq!(sleeps[3], Duration::from_secs(2));
        assert_eq!(seq.session().map(Session::action_count), Some(2));
    }

    #[test]
    fn test_statistics_follow_the_session() {
        let profile = ActionSequenceProfile::new(
            1.0,
            0.1,
            0.0,
            1.0,
            0.0,
            MouseMovementProfile::new(1.0, 0.1, 0.0, 1.0, 30),
            KeyboardPreset::Precise.profile(),
        );
        let (mut seq, _, _) = setup(profile, 14);
        assert_eq!(seq.statistics().session, None);

        seq.move_to(300, 300, None).unwrap();
        seq.press_key("q", None).unwrap();

        let stats = seq.statistics();
        assert_eq!(stats.session.map(|s| s.action_count), Some(2));
        assert_eq!(stats.mouse.moves, 1);
        assert_eq!(stats.mouse.points_visited, 30);
        assert_eq!(stats.keyboard.keys_pressed, 1);

        let summary = seq.end_sequence();
        assert_eq!(seq.statistics().session, summary);
    }

    #[test]
    fn test_set_profile_reaches_synthesizers() {
        let (mut seq, _, _) = setup(calm(), 9);
        seq.set_profile(SequencePreset::Tired.profile());
        assert_eq!(seq.keyboard().profile(), &KeyboardPreset::Slow.profile());
        assert_eq!(seq.mouse().profile(), SequencePreset::Tired.profile().mouse());
        assert_eq!(seq.profile().fatigue_rate(), 0.005);
    }

    #[test]
    fn test_move_through_sequencer() {
        let (mut seq, backend, _) = setup(calm(), 10);
        seq.move_to(400, 300, Some(Duration::from_millis(300))).unwrap();
        assert_eq!(backend.moves().last(), Some(&Point::new(400, 300)));
        assert_eq!(seq.mouse().last_position(), Some(Point::new(400, 300)));
    }
}
