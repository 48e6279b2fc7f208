//! Humanized keyboard input
//!
//! Keystroke timing depends on the previous key (repeats are quick, hand
//! alternation is quicker, neighbouring keys are slower). Typing can inject
//! adjacency-aware typos and correct them, either right away or after a few
//! more characters.

use std::sync::Arc;
use std::time::Duration;

use crate::input::{Held, HeldInputs, InputBackend, InputError};
use crate::profile::KeyboardProfile;
use crate::stealth::Humanizer;

/// Key name used for corrections
pub const BACKSPACE: &str = "backspace";

const LEFT_HAND: &str = "qwertasdfgzxcvb";
const RIGHT_HAND: &str = "yuiophjklnm";
/// Typo pool when no neighbouring key is picked
const RANDOM_TYPO_KEYS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 ";

/// Seconds before a key at typing speed 1.0
const BASE_KEY_DELAY: f64 = 0.1;
const REPEAT_FACTOR: f64 = 0.7;
const ALTERNATE_HAND_FACTOR: f64 = 0.9;
const ADJACENT_KEY_FACTOR: f64 = 1.2;
const ADJACENT_TYPO_PROBABILITY: f64 = 0.8;
const IMMEDIATE_NOTICE_PROBABILITY: f64 = 0.7;
/// Characters typed past a typo before a delayed correction
const MAX_RUN_ON: usize = 3;
const DEFAULT_KEY_INTERVAL: f64 = 0.05;

/// Counters over everything typed since the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingStats {
    pub keys_pressed: u64,
    pub errors_injected: u64,
    pub immediate_corrections: u64,
    pub delayed_corrections: u64,
    pub backspaces: u64,
}

/// Drives an [`InputBackend`] with humanized keystrokes
pub struct KeyboardSynthesizer {
    backend: Arc<dyn InputBackend>,
    profile: KeyboardProfile,
    last_key: Option<String>,
    stats: TypingStats,
}

impl KeyboardSynthesizer {
    /// Synthesizer driving `backend` with `profile`
    pub fn new(backend: Arc<dyn InputBackend>, profile: KeyboardProfile) -> Self {
        Self {
            backend,
            profile,
            last_key: None,
            stats: TypingStats::default(),
        }
    }

    /// Profile used for the next keystroke
    pub fn profile(&self) -> &KeyboardProfile {
        &self.profile
    }

    /// Replace the profile; takes effect on the next keystroke
    pub fn set_profile(&mut self, profile: KeyboardProfile) {
        log::debug!(
            "Keyboard profile set: speed={}, variability={}, error_rate={}, hold_time={}, hold_variability={}",
            profile.typing_speed(),
            profile.typing_variability(),
            profile.error_rate(),
            profile.key_hold_time(),
            profile.key_hold_variability()
        );
        self.profile = profile;
    }

    /// Most recently pressed key, used for the repeated-key speedup
    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    /// Counters since construction or the last [`reset_stats`](Self::reset_stats)
    pub fn stats(&self) -> TypingStats {
        self.stats
    }

    /// Zero every counter
    pub fn reset_stats(&mut self) {
        self.stats = TypingStats::default();
    }

    /// Seconds to wait before pressing `key`
    fn key_delay(&self, humanizer: &mut Humanizer, key: &str) -> f64 {
        let mut delay = BASE_KEY_DELAY / self.profile.typing_speed();

        if let Some(last) = &self.last_key {
            if key == last {
                delay *= REPEAT_FACTOR;
            }

            if let (Some(current), Some(previous)) = (single_char(key), single_char(last)) {
                let current = current.to_ascii_lowercase();
                let previous = previous.to_ascii_lowercase();

                if alternates_hands(previous, current) {
                    delay *= ALTERNATE_HAND_FACTOR;
                }
                if self.profile.adjacency().is_adjacent(previous, current) {
                    delay *= ADJACENT_KEY_FACTOR;
                }
            }
        }

        delay * humanizer.variability_factor(self.profile.typing_variability())
    }

    fn hold_time(&self, humanizer: &mut Humanizer) -> f64 {
        self.profile.key_hold_time() * humanizer.variability_factor(self.profile.key_hold_variability())
    }

    /// A plausible wrong key for `intended`, usually one of its neighbours
    fn typo_for(&self, humanizer: &mut Humanizer, intended: char) -> char {
        let neighbors = self.profile.adjacency().neighbors(intended);
        if !neighbors.is_empty() && humanizer.chance(ADJACENT_TYPO_PROBABILITY) {
            if let Some(&key) = humanizer.choose(neighbors) {
                return key;
            }
        }
        humanizer
            .choose(RANDOM_TYPO_KEYS)
            .map_or(' ', |&b| char::from(b))
    }

    /// Wait, press, hold and release one key.
    ///
    /// The key is released on every path out of this call once it went down.
    pub fn press_key(
        &mut self,
        humanizer: &mut Humanizer,
        key: &str,
        hold_time: Option<Duration>,
    ) -> Result<(), InputError> {
        if key.is_empty() {
            return Err(InputError::InvalidKey(key.to_string()));
        }

        let delay = self.key_delay(humanizer, key);
        humanizer.pause(delay);

        let hold = match hold_time {
            Some(hold) => hold.as_secs_f64(),
            None => self.hold_time(humanizer),
        };

        let mut held = HeldInputs::new(Arc::clone(&self.backend));
        held.press(Held::Key(key.to_string()))?;
        humanizer.pause(hold);
        if let Some(result) = held.release_last() {
            result?;
        }

        self.last_key = Some(key.to_string());
        self.stats.keys_pressed += 1;
        if key == BACKSPACE {
            self.stats.backspaces += 1;
        }
        Ok(())
    }

    fn press_char(&mut self, humanizer: &mut Humanizer, c: char) -> Result<(), InputError> {
        self.press_key(humanizer, c.encode_utf8(&mut [0; 4]), None)
    }

    /// Press a `+`-joined combination such as `ctrl+shift+s`.
    ///
    /// Modifiers go down in order, the last key gets a full press, then the
    /// modifiers come up in reverse. Anything still held on failure is released.
    pub fn press_hotkey(&mut self, humanizer: &mut Humanizer, keys: &str) -> Result<(), InputError> {
        let parts: Vec<&str> = keys.split('+').map(str::trim).collect();
        if parts.iter().any(|k| k.is_empty()) {
            return Err(InputError::InvalidKey(keys.to_string()));
        }
        let Some((last, modifiers)) = parts.split_last() else {
            return Err(InputError::InvalidKey(keys.to_string()));
        };

        let mut held = HeldInputs::new(Arc::clone(&self.backend));
        for modifier in modifiers {
            held.press(Held::Key((*modifier).to_string()))?;
            humanizer.pause_between(0.03, 0.08);
        }

        self.press_key(humanizer, last, None)?;

        while let Some(result) = held.release_last() {
            result?;
            humanizer.pause_between(0.02, 0.05);
        }

        self.last_key = Some((*last).to_string());
        Ok(())
    }

    /// Press each key in order with a fixed pause after each.
    ///
    /// Keeps going after a failed key and reports the first failure.
    pub fn press_keys<S: AsRef<str>>(
        &mut self,
        humanizer: &mut Humanizer,
        keys: &[S],
        interval: Option<Duration>,
    ) -> Result<(), InputError> {
        let interval = interval.map_or(DEFAULT_KEY_INTERVAL, |d| d.as_secs_f64());
        let mut first_error = None;

        for key in keys {
            if let Err(e) = self.press_key(humanizer, key.as_ref(), None) {
                log::warn!("Key {:?} failed: {}", key.as_ref(), e);
                first_error.get_or_insert(e);
            }
            humanizer.pause(interval);
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Type `text`, injecting and correcting typos when `error_correction` is on.
    ///
    /// A delayed correction types up to three more characters, backspaces
    /// over all of them plus the typo, and resumes at the character the typo
    /// replaced.
    pub fn type_string(
        &mut self,
        humanizer: &mut Humanizer,
        text: &str,
        error_correction: bool,
    ) -> Result<(), InputError> {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            if error_correction && humanizer.chance(self.profile.error_rate()) {
                let typo = self.typo_for(humanizer, chars[i]);
                self.stats.errors_injected += 1;
                self.press_char(humanizer, typo)?;

                if humanizer.chance(IMMEDIATE_NOTICE_PROBABILITY) {
                    humanizer.pause_between(0.1, 0.3);
                    self.press_key(humanizer, BACKSPACE, None)?;
                    self.stats.immediate_corrections += 1;
                } else {
                    let run_on = MAX_RUN_ON.min(chars.len() - i);
                    for &c in &chars[i..i + run_on] {
                        self.press_char(humanizer, c)?;
                    }

                    humanizer.pause_between(0.3, 0.7);

                    // the typo plus every character typed after it
                    for _ in 0..=run_on {
                        self.press_key(humanizer, BACKSPACE, None)?;
                        humanizer.pause_between(0.05, 0.15);
                    }

                    self.stats.delayed_corrections += 1;
                    continue;
                }
            }

            self.press_char(humanizer, chars[i])?;
            i += 1;
        }

        Ok(())
    }
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn alternates_hands(a: char, b: char) -> bool {
    (LEFT_HAND.contains(a) && RIGHT_HAND.contains(b)) || (RIGHT_HAND.contains(a) && LEFT_HAND.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RecordingBackend;
    use crate::profile::KeyboardPreset;
    use crate::stealth::ManualClock;

    fn setup(
        profile: KeyboardProfile,
        seed: u64,
    ) -> (KeyboardSynthesizer, Arc<RecordingBackend>, Humanizer, Arc<ManualClock>) {
        let backend = Arc::new(RecordingBackend::new());
        let clock = Arc::new(ManualClock::new());
        let humanizer = Humanizer::seeded(seed, clock.clone());
        (KeyboardSynthesizer::new(backend.clone(), profile), backend, humanizer, clock)
    }

    /// Minimal variability so delay factors are easy to see
    fn steady() -> KeyboardProfile {
        KeyboardProfile::new(1.0, 0.1, 0.0, 0.05, 0.1)
    }

    fn approx(value: f64, expected: f64) -> bool {
        (value - expected).abs() <= expected * 0.031
    }

    #[test]
    fn test_key_delay_modifiers() {
        let (mut keyboard, _, mut h, _) = setup(steady(), 1);

        assert!(approx(keyboard.key_delay(&mut h, "a"), 0.1));

        keyboard.last_key = Some("a".into());
        assert!(approx(keyboard.key_delay(&mut h, "a"), 0.07));

        keyboard.last_key = Some("f".into());
        assert!(approx(keyboard.key_delay(&mut h, "j"), 0.09));

        keyboard.last_key = Some("a".into());
        assert!(approx(keyboard.key_delay(&mut h, "s"), 0.12));

        keyboard.last_key = Some("A".into());
        assert!(approx(keyboard.key_delay(&mut h, "s"), 0.12));

        keyboard.last_key = Some("enter".into());
        assert!(approx(keyboard.key_delay(&mut h, "j"), 0.1));
    }

    #[test]
    fn test_press_key_holds_for_requested_time() {
        let (mut keyboard, backend, mut h, clock) = setup(steady(), 2);

        keyboard
            .press_key(&mut h, "q", Some(Duration::from_millis(200)))
            .unwrap();

        assert_eq!(backend.key_downs(), vec!["q".to_string()]);
        assert_eq!(backend.key_ups(), vec!["q".to_string()]);
        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 2);
        assert_eq!(sleeps[1], Duration::from_millis(200));
        assert_eq!(keyboard.last_key(), Some("q"));
    }

    #[test]
    fn test_failed_key_down_is_reported() {
        let (mut keyboard, backend, mut h, _) = setup(steady(), 3);
        backend.fail_key_down("x");

        assert!(keyboard.press_key(&mut h, "x", None).is_err());
        assert!(backend.key_ups().is_empty());
        assert_eq!(keyboard.last_key(), None);
        assert!(matches!(
            keyboard.press_key(&mut h, "", None),
            Err(InputError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_hotkey_order() {
        let (mut keyboard, backend, mut h, _) = setup(steady(), 4);

        keyboard.press_hotkey(&mut h, "ctrl+shift+s").unwrap();

        assert_eq!(backend.key_downs(), vec!["ctrl", "shift", "s"]);
        assert_eq!(backend.key_ups(), vec!["s", "shift", "ctrl"]);
        assert_eq!(keyboard.last_key(), Some("s"));
    }

    #[test]
    fn test_hotkey_modifier_gaps() {
        for seed in 0..20 {
            let (mut keyboard, _, mut h, clock) = setup(steady(), seed);

            keyboard.press_hotkey(&mut h, "ctrl+shift+s").unwrap();

            // two press gaps, the key's own delay and hold, then two release gaps
            let sleeps: Vec<f64> = clock.sleeps().iter().map(Duration::as_secs_f64).collect();
            assert_eq!(sleeps.len(), 6, "seed {seed}: {sleeps:?}");
            for gap in &sleeps[..2] {
                assert!((0.03..=0.08).contains(gap), "press gap {gap}");
            }
            for gap in &sleeps[4..] {
                assert!((0.02..=0.05).contains(gap), "release gap {gap}");
            }
        }
    }

    #[test]
    fn test_hotkey_releases_modifiers_on_failure() {
        let (mut keyboard, backend, mut h, _) = setup(steady(), 5);
        backend.fail_key_down("c");

        assert!(keyboard.press_hotkey(&mut h, "ctrl+alt+c").is_err());

        assert_eq!(backend.key_downs(), vec!["ctrl", "alt"]);
        assert_eq!(backend.key_ups(), vec!["alt", "ctrl"]);
    }

    #[test]
    fn test_invalid_hotkey() {
        let (mut keyboard, backend, mut h, _) = setup(steady(), 6);
        assert!(matches!(
            keyboard.press_hotkey(&mut h, "ctrl+"),
            Err(InputError::InvalidKey(_))
        ));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_zero_error_rate_types_verbatim() {
        let text = "Hello, world! 123";
        let (mut keyboard, backend, mut h, _) = setup(KeyboardPreset::Precise.profile(), 7);

        keyboard.type_string(&mut h, text, true).unwrap();

        let expected: Vec<String> = text.chars().map(String::from).collect();
        assert_eq!(backend.key_downs(), expected);
        assert_eq!(keyboard.stats().errors_injected, 0);
        assert_eq!(keyboard.stats().keys_pressed, text.chars().count() as u64);
    }

    #[test]
    fn test_error_correction_disabled_types_verbatim() {
        let text = "no typos here";
        let profile = steady().with_unclamped_error_rate(1.0);
        let (mut keyboard, backend, mut h, _) = setup(profile, 8);

        keyboard.type_string(&mut h, text, false).unwrap();

        assert_eq!(backend.typed_text(), text);
        assert_eq!(backend.key_downs().len(), text.len());
    }

    #[test]
    fn test_every_typo_is_corrected() {
        let text = "the quick brown fox jumps over the lazy dog";
        let mut immediate = 0;
        let mut delayed = 0;

        for seed in 0..10 {
            let profile = KeyboardPreset::Human.profile().with_unclamped_error_rate(1.0);
            let (mut keyboard, backend, mut h, _) = setup(profile, seed);

            keyboard.type_string(&mut h, text, true).unwrap();

            // replaying the key stream with backspaces must leave exactly the text
            assert_eq!(backend.typed_text(), text, "seed {seed}");

            let stats = keyboard.stats();
            assert!(stats.errors_injected >= text.len() as u64);
            assert_eq!(
                stats.errors_injected,
                stats.immediate_corrections + stats.delayed_corrections
            );
            assert!(stats.backspaces >= stats.errors_injected);
            immediate += stats.immediate_corrections;
            delayed += stats.delayed_corrections;
        }

        assert!(immediate > 0);
        assert!(delayed > 0);
    }

    #[test]
    fn test_delayed_correction_near_end_of_text() {
        // two characters left means at most two run-on characters
        for seed in 0..20 {
            let profile = steady().with_unclamped_error_rate(1.0);
            let (mut keyboard, backend, mut h, _) = setup(profile, seed);
            keyboard.type_string(&mut h, "ok", true).unwrap();
            assert_eq!(backend.typed_text(), "ok", "seed {seed}");
        }
    }

    #[test]
    fn test_press_keys_continues_after_failure() {
        let (mut keyboard, backend, mut h, _) = setup(steady(), 9);
        backend.fail_key_down("b");

        let result = keyboard.press_keys(&mut h, &["a", "b", "c"], Some(Duration::from_millis(10)));

        assert!(result.is_err());
        assert_eq!(backend.key_downs(), vec!["a", "c"]);
    }

    #[test]
    fn test_reset_stats() {
        let (mut keyboard, _, mut h, _) = setup(steady(), 10);
        keyboard.type_string(&mut h, "abc", true).unwrap();
        assert_eq!(keyboard.stats().keys_pressed, 3);
        keyboard.reset_stats();
        assert_eq!(keyboard.stats(), TypingStats::default());
    }
}
