//! Actions and their JSON records

use std::error::Error;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::ActionError;
use crate::input::{MouseButton, Point};
use crate::mouse::ClickRequest;

/// Error type a [`CustomAction`] may return
pub type CustomError = Box<dyn Error + Send + Sync>;

/// Caller-supplied step run inside a sequence.
///
/// `Ok(false)` means the action declined and counts as a failure.
pub trait CustomAction: Send {
    fn invoke(&mut self, args: &[Value]) -> Result<bool, CustomError>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> CustomAction for F
where
    F: FnMut(&[Value]) -> Result<bool, CustomError> + Send,
{
    fn invoke(&mut self, args: &[Value]) -> Result<bool, CustomError> {
        self(args)
    }
}

/// One step for the sequencer
pub enum Action {
    MouseMove {
        target: Point,
        duration: Option<Duration>,
    },
    MouseClick(ClickRequest),
    MouseDrag {
        target: Point,
        button: MouseButton,
        duration: Option<Duration>,
    },
    KeyPress {
        key: String,
        hold_time: Option<Duration>,
    },
    KeyHotkey {
        keys: String,
    },
    TypeText {
        text: String,
        error_correction: bool,
    },
    Wait {
        duration: Duration,
    },
    /// Think pause; a sampled duration is used when none is given
    Think {
        duration: Option<Duration>,
    },
    /// Step away from the input devices; the duration is drawn from `kind` when absent
    Break {
        kind: BreakKind,
        duration: Option<Duration>,
    },
    Custom {
        handler: Box<dyn CustomAction>,
        args: Vec<Value>,
    },
}

impl Action {
    pub fn custom(handler: impl CustomAction + 'static, args: Vec<Value>) -> Self {
        Action::Custom {
            handler: Box::new(handler),
            args,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::MouseMove { .. } => ActionKind::MouseMove,
            Action::MouseClick(_) => ActionKind::MouseClick,
            Action::MouseDrag { .. } => ActionKind::MouseDrag,
            Action::KeyPress { .. } => ActionKind::KeyPress,
            Action::KeyHotkey { .. } => ActionKind::KeyHotkey,
            Action::TypeText { .. } => ActionKind::TypeText,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Think { .. } => ActionKind::Think,
            Action::Break { .. } => ActionKind::Break,
            Action::Custom { .. } => ActionKind::Custom,
        }
    }

    /// Parse a record such as `{"type": "mouse_move", "x": 10, "y": 20}`.
    ///
    /// Durations are seconds. `custom` has no record form.
    pub fn from_record(record: &Value) -> Result<Self, ActionError> {
        if record.get("type").and_then(Value::as_str) == Some(ActionKind::Custom.name()) {
            return Err(ActionError::InvalidAction(
                "custom actions cannot be built from a record".to_string(),
            ));
        }

        let record = ActionRecord::deserialize(record)
            .map_err(|e| ActionError::InvalidAction(e.to_string()))?;

        Ok(match record {
            ActionRecord::MouseMove { x, y, duration } => Action::MouseMove {
                target: Point::new(x, y),
                duration: optional_seconds("duration", duration)?,
            },
            ActionRecord::MouseClick {
                x,
                y,
                button,
                clicks,
                interval,
                duration,
            } => Action::MouseClick(ClickRequest {
                x,
                y,
                button,
                clicks,
                interval: optional_seconds("interval", interval)?,
                duration: optional_seconds("duration", duration)?,
            }),
            ActionRecord::MouseDrag {
                x,
                y,
                button,
                duration,
            } => Action::MouseDrag {
                target: Point::new(x, y),
                button,
                duration: optional_seconds("duration", duration)?,
            },
            ActionRecord::KeyPress { key, hold_time } => Action::KeyPress {
                key,
                hold_time: optional_seconds("hold_time", hold_time)?,
            },
            ActionRecord::KeyHotkey { keys } => Action::KeyHotkey { keys },
            ActionRecord::TypeText {
                text,
                error_correction,
            } => Action::TypeText {
                text,
                error_correction,
            },
            ActionRecord::Wait { duration } => Action::Wait {
                duration: seconds("duration", duration)?,
            },
            ActionRecord::Think { duration } => Action::Think {
                duration: optional_seconds("duration", duration)?,
            },
            ActionRecord::Break { break_type, duration } => Action::Break {
                kind: break_type,
                duration: optional_seconds("duration", duration)?,
            },
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MouseMove { target, duration } => f
                .debug_struct("MouseMove")
                .field("target", target)
                .field("duration", duration)
                .finish(),
            Action::MouseClick(request) => f.debug_tuple("MouseClick").field(request).finish(),
            Action::MouseDrag {
                target,
                button,
                duration,
            } => f
                .debug_struct("MouseDrag")
                .field("target", target)
                .field("button", button)
                .field("duration", duration)
                .finish(),
            Action::KeyPress { key, hold_time } => f
                .debug_struct("KeyPress")
                .field("key", key)
                .field("hold_time", hold_time)
                .finish(),
            Action::KeyHotkey { keys } => f.debug_struct("KeyHotkey").field("keys", keys).finish(),
            Action::TypeText {
                text,
                error_correction,
            } => f
                .debug_struct("TypeText")
                .field("text", text)
                .field("error_correction", error_correction)
                .finish(),
            Action::Wait { duration } => f.debug_struct("Wait").field("duration", duration).finish(),
            Action::Think { duration } => f.debug_struct("Think").field("duration", duration).finish(),
            Action::Break { kind, duration } => f
                .debug_struct("Break")
                .field("kind", kind)
                .field("duration", duration)
                .finish(),
            Action::Custom { handler, args } => f
                .debug_struct("Custom")
                .field("handler", &handler.name())
                .field("args", args)
                .finish(),
        }
    }
}

/// Parse a JSON array of action records
pub fn parse_script(script: &str) -> Result<Vec<Action>, ActionError> {
    let records: Vec<Value> = serde_json::from_str(script)
        .map_err(|e| ActionError::InvalidAction(format!("expected a JSON array of records: {}", e)))?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            Action::from_record(record).map_err(|e| match e {
                ActionError::InvalidAction(msg) => ActionError::InvalidAction(format!("record {}: {}", i, msg)),
                other => other,
            })
        })
        .collect()
}

/// How long a break lasts when no duration is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// 5-15s
    #[default]
    Micro,
    /// 30-120s
    Short,
    /// 5-15 minutes
    Long,
}

impl BreakKind {
    /// Range, in seconds, a break duration is drawn from
    pub fn seconds_range(self) -> (f64, f64) {
        match self {
            BreakKind::Micro => (5.0, 15.0),
            BreakKind::Short => (30.0, 120.0),
            BreakKind::Long => (300.0, 900.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BreakKind::Micro => "micro",
            BreakKind::Short => "short",
            BreakKind::Long => "long",
        }
    }
}

impl fmt::Display for BreakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action type tags, each with its base pre-action delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    MouseMove,
    MouseClick,
    MouseDrag,
    KeyPress,
    KeyHotkey,
    TypeText,
    Wait,
    Think,
    Break,
    Custom,
}

impl ActionKind {
    /// Seconds of delay before the action at delay factor 1.0
    pub fn base_delay(self) -> f64 {
        match self {
            ActionKind::MouseMove => 0.1,
            ActionKind::MouseClick => 0.2,
            ActionKind::MouseDrag => 0.3,
            ActionKind::KeyPress => 0.15,
            ActionKind::KeyHotkey => 0.25,
            ActionKind::TypeText => 0.3,
            ActionKind::Wait | ActionKind::Think | ActionKind::Break | ActionKind::Custom => 0.2,
        }
    }

    /// The record `type` tag
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::MouseMove => "mouse_move",
            ActionKind::MouseClick => "mouse_click",
            ActionKind::MouseDrag => "mouse_drag",
            ActionKind::KeyPress => "key_press",
            ActionKind::KeyHotkey => "key_hotkey",
            ActionKind::TypeText => "type_text",
            ActionKind::Wait => "wait",
            ActionKind::Think => "think",
            ActionKind::Break => "break",
            ActionKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ActionRecord {
    MouseMove {
        x: i32,
        y: i32,
        duration: Option<f64>,
    },
    MouseClick {
        x: Option<i32>,
        y: Option<i32>,
        #[serde(default)]
        button: MouseButton,
        #[serde(default = "default_clicks")]
        clicks: u32,
        interval: Option<f64>,
        duration: Option<f64>,
    },
    MouseDrag {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
        duration: Option<f64>,
    },
    KeyPress {
        key: String,
        hold_time: Option<f64>,
    },
    KeyHotkey {
        keys: String,
    },
    TypeText {
        text: String,
        #[serde(default = "default_error_correction")]
        error_correction: bool,
    },
    Wait {
        #[serde(default = "default_wait")]
        duration: f64,
    },
    Think {
        duration: Option<f64>,
    },
    Break {
        #[serde(default)]
        break_type: BreakKind,
        duration: Option<f64>,
    },
}

fn default_clicks() -> u32 {
    1
}

fn default_error_correction() -> bool {
    true
}

fn default_wait() -> f64 {
    1.0
}

fn seconds(field: &str, value: f64) -> Result<Duration, ActionError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ActionError::InvalidAction(format!("{} must be a non-negative number of seconds, got {}", field, value))
    })
}

fn optional_seconds(field: &str, value: Option<f64>) -> Result<Option<Duration>, ActionError> {
    value.map(|v| seconds(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_click_record() {
        let action = Action::from_record(&json!({
            "type": "mouse_click",
            "x": 300,
            "button": "right",
            "clicks": 2,
            "interval": 0.25
        }))
        .unwrap();

        let Action::MouseClick(request) = action else {
            panic!("expected a click");
        };
        assert_eq!(request.x, Some(300));
        assert_eq!(request.y, None);
        assert_eq!(request.button, MouseButton::Right);
        assert_eq!(request.clicks, 2);
        assert_eq!(request.interval, Some(Duration::from_millis(250)));
        assert_eq!(request.duration, None);
    }

    #[test]
    fn test_record_defaults() {
        let Action::Wait { duration } = Action::from_record(&json!({"type": "wait"})).unwrap() else {
            panic!("expected a wait");
        };
        assert_eq!(duration, Duration::from_secs(1));

        let action = Action::from_record(&json!({"type": "type_text", "text": "hi"})).unwrap();
        assert!(matches!(
            action,
            Action::TypeText {
                error_correction: true,
                ..
            }
        ));

        let action = Action::from_record(&json!({"type": "mouse_drag", "x": 1, "y": 2})).unwrap();
        assert!(matches!(
            action,
            Action::MouseDrag {
                button: MouseButton::Left,
                duration: None,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_records() {
        let invalid = [
            json!({"x": 10, "y": 10}),
            json!({"type": "jump"}),
            json!({"type": "mouse_move", "x": 10}),
            json!({"type": "key_press"}),
            json!({"type": "wait", "duration": -1.0}),
            json!({"type": "custom"}),
            json!("mouse_move"),
        ];
        for record in &invalid {
            assert!(
                matches!(Action::from_record(record), Err(ActionError::InvalidAction(_))),
                "{} should be rejected",
                record
            );
        }
    }

    #[test]
    fn test_parse_script() {
        let actions = parse_script(
            r#"[
                {"type": "mouse_move", "x": 100, "y": 200, "duration": 0.5},
                {"type": "key_hotkey", "keys": "ctrl+s"},
                {"type": "think"}
            ]"#,
        )
        .unwrap();
        let kinds: Vec<ActionKind> = actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::MouseMove, ActionKind::KeyHotkey, ActionKind::Think]
        );

        let err = parse_script(r#"[{"type": "wait"}, {"type": "nope"}]"#).unwrap_err();
        assert!(err.to_string().contains("record 1"));
        assert!(parse_script(r#"{"type": "wait"}"#).is_err());
    }

    #[test]
    fn test_parse_break_record() {
        let action = Action::from_record(&json!({"type": "break", "break_type": "long"})).unwrap();
        assert!(matches!(
            action,
            Action::Break {
                kind: BreakKind::Long,
                duration: None
            }
        ));

        let Action::Break { kind, duration } =
            Action::from_record(&json!({"type": "break", "duration": 2.5})).unwrap()
        else {
            panic!("expected a break");
        };
        assert_eq!(kind, BreakKind::Micro);
        assert_eq!(duration, Some(Duration::from_millis(2500)));

        assert!(Action::from_record(&json!({"type": "break", "break_type": "nap"})).is_err());
        assert_eq!(ActionKind::Break.name(), "break");
        assert_eq!(BreakKind::Short.seconds_range(), (30.0, 120.0));
    }

    #[test]
    fn test_kind_names_and_delays() {
        assert_eq!(ActionKind::MouseMove.base_delay(), 0.1);
        assert_eq!(ActionKind::TypeText.base_delay(), 0.3);
        assert_eq!(ActionKind::Wait.base_delay(), 0.2);
        assert_eq!(ActionKind::KeyHotkey.to_string(), "key_hotkey");
    }

    #[test]
    fn test_closure_as_custom_action() {
        let mut calls = 0;
        let mut handler = |args: &[Value]| -> Result<bool, CustomError> {
            calls += 1;
            Ok(args.len() == 2)
        };
        assert!(handler.invoke(&[json!(1), json!("two")]).unwrap());
        assert!(!handler.invoke(&[]).unwrap());
        assert_eq!(handler.name(), "custom");
        assert_eq!(calls, 2);
    }
}
