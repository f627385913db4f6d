//! Maps the abstract command vocabulary onto Xbox button tags.

use super::error::{ControlError, ControlResult};
use super::types::{CommandType, DeviceCommand};
use super::wire::WireMessage;

/// Outcome of translating a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Send(WireMessage),
    /// Power depends on whether the console answers, so the controller decides
    PowerToggle,
}

const CUSTOM_BUTTONS: &[(&str, &str)] = &[
    ("a", "a"),
    ("b", "b"),
    ("x", "x"),
    ("y", "y"),
    ("lb", "left_shoulder"),
    ("rb", "right_shoulder"),
    ("lt", "left_trigger"),
    ("rt", "right_trigger"),
    ("view", "view"),
    ("menu", "menu"),
    ("xbox", "nexus"),
    ("guide", "nexus"),
    ("left_stick", "left_thumbstick"),
    ("right_stick", "right_thumbstick"),
];

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

fn simple_button(command_type: &CommandType) -> Option<&'static str> {
    match command_type {
        CommandType::Menu => Some("nexus"),
        CommandType::Back => Some("back"),
        CommandType::DirectionalUp => Some("up"),
        CommandType::DirectionalDown => Some("down"),
        CommandType::DirectionalLeft => Some("left"),
        CommandType::DirectionalRight => Some("right"),
        CommandType::Ok => Some("a"),
        CommandType::PlayPause => Some("play_pause"),
        CommandType::Stop => Some("stop"),
        CommandType::FastForward => Some("fast_forward"),
        CommandType::Rewind => Some("rewind"),
        _ => None,
    }
}

/// Exactly one decimal digit, surrounding whitespace tolerated. Signs and
/// leading zeros ("+5", "05") are rejected.
pub fn number_button(payload: Option<&str>) -> Option<&'static str> {
    match payload?.trim().as_bytes() {
        [d] if d.is_ascii_digit() => DIGITS.get(usize::from(d - b'0')).copied(),
        _ => None,
    }
}

/// Case-insensitive exact lookup of a symbolic controller button
pub fn custom_button(payload: Option<&str>) -> Option<&'static str> {
    let key = payload?.to_lowercase();
    CUSTOM_BUTTONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tag)| *tag)
}

pub fn translate(command: &DeviceCommand) -> ControlResult<Translation> {
    let payload = command.payload.as_deref();
    let unmapped = || ControlError::Unmapped {
        kind: command.command_type.clone(),
        payload: command.payload.clone(),
    };

    let tag = match &command.command_type {
        CommandType::Power => return Ok(Translation::PowerToggle),
        CommandType::Number => number_button(payload).ok_or_else(unmapped)?,
        CommandType::Custom => custom_button(payload).ok_or_else(unmapped)?,
        CommandType::Unknown => {
            return Err(ControlError::UnknownCommand(command.command_type.clone()));
        }
        other => simple_button(other).ok_or_else(unmapped)?,
    };

    Ok(Translation::Send(WireMessage::button(tag)))
}
