//! Shared types for device control. Defines the device record, the abstract
//! command vocabulary, command listings, and the result structure returned by
//! every controller.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::error::ControlResult;

/// Kind of device, used to pick the controller family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Tv,
    Receiver,
    Soundbar,
    StreamingDevice,
    GameConsole,
    CableBox,
    SmartTv,
    Xbox,
    Roku,
    Other,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Tv => write!(f, "tv"),
            DeviceType::Receiver => write!(f, "receiver"),
            DeviceType::Soundbar => write!(f, "soundbar"),
            DeviceType::StreamingDevice => write!(f, "streaming_device"),
            DeviceType::GameConsole => write!(f, "game_console"),
            DeviceType::CableBox => write!(f, "cable_box"),
            DeviceType::SmartTv => write!(f, "smart_tv"),
            DeviceType::Xbox => write!(f, "xbox"),
            DeviceType::Roku => write!(f, "roku"),
            DeviceType::Other => write!(f, "other"),
        }
    }
}

/// How the device is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Infrared,
    Network,
    Bluetooth,
    WebOs,
    Usb,
}

/// A controllable endpoint as handed over by the API layer.
///
/// The record is assumed to be syntactically valid already; controllers only
/// check semantic preconditions such as "has an address".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub device_type: DeviceType,
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Opaque session token (the Live ID for Xbox consoles)
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Device {
    pub fn new(name: &str, device_type: DeviceType) -> Self {
        Self {
            name: name.to_string(),
            brand: None,
            model: None,
            device_type,
            connection_type: ConnectionType::Network,
            ip_address: None,
            mac_address: None,
            port: None,
            auth_token: None,
        }
    }

    pub fn with_address(mut self, ip: &str) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Network address, treating an empty string the same as no address
    pub fn address(&self) -> Option<&str> {
        self.ip_address.as_deref().filter(|ip| !ip.is_empty())
    }

    /// Auth token, treating an empty string the same as no token
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn has_valid_address(&self) -> bool {
        self.address()
            .is_some_and(|ip| ip.parse::<IpAddr>().is_ok())
    }

    /// Port 0 is the only value a `u16` can hold that is out of range
    pub fn has_valid_port(&self) -> bool {
        self.port.is_none_or(|p| p >= 1)
    }

    pub fn has_valid_mac(&self) -> bool {
        self.mac_address.as_deref().is_none_or(is_mac_address)
    }
}

/// `XX:XX:XX:XX:XX:XX` with either ':' or '-' as separator
fn is_mac_address(mac: &str) -> bool {
    let bytes = mac.as_bytes();
    if bytes.len() != 17 {
        return false;
    }

    bytes.iter().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            *b == b':' || *b == b'-'
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

/// Abstract command vocabulary shared by every device family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Power,
    Menu,
    Back,
    DirectionalUp,
    DirectionalDown,
    DirectionalLeft,
    DirectionalRight,
    Ok,
    PlayPause,
    Stop,
    FastForward,
    Rewind,
    Number,
    Custom,
    /// Kinds added by newer API versions that this build does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandType::Power => "power",
            CommandType::Menu => "menu",
            CommandType::Back => "back",
            CommandType::DirectionalUp => "directional_up",
            CommandType::DirectionalDown => "directional_down",
            CommandType::DirectionalLeft => "directional_left",
            CommandType::DirectionalRight => "directional_right",
            CommandType::Ok => "ok",
            CommandType::PlayPause => "play_pause",
            CommandType::Stop => "stop",
            CommandType::FastForward => "fast_forward",
            CommandType::Rewind => "rewind",
            CommandType::Number => "number",
            CommandType::Custom => "custom",
            CommandType::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A single command request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub command_type: CommandType,
    /// Only read for `Number` (a digit) and `Custom` (a button name)
    #[serde(default)]
    pub payload: Option<String>,
}

impl DeviceCommand {
    pub fn new(command_type: CommandType) -> Self {
        Self {
            command_type,
            payload: None,
        }
    }

    pub fn with_payload(command_type: CommandType, payload: &str) -> Self {
        Self {
            command_type,
            payload: Some(payload.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn from_outcome(outcome: ControlResult<()>, what: &str) -> Self {
        match outcome {
            Ok(()) => Self::ok(format!("{} succeeded", what)),
            Err(e) => Self::failed(format!("{} failed: {}", what, e)),
        }
    }
}
