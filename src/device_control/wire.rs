//! Xbox wire messages. Each message is a small JSON object sent either over a
//! TCP connection or as a single UDP datagram to the console command port.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stream,
    Datagram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Button { button: String },
    PowerOn { live_id: String },
    Ping,
    Text { text: String },
}

impl WireMessage {
    pub fn button(tag: &str) -> Self {
        WireMessage::Button {
            button: tag.to_string(),
        }
    }

    /// Buttons and text need the stream; power-on and ping go out as datagrams
    pub fn transport(&self) -> TransportKind {
        match self {
            WireMessage::Button { .. } | WireMessage::Text { .. } => TransportKind::Stream,
            WireMessage::PowerOn { .. } | WireMessage::Ping => TransportKind::Datagram,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Short tag used in logs, e.g. `button:up`
impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireMessage::Button { button } => write!(f, "button:{}", button),
            WireMessage::PowerOn { .. } => write!(f, "power_on"),
            WireMessage::Ping => write!(f, "ping"),
            WireMessage::Text { .. } => write!(f, "text"),
        }
    }
}
