//! Envelopes: the structured messages carried inside frames.
//!
//! On the wire an envelope is a JSON object tagged by a numeric `meta`
//! field, e.g. `{"meta":0,"sender":"bob","content":"hi"}`.

use serde::{Deserialize, Serialize};

/// Kind tag of an envelope, serialized as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Meta {
    Send = 0,
    Join = 1,
    Leave = 2,
    BatchJoin = 3,
    BatchLeave = 4,
}

impl From<Meta> for u8 {
    fn from(meta: Meta) -> Self {
        meta as u8
    }
}

impl TryFrom<u8> for Meta {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Meta::Send),
            1 => Ok(Meta::Join),
            2 => Ok(Meta::Leave),
            3 => Ok(Meta::BatchJoin),
            4 => Ok(Meta::BatchLeave),
            other => Err(format!("unknown meta code {other}")),
        }
    }
}

/// A decoded message: kind tag plus kind-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub enum Envelope {
    /// A chat line relayed from `sender`
    Send { sender: String, content: String },
    /// A single user entered the chat
    Join { username: String },
    /// A single user left the chat
    Leave { username: String },
    /// Several users are present (sent to a newcomer)
    BatchJoin { usernames: Vec<String> },
    /// Several users left at once
    BatchLeave { usernames: Vec<String> },
}

impl Envelope {
    pub fn send(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Envelope::Send {
            sender: sender.into(),
            content: content.into(),
        }
    }

    pub fn join(username: impl Into<String>) -> Self {
        Envelope::Join {
            username: username.into(),
        }
    }

    pub fn leave(username: impl Into<String>) -> Self {
        Envelope::Leave {
            username: username.into(),
        }
    }

    pub fn meta(&self) -> Meta {
        match self {
            Envelope::Send { .. } => Meta::Send,
            Envelope::Join { .. } => Meta::Join,
            Envelope::Leave { .. } => Meta::Leave,
            Envelope::BatchJoin { .. } => Meta::BatchJoin,
            Envelope::BatchLeave { .. } => Meta::BatchLeave,
        }
    }
}

/// Flat JSON shape shared by every envelope kind
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usernames: Option<Vec<String>>,
}

impl WireEnvelope {
    fn bare(meta: Meta) -> Self {
        Self {
            meta,
            sender: None,
            content: None,
            username: None,
            usernames: None,
        }
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        let mut wire = WireEnvelope::bare(envelope.meta());
        match envelope {
            Envelope::Send { sender, content } => {
                wire.sender = Some(sender);
                wire.content = Some(content);
            }
            Envelope::Join { username } | Envelope::Leave { username } => {
                wire.username = Some(username);
            }
            Envelope::BatchJoin { usernames } | Envelope::BatchLeave { usernames } => {
                wire.usernames = Some(usernames);
            }
        }
        wire
    }
}

fn required<T>(field: Option<T>, name: &str, meta: Meta) -> Result<T, String> {
    field.ok_or_else(|| format!("{meta:?} envelope is missing '{name}'"))
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = String;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let meta = wire.meta;
        Ok(match meta {
            Meta::Send => Envelope::Send {
                sender: required(wire.sender, "sender", meta)?,
                content: required(wire.content, "content", meta)?,
            },
            Meta::Join => Envelope::Join {
                username: required(wire.username, "username", meta)?,
            },
            Meta::Leave => Envelope::Leave {
                username: required(wire.username, "username", meta)?,
            },
            Meta::BatchJoin => Envelope::BatchJoin {
                usernames: required(wire.usernames, "usernames", meta)?,
            },
            Meta::BatchLeave => Envelope::BatchLeave {
                usernames: required(wire.usernames, "usernames", meta)?,
            },
        })
    }
}
