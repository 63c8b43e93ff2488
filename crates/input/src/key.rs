use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys the game listens to. Serialized with browser-style key codes (`KeyW`, `ArrowUp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    #[serde(rename = "KeyW")]
    W,
    #[serde(rename = "KeyA")]
    A,
    #[serde(rename = "KeyS")]
    S,
    #[serde(rename = "KeyD")]
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    #[serde(rename = "KeyQ")]
    Q,
    #[serde(rename = "KeyE")]
    E,
    #[serde(rename = "KeyR")]
    R,
    Escape,
}

impl Key {
    pub const ALL: [Key; 13] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::ArrowUp,
        Key::ArrowDown,
        Key::ArrowLeft,
        Key::ArrowRight,
        Key::Space,
        Key::Q,
        Key::E,
        Key::R,
        Key::Escape,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Key::W => "KeyW",
            Key::A => "KeyA",
            Key::S => "KeyS",
            Key::D => "KeyD",
            Key::ArrowUp => "ArrowUp",
            Key::ArrowDown => "ArrowDown",
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
            Key::Space => "Space",
            Key::Q => "KeyQ",
            Key::E => "KeyE",
            Key::R => "KeyR",
            Key::Escape => "Escape",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown key code: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::ALL
            .into_iter()
            .find(|k| k.code() == s)
            .ok_or_else(|| UnknownKey(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_str() {
        for key in Key::ALL {
            assert_eq!(key.code().parse::<Key>(), Ok(key));
        }
        assert_eq!("KeyZ".parse::<Key>(), Err(UnknownKey("KeyZ".into())));
    }

    #[test]
    fn serde_uses_key_codes() {
        assert_eq!(serde_json::to_string(&Key::W).unwrap(), r#""KeyW""#);
        let k: Key = serde_json::from_str(r#""ArrowLeft""#).unwrap();
        assert_eq!(k, Key::ArrowLeft);
    }
}
