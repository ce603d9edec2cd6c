//! Thematic events - what gameplay code raises for the rule engine to react to.

use bark_world::EntityId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A short action symbol of up to four ASCII alphanumerics, stored upper-cased.
///
/// Rules and events name actions such as `SAY`, `SEE` or `HURT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionName([u8; 4]);

impl ActionName {
    /// The action used for speech, including the synthetic events raised when a bark ends.
    pub const SAY: ActionName = ActionName(*b"SAY\0");

    /// Parse an action symbol. Returns `None` for empty, overlong or non-alphanumeric input.
    pub fn new(symbol: &str) -> Option<Self> {
        let bytes = symbol.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        let mut packed = [0u8; 4];
        for (slot, byte) in packed.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Some(Self(packed))
    }

    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(4);
        // Only ASCII alphanumerics are ever stored.
        std::str::from_utf8(&self.0[..len]).unwrap_or("")
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActionName({})", self.as_str())
    }
}

impl Serialize for ActionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        ActionName::new(&symbol)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid action name '{}'", symbol)))
    }
}

/// An event raised by gameplay: *who* did *what* about *which concept*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThematicEvent {
    /// The originating actor, if any.
    pub actor: Option<EntityId>,
    pub action: ActionName,
    /// The object of the event, i.e. what the bark is about.
    pub concept: String,
}

impl ThematicEvent {
    pub fn new(action: ActionName, concept: impl Into<String>) -> Self {
        Self {
            actor: None,
            action,
            concept: concept.into(),
        }
    }

    /// Set the originating actor.
    pub fn by(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// The synthetic event raised when a spoken line finishes (or is spoken instantly).
    pub fn spoken(concept: impl Into<String>, speaker: Option<EntityId>) -> Self {
        Self {
            actor: speaker,
            action: ActionName::SAY,
            concept: concept.into(),
        }
    }
}
