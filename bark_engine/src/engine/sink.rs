//! Output sinks - where spoken lines and raised notifications go.

use bark_world::EntityId;

/// Receives the engine's outward effects.
pub trait BarkSink {
    /// A line is spoken by `speaker` (`None` for an unattributed line).
    fn on_say(&mut self, speaker: Option<EntityId>, text: &str);

    /// A named notification raised by a RAISE command.
    fn on_event_raised(&mut self, name: &str);
}

impl<S: BarkSink + ?Sized> BarkSink for &mut S {
    fn on_say(&mut self, speaker: Option<EntityId>, text: &str) {
        (**self).on_say(speaker, text)
    }

    fn on_event_raised(&mut self, name: &str) {
        (**self).on_event_raised(name)
    }
}

/// A sink that keeps everything it receives, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub spoken: Vec<(Option<EntityId>, String)>,
    pub raised: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spoken text without speakers.
    pub fn lines(&self) -> Vec<&str> {
        self.spoken.iter().map(|(_, text)| text.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.spoken.clear();
        self.raised.clear();
    }
}

impl BarkSink for RecordingSink {
    fn on_say(&mut self, speaker: Option<EntityId>, text: &str) {
        self.spoken.push((speaker, text.to_string()));
    }

    fn on_event_raised(&mut self, name: &str) {
        self.raised.push(name.to_string());
    }
}
