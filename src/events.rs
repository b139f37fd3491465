//! Save lifecycle notifications.

use std::fmt;
use std::sync::Arc;

use crate::settings::Settings;

/// Name of the event fired after staging and before commit.
pub const PRE_SAVE: &str = "settings.pre_save";
/// Name of the event fired after a successful commit.
pub const POST_SAVE: &str = "settings.post_save";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsEventKind {
    PreSave,
    PostSave,
}

impl SettingsEventKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::PreSave => PRE_SAVE,
            Self::PostSave => POST_SAVE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SettingsEvent<'a> {
    pub kind: SettingsEventKind,
    pub settings: &'a Settings,
}

impl SettingsEvent<'_> {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

type Observer = Arc<dyn Fn(&SettingsEvent<'_>) + Send + Sync>;

/// Synchronous, ordered list of observers.
///
/// A pre-save event is not always followed by a post-save one: if the commit
/// fails, only the pre-save event has been delivered.
#[derive(Clone, Default)]
pub struct EventNotifier {
    observers: Vec<Observer>,
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer called for every event, after those already added.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&SettingsEvent<'_>) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
    }

    pub fn dispatch(&self, event: &SettingsEvent<'_>) {
        tracing::trace!(event = event.name(), schema = event.settings.schema(), "dispatching settings event");
        for observer in &self.observers {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_observers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = EventNotifier::new();
        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            notifier.subscribe(move |event| {
                log.lock().unwrap().push(format!("{tag}:{}", event.name()));
            });
        }

        let settings = Settings::new("shop.general");
        notifier.dispatch(&SettingsEvent {
            kind: SettingsEventKind::PreSave,
            settings: &settings,
        });

        assert_eq!(
            *log.lock().unwrap(),
            ["first:settings.pre_save", "second:settings.pre_save"]
        );
    }

    #[test]
    fn test_event_names() {
        assert_eq!(SettingsEventKind::PreSave.name(), "settings.pre_save");
        assert_eq!(SettingsEventKind::PostSave.name(), "settings.post_save");
    }
}
