use super::Emitter;
use crate::entry::{payload_from_value, ErrorInfo, LogEntry, LogLevel, LogSource, UiAction};
use serde_json::Value;

const UI_FEATURE: &str = "ui-interaction";

/// Lightweight UI-interaction logger
///
/// Entries are tagged `source = frontend` with the interaction kind in
/// `action`. Everything is INFO except [`UiLogger::error`].
#[derive(Clone)]
pub struct UiLogger {
    emitter: Emitter,
}

impl UiLogger {
    pub(crate) fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }

    pub fn open(&self, component: &str, data: Option<Value>) {
        self.record(UiAction::Open, component, format!("{component} open"), data);
    }

    pub fn close(&self, component: &str, data: Option<Value>) {
        self.record(UiAction::Close, component, format!("{component} close"), data);
    }

    pub fn mount(&self, component: &str, data: Option<Value>) {
        self.record(UiAction::Mount, component, format!("{component} mount"), data);
    }

    pub fn unmount(&self, component: &str, data: Option<Value>) {
        self.record(UiAction::Unmount, component, format!("{component} unmount"), data);
    }

    pub fn click(&self, component: &str, target: &str, data: Option<Value>) {
        let data = with_field(data, "target", target);
        self.record(UiAction::Click, component, format!("{component} click {target}"), data);
    }

    pub fn change(&self, component: &str, field: &str, data: Option<Value>) {
        let data = with_field(data, "field", field);
        self.record(UiAction::Change, component, format!("{component} change {field}"), data);
    }

    pub fn error(&self, component: &str, error: ErrorInfo, data: Option<Value>) {
        let entry = self
            .entry(LogLevel::Error, UiAction::Error, component, error.message.clone(), data)
            .with_error(error);
        self.emitter.emit(entry);
    }

    fn record(&self, action: UiAction, component: &str, message: String, data: Option<Value>) {
        let entry = self.entry(LogLevel::Info, action, component, message, data);
        self.emitter.emit(entry);
    }

    fn entry(
        &self,
        level: LogLevel,
        action: UiAction,
        component: &str,
        message: String,
        data: Option<Value>,
    ) -> LogEntry {
        LogEntry::new(level, LogSource::Frontend, component, message)
            .with_feature(UI_FEATURE)
            .with_action(action.as_str())
            .with_data(data.and_then(payload_from_value))
    }
}

fn with_field(data: Option<Value>, key: &str, value: &str) -> Option<Value> {
    let mut payload = data.and_then(payload_from_value).unwrap_or_default();
    payload.insert(key.to_string(), Value::String(value.to_string()));
    Some(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::test_support;
    use serde_json::json;

    #[test]
    fn test_lifecycle_actions_are_tagged() {
        let (emitter, _signal) = test_support::emitter(100, 100);
        let ui = UiLogger::new(emitter.clone());

        ui.open("ChapterDialog", None);
        ui.mount("ChapterDialog", Some(json!({"chapter": 4})));
        ui.unmount("ChapterDialog", None);
        ui.close("ChapterDialog", None);

        let actions: Vec<String> = emitter
            .store()
            .snapshot()
            .into_iter()
            .map(|e| e.action.unwrap())
            .collect();
        assert_eq!(actions, vec!["open", "mount", "unmount", "close"]);
    }

    #[test]
    fn test_click_records_target() {
        let (emitter, _signal) = test_support::emitter(100, 100);
        let ui = UiLogger::new(emitter.clone());

        ui.click("Toolbar", "save-button", Some(json!({"shortcut": false})));

        let entry = &emitter.store().snapshot()[0];
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.source, LogSource::Frontend);
        assert_eq!(entry.message, "Toolbar click save-button");
        let data = entry.data.as_ref().unwrap();
        assert_eq!(data["target"], "save-button");
        assert_eq!(data["shortcut"], false);
    }

    #[test]
    fn test_error_action_is_error_level() {
        let (emitter, _signal) = test_support::emitter(100, 100);
        let ui = UiLogger::new(emitter.clone());

        ui.error("Canvas", ErrorInfo::new("render failed", "render failed\n at draw"), None);

        let entry = &emitter.store().snapshot()[0];
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.action.as_deref(), Some("error"));
        assert_eq!(entry.error.as_deref(), Some("render failed"));
        assert!(entry.stack.is_some());
    }
}
