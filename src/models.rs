use serde::{Deserialize, Serialize};

/// Epoch milliseconds.
pub type Timestamp = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(alias = "createdAt")]
    pub created_at: Timestamp,
    /// Daily local clock time, `HH:MM`.
    #[serde(default, alias = "reminderTime")]
    pub reminder_time: Option<String>,
    /// Set by postpone; re-arming honours it while it is still ahead.
    #[serde(default)]
    pub snoozed_until: Option<Timestamp>,
}

/// How a task id is folded into the integer id the notification platform wants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    #[default]
    Hash,
    Digits,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub id_strategy: IdStrategy,
    #[serde(default)]
    pub notification_title: Option<String>,
    #[serde(default)]
    pub ai_api_key: String,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: default_language(),
            id_strategy: IdStrategy::Hash,
            notification_title: None,
            ai_api_key: String::new(),
            ai_model: default_ai_model(),
        }
    }
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.0-flash".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TasksFile {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.language, "auto");
        assert_eq!(settings.id_strategy, IdStrategy::Hash);
        assert!(settings.notification_title.is_none());
        assert!(settings.ai_api_key.is_empty());
        assert_eq!(settings.ai_model, "gemini-2.0-flash");
    }

    #[test]
    fn settings_serde_applies_defaults_for_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{ "id_strategy": "digits" }"#).expect("settings");
        assert_eq!(settings.id_strategy, IdStrategy::Digits);
        assert_eq!(settings.language, "auto");
        assert_eq!(settings.ai_model, "gemini-2.0-flash");
    }

    #[test]
    fn task_accepts_legacy_camel_case_fields() {
        let json = r#"
        {
          "id": "5f0c",
          "text": "ilaç iç",
          "completed": false,
          "createdAt": 1700000000000,
          "reminderTime": "09:00"
        }
        "#;

        let task: Task = serde_json::from_str(json).expect("task should deserialize");
        assert_eq!(task.created_at, 1_700_000_000_000);
        assert_eq!(task.reminder_time.as_deref(), Some("09:00"));
        assert_eq!(task.snoozed_until, None);
    }

    #[test]
    fn task_without_reminder_serializes_null() {
        let task = Task {
            id: "t1".to_string(),
            text: "buy milk".to_string(),
            completed: false,
            created_at: 1,
            reminder_time: None,
            snoozed_until: None,
        };
        let value = serde_json::to_value(&task).expect("serialize task");
        assert_eq!(value["reminder_time"], serde_json::Value::Null);
        assert_eq!(value["snoozed_until"], serde_json::Value::Null);
        assert_eq!(value["created_at"], 1);
    }
}
