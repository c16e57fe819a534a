use sys_locale::get_locale;

use crate::models::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Tr,
    En,
}

pub struct Labels {
    pub reminder_title: &'static str,
    pub suggestion_prompt: &'static str,
}

pub const SUPPORTED_LANGUAGES: [&str; 3] = ["auto", "tr", "en"];

pub fn resolve_language(language: &str) -> Language {
    match language.trim().to_lowercase().as_str() {
        "tr" => Language::Tr,
        "en" => Language::En,
        _ => language_from_locale(&get_locale().unwrap_or_default()),
    }
}

fn language_from_locale(locale: &str) -> Language {
    if locale.to_lowercase().starts_with("tr") {
        Language::Tr
    } else {
        Language::En
    }
}

pub fn labels(lang: Language) -> Labels {
    match lang {
        Language::Tr => Labels {
            reminder_title: "Günlük Dostum Hatırlatıcı",
            suggestion_prompt: "Kullanıcının yapılacaklar listesine eklediği \"{task}\" görevi için uygun bir hatırlatma saati öner. Sadece HH:MM formatında saat öner, başka açıklama yapma. Örnek: 09:00, 14:30, 18:00 gibi.",
        },
        Language::En => Labels {
            reminder_title: "Günlük Dostum Reminder",
            suggestion_prompt: "Suggest a suitable reminder time for the task \"{task}\" that the user just added to their todo list. Answer only with a time in HH:MM format and nothing else. Examples: 09:00, 14:30, 18:00.",
        },
    }
}

/// A non-blank `notification_title` wins over the localized default.
pub fn reminder_title(settings: &Settings) -> String {
    settings
        .notification_title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| labels(resolve_language(&settings.language)).reminder_title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_languages_ignore_the_system_locale() {
        assert_eq!(resolve_language("tr"), Language::Tr);
        assert_eq!(resolve_language(" EN "), Language::En);
    }

    #[test]
    fn locale_prefix_decides_auto() {
        assert_eq!(language_from_locale("tr-TR"), Language::Tr);
        assert_eq!(language_from_locale("TR"), Language::Tr);
        assert_eq!(language_from_locale("en-US"), Language::En);
        assert_eq!(language_from_locale(""), Language::En);
    }

    #[test]
    fn reminder_title_prefers_override() {
        let mut settings = Settings::default();
        settings.language = "tr".to_string();
        assert_eq!(reminder_title(&settings), "Günlük Dostum Hatırlatıcı");

        settings.notification_title = Some("  ".to_string());
        assert_eq!(reminder_title(&settings), "Günlük Dostum Hatırlatıcı");

        settings.notification_title = Some(" İlaç ".to_string());
        assert_eq!(reminder_title(&settings), "İlaç");
    }

    #[test]
    fn prompts_carry_a_task_placeholder() {
        for lang in [Language::Tr, Language::En] {
            assert!(labels(lang).suggestion_prompt.contains("{task}"));
        }
    }
}
