//! Message lookup for user-facing text.
//!
//! The flows only ever ask a [`Localizer`] for a key; [`Catalog`] is the
//! built-in implementation with English and Korean tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept region-qualified tags like "ko-KR".
        let lang = s.split(['-', '_']).next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ko" => Ok(Self::Ko),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

/// Lookup from message key to display string.
pub trait Localizer: Send + Sync {
    fn locale(&self) -> Locale;

    fn text(&self, key: &str) -> String;
}

const EN: &[(&str, &str)] = &[
    ("buttons.close", "Close"),
    ("buttons.cancel", "Cancel"),
    ("buttons.add", "Add"),
    ("buttons.adding", "Adding..."),
    ("common.processing", "Processing..."),
    ("actor.add_modal_title", "Add Actor"),
    ("actor.name_label", "Actor name"),
    ("actor.name_placeholder", "Enter an actor name"),
    ("policy.ai_modal_title", "AI Policy Recommendations"),
    ("policy.ai_modal_desc", "Get AI-recommended policies for the selected feature."),
    ("policy.ai_loading", "Generating recommendations..."),
    ("policy.ai_get_recommendations", "Get recommendations"),
    ("policy.ai_retry", "Retry"),
    ("policy.ai_error", "Failed to get AI recommendations."),
    ("policy.ai_select_policies", "Select policies to add"),
    ("policy.ai_selected_suffix", " selected"),
    ("policy.ai_add_selected", "Add selected"),
    ("policy.ai_policies_added", " policies added."),
    ("policy.add_error_title", "Failed to add policies"),
    ("policy.add_error_desc", "An error occurred while adding the selected policies."),
    ("orgCreate.title", "Create Organization"),
    ("orgCreate.description", "Create a new organization. You will be its owner."),
    ("orgCreate.name_label", "Organization name"),
    ("orgCreate.name_placeholder", "Enter an organization name"),
    ("orgCreate.create", "Create"),
    ("orgCreate.creating", "Creating..."),
    ("orgCreate.input_error_title", "Input error"),
    ("orgCreate.input_name_required", "Please enter an organization name."),
    ("orgCreate.success_title", "Organization created"),
    ("orgCreate.success_message", "{org} has been created."),
    ("orgCreate.failure_title", "Failed to create organization"),
    ("orgCreate.failure_message", "An error occurred while creating the organization."),
];

const KO: &[(&str, &str)] = &[
    ("buttons.close", "닫기"),
    ("buttons.cancel", "취소"),
    ("buttons.add", "추가"),
    ("buttons.adding", "추가 중..."),
    ("common.processing", "처리 중..."),
    ("actor.add_modal_title", "액터 추가"),
    ("actor.name_label", "액터 이름"),
    ("actor.name_placeholder", "액터 이름을 입력하세요"),
    ("policy.ai_modal_title", "AI 정책 추천"),
    ("policy.ai_modal_desc", "선택한 기능에 대한 AI 추천 정책을 받아보세요."),
    ("policy.ai_loading", "추천을 생성하는 중..."),
    ("policy.ai_get_recommendations", "추천 받기"),
    ("policy.ai_retry", "다시 시도"),
    ("policy.ai_error", "AI 추천을 가져오지 못했습니다."),
    ("policy.ai_select_policies", "추가할 정책을 선택하세요"),
    ("policy.ai_selected_suffix", "개 선택됨"),
    ("policy.ai_add_selected", "선택 항목 추가"),
    ("policy.ai_policies_added", "개의 정책이 추가되었습니다."),
    ("policy.add_error_title", "정책 추가 실패"),
    ("policy.add_error_desc", "선택한 정책을 추가하는 중 오류가 발생했습니다."),
    ("orgCreate.title", "조직 생성"),
    ("orgCreate.description", "새 조직을 생성합니다. 생성자가 소유자가 됩니다."),
    ("orgCreate.name_label", "조직 이름"),
    ("orgCreate.name_placeholder", "조직 이름을 입력하세요"),
    ("orgCreate.create", "생성"),
    ("orgCreate.creating", "생성 중..."),
    ("orgCreate.input_error_title", "입력 오류"),
    ("orgCreate.input_name_required", "조직 이름을 입력해주세요."),
    ("orgCreate.success_title", "조직 생성 완료"),
    ("orgCreate.success_message", "{org} 조직이 생성되었습니다."),
    ("orgCreate.failure_title", "조직 생성 실패"),
    ("orgCreate.failure_message", "조직을 생성하는 중 오류가 발생했습니다."),
];

/// Built-in message tables.
///
/// Missing keys fall back to English, then to the key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
        match locale {
            Locale::En => EN,
            Locale::Ko => KO,
        }
    }

    fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
        Self::table(locale)
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

impl Localizer for Catalog {
    fn locale(&self) -> Locale {
        self.locale
    }

    fn text(&self, key: &str) -> String {
        Self::lookup(self.locale, key)
            .or_else(|| Self::lookup(Locale::En, key))
            .unwrap_or(key)
            .to_string()
    }
}
