use crate::utils::error::{ReportError, Result};
use crate::utils::validation::Validate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_SUMMARY_TEMPLATE: &str = "Give a summary of the thoughts and feelings expressed in the following survey responses, as an answer to the question {survey_question}. Highlight any recurring themes or particular areas of concern. Here are the survey responses: {responses}";

pub const DEFAULT_COMBINE_TEMPLATE: &str = "Combine the following two summaries into one text. Give particular focus to any recurring feelings, themes and areas of concern. Summary 1: {current_summary}. Summary 2: {new_summary}";

pub const DEFAULT_COLLECTIVE_FEEDBACK_TEMPLATE: &str = "Give an overall summary of the different ideas and opinions expressed in the following survey response summaries: {collective_feedback}. Begin the response with the phrase: 'Collective feedback from the survey shows that, overall, respondents feel that ...' ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub summary: String,
    pub combine: String,
    pub collective_feedback: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            summary: DEFAULT_SUMMARY_TEMPLATE.to_string(),
            combine: DEFAULT_COMBINE_TEMPLATE.to_string(),
            collective_feedback: DEFAULT_COLLECTIVE_FEEDBACK_TEMPLATE.to_string(),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"))
}

/// 一次掃描替換 `{name}`。替換後的內容不會再被掃描，
/// 所以回覆文字裡出現的大括號不會被誤當成變數。
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// 每則回覆一行，合併成一段 prompt 文字
pub fn format_responses(responses: &[&str]) -> String {
    responses
        .iter()
        .map(|r| format!("\n- {}", r.replace('\n', " ")))
        .collect()
}

impl PromptTemplates {
    pub fn summary_prompt(&self, question: &str, responses: &[&str]) -> String {
        let responses = format_responses(responses);
        render(
            &self.summary,
            &[
                ("survey_question", question),
                ("responses", responses.as_str()),
            ],
        )
    }

    pub fn combine_prompt(&self, current_summary: &str, new_summary: &str) -> String {
        render(
            &self.combine,
            &[
                ("current_summary", current_summary),
                ("new_summary", new_summary),
            ],
        )
    }

    pub fn collective_feedback_prompt(&self, collective_feedback: &str) -> String {
        render(
            &self.collective_feedback,
            &[("collective_feedback", collective_feedback)],
        )
    }
}

fn require_placeholders(field: &str, template: &str, names: &[&str]) -> Result<()> {
    for name in names {
        let placeholder = format!("{{{}}}", name);
        if !template.contains(&placeholder) {
            return Err(ReportError::ValidationError {
                message: format!("prompts.{} must contain the placeholder {}", field, placeholder),
            });
        }
    }
    Ok(())
}

impl Validate for PromptTemplates {
    fn validate(&self) -> Result<()> {
        require_placeholders("summary", &self.summary, &["survey_question", "responses"])?;
        require_placeholders("combine", &self.combine, &["current_summary", "new_summary"])?;
        require_placeholders(
            "collective_feedback",
            &self.collective_feedback,
            &["collective_feedback"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_pass() {
        let out = render(
            "Summary 1: {current_summary}. Summary 2: {new_summary}",
            &[
                ("current_summary", "mentions {new_summary} literally"),
                ("new_summary", "second"),
            ],
        );
        assert_eq!(
            out,
            "Summary 1: mentions {new_summary} literally. Summary 2: second"
        );
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(render("{a} and {b}", &[("a", "x")]), "x and {b}");
    }

    #[test]
    fn test_summary_prompt_lists_responses() {
        let prompts = PromptTemplates::default();
        let prompt = prompts.summary_prompt("How was onboarding?", &["Smooth", "Too long\nand slow"]);
        assert!(prompt.contains("as an answer to the question How was onboarding?"));
        assert!(prompt.ends_with("Here are the survey responses: \n- Smooth\n- Too long and slow"));
    }

    #[test]
    fn test_validate_templates() {
        assert!(PromptTemplates::default().validate().is_ok());

        let broken = PromptTemplates {
            combine: "Merge {current_summary}".to_string(),
            ..Default::default()
        };
        let err = broken.validate().unwrap_err();
        assert!(err.to_string().contains("{new_summary}"));
    }
}
