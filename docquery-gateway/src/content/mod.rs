//! Prompt text shipped with the gateway.

mod template;

use thiserror::Error;

pub use template::{TemplateVars, render_template, vars_from_pairs};

/// Answer prompt; expects `{{context}}` and `{{question}}`.
pub const ANSWER_PROMPT: &str = include_str!("../../prompts/answer.md");

/// Separator placed between retrieved chunks in the answer prompt.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("template error: {0}")]
    TemplateParse(String),
    #[error("missing template variable: {0}")]
    MissingVar(String),
}

/// Render the answer prompt for one question and its retrieved context.
pub fn answer_prompt(question: &str, context: &[String]) -> Result<String, ContentError> {
    let context = context.join(CONTEXT_SEPARATOR);
    render_template(
        ANSWER_PROMPT,
        &vars_from_pairs(&[("context", &context), ("question", question)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_embeds_context_and_question() {
        let context = vec!["Grace period is 30 days.".to_string(), "Premiums are annual.".to_string()];
        let prompt = answer_prompt("What is the grace period?", &context).unwrap();

        assert!(prompt.contains("Grace period is 30 days.\n---\nPremiums are annual."));
        assert!(prompt.contains("**QUESTION:** What is the grace period?"));
        assert!(!prompt.contains("{{"));
    }
}
