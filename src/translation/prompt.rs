const TEXT_PLACEHOLDER: &str = "{text}";

/// Fills a prompt template with the message text.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Only the first placeholder is replaced, so a message that itself
    /// contains `{text}` is embedded unchanged.
    pub fn build(&self, text: &str) -> String {
        self.template.replacen(TEXT_PLACEHOLDER, text, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PromptConfig;

    #[test]
    fn embeds_text_once() {
        let builder = PromptBuilder::new("English: {text}\nHungarian:");
        assert_eq!(
            builder.build("literal {text} inside"),
            "English: literal {text} inside\nHungarian:"
        );
    }

    #[test]
    fn default_template_ends_with_task() {
        let prompt = PromptBuilder::new(PromptConfig::default().template).build("Good morning!");
        assert!(prompt.contains("English: Good morning!\nHungarian:"));
        assert!(!prompt.contains("{text}"));
    }
}
