//! Automatic tool selection for requests that name no tools.

use pprovider::{ChatContexts, ToolDefinition};

pub trait ToolSelector: Send + Sync {
    /// Names of the tools from `catalog` to offer for this conversation.
    fn select(&self, contexts: &ChatContexts, catalog: &[ToolDefinition]) -> Vec<String>;
}

/// Offers a tool when any of its trigger words appears in the system prompt
/// or in a text question of the conversation. Matching ignores case.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriggerWordToolSelector;

impl ToolSelector for TriggerWordToolSelector {
    fn select(&self, contexts: &ChatContexts, catalog: &[ToolDefinition]) -> Vec<String> {
        let corpus = contexts.question_corpus().to_lowercase();
        if corpus.is_empty() {
            return Vec::new();
        }

        catalog
            .iter()
            .filter(|definition| {
                definition
                    .trigger_words
                    .iter()
                    .map(|word| word.trim())
                    .filter(|word| !word.is_empty())
                    .any(|word| corpus.contains(&word.to_lowercase()))
            })
            .map(|definition| definition.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pprovider::ContentItem;

    use super::*;

    fn catalog() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("get_weather", "Weather lookup", "{}")
                .with_trigger_words(["weather", "天气"]),
            ToolDefinition::new("search", "Web search", "{}").with_trigger_words(["search"]),
            ToolDefinition::new("always_off", "No triggers", "{}").with_trigger_words([" "]),
        ]
    }

    #[test]
    fn trigger_words_match_questions_case_insensitively() {
        let mut contexts = ChatContexts::new();
        contexts.add_questions(vec![ContentItem::text("What's the WEATHER in Paris?")]);

        assert_eq!(
            TriggerWordToolSelector.select(&contexts, &catalog()),
            vec!["get_weather".to_string()]
        );
    }

    #[test]
    fn system_prompt_contributes_to_matching() {
        let contexts = ChatContexts::new().with_system_prompt("You may search the web.");

        assert_eq!(
            TriggerWordToolSelector.select(&contexts, &catalog()),
            vec!["search".to_string()]
        );
    }

    #[test]
    fn empty_conversation_selects_nothing() {
        assert!(TriggerWordToolSelector
            .select(&ChatContexts::new(), &catalog())
            .is_empty());
    }
}
