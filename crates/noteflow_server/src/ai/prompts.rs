//! Fixed prompt templates.
//!
//! Instruction prompts are sent with the `assistant` role, matching how the
//! NoteFlow client has always primed the model.

use super::{ChatMessage, ChatRole};

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for NoteFlow, a personal knowledge base application. Help users with their notes, answer questions, and provide assistance with content creation and editing. Be concise and helpful.";

pub const EDITOR_SYSTEM_PROMPT: &str = "You are a professional editor. Your task is to edit text according to the user's instructions. Return only the edited text without explanations or commentary.";

pub const MEETING_MINUTES_SYSTEM_PROMPT: &str = "You are a meeting assistant. Your task is to analyze meeting transcriptions and generate structured meeting minutes.

Return your response in the following Markdown format:

# Meeting Topic
[Brief description of the main topic]

## Key Discussion Points
- [Point 1]
- [Point 2]
- [Point 3]

## Action Items
- [ ] [Task 1] - @[Assignee if mentioned]
- [ ] [Task 2] - @[Assignee if mentioned]

## Decisions Made
- [Decision 1]
- [Decision 2]

## Summary
[Brief summary of the meeting]";

pub const DEFAULT_TRANSLATE_LANGUAGE: &str = "English";

/// Text transformation requested from `/api/ai/edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Polish,
    Summarize,
    Expand,
    Condense,
    Formalize,
    Casual,
    Translate,
    FixGrammar,
    Custom,
}

impl EditAction {
    /// Unknown labels fall back to `Polish`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "summarize" => Self::Summarize,
            "expand" => Self::Expand,
            "condense" => Self::Condense,
            "formalize" => Self::Formalize,
            "casual" => Self::Casual,
            "translate" => Self::Translate,
            "fix-grammar" => Self::FixGrammar,
            "custom" => Self::Custom,
            _ => Self::Polish,
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Polish | Self::Custom => "Improve the writing quality, fix any issues, and make it more readable while maintaining the original meaning:",
            Self::Summarize => "Summarize this content in a few concise sentences, keeping the key points:",
            Self::Expand => "Expand this content with more details, examples, and explanations while keeping the same tone and style:",
            Self::Condense => "Condense this content while preserving all key information and the main message:",
            Self::Formalize => "Rewrite this content in a more formal, professional tone suitable for business contexts:",
            Self::Casual => "Rewrite this content in a more casual, friendly, conversational tone:",
            Self::Translate => "Translate this content to",
            Self::FixGrammar => "Fix all grammar, spelling, and punctuation errors in this text while maintaining the original meaning:",
        }
    }
}

/// Builds the user prompt for an edit request.
///
/// `custom` uses the caller's instruction and falls back to polish when it is
/// blank; `translate` targets `language` or English.
pub fn edit_prompt(
    action: EditAction,
    text: &str,
    language: Option<&str>,
    custom_prompt: Option<&str>,
) -> String {
    match action {
        EditAction::Translate => {
            let language = non_blank(language).unwrap_or(DEFAULT_TRANSLATE_LANGUAGE);
            format!("{} {language}:\n\n{text}", action.instruction())
        }
        EditAction::Custom => match non_blank(custom_prompt) {
            Some(instruction) => format!("{instruction}\n\n{text}"),
            None => format!("{}\n\n{text}", action.instruction()),
        },
        _ => format!("{}\n\n{text}", action.instruction()),
    }
}

/// Prompt for a vision request. A non-blank caller prompt wins over the
/// action template.
pub fn vision_prompt(action: &str, custom_prompt: Option<&str>) -> String {
    if let Some(prompt) = non_blank(custom_prompt) {
        return prompt.to_string();
    }
    let template = match action.trim() {
        "" | "ocr" => "Extract all text from this image. Preserve the layout and formatting as much as possible. Only return the extracted text.",
        "chart" => "Analyze this chart or graph. Describe what it shows, identify the data, trends, and key insights. Format your response in Markdown.",
        "table" => "Extract any tables from this image. Present the data in a formatted Markdown table. Also describe what the table represents.",
        "formula" => "Extract any mathematical formulas from this image. Present them in LaTeX format and explain what each formula represents.",
        "describe" => "Describe this image in detail. Include all visual elements, text, layout, and any relevant context.",
        _ => "Analyze this image and extract all relevant information including text, charts, tables, and other content. Present the results in a structured Markdown format.",
    };
    template.to_string()
}

/// Chat transcript: system prompt, prior turns, then the new user message.
pub fn chat_messages(history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(ChatRole::Assistant, CHAT_SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::new(ChatRole::User, message));
    messages
}

pub fn edit_messages(prompt: String) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(ChatRole::Assistant, EDITOR_SYSTEM_PROMPT),
        ChatMessage::new(ChatRole::User, prompt),
    ]
}

pub fn meeting_minutes_messages(transcript: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(ChatRole::Assistant, MEETING_MINUTES_SYSTEM_PROMPT),
        ChatMessage::new(
            ChatRole::User,
            format!("Generate meeting minutes from this transcription:\n\n{transcript}"),
        ),
    ]
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        chat_messages, edit_prompt, vision_prompt, EditAction, CHAT_SYSTEM_PROMPT,
    };
    use crate::ai::{ChatMessage, ChatRole};

    #[test]
    fn unknown_edit_action_falls_back_to_polish() {
        assert_eq!(EditAction::parse("rewrite-as-haiku"), EditAction::Polish);
        assert_eq!(EditAction::parse("fix-grammar"), EditAction::FixGrammar);
        let prompt = edit_prompt(EditAction::parse("nope"), "hello", None, None);
        assert!(prompt.starts_with("Improve the writing quality"));
        assert!(prompt.ends_with("\n\nhello"));
    }

    #[test]
    fn summarize_has_its_own_template() {
        assert_eq!(EditAction::parse("summarize"), EditAction::Summarize);
        let prompt = edit_prompt(EditAction::Summarize, "long text", None, None);
        assert!(prompt.starts_with("Summarize this content"));
        assert!(prompt.ends_with("\n\nlong text"));
    }

    #[test]
    fn translate_defaults_to_english() {
        assert_eq!(
            edit_prompt(EditAction::Translate, "hola", None, None),
            "Translate this content to English:\n\nhola"
        );
        assert_eq!(
            edit_prompt(EditAction::Translate, "hello", Some("French"), None),
            "Translate this content to French:\n\nhello"
        );
    }

    #[test]
    fn custom_uses_caller_instruction_or_polish() {
        assert_eq!(
            edit_prompt(EditAction::Custom, "text", None, Some("Make it rhyme")),
            "Make it rhyme\n\ntext"
        );
        let fallback = edit_prompt(EditAction::Custom, "text", None, Some("  "));
        assert!(fallback.starts_with("Improve the writing quality"));
    }

    #[test]
    fn vision_prompt_prefers_custom_text() {
        assert!(vision_prompt("", None).starts_with("Extract all text"));
        assert!(vision_prompt("formula", None).contains("LaTeX"));
        assert!(vision_prompt("mystery", None).starts_with("Analyze this image"));
        assert_eq!(vision_prompt("ocr", Some("Count the cats")), "Count the cats");
    }

    #[test]
    fn chat_messages_wrap_history() {
        let history = vec![
            ChatMessage::new(ChatRole::User, "hi"),
            ChatMessage::new(ChatRole::Assistant, "hello"),
        ];
        let messages = chat_messages(&history, "next");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, CHAT_SYSTEM_PROMPT);
        assert_eq!(messages[3], ChatMessage::new(ChatRole::User, "next"));
    }
}
