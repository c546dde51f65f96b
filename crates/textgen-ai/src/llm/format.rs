//! Model-family chat templates.
//!
//! A chat request is rendered into a single prompt string using the template
//! of the model family, detected from the model identifier. Every template
//! ends with the assistant preamble so generation continues as the assistant.

use textgen_core::{ChatMessage, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFormat {
    /// Qwen2.5 / Hermes — `<|im_start|>role\n...\n<|im_end|>`
    ChatML,
    /// Gemma 2/3 — `<start_of_turn>user\n...<end_of_turn>`
    Gemma,
    /// gpt-oss Harmony — `<|start|>role<|message|>...<|end|>`
    Harmony,
    /// Mistral v0.3 / Ministral — `[INST]...[/INST]`
    Mistral,
    /// Llama 3.x — `<|start_header_id|>role<|end_header_id|>`
    Llama3,
}

impl PromptFormat {
    /// Detect the template from a model identifier or file name.
    ///
    /// Examples:
    ///  - `"google/gemma-3-4b-it"` → `Gemma`
    ///  - `"openai/gpt-oss-120b"` → `Harmony`
    ///  - `"Meta-Llama-3.1-8B-Instruct-Q4_K_M.gguf"` → `Llama3`
    ///  - `"Qwen2.5-3B-Instruct-Q4_K_M.gguf"` → `ChatML` (default)
    pub fn detect(model: &str) -> Self {
        let lower = model.to_lowercase();
        if lower.contains("gemma") {
            Self::Gemma
        } else if lower.contains("gpt-oss") {
            Self::Harmony
        } else if lower.contains("mistral") || lower.contains("ministral") {
            Self::Mistral
        } else if lower.contains("llama") {
            Self::Llama3
        } else {
            Self::ChatML
        }
    }
}

pub trait PromptFormatter: Send + Sync {
    /// Render a conversation, ending with the assistant preamble.
    fn format_conversation(&self, messages: &[ChatMessage]) -> String;
}

pub fn create_formatter(format: PromptFormat) -> Box<dyn PromptFormatter> {
    match format {
        PromptFormat::ChatML => Box::new(ChatMLFormatter),
        PromptFormat::Gemma => Box::new(GemmaFormatter),
        PromptFormat::Harmony => Box::new(HarmonyFormatter),
        PromptFormat::Mistral => Box::new(MistralFormatter),
        PromptFormat::Llama3 => Box::new(Llama3Formatter),
    }
}

/// Split a leading system message off the rest of the conversation.
fn split_system(messages: &[ChatMessage]) -> (Option<&str>, &[ChatMessage]) {
    match messages.split_first() {
        Some((first, rest)) if first.role == Role::System => (Some(first.content.as_str()), rest),
        _ => (None, messages),
    }
}

// ---------------------------------------------------------------------------
// ChatML (Qwen2.5 / Hermes)
// ---------------------------------------------------------------------------

pub struct ChatMLFormatter;

impl PromptFormatter for ChatMLFormatter {
    fn format_conversation(&self, messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        for msg in messages {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("<|im_start|>{role}\n{}\n<|im_end|>\n", msg.content));
        }
        prompt.push_str("<|im_start|>assistant\n");
        prompt
    }
}

// ---------------------------------------------------------------------------
// Gemma
// ---------------------------------------------------------------------------

pub struct GemmaFormatter;

impl PromptFormatter for GemmaFormatter {
    fn format_conversation(&self, messages: &[ChatMessage]) -> String {
        // Gemma has no system role: the system text is folded into the first user turn.
        let (system, turns) = split_system(messages);
        let mut prompt = String::from("<bos>");
        let mut pending_system = system;

        for msg in turns {
            match msg.role {
                Role::Assistant => {
                    prompt.push_str(&format!(
                        "<start_of_turn>model\n{}<end_of_turn>\n",
                        msg.content
                    ));
                }
                Role::User | Role::System => {
                    let content = match pending_system.take() {
                        Some(sys) => format!("{sys}\n\n{}", msg.content),
                        None => msg.content.clone(),
                    };
                    prompt.push_str(&format!("<start_of_turn>user\n{content}<end_of_turn>\n"));
                }
            }
        }

        if let Some(sys) = pending_system {
            prompt.push_str(&format!("<start_of_turn>user\n{sys}<end_of_turn>\n"));
        }
        prompt.push_str("<start_of_turn>model\n");
        prompt
    }
}

// ---------------------------------------------------------------------------
// Harmony (gpt-oss)
// ---------------------------------------------------------------------------

pub struct HarmonyFormatter;

impl PromptFormatter for HarmonyFormatter {
    fn format_conversation(&self, messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        for msg in messages {
            match msg.role {
                // Harmony reserves `system` for runtime metadata; caller instructions go to `developer`.
                Role::System => prompt.push_str(&format!(
                    "<|start|>developer<|message|># Instructions\n\n{}<|end|>",
                    msg.content
                )),
                Role::User => {
                    prompt.push_str(&format!("<|start|>user<|message|>{}<|end|>", msg.content))
                }
                Role::Assistant => prompt.push_str(&format!(
                    "<|start|>assistant<|channel|>final<|message|>{}<|end|>",
                    msg.content
                )),
            }
        }
        prompt.push_str("<|start|>assistant");
        prompt
    }
}

// ---------------------------------------------------------------------------
// Mistral v0.3 / Ministral
// ---------------------------------------------------------------------------

pub struct MistralFormatter;

impl PromptFormatter for MistralFormatter {
    fn format_conversation(&self, messages: &[ChatMessage]) -> String {
        let (system, turns) = split_system(messages);
        let mut prompt = String::from("<s>");
        let mut pending_system = system;

        for msg in turns {
            match msg.role {
                Role::User | Role::System => match pending_system.take() {
                    // System message is prepended to first user message
                    Some(sys) => {
                        prompt.push_str(&format!("[INST] {sys}\n\n{} [/INST]", msg.content))
                    }
                    None => prompt.push_str(&format!("[INST] {} [/INST]", msg.content)),
                },
                Role::Assistant => {
                    prompt.push_str(&format!(" {}</s>", msg.content));
                }
            }
        }

        if let Some(sys) = pending_system {
            prompt.push_str(&format!("[INST] {sys} [/INST]"));
        }
        prompt
    }
}

// ---------------------------------------------------------------------------
// Llama 3.x
// ---------------------------------------------------------------------------

pub struct Llama3Formatter;

impl PromptFormatter for Llama3Formatter {
    fn format_conversation(&self, messages: &[ChatMessage]) -> String {
        let mut prompt = String::from("<|begin_of_text|>");
        for msg in messages {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!(
                "<|start_header_id|>{role}<|end_header_id|>\n\n\
                 {}<|eot_id|>",
                msg.content
            ));
        }
        prompt.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantum() -> Vec<ChatMessage> {
        vec![ChatMessage::user(
            "Explain quantum mechanics clearly and concisely.",
        )]
    }

    #[test]
    fn detect_from_model_id() {
        assert_eq!(PromptFormat::detect("google/gemma-3-4b-it"), PromptFormat::Gemma);
        assert_eq!(PromptFormat::detect("openai/gpt-oss-120b"), PromptFormat::Harmony);
        assert_eq!(PromptFormat::detect("openai/gpt-oss-20b"), PromptFormat::Harmony);
        assert_eq!(
            PromptFormat::detect("Ministral-8B-Instruct-2410-Q4_K_M.gguf"),
            PromptFormat::Mistral
        );
        assert_eq!(
            PromptFormat::detect("meta-llama/Llama-3.2-1B-Instruct"),
            PromptFormat::Llama3
        );
        assert_eq!(
            PromptFormat::detect("Qwen/Qwen2.5-3B-Instruct"),
            PromptFormat::ChatML
        );
    }

    #[test]
    fn chatml_single_turn() {
        let prompt = ChatMLFormatter.format_conversation(&quantum());
        assert_eq!(
            prompt,
            "<|im_start|>user\nExplain quantum mechanics clearly and concisely.\n<|im_end|>\n\
             <|im_start|>assistant\n"
        );
    }

    #[test]
    fn gemma_folds_system_into_first_user_turn() {
        let messages = vec![
            ChatMessage::new(Role::System, "Be brief."),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("bye"),
        ];
        let prompt = GemmaFormatter.format_conversation(&messages);
        assert_eq!(
            prompt,
            "<bos><start_of_turn>user\nBe brief.\n\nhi<end_of_turn>\n\
             <start_of_turn>model\nhello<end_of_turn>\n\
             <start_of_turn>user\nbye<end_of_turn>\n\
             <start_of_turn>model\n"
        );
    }

    #[test]
    fn harmony_single_turn() {
        let prompt = HarmonyFormatter.format_conversation(&quantum());
        assert_eq!(
            prompt,
            "<|start|>user<|message|>Explain quantum mechanics clearly and concisely.<|end|>\
             <|start|>assistant"
        );
    }

    #[test]
    fn harmony_system_becomes_developer() {
        let messages = vec![ChatMessage::new(Role::System, "Answer in French."), ChatMessage::user("hi")];
        let prompt = HarmonyFormatter.format_conversation(&messages);
        assert!(prompt.starts_with("<|start|>developer<|message|># Instructions\n\nAnswer in French.<|end|>"));
        assert!(prompt.ends_with("<|start|>user<|message|>hi<|end|><|start|>assistant"));
    }

    #[test]
    fn mistral_multi_turn() {
        let messages = vec![
            ChatMessage::new(Role::System, "sys"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("bye"),
        ];
        let prompt = MistralFormatter.format_conversation(&messages);
        assert!(prompt.starts_with("<s>[INST] sys\n\nhi [/INST]"));
        assert!(prompt.contains(" hello</s>"));
        assert!(prompt.ends_with("[INST] bye [/INST]"));
    }

    #[test]
    fn llama3_single_turn() {
        let prompt = Llama3Formatter.format_conversation(&quantum());
        assert!(prompt.starts_with("<|begin_of_text|><|start_header_id|>user<|end_header_id|>"));
        assert!(prompt.contains("Explain quantum mechanics"));
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn create_formatter_matches_format() {
        let f = create_formatter(PromptFormat::Harmony);
        assert!(f.format_conversation(&quantum()).ends_with("<|start|>assistant"));
    }
}
