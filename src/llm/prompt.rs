use crate::error::{RagError, Result};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

pub const DEFAULT_TEMPLATE: &str = "Use the following context to answer the question. \
Answer only from the context. If the answer is not in the context, say that you don't know.

Context: {context}

Question: {question}

Answer:";

/// Prompt text with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::InvalidTemplate(format!("missing {}", placeholder)));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills both slots in one pass, so placeholder-like text inside the
    /// context or question is left alone.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut rendered = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            rendered.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                rendered.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
                rendered.push_str(question);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_both_slots() {
        let template = PromptTemplate::default();
        assert!(PromptTemplate::new(template.as_str()).is_ok());
        let rendered = template.render("CTX", "Q?");
        assert!(rendered.contains("Context: CTX"));
        assert!(rendered.contains("Question: Q?"));
        assert!(rendered.contains("don't know"));
    }

    #[test]
    fn missing_slot_rejected() {
        let err = PromptTemplate::new("Only {question}").unwrap_err();
        assert!(matches!(err, RagError::InvalidTemplate(msg) if msg.contains("{context}")));
    }

    #[test]
    fn substituted_text_is_not_reexpanded() {
        let template = PromptTemplate::new("[{context}] [{question}] {other}").unwrap();
        assert_eq!(
            template.render("{question}", "what about {context}?"),
            "[{question}] [what about {context}?] {other}"
        );
    }
}
