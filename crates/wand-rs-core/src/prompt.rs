//! System prompt sent to the model for each record.

use wand_rs_protocol::Record;

/// Renders the per-record correction prompt for one run.
#[derive(Debug, Clone)]
pub struct CorrectionPrompt<'a> {
    instruction: &'a str,
    marker: &'a str,
}

impl<'a> CorrectionPrompt<'a> {
    /// `instruction` is trimmed once and applied to every record in the run.
    pub fn new(instruction: &'a str, marker: &'a str) -> Self {
        Self {
            instruction: instruction.trim(),
            marker,
        }
    }

    pub fn instruction(&self) -> &str {
        self.instruction
    }

    pub fn render(&self, record: &Record) -> String {
        let role = record.role;
        format!(
            "Here is the human request for this specific conversation: {instruction}. \
             Role - {role}. \
             Regarding logistics, numbers, addresses, and clerical errors, please provide any \
             necessary updates to the following: Role - {role}, Content - {content}. \
             Make the smallest changes possible. \
             Respond only with the amended text, with no explanation before or after. \
             If the rest of the request is not relevant to the human request, respond only \
             with \"{marker}\".",
            instruction = self.instruction,
            content = record.content,
            marker = self.marker,
        )
    }
}
