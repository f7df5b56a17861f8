//! Prompt construction and output budgeting

use crate::processor::word_count;

/// System instruction sent with every extraction request
pub const SYSTEM_MESSAGE: &str = "You are an intelligent text extraction and conversion assistant. \
Your task is to extract structured information from the given text and convert it into a pure JSON format. \
The JSON should contain only the structured data extracted from the text, with no additional commentary, \
explanations, or extraneous information.";

/// Build the user instruction: the field list, the exact output shape, then the chunk verbatim
pub fn build_user_prompt(fields: &[String], chunk: &str) -> String {
    let field_list = fields.join(", ");
    let example = fields
        .iter()
        .map(|field| format!("{}: \"value\"", serde_json::Value::String(field.clone())))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Extract the following fields from the content: {field_list}\n\
         Format the output EXACTLY as:\n\
         {{\n    \"listings\": [\n        {{{example}}}\n    ]\n}}\n\n\
         Content: {chunk}"
    )
}

/// Approximate prompt size: words in the system plus the user instruction
pub fn prompt_tokens(system: &str, user: &str) -> usize {
    word_count(system) + word_count(user)
}

/// Tokens to request: `min(max_output, context_window - prompt_tokens)`, never negative
pub fn output_budget(max_output_tokens: u32, context_window: u32, prompt_tokens: usize) -> u32 {
    let remaining = (context_window as usize).saturating_sub(prompt_tokens);
    max_output_tokens.min(u32::try_from(remaining).unwrap_or(u32::MAX))
}
