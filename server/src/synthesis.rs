//! Final-answer prompt assembly.
//!
//! Retrieval hands back an ordered list of fact texts; this module folds them
//! into the synthesis prompt sent to the generative model. Whether any facts
//! were found or not, the reply is always phrased by the model: "no
//! information found" is a normal answer, not an error.

/// Placeholder inserted when retrieval produced no context.
const NO_CONTEXT: &str = "No relevant context was found.";

/// Build the synthesis prompt for a user question and its retrieved context.
pub fn build_prompt(context: &[String], question: &str) -> String {
    let facts = if context.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        context.join("\n\n")
    };

    format!(
        "# PERSONA\n\
         You are the campus assistant. Your communication is clear, helpful \
         and confident. You never mention your database or that you are an \
         AI.\n\n\
         # RULES\n\
         1. SYNTHESIS: your main task is answering the user's question. If \
         the CONTEXT below contains several relevant facts, combine them \
         into one complete, well-organized answer instead of listing them \
         separately.\n\
         2. PRECISION: base your answer strictly on the CONTEXT. Do not add \
         information that is not there.\n\
         3. MISSING INFORMATION: if the CONTEXT contains nothing relevant to \
         the question, say politely that you do not have that specific \
         information.\n\
         4. SMALL TALK: if the message is casual conversation, reply \
         naturally and warmly.\n\n\
         # CONTEXT\n\
         ---\n\
         {facts}\n\
         ---\n\n\
         Following all rules above, and prioritizing SYNTHESIS, answer the \
         user's question.\n\
         Question: \"{question}\""
    )
}
