//! Prompt construction for the completion oracle.

use crate::exemplar::Exemplar;

/// A completion request: prompt text, response length budget, stop marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub max_tokens: usize,
    pub stop: String,
}

/// Combine the worked example with a fragment into a single prompt.
///
/// The response budget is half the fragment's character count, as a
/// token-budget heuristic; the stop marker is unique to the transform kind.
pub fn make_prompt(fragment: &str, exemplar: &Exemplar) -> Prompt {
    let noun = exemplar.kind.noun();
    let text = format!(
        "### Python {noun} {before_description}\n\
         {before_text}\n\
         \n\
         ### The same Python {noun} {after_description}\n\
         {after_text}\n\
         \n\
         ### Python {noun} {before_description}\n\
         {fragment}\n\
         ### End of {noun}\n\
         \n\
         ### Now rewrite the Python {noun} {after_description}\n",
        before_description = exemplar.before_description,
        after_description = exemplar.after_description,
        before_text = exemplar.before_text,
        after_text = exemplar.after_text,
    );

    Prompt {
        text,
        max_tokens: fragment.len() / 2,
        stop: format!("### End of {noun}"),
    }
}
