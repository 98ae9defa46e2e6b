// Prompt constants for cover letter generation.

use crate::llm_client::fill_template;

/// Instructions sent with every cover letter request.
pub const COVER_LETTER_SYSTEM: &str = "You write professional cover letters using only the \
    supplied resume and job description. Do not invent facts. Body text only. \
    No headers or contact blocks.";

/// Cover letter prompt template. Replace `{resume}` and `{jd}` before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Goal: Draft a professional cover letter in three concise paragraphs (~220 words).
Constraints:
- Use only information present or directly implied by the resume and job description.
- Do not add contact blocks, dates, or headings. Provide only the body text.

Resume:
{resume}

Job description:
{jd}

Output: Only the cover letter body text, three paragraphs."#;

pub fn build_cover_letter_prompt(resume: &str, jd: &str) -> String {
    fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[("{resume}", resume), ("{jd}", jd)],
    )
}
