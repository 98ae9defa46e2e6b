// Cover letter generation: validates the résumé/JD pair, asks the completion
// service for a three-paragraph letter, and reshapes whatever comes back.

pub mod handlers;
pub mod paragraphs;
pub mod prompts;
