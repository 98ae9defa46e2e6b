// Company research: asks the completion service for a markdown report that
// ends in a JSON object, splits the two, and checks the JSON against the
// report schema before anything reaches the client.

pub mod handlers;
pub mod prompts;
pub mod report;
pub mod types;
