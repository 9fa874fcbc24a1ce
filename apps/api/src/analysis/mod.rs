// Interview analysis: prompt construction and the session pipeline that
// turns two uploaded documents and a goal into an editable markdown report.
// All completion calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod session;
