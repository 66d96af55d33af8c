// Recommendation pipeline: preferences or profile in, structured recommendations out.
// Every generator call goes through the `generator` module — nothing here spawns processes.

pub mod extractor;
pub mod handlers;
pub mod pipeline;
pub mod preferences;
pub mod prompts;
pub mod reference;
pub mod schema;
