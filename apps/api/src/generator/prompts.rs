// Shared prompt fragments.
// Each pipeline mode defines its own templates in recommendation/prompts.rs;
// this file holds the instructions every generator prompt must carry.

/// Closing instruction appended to every prompt. The extractor only locates JSON
/// syntactically, so this line is the one lever over the output shape.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only and nothing else. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Role line for preference-based stream and career guidance.
pub const ADVISOR_ROLE: &str = "You are an expert academic and career advisor \
    who matches students to college streams, institutions and career paths.";

/// Role line for dataset-grounded college guidance.
pub const COUNSELOR_ROLE: &str = "You are an expert college guidance counselor.";
