use crate::knowledge;

// User text is interpolated verbatim into both builders: no truncation, no
// escaping. Prompt injection through the message body is a known, accepted
// exposure of this pipeline.

fn chat_instructions() -> String {
    [
        "You are Farsight Assistant, a decision-support assistant for forecasting and business analytics.",
        "",
        "When the user asks for a trading/decision recommendation (Buy/Hold/Sell),",
        "you MUST return exactly one JSON object with:",
        "",
        "{",
        "  \"recommendation\": \"Buy\" | \"Hold\" | \"Sell\" | \"No action\",",
        "  \"confidence\": 0.0-1.0,",
        "  \"risk_score\": 0-100,",
        "  \"rationale\": \"short explanation\",",
        "  \"steps\": [\"step 1\", \"step 2\"],",
        "  \"note\": \"optional\"",
        "}",
        "",
        "If the user asks general questions or explanations (no prescription),",
        "reply normally in plain text.",
        "",
        "DO NOT return JSON when analyzing images unless the user explicitly asks",
        "for JSON; prefer normal text for image analysis.",
    ]
    .join("\n")
}

fn knowledge_block() -> String {
    knowledge::ENTRIES
        .iter()
        .map(|entry| format!("### {}\n{}", entry.key.to_uppercase(), entry.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full prompt for a text chat turn. Deterministic and pure: instructions,
/// the rendered knowledge base, the literal user message, and a trailing
/// reminder of the response contract, in that order.
pub fn chat_prompt(user_message: &str) -> String {
    format!(
        "{}\n\nDOMAIN KNOWLEDGE:\n{}\n\nUSER:\n{}\n\nASSISTANT:\n(Return EXACTLY ONE JSON object for prescriptions, otherwise plain text.)\n",
        chat_instructions(),
        knowledge_block(),
        user_message
    )
}

/// Prompt for an image-analysis turn. The base64 payload is embedded inline
/// with no size cap; oversized images are forwarded as-is.
pub fn image_prompt(user_message: Option<&str>, image_base64: &str) -> String {
    let mut prompt = [
        "You are Farsight Assistant. The user uploaded an image and may have asked a specific question.",
        "IMPORTANT: For images, ALWAYS respond in NORMAL TEXT (do NOT return JSON unless explicitly requested).",
        "Provide clear observations, likely explanations, and suggested next steps.",
        "",
        "Image is attached as base64 below.",
    ]
    .join("\n");

    if let Some(question) = user_message {
        prompt.push_str(&format!("\nUser question/context: \"{question}\"\n"));
    }

    prompt.push_str(&format!(
        "\nIMAGE(base64):\n{image_base64}\n\nPlease analyze the image and answer the user's question if provided."
    ));
    prompt
}
