use serde_json::Value;

/// One attempt at pulling a reply string out of the upstream envelope.
/// Probes run in `PROBE_ORDER`; the first match wins. The ordering is a
/// compatibility contract across upstream API shapes and must not change.
#[derive(Debug, Clone, Copy)]
enum ReplyProbe {
    /// A string value at the top-level `response` field.
    ResponseField,
    /// The body itself is already a string.
    BareString,
    /// OpenAI-style `choices` array; each element's `text` or `content`
    /// joined with newlines and trimmed.
    ChoicesJoin,
    /// A field literally named `text`.
    TextField,
}

const PROBE_ORDER: [ReplyProbe; 4] = [
    ReplyProbe::ResponseField,
    ReplyProbe::BareString,
    ReplyProbe::ChoicesJoin,
    ReplyProbe::TextField,
];

impl ReplyProbe {
    fn probe(self, body: &Value) -> Option<String> {
        match self {
            ReplyProbe::ResponseField => body.get("response")?.as_str().map(str::to_string),
            ReplyProbe::BareString => body.as_str().map(str::to_string),
            ReplyProbe::ChoicesJoin => {
                let choices = body.get("choices")?.as_array()?;
                let joined = choices
                    .iter()
                    .map(|choice| {
                        choice
                            .get("text")
                            .and_then(Value::as_str)
                            .or_else(|| choice.get("content").and_then(Value::as_str))
                            .unwrap_or("")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(joined.trim().to_string())
            }
            ReplyProbe::TextField => body.get("text")?.as_str().map(str::to_string),
        }
    }
}

/// Normalize the heterogeneous upstream envelope into a single reply string.
/// Falls back to serializing the whole body when no probe matches.
pub fn normalize_reply(body: &Value) -> String {
    PROBE_ORDER
        .iter()
        .find_map(|probe| probe.probe(body))
        .unwrap_or_else(|| body.to_string())
}
