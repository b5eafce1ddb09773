use crate::lexicon::LexicalHint;

/// Persona/system-instruction selection for a turn.
///
/// The instruction text travels to the backend as a separate request field;
/// it is never concatenated into the prompt payload, so user-controlled text
/// cannot override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    #[default]
    General,
    SlangAware,
    LocalLens,
}

impl Persona {
    pub fn instruction(&self) -> &'static str {
        match self {
            Persona::General => {
                "You are Zenith, a sophisticated AI assistant integrated into the user's browser. \
                 You provide concise, accurate, and context-aware assistance."
            }
            Persona::SlangAware => {
                "You are Zenith, the ultimate Kenyan Thought Partner. \
                 Your personality is \"Nairobi Gen Z Excellence\": brilliant, tech-savvy, and deeply rooted in local culture. \
                 Use a mix of English and Sheng (Kenyan urban slang) naturally. \
                 Don't just translate; localize the perspective. \
                 If the user is reading about global tech, explain how it affects \"Kanairo\" or the local \"mbogi\". \
                 Keep it snappy, helpful, and \"fiti\"."
            }
            Persona::LocalLens => {
                "Analyze the provided context specifically for its impact or relevance to Kenya \
                 and the wider East African region. Consider economic factors (KES/USD), local tech \
                 ecosystem, and social dynamics."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::General => "general",
            Persona::SlangAware => "slang",
            Persona::LocalLens => "local",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "general" => Some(Persona::General),
            "slang" | "sheng" => Some(Persona::SlangAware),
            "local" => Some(Persona::LocalLens),
            _ => None,
        }
    }
}

/// Build the single outbound text payload for one turn.
///
/// Page context, when present, leads the payload in its own delimited block
/// followed by the user prompt block. Lexical hints, when any matched, are
/// appended at the end. Without context the payload is the prompt alone.
pub fn compose(prompt_text: &str, context: Option<&str>, hints: &[LexicalHint]) -> String {
    let mut payload = match context {
        Some(context) => {
            format!("CONTEXT FROM PAGE:\n{context}\n\nUSER PROMPT:\n{prompt_text}")
        }
        None => prompt_text.to_string(),
    };

    if !hints.is_empty() {
        payload.push_str("\n\nLEXICAL HINTS:\n");
        for hint in hints {
            payload.push_str(&format!("{}: {}\n", hint.term, hint.definition));
        }
    }

    payload
}
