/// A slang term detected in a prompt, paired with its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalHint {
    pub term: &'static str,
    pub definition: &'static str,
}

/// Fixed dictionary of slang/jargon terms used to annotate prompts.
///
/// Entries keep their insertion order so hint output is deterministic.
pub struct Lexicon {
    entries: Vec<(&'static str, &'static str)>,
}

/// Sheng (Kenyan urban slang) terms the assistant localizes around.
const SHENG_DICTIONARY: &[(&str, &str)] = &[
    ("mbogi", "squad, group, or community"),
    ("form", "a plan, event, or happening"),
    ("kanairo", "Nairobi city"),
    ("moti", "car or vehicle"),
    ("chapaa", "money"),
    ("raba", "money"),
    ("fiti", "cool, good, or okay"),
    ("wadau", "stakeholders or peers"),
    ("omba", "request or pray"),
    ("luku", "style or look"),
    ("sherehe", "party or celebration"),
    ("ngori", "trouble or serious situation"),
    ("base", "local hangout spot"),
];

impl Lexicon {
    pub fn sheng() -> Self {
        Self {
            entries: SHENG_DICTIONARY.to_vec(),
        }
    }

    #[cfg(test)]
    pub fn from_entries(entries: Vec<(&'static str, &'static str)>) -> Self {
        Self { entries }
    }

    /// Return every dictionary term that occurs in `prompt`
    /// (case-insensitive substring match), in dictionary order.
    ///
    /// An empty result means "no hint block" — it is not an error.
    pub fn annotate(&self, prompt: &str) -> Vec<LexicalHint> {
        let haystack = prompt.to_lowercase();
        self.entries
            .iter()
            .filter(|(term, _)| haystack.contains(&term.to_lowercase()))
            .map(|&(term, definition)| LexicalHint { term, definition })
            .collect()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::sheng()
    }
}
