//! Rule-based fact extraction from user utterances.
//!
//! `FactExtractor` scores a single utterance against a declarative, ordered
//! table of weighted regex rules and decides whether it yields a durable
//! memory. It is a pure function: no I/O, no side effects, deterministic
//! for a given utterance.

use std::sync::OnceLock;

use regex::Regex;

use valet_types::memory::{ExtractedFact, MemoryCategory};

/// Minimum rule score for an utterance to produce a memory.
const IMPORTANCE_THRESHOLD: u8 = 4;

/// Importance ceiling on emitted memories.
const IMPORTANCE_CAP: u8 = 10;

/// One entry in the extraction rule table.
struct Rule {
    pattern: Regex,
    category: MemoryCategory,
    score: u8,
    label: &'static str,
}

impl Rule {
    fn new(pattern: &str, category: MemoryCategory, score: u8, label: &'static str) -> Self {
        Self {
            // Patterns are compile-time constants; a failure here is a
            // programming error caught by the rule-table test.
            pattern: Regex::new(pattern).expect("invalid extraction rule pattern"),
            category,
            score,
            label,
        }
    }
}

/// The ordered rule table. Declaration order breaks score ties: the first
/// matching rule with the maximum score picks the category.
fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use MemoryCategory::*;
        vec![
            // Personal info
            Rule::new(r"(?i)(?:my name is|i'm|call me|i am)\s+([a-z]+)", PersonalInfo, 8, "name"),
            Rule::new(r"(?i)(?:i live in|i'm from|based in|from)\s+([a-z\s]+)", PersonalInfo, 6, "location"),
            Rule::new(r"(?i)(?:i'm|i am)\s+(\d+)\s*(?:years old)?", PersonalInfo, 5, "age"),
            // Professional info
            Rule::new(r"(?i)(?:i work at|work for|employed by)\s+([a-z\s]+)", ProfessionalInfo, 7, "company"),
            Rule::new(r"(?i)(?:i'm a|i am a|work as|my job)\s+([a-z\s]+)", ProfessionalInfo, 6, "role"),
            Rule::new(
                r"(?i)(?:i use|work with|experienced with)\s+(react|vue|python|javascript|typescript|java|php|node|rust)",
                ProfessionalInfo,
                5,
                "tech",
            ),
            // Contact info
            Rule::new(r"(?i)(?:my email|email me|contact)\s*(?:is|at)?\s*([\w@.-]+)", ContactInfo, 7, "email"),
            Rule::new(r"(?i)(?:my phone|call me)\s*(?:is|at)?\s*([\d\s+-]+)", ContactInfo, 6, "phone"),
            // Projects
            Rule::new(r"(?i)(?:working on|building|my project|developing)\s+([a-z\s]+)", ProjectInfo, 6, "project"),
            Rule::new(r"(?i)(?:creating|making|designing)\s+([a-z\s]+)", ProjectInfo, 5, "creation"),
            // Goals and learning
            Rule::new(r"(?i)(?:my goal|want to|planning to|trying to)\s+([a-z\s]+)", Goals, 5, "goal"),
            Rule::new(r"(?i)(?:learning|studying|getting into)\s+([a-z\s]+)", Goals, 4, "learning"),
            // Preferences
            Rule::new(r"(?i)(?:i like|love|enjoy)\s+([a-z\s]+)", Preferences, 4, "likes"),
            Rule::new(r"(?i)(?:i prefer|better than|rather)\s+([a-z\s]+)", Preferences, 4, "preferences"),
            Rule::new(r"(?i)(?:i hate|dislike|can't stand)\s+([a-z\s]+)", Preferences, 4, "dislikes"),
            // Explicit memory cues outrank everything else
            Rule::new(r"(?i)(?:remember that|don't forget|important:|note that)", ExplicitMemory, 9, "explicit"),
            Rule::new(r"(?i)(?:for future|fyi|just so you know)", ExplicitMemory, 7, "fyi"),
        ]
    })
}

/// Outcome of scoring an utterance against the whole rule table.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub max_score: u8,
    pub primary_category: MemoryCategory,
    pub matched_labels: Vec<&'static str>,
}

/// Stateless utility for extracting durable facts from user utterances.
pub struct FactExtractor;

impl FactExtractor {
    /// Score `utterance` against every rule.
    ///
    /// The highest-scoring matching rule supplies the primary category;
    /// ties go to the rule declared first. An utterance matching nothing
    /// scores 0 with a `PersonalInfo` placeholder category.
    pub fn analyze(utterance: &str) -> Analysis {
        let mut max_score = 0u8;
        let mut primary_category = MemoryCategory::PersonalInfo;
        let mut matched_labels = Vec::new();

        for rule in rules() {
            if rule.pattern.is_match(utterance) {
                if rule.score > max_score {
                    max_score = rule.score;
                    primary_category = rule.category;
                }
                matched_labels.push(rule.label);
            }
        }

        Analysis {
            max_score,
            primary_category,
            matched_labels,
        }
    }

    /// Decide whether `utterance` yields a durable memory.
    ///
    /// Emits a fact only when the maximum rule score clears the threshold;
    /// importance is the matched score, capped at 10.
    pub fn extract(utterance: &str) -> Option<ExtractedFact> {
        let analysis = Self::analyze(utterance);
        if analysis.max_score < IMPORTANCE_THRESHOLD {
            return None;
        }

        Some(ExtractedFact {
            category: analysis.primary_category,
            content: utterance.to_string(),
            importance: analysis.max_score.min(IMPORTANCE_CAP),
        })
    }
}
