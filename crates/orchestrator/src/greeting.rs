//! Greeting detection and canned replies.
//!
//! Classification is a pure function over a fixed pattern table; reply
//! selection goes through an injectable, seedable pool.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GreetingCategory {
    Salutation,
    Gratitude,
    Farewell,
}

/// What a query asks of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Only a greeting, answered from the pool
    Greeting(GreetingCategory),
    /// Opens with a greeting and carries a question
    GreetingWithQuestion(GreetingCategory),
    Query,
}

const SALUTATION: &str = r"hi|hello|hey|hiya|greetings|good\s+(?:morning|afternoon|evening|day)|how\s+are\s+you(?:\s+doing)?|what(?:'|’)?s\s+up";
/// Salutations minus "how are you" and "what's up", which also open ordinary questions
const SIMPLE_SALUTATION: &str = r"hi|hello|hey|hiya|greetings|good\s+(?:morning|afternoon|evening|day)";
const GRATITUDE: &str = r"thanks|thank\s+you";
const FAREWELL: &str = r"bye|goodbye|see\s+you";

fn category_pattern(alternation: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("greeting pattern is valid")
}

static CATEGORY_PATTERNS: Lazy<[(GreetingCategory, Regex); 3]> = Lazy::new(|| {
    [
        (GreetingCategory::Salutation, category_pattern(SALUTATION)),
        (GreetingCategory::Gratitude, category_pattern(GRATITUDE)),
        (GreetingCategory::Farewell, category_pattern(FAREWELL)),
    ]
});

/// Any greeting phrase plus the punctuation and whitespace trailing it
static GREETING_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{}|{}|{})\b[\s!?.,;:]*",
        SALUTATION, GRATITUDE, FAREWELL
    ))
    .expect("greeting strip pattern is valid")
});

/// Greeting phrases that never start a question on their own
static SIMPLE_GREETING_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{}|{}|{})\b[\s!?.,;:]*",
        SIMPLE_SALUTATION, GRATITUDE, FAREWELL
    ))
    .expect("simple greeting strip pattern is valid")
});

static LEADING_GREETING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^[\s[:punct:]]*(?:{}|{}|{})\b",
        SIMPLE_SALUTATION, GRATITUDE, FAREWELL
    ))
    .expect("leading greeting pattern is valid")
});

static INTERROGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\?|\b(?:what|why|how|when|where|who|whom|whose|which)\b|\b(?:can|could|would|will)\s+you\b|\b(?:tell\s+me|explain|describe|show\s+me|help\s+me|give\s+me|list|find|search)\b",
    )
    .expect("interrogative pattern is valid")
});

/// Category of the earliest greeting phrase in `query`
pub fn greeting_category(query: &str) -> Option<GreetingCategory> {
    CATEGORY_PATTERNS
        .iter()
        .filter_map(|(category, pattern)| pattern.find(query).map(|m| (m.start(), *category)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, category)| category)
}

/// True if the query carries a question or request beyond its greetings.
///
/// "how are you" and "what's up" count as greetings only when nothing but
/// other greetings and punctuation surrounds them; otherwise they stay in
/// the text checked for interrogatives.
pub fn has_question(query: &str) -> bool {
    let without_greetings = GREETING_PHRASE.replace_all(query, " ");
    if !without_greetings.chars().any(char::is_alphanumeric) {
        return false;
    }
    let remainder = SIMPLE_GREETING_PHRASE.replace_all(query, " ");
    INTERROGATIVE.is_match(&remainder)
}

pub fn classify(query: &str) -> Intent {
    let Some(category) = greeting_category(query) else {
        return Intent::Query;
    };

    if !has_question(query) {
        Intent::Greeting(category)
    } else if LEADING_GREETING.is_match(query) {
        Intent::GreetingWithQuestion(category)
    } else {
        Intent::Query
    }
}

const SALUTATION_REPLIES: &[&str] = &[
    "Hello! How can I help you today?",
    "Hi there! What would you like to know?",
    "Hey! Ask me anything and I'll look it up for you.",
    "Greetings! What can I help you find?",
];

const GRATITUDE_REPLIES: &[&str] = &[
    "You're welcome! Let me know if there's anything else.",
    "Happy to help! Anything else you'd like to know?",
    "Glad I could help!",
];

const FAREWELL_REPLIES: &[&str] = &[
    "Goodbye! Come back any time you have a question.",
    "See you later! Happy learning.",
    "Bye! Good luck with your work.",
];

const QUESTION_PREFIXES: &[&str] = &[
    "Hello! ",
    "Hi there! ",
    "Hey! Great question. ",
    "Hello! Happy to help. ",
];

/// Canned replies and answer prefixes with a replaceable random source
pub struct GreetingPool {
    rng: Mutex<StdRng>,
}

impl Default for GreetingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl GreetingPool {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selection for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn replies(category: GreetingCategory) -> &'static [&'static str] {
        match category {
            GreetingCategory::Salutation => SALUTATION_REPLIES,
            GreetingCategory::Gratitude => GRATITUDE_REPLIES,
            GreetingCategory::Farewell => FAREWELL_REPLIES,
        }
    }

    pub fn prefixes() -> &'static [&'static str] {
        QUESTION_PREFIXES
    }

    fn pick(&self, options: &'static [&'static str]) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        options.choose(&mut *rng).copied().unwrap_or_default()
    }

    pub fn reply(&self, category: GreetingCategory) -> &'static str {
        self.pick(Self::replies(category))
    }

    pub fn prefix(&self) -> &'static str {
        self.pick(Self::prefixes())
    }
}
