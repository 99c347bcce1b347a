// Draft-state extraction from free-form user utterances.
//
// Matching is best-effort pattern matching over the lowercased utterance.
// Rules live in an ordered table; each rule turns a match into a
// `StateUpdate`, and `Extraction` folds the updates with explicit precedence
// (a round/position pick beats a bare pick number).

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::serpentine::{pick_from_round_position, LEAGUE_SIZE};

// ---------------------------------------------------------------------------
// Update types
// ---------------------------------------------------------------------------

/// Which phrasing produced a drafted-players list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    /// "I drafted A, B": the user just made a pick.
    DraftedPhrase,
    /// "my current roster is: A, B": a restatement, no pick was made.
    RosterRestatement,
}

/// A single state update recognized in an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    Drafted {
        players: Vec<String>,
        source: RosterSource,
    },
    ExplicitPick(u32),
    RoundPositionPick { round: u32, position: u32, pick: u32 },
}

/// Everything recognized in one utterance, in rule-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub updates: Vec<StateUpdate>,
}

impl Extraction {
    /// Drafted players from every matching phrasing, concatenated in rule
    /// order. Not deduplicated.
    pub fn drafted(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter_map(|u| match u {
                StateUpdate::Drafted { players, .. } => Some(players.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Whether the "I drafted ..." phrasing matched. Drives the post-reply
    /// pick advance.
    pub fn drafted_phrase_matched(&self) -> bool {
        self.updates.iter().any(|u| {
            matches!(
                u,
                StateUpdate::Drafted {
                    source: RosterSource::DraftedPhrase,
                    ..
                }
            )
        })
    }

    pub fn explicit_pick(&self) -> Option<u32> {
        self.updates.iter().find_map(|u| match u {
            StateUpdate::ExplicitPick(pick) => Some(*pick),
            _ => None,
        })
    }

    pub fn round_position_pick(&self) -> Option<u32> {
        self.updates.iter().find_map(|u| match u {
            StateUpdate::RoundPositionPick { pick, .. } => Some(*pick),
            _ => None,
        })
    }

    /// The pick number this utterance establishes, if any. Round/position
    /// overrides a bare pick number.
    pub fn resolved_pick(&self) -> Option<u32> {
        self.round_position_pick().or_else(|| self.explicit_pick())
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

type Handler = fn(&str, &Captures<'_>) -> Option<StateUpdate>;

struct Rule {
    name: &'static str,
    pattern: Regex,
    handler: Handler,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, handler: Handler) -> Self {
        Rule {
            name,
            pattern: Regex::new(pattern).expect("extraction patterns are valid"),
            handler,
        }
    }
}

/// Ordered extraction rules. Patterns run against the lowercased utterance.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("drafted", r#"i drafted ([a-z .,'"-]+)"#, |text, caps| {
            drafted_update(text, caps, RosterSource::DraftedPhrase)
        }),
        Rule::new(
            "roster",
            r#"my current roster is: ([a-z .,'"-]+)"#,
            |text, caps| drafted_update(text, caps, RosterSource::RosterRestatement),
        ),
        Rule::new(
            "explicit_pick",
            r"\b(?:pick|selection|at pick|at)\s*(\d+)",
            |_, caps| {
                let pick = parse_positive(caps.get(1)?.as_str())?;
                Some(StateUpdate::ExplicitPick(pick))
            },
        ),
        Rule::new(
            "round_position",
            r"i['’]?m drafting at position (\d+) in round (\d+)",
            |_, caps| {
                let position = parse_positive(caps.get(1)?.as_str())?;
                let round = parse_positive(caps.get(2)?.as_str())?;
                if position > LEAGUE_SIZE {
                    return None;
                }
                let pick = pick_from_round_position(round, position)?;
                Some(StateUpdate::RoundPositionPick {
                    round,
                    position,
                    pick,
                })
            },
        ),
    ]
});

/// A pick keyword left dangling at the end of a name list when the list is
/// followed directly by a number ("I drafted X, at pick 5").
static TRAILING_PICK_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:at pick|pick|selection|at)\s*$").expect("trailing pick pattern is valid")
});

static NEXT_PICK_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"next pick|who should i pick next").expect("next-pick pattern is valid")
});

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract draft-state updates from a user utterance. Pure; never fails.
pub fn extract(utterance: &str) -> Extraction {
    let text = utterance.to_lowercase();
    let mut updates = Vec::new();

    for rule in RULES.iter() {
        let Some(caps) = rule.pattern.captures(&text) else {
            continue;
        };
        if let Some(update) = (rule.handler)(&text, &caps) {
            tracing::debug!(rule = rule.name, ?update, "extraction rule matched");
            updates.push(update);
        }
    }

    Extraction { updates }
}

/// Whether the utterance asks for the user's next pick.
pub fn is_next_pick_query(utterance: &str) -> bool {
    NEXT_PICK_INTENT.is_match(&utterance.to_lowercase())
}

/// Title-case a name: uppercase every letter that follows a non-letter,
/// lowercase the rest. "o'neal" becomes "O'Neal".
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn drafted_update(text: &str, caps: &Captures<'_>, source: RosterSource) -> Option<StateUpdate> {
    let list = caps.get(1)?;
    let mut raw = list.as_str();

    let followed_by_digit = text[list.end()..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());
    if followed_by_digit {
        if let Some(clause) = TRAILING_PICK_CLAUSE.find(raw) {
            raw = &raw[..clause.start()];
        }
    }

    let players = split_names(raw);
    Some(StateUpdate::Drafted { players, source })
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(title_case)
        .collect()
}

fn parse_positive(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}
