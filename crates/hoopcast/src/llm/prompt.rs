// Recommendation prompt template.
//
// The prompt is rebuilt from scratch every turn from the reference context,
// the user's utterance and the tracked draft state; conversation history is
// never replayed into it.

use crate::draft::state::DraftState;

/// Answer format the model is asked to follow, ending with the STATS block
/// a downstream visualizer parses.
const ANSWER_FORMAT: &str = "\
Format your answer exactly as follows:
Draft Pick: <The draft pick I should be at>
Your drafted players: <player1>, <player2>, ...
Recommended players: <player1>, <player2>, <player3>

<Player1> (TEAM - POS):
Pros - <pros>
Cons - <cons>

<Player2> (TEAM - POS):
Pros - <pros>
Cons - <cons>

<Player3> (TEAM - POS):
Pros - <pros>
Cons - <cons>

STATS: {\"Player1\": {\"PTS\":...,\"TRB\":...,\"AST\":...,\"3P\":...,\"STL\":...,\"BLK\":...,\"FG%\":...,\"FT%\":...,\"TOV\":...}, ...}
Do not include any other text or advice. Make sure to include the STATS JSON block in the above format so it can be visualized.";

/// Render the recommendation prompt.
///
/// `pick_label` is the pick number or `unknown`; `drafted_label` is the
/// comma-joined roster or `None`.
pub fn build_recommendation_prompt(
    context: &str,
    utterance: &str,
    pick_label: &str,
    drafted_label: &str,
) -> String {
    format!(
        "{context}\n\n\
         User question: {utterance}\n\
         Draft Pick: {pick_label}\n\
         Your drafted players: {drafted_label}\n\
         Please answer for a 10-team, serpentine draft. Recommend the top 3 players for this pick only.\n\
         {ANSWER_FORMAT}"
    )
}

/// Render the recommendation prompt for the given draft state.
pub fn prompt_for_state(context: &str, utterance: &str, state: &DraftState) -> String {
    build_recommendation_prompt(
        context,
        utterance,
        &state.pick_label(),
        &state.drafted_label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lines_follow_context() {
        let prompt = build_recommendation_prompt(
            "Resources:\nrankings\n\nPrompts:\nstrategy",
            "Who should I pick next?",
            "15",
            "Lebron James, Nikola Jokic",
        );
        assert!(prompt.starts_with(
            "Resources:\nrankings\n\nPrompts:\nstrategy\n\n\
             User question: Who should I pick next?\n\
             Draft Pick: 15\n\
             Your drafted players: Lebron James, Nikola Jokic\n\
             Please answer for a 10-team, serpentine draft. Recommend the top 3 players for this pick only.\n\
             Format your answer exactly as follows:\n"
        ));
    }

    #[test]
    fn answer_format_has_three_player_blocks_and_stats() {
        let prompt = build_recommendation_prompt("ctx", "q", "3", "None");
        assert_eq!(prompt.matches("(TEAM - POS):\nPros - <pros>\nCons - <cons>").count(), 3);
        assert!(prompt.contains("Recommended players: <player1>, <player2>, <player3>\n\n"));
        assert!(prompt.contains(
            "\nSTATS: {\"Player1\": {\"PTS\":...,\"TRB\":...,\"AST\":...,\"3P\":...,\"STL\":...,\"BLK\":...,\"FG%\":...,\"FT%\":...,\"TOV\":...}, ...}\n"
        ));
        assert!(prompt.ends_with("so it can be visualized."));
    }

    #[test]
    fn empty_state_renders_placeholders() {
        let state = DraftState::new();
        let prompt = prompt_for_state("ctx", "hello", &state);
        assert!(prompt.contains("\nDraft Pick: unknown\n"));
        assert!(prompt.contains("\nYour drafted players: None\n"));
    }

    #[test]
    fn utterance_is_embedded_verbatim() {
        let utterance = "I drafted   LeBron James, at pick 5 !!";
        let prompt = build_recommendation_prompt("ctx", utterance, "15", "Lebron James");
        assert!(prompt.contains(&format!("User question: {utterance}\n")));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = build_recommendation_prompt("ctx", "q", "7", "A, B");
        let b = build_recommendation_prompt("ctx", "q", "7", "A, B");
        assert_eq!(a, b);
    }
}
