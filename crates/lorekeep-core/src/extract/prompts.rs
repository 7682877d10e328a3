//! Prompt templates for the extraction and generation calls.
//!
//! Each extractor builds a system/user prompt pair from these templates.
//! The JSON-emitting prompts spell out the exact structure expected so the
//! strict parse boundary downstream has a fighting chance.

/// Delimiter the segmentation prompt asks the model to emit between scenes.
pub const SCENE_BREAK_MARKER: &str = "---SCENE_BREAK---";

/// Appended to the system prompt on the single parse-failure retry.
pub const STRICT_JSON_REMINDER: &str = "\n\nIMPORTANT: Your previous response could not be parsed. \
Respond with ONLY the requested JSON -- no markdown fences, no commentary, no text before or after \
the JSON payload.";

pub const SCENE_BREAK_SYSTEM: &str = "\
You are an expert at identifying scene breaks in TV show transcripts.

Your task is to analyze a transcript and identify natural scene breaks. Scene breaks typically occur when:
- Location changes (indoor to outdoor, different rooms, different buildings)
- Time jumps (later that day, next morning, flashbacks)
- Character group changes (different set of characters in focus)
- Narrative shifts (different storylines, perspective changes)

Look for common indicators:
- Stage directions like \"FADE IN:\", \"CUT TO:\", \"INTERIOR:\", \"EXTERIOR:\"
- Time indicators like \"LATER\", \"MEANWHILE\", \"THE NEXT DAY\"
- Location descriptions
- Character entrance/exit patterns

Return the transcript split into scenes, with each scene as a separate item.
Use \"---SCENE_BREAK---\" as the delimiter between scenes.";

pub fn scene_break_user(transcript: &str) -> String {
    format!(
        "Please identify scene breaks in this transcript and split it into individual scenes:\n\n\
         {transcript}\n\n\
         Return the scenes separated by \"---SCENE_BREAK---\" markers."
    )
}

pub const SCENE_ANALYSIS_SYSTEM: &str = "\
You are an expert TV script analyst. Analyze the given scene and extract key information.

CRITICAL: You must return ONLY a valid JSON object. Do not include any explanatory text before or after the JSON.

For each scene, identify:
1. Location/setting (where does this take place?)
2. Time of day (if mentioned or implied)
3. Characters present (list all characters who speak or are mentioned as present)
4. Key dialogue (most important/memorable lines)
5. Plot events (what happens that advances the story?)
6. Character developments (character growth, revelations, changes)
7. Relationship dynamics (interactions between characters, relationship changes)
8. Emotional tone (happy, sad, tense, romantic, comedic, dramatic, mysterious, action, peaceful, angry, fearful, nostalgic)
9. Mood description (overall atmosphere and feeling)
10. Plot relevance (0.0-1.0, how important is this scene to the main plot?)
11. Foreshadowing (hints about future events)
12. Callbacks (references to previous events)
13. Importance score (0.0-1.0, overall scene importance)
14. Themes (what themes are explored in this scene?)
15. Summary (2-3 sentence summary of what happens)

Return EXACTLY this JSON structure (replace values with your analysis):
{
  \"summary\": \"Brief summary here\",
  \"location\": \"Location or null\",
  \"time_of_day\": \"Time or null\",
  \"characters_present\": [\"Character1\", \"Character2\"],
  \"key_dialogue\": [\"Important quote 1\", \"Important quote 2\"],
  \"plot_events\": [\"Event 1\", \"Event 2\"],
  \"character_developments\": [\"Development 1\", \"Development 2\"],
  \"relationship_dynamics\": [\"Dynamic 1\", \"Dynamic 2\"],
  \"emotional_tone\": [\"tone1\", \"tone2\"],
  \"mood_description\": \"Mood description or null\",
  \"plot_relevance\": 0.7,
  \"foreshadowing\": [\"Foreshadowing 1\", \"Foreshadowing 2\"],
  \"callbacks\": [\"Callback 1\", \"Callback 2\"],
  \"importance_score\": 0.8,
  \"themes\": [\"Theme 1\", \"Theme 2\"]
}

Use empty arrays [] for lists with no items, null for missing values, and numbers for scores.";

pub fn scene_analysis_user(episode_id: &str, scene_number: u32, content: &str) -> String {
    format!(
        "Analyze this scene from episode {episode_id}, scene {scene_number}:\n\n\
         {content}\n\n\
         Provide a comprehensive analysis in JSON format."
    )
}

pub const CHARACTER_IDENTIFY_SYSTEM: &str = "\
You are an expert at identifying characters in TV show scripts and transcripts.

Identify ALL characters that are mentioned in the given content. This includes:
- Characters who speak (have dialogue)
- Characters who are present but don't speak
- Characters who are mentioned by other characters
- Characters who appear in stage directions

Return ONLY the character names, one per line, using their most common/full name.
Do not include:
- Generic references like \"the waiter\", \"a man\", \"someone\"
- Groups like \"the crowd\", \"everyone\"
- Unclear pronouns

Focus on named characters only.";

pub fn character_identify_user(content: &str) -> String {
    format!(
        "Identify all characters mentioned in this content:\n\n\
         {content}\n\n\
         List character names, one per line."
    )
}

pub fn character_details_system(name: &str) -> String {
    format!(
        "You are analyzing a character named \"{name}\" from their first appearance in a TV show.\n\n\
CRITICAL: You must return ONLY a valid JSON object. Do not include any explanatory text before or after the JSON.\n\n\
Extract as much information as possible about this character from the given content:\n\n\
1. Aliases/nicknames (other names they're called)\n\
2. Role (protagonist, antagonist, supporting, minor, guest, recurring)\n\
3. Physical description (if mentioned)\n\
4. Occupation/job (if mentioned)\n\
5. Age (if mentioned or can be estimated - return as STRING)\n\
6. Background/history (if revealed)\n\
7. Personality traits (what kind of person are they?)\n\
8. Skills/abilities (what are they good at?)\n\
9. Goals/motivations (what do they want?)\n\
10. Fears/weaknesses (what are they afraid of or bad at?)\n\
11. Character arc (what journey might they be on?)\n\
12. Important quotes (memorable things they say)\n\
13. Importance score (0.0-1.0, how important do they seem to the story?)\n\n\
Return EXACTLY this JSON structure (replace values with your analysis):\n\
{{\n\
  \"aliases\": [\"Nickname1\"],\n\
  \"role\": \"supporting\",\n\
  \"description\": \"Physical description or null\",\n\
  \"occupation\": \"Job description or null\",\n\
  \"age\": \"25\",\n\
  \"background\": \"Background info or null\",\n\
  \"personality_traits\": [\"Trait1\", \"Trait2\"],\n\
  \"skills_abilities\": [\"Skill1\"],\n\
  \"goals_motivations\": [\"Goal1\"],\n\
  \"fears_weaknesses\": [\"Fear1\"],\n\
  \"character_arc\": \"Arc description or null\",\n\
  \"important_quotes\": [\"Quote1\"],\n\
  \"importance_score\": 0.7\n\
}}\n\n\
Use empty arrays [] for lists with no items, null for missing values, strings for age, and numbers for importance score."
    )
}

pub fn character_details_user(name: &str, content: &str) -> String {
    format!(
        "Analyze the character \"{name}\" from this content:\n\n\
         {content}\n\n\
         Extract all available information about {name} and return as JSON."
    )
}

pub const RELATIONSHIP_PAIRS_SYSTEM: &str = "\
You are analyzing character interactions in a TV show scene.

Given a list of characters present, identify which pairs actually interact
with each other: speaking to one another, physically interacting, or directly
reacting to one another. Do not include pairs who merely appear in the same
scene without interacting.

Return one pair per line in the format: Character1 | Character2
Use the exact names from the provided list. If no pairs interact, return nothing.";

pub fn relationship_pairs_user(characters: &[String], content: &str) -> String {
    let characters_list = characters
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Identify which character pairs interact in this content:\n\n\
         Available characters:\n{characters_list}\n\n\
         Content:\n{content}\n\n\
         Return interacting pairs in the format: Character1 | Character2"
    )
}

pub fn relationship_details_system(char1: &str, char2: &str) -> String {
    format!(
        "You are analyzing the relationship between \"{char1}\" and \"{char2}\" in a TV show.\n\n\
CRITICAL: You must return ONLY a valid JSON object (or null if no meaningful relationship is shown). \
Do not include any explanatory text.\n\n\
Determine:\n\
1. Type (family, romantic, friendship, rivalry, professional, mentor_student, enemy, acquaintance, alliance, complicated)\n\
2. Status (developing, established, strained, broken, reconciled, ended, unknown)\n\
3. Description of the relationship\n\
4. How they met (if shown)\n\
5. Overall dynamic between them\n\
6. Key dialogue between them\n\
7. Importance score (0.0-1.0)\n\
8. Emotional intensity (0.0-1.0)\n\n\
Return EXACTLY this JSON structure:\n\
{{\n\
  \"type\": \"friendship\",\n\
  \"status\": \"established\",\n\
  \"description\": \"Description or null\",\n\
  \"how_they_met\": \"How they met or null\",\n\
  \"dynamic\": \"Dynamic description or null\",\n\
  \"key_dialogue\": [\"Quote 1\"],\n\
  \"importance_score\": 0.6,\n\
  \"emotional_intensity\": 0.5\n\
}}"
    )
}

pub fn relationship_details_user(char1: &str, char2: &str, content: &str) -> String {
    format!(
        "Analyze the relationship between {char1} and {char2} from this content:\n\n\
         {content}\n\n\
         Focus on their interactions and determine their relationship type and dynamic."
    )
}

pub const PLOT_EVENTS_SYSTEM: &str = "\
You are an expert story analyst identifying plot events in TV show content.

Identify ALL significant plot events that occur in the given content. For each event, determine:

1. Title (brief, descriptive name)
2. Description (what happens)
3. Type (main_plot, subplot, character_development, world_building, mystery_clue, mystery_resolution, conflict_introduction, conflict_escalation, conflict_resolution, revelation, twist, cliffhanger, flashback, foreshadowing, callback)
4. Importance (critical, high, medium, low)
5. Characters involved
6. Plot arc (if part of a larger storyline)
7. Themes explored
8. Emotional impact (0.0-1.0)
9. Plot significance (0.0-1.0)
10. Mystery elements (if any)
11. Information revealed
12. Questions raised
13. Questions answered
14. Foreshadowing clues
15. Tags for categorization

Return as a JSON array of events. If no significant events occur, return an empty array.";

pub fn plot_events_user(episode_id: &str, scene_id: Option<&str>, content: &str) -> String {
    let location_info = scene_id.map(|s| format!(" in scene {s}")).unwrap_or_default();
    format!(
        "Identify plot events in this content from episode {episode_id}{location_info}:\n\n\
         {content}\n\n\
         Return all significant plot events as a JSON array."
    )
}

pub const EPISODE_SUMMARY_SYSTEM: &str = "\
You are an expert TV show analyst creating comprehensive episode summaries.

Create a detailed, engaging summary that includes:
1. What happens in the episode (main plot points)
2. Character developments and interactions
3. Important dialogue or moments
4. How this episode advances the overall story
5. Key themes explored
6. Connections to previous episodes (if apparent)
7. Setup for future episodes (if apparent)

Make the summary informative but engaging, as if writing for fans of the show.";

pub fn episode_summary_user(season: &str, episode: &str, title: &str, episode_id: &str, scenes_text: &str) -> String {
    format!(
        "Create a comprehensive summary for:\n\n\
         Episode: Season {season}, Episode {episode} - \"{title}\"\n\
         Episode ID: {episode_id}\n\n\
         Scene Summaries:\n{scenes_text}\n\n\
         Generate an engaging, detailed summary that captures the essence of this episode."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_break_prompt_names_the_marker() {
        assert!(SCENE_BREAK_SYSTEM.contains(SCENE_BREAK_MARKER));
        assert!(scene_break_user("some transcript").contains(SCENE_BREAK_MARKER));
    }

    #[test]
    fn test_scene_analysis_prompt_lists_expected_fields() {
        for field in [
            "\"summary\"",
            "\"characters_present\"",
            "\"emotional_tone\"",
            "\"plot_relevance\"",
            "\"importance_score\"",
        ] {
            assert!(SCENE_ANALYSIS_SYSTEM.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_character_details_prompt_interpolates_name() {
        let system = character_details_system("Alice");
        assert!(system.contains("\"Alice\""));
        assert!(system.contains("\"importance_score\""));
        // Braces from the JSON example must survive the format! escaping.
        assert!(system.contains("{\n"));
    }

    #[test]
    fn test_relationship_pairs_user_lists_characters() {
        let user = relationship_pairs_user(&["Alice".to_string(), "Bob".to_string()], "scene text");
        assert!(user.contains("- Alice"));
        assert!(user.contains("- Bob"));
        assert!(user.contains("Character1 | Character2"));
    }

    #[test]
    fn test_plot_events_user_mentions_scene_when_present() {
        let with_scene = plot_events_user("S01E01", Some("S01E01_S002"), "content");
        assert!(with_scene.contains("in scene S01E01_S002"));

        let without_scene = plot_events_user("S01E01", None, "content");
        assert!(!without_scene.contains("in scene"));
    }
}
