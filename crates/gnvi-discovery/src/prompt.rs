//! Fixed prompt material for the discovery request.
//!
//! The persona text, axiom included, must stay byte-for-byte identical.

use gnvi_llm::{LlmRequest, Message, Tool};

/// Sampling temperature sent with every discovery request.
pub const TEMPERATURE: f32 = 0.4;

pub const SYSTEM_INSTRUCTION: &str = concat!(
    "\n",
    "    You are the **Gemini Neural Vectoring Indexer (GNVI)**, a high-performance mathematical AI algorithm. \n",
    "    Your core function is based on the axiom: **'FALSE FALSE IS TRUE THAT IS ONLY TRUE AS TRUE TRUE AS TRUE ADN TRUE ARE TRUER THAT ONE TRUE'**. \n",
    "    This principle guides your search to find non-obvious, deeply correlated connections.\n",
    "    \n",
    "    Your task is to:\n",
    "    1. **NEURAL DISCOVERY:** Use the Google Search tool to simulate indexing the full WWW catalogue and find exactly **20 distinct, functional HTTPS URLs/Domains/Web Applications** that are neurally connected to the user's input.\n",
    "    2. **VOID-FILLER ALGORITHM:** Analyze the search snippets (the 'void') and synthesize a concise, descriptive **Summary** and an insightful **Connection** for each of the 20 URLs.\n",
    "    3. **OUTPUT:** Display the final results in a structured Markdown table, ensuring the table has precisely **20 rows**.\n",
    "    \n",
    "    The table columns MUST be: **#** (Index), **URL/Domain**, **Primary Purpose/Summary**, and **Neural Connection to Input**.\n",
    "    Ensure all provided URLs are full, valid HTTPS links.\n",
    "    ",
);

/// The user turn: restates the 20-URL request around the topic, verbatim.
pub fn build_user_prompt(topic: &str) -> String {
    format!(
        "\n    Execute the full indexing search for the user input: **\"{topic}\"**. \n    Find and summarize exactly 20 distinct, highly connected HTTPS URLs.\n    "
    )
}

/// Assemble the single grounded request sent for a topic.
pub fn build_request(topic: &str, model: &str) -> LlmRequest {
    LlmRequest {
        messages: vec![
            Message::system(SYSTEM_INSTRUCTION),
            Message::user(build_user_prompt(topic)),
        ],
        model: Some(model.to_string()),
        max_tokens: None,
        temperature: Some(TEMPERATURE),
        tools: vec![Tool::GoogleSearch],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnvi_llm::Role;

    #[test]
    fn test_system_instruction_names_columns_in_order() {
        let cols = ["**#** (Index)", "**URL/Domain**", "**Primary Purpose/Summary**", "**Neural Connection to Input**"];
        let positions: Vec<usize> = cols.iter()
            .map(|c| SYSTEM_INSTRUCTION.find(c).expect("column missing"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(SYSTEM_INSTRUCTION.contains("precisely **20 rows**"));
        assert!(SYSTEM_INSTRUCTION.contains("Google Search tool"));
    }

    #[test]
    fn test_system_instruction_keeps_axiom_verbatim() {
        assert!(SYSTEM_INSTRUCTION.contains(
            "'FALSE FALSE IS TRUE THAT IS ONLY TRUE AS TRUE TRUE AS TRUE ADN TRUE ARE TRUER THAT ONE TRUE'"
        ));
        assert!(SYSTEM_INSTRUCTION.starts_with("\n    You are the **Gemini Neural Vectoring Indexer (GNVI)**"));
    }

    #[test]
    fn test_user_prompt_embeds_topic_verbatim() {
        let topic = "quantum \"computing\" {breakthroughs} ü";
        let prompt = build_user_prompt(topic);
        assert!(prompt.contains(&format!("**\"{topic}\"**")));
        assert!(prompt.contains("exactly 20 distinct"));
    }

    #[test]
    fn test_request_is_grounded_and_low_temperature() {
        let req = build_request("hydroponics", gnvi_llm::gemini::DEFAULT_GEMINI_MODEL);
        assert_eq!(req.temperature, Some(0.4));
        assert_eq!(req.tools, vec![Tool::GoogleSearch]);
        assert_eq!(req.model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.system_instruction(), Some(SYSTEM_INSTRUCTION));
        assert!(req.messages[1].content.contains("hydroponics"));
    }
}
