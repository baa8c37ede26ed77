// Assistant prompt configuration: rendered preview of the behaviour rules
// the backend derives from a `PromptConfig`.

use std::fmt::Write as _;

use sybil_api::PromptConfig;

const SMART_BREVITY: &str = "Follow Axios-style brevity: short paragraphs (2-4 sentences max), \
bold labels for sections (e.g., **Why it matters:**, **The big picture:**, **Key takeaways:**), \
and actionable summaries";

const PEOPLE_BY_ROLE: &str = "first_names_internally_roles_cross_team";

const ASK_ABOUT_DEPTH: &str = "Unless asked to generate a strategic draft, project memo, or \
something determined to be longer. When appropriate, ask how much depth the person is looking \
for, and give options (a few short action items/bullet points or a comprehensive draft \
including exec summary, etc.)";

/// Markdown preview of the instructions a config produces.
pub fn preview(config: &PromptConfig) -> String {
    let mut out = String::from("**Tone & Style**:\n\n");
    // Writing into a String cannot fail.
    let _ = writeln!(out, "- **Tone**: {}", config.tone);

    if config.use_smart_brevity {
        let _ = writeln!(out, "- **Smart Brevity**: {SMART_BREVITY}");
    }
    if config.people_references == PEOPLE_BY_ROLE {
        out.push_str(
            "- **People References**: Use first names for internal references. \
             Use roles when referring cross-team (e.g., \"Policy Lead\" or \"Director\")\n",
        );
    }
    if config.use_formatting {
        out.push_str("- **Formatting**: Use bold and bullets for clarity and structure\n");
    }
    if config.use_emojis {
        out.push_str("- **Emojis**: Use emojis when appropriate\n");
    } else {
        out.push_str("- **Emojis**: Do not use emojis unless explicitly requested by the user\n");
    }

    let _ = write!(
        out,
        "- **Response Length**: For most responses, use {}. ",
        config.default_response_length
    );
    if config.ask_about_depth {
        let _ = writeln!(out, "{ASK_ABOUT_DEPTH}");
    } else {
        out.push_str("Adjust length based on query complexity.\n");
    }

    if config.tone_adapts_by_user {
        out.push_str("- **Tone Adaptation**: Adapt tone based on user preferences\n");
    } else {
        out.push_str(
            "- **Tone Adaptation**: Do not adapt tone by user - maintain consistent \
             professional tone for all users\n",
        );
    }

    if !config.custom_instructions.is_empty() {
        let _ = writeln!(
            out,
            "\n**Additional Instructions**:\n{}",
            config.custom_instructions
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PromptConfig {
        PromptConfig {
            tone: "warm and direct".into(),
            use_smart_brevity: true,
            people_references: PEOPLE_BY_ROLE.into(),
            use_formatting: false,
            use_emojis: false,
            default_response_length: "3-5 sentences".into(),
            ask_about_depth: false,
            tone_adapts_by_user: true,
            custom_instructions: String::new(),
        }
    }

    #[test]
    fn preview_reflects_flags() {
        let text = preview(&config());
        assert!(text.starts_with("**Tone & Style**:\n\n- **Tone**: warm and direct\n"));
        assert!(text.contains("**Smart Brevity**"));
        assert!(text.contains("**People References**"));
        assert!(!text.contains("**Formatting**"));
        assert!(text.contains("Do not use emojis"));
        assert!(text.contains("use 3-5 sentences. Adjust length based on query complexity.\n"));
        assert!(text.contains("Adapt tone based on user preferences"));
        assert!(!text.contains("Additional Instructions"));
    }

    #[test]
    fn custom_instructions_are_appended() {
        let mut cfg = config();
        cfg.custom_instructions = "Cite meeting dates.".into();
        cfg.people_references = "full_names".into();
        let text = preview(&cfg);
        assert!(!text.contains("People References"));
        assert!(text.ends_with("\n**Additional Instructions**:\nCite meeting dates.\n"));
    }
}
