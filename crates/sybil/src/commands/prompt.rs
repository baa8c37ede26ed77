//! Prompt settings handlers.

use sybil_api::PromptConfig;
use sybil_core::{CoreError, prompt};

use crate::cli::{GlobalOpts, PromptArgs, PromptCommand, PromptSetArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

const PEOPLE_REFERENCES: [&str; 3] = [
    "first_names_internally_roles_cross_team",
    "always_first_names",
    "always_roles",
];

fn detail(c: &PromptConfig) -> String {
    [
        format!("Tone:                {}", c.tone),
        format!("Smart Brevity:       {}", output::yes_no(c.use_smart_brevity)),
        format!("People References:   {}", c.people_references),
        format!("Formatting:          {}", output::yes_no(c.use_formatting)),
        format!("Emojis:              {}", output::yes_no(c.use_emojis)),
        format!("Response Length:     {}", c.default_response_length),
        format!("Ask About Depth:     {}", output::yes_no(c.ask_about_depth)),
        format!("Tone Adapts by User: {}", output::yes_no(c.tone_adapts_by_user)),
        format!("Custom Instructions: {}", output::opt(Some(&c.custom_instructions))),
    ]
    .join("\n")
}

fn people_references(value: String) -> Result<String, CliError> {
    if PEOPLE_REFERENCES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(CliError::Validation {
            field: "people-references".into(),
            reason: format!("expected one of {}", PEOPLE_REFERENCES.join(", ")),
        })
    }
}

/// Overlay the flags that were given onto the current config.
fn apply(mut config: PromptConfig, args: PromptSetArgs) -> Result<PromptConfig, CliError> {
    if let Some(refs) = args.people_references {
        config.people_references = people_references(refs)?;
    }
    if let Some(tone) = args.tone {
        config.tone = tone;
    }
    if let Some(length) = args.response_length {
        config.default_response_length = length;
    }
    if let Some(v) = args.smart_brevity {
        config.use_smart_brevity = v;
    }
    if let Some(v) = args.formatting {
        config.use_formatting = v;
    }
    if let Some(v) = args.emojis {
        config.use_emojis = v;
    }
    if let Some(v) = args.ask_about_depth {
        config.ask_about_depth = v;
    }
    if let Some(v) = args.tone_adapts {
        config.tone_adapts_by_user = v;
    }
    if let Some(text) = args.custom_instructions {
        config.custom_instructions = text;
    }
    Ok(config)
}

pub async fn handle(ctx: &Context, args: PromptArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = ctx.console.client();

    match args.command {
        PromptCommand::Show { preview } => {
            let config = client.get_prompt_config().await.map_err(CoreError::from)?;
            let out = if preview {
                prompt::preview(&config)
            } else {
                output::render_single(global.output, &config, detail, |c| c.tone.clone())?
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PromptCommand::Set(args) => {
            let updated = match args.from_file {
                Some(ref path) => util::read_json_file::<PromptConfig>(path)?,
                None => {
                    let current = client.get_prompt_config().await.map_err(CoreError::from)?;
                    let updated = apply(current.clone(), args)?;
                    if updated == current {
                        output::notice(global, "Nothing to change");
                        return Ok(());
                    }
                    updated
                }
            };
            let saved = client
                .update_prompt_config(&updated)
                .await
                .map_err(CoreError::from)?;
            output::notice(global, "✓ Prompt configuration saved");
            let out = output::render_single(global.output, &saved, detail, |c| c.tone.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn current() -> PromptConfig {
        PromptConfig {
            tone: "professional".into(),
            use_smart_brevity: true,
            people_references: "always_roles".into(),
            use_formatting: true,
            use_emojis: false,
            default_response_length: "3-6 sentences".into(),
            ask_about_depth: true,
            tone_adapts_by_user: false,
            custom_instructions: String::new(),
        }
    }

    fn set_args() -> PromptSetArgs {
        PromptSetArgs {
            from_file: None,
            tone: None,
            smart_brevity: None,
            people_references: None,
            formatting: None,
            emojis: None,
            response_length: None,
            ask_about_depth: None,
            tone_adapts: None,
            custom_instructions: None,
        }
    }

    #[test]
    fn only_given_flags_change() {
        let args = PromptSetArgs {
            tone: Some("Warm and plain-spoken".into()),
            emojis: Some(true),
            ..set_args()
        };
        let updated = apply(current(), args).unwrap();
        assert_eq!(updated.tone, "Warm and plain-spoken");
        assert!(updated.use_emojis);
        assert_eq!(updated.default_response_length, "3-6 sentences");
        assert!(updated.use_smart_brevity);
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let args = PromptSetArgs {
            people_references: Some("nicknames".into()),
            ..set_args()
        };
        let err = apply(current(), args).unwrap_err();
        assert!(err.to_string().contains("people-references"));
    }
}
