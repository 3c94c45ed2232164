use anyhow::Result;
use dialoguer::{Confirm, Editor, Input, MultiSelect, Select};

#[cfg(test)]
use mockall::automock;

/// Operator interaction used by the interactive commands.
#[cfg_attr(test, automock)]
pub trait Prompter {
    /// Single choice among `items`; returns the chosen index.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Zero or more choices among `items`.
    fn multi_select(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;

    /// Non-empty, trimmed free text.
    fn input(&self, prompt: &str) -> Result<String>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Open `text` in the operator's editor. `None` when the edit was aborted.
    fn edit(&self, text: &str) -> Result<Option<String>>;
}

/// Terminal prompts on stderr via dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        Ok(Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }

    fn multi_select(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        Ok(MultiSelect::new()
            .with_prompt(prompt)
            .items(items)
            .interact()?)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|value: &String| -> Result<(), &str> {
                if value.trim().is_empty() {
                    Err("A value is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn edit(&self, text: &str) -> Result<Option<String>> {
        Ok(Editor::new().extension(".json").edit(text)?)
    }
}
