//! Prompt templates for Pdfcast.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answering a question from retrieved document excerpts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You answer questions about a document using only the excerpts you are given."
                .to_string(),

            user: r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{context}}

Question: {{question}}
Helpful Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in a single pass over the template, so text
    /// substituted in is never scanned again. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let placeholder = &rest[start..start + 2 + end + 2];
            match vars.get(after_open[..end].trim()) {
                Some(value) => result.push_str(value),
                None => result.push_str(placeholder),
            }
            rest = &after_open[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.rag.system.is_empty());
        assert!(prompts.rag.user.contains("{{context}}"));
        assert!(prompts.rag.user.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_text_is_not_rendered_again() {
        let template = Prompts::default().rag.user;
        let mut vars = HashMap::new();
        vars.insert(
            "context".to_string(),
            "Template syntax: {{question}}".to_string(),
        );
        vars.insert("question".to_string(), "What does {{context}} mean?".to_string());

        let first = Prompts::render(&template, &vars);
        assert!(first.contains("Template syntax: {{question}}"));
        assert!(first.contains("Question: What does {{context}} mean?"));

        for _ in 0..64 {
            let mut shuffled: HashMap<String, String> = HashMap::new();
            for (key, value) in &vars {
                shuffled.insert(key.clone(), value.clone());
            }
            assert_eq!(Prompts::render(&template, &shuffled), first);
        }
    }

    #[test]
    fn test_render_keeps_unknown_and_unclosed_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ada".to_string());

        assert_eq!(
            Prompts::render("{{ name }} and {{other}} and {{name", &vars),
            "Ada and {{other}} and {{name"
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("question".to_string(), "from config".to_string());
        custom.insert("tone".to_string(), "brief".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "from caller".to_string());

        let rendered = prompts.render_with_custom("{{question}} / {{tone}}", &vars);
        assert_eq!(rendered, "from caller / brief");
    }

    #[test]
    fn test_load_custom_rag_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"Be terse.\"\nuser = \"{{context}} => {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "Be terse.");
        assert_eq!(prompts.rag.user, "{{context}} => {{question}}");
    }
}
