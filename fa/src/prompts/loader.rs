//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::golden::GoldenExample;

/// Variables for `system.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct SystemPromptContext {
    /// Crop the exemplar describes
    pub exemplar_crop: String,
    /// The exemplar recipe, pretty-printed JSON
    pub exemplar_json: String,
}

impl SystemPromptContext {
    pub fn from_exemplar(exemplar: &GoldenExample) -> Result<Self> {
        let exemplar_json =
            serde_json::to_string_pretty(&exemplar.recipe).map_err(|e| eyre!("Failed to serialize exemplar: {}", e))?;
        Ok(Self {
            exemplar_crop: exemplar.crop_label.clone(),
            exemplar_json,
        })
    }
}

/// Variables for `user.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct UserPromptContext {
    /// Rendered grounding context
    pub context: String,
    pub query: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory, if one exists
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader consulting `override_dir` before the embedded templates
    pub fn new(override_dir: Option<&Path>) -> Self {
        let override_dir = override_dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        debug!(?override_dir, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; evidence must reach the model verbatim
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    pub fn system_prompt(&self, context: &SystemPromptContext) -> Result<String> {
        self.render("system", context)
    }

    pub fn user_prompt(&self, context: &UserPromptContext) -> Result<String> {
        self.render("user", context)
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golden::builtin_exemplar;

    #[test]
    fn test_system_prompt_contains_rules_and_exemplar() {
        let loader = PromptLoader::embedded_only();
        let ctx = SystemPromptContext::from_exemplar(builtin_exemplar()).unwrap();

        let prompt = loader.system_prompt(&ctx).unwrap();

        assert!(prompt.contains("ONLY from the CONTEXT"));
        assert!(prompt.contains("different crop, Basil"));
        assert!(prompt.contains("\"growth_stage\": \"Vegetative\""));
    }

    #[test]
    fn test_user_prompt_is_not_html_escaped() {
        let loader = PromptLoader::embedded_only();
        let ctx = UserPromptContext {
            context: "- Source: fao.org/tomato\n  Fact: pH < 7 & \"well drained\"\n\n".to_string(),
            query: "soil for tomato?".to_string(),
        };

        let prompt = loader.user_prompt(&ctx).unwrap();

        assert!(prompt.contains("pH < 7 & \"well drained\""));
        assert!(prompt.contains("QUESTION:\nsoil for tomato?"));
    }

    #[test]
    fn test_override_dir_takes_precedence() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("user.pmt"), "Q={{query}}").unwrap();
        let loader = PromptLoader::new(Some(temp.path()));

        let prompt = loader
            .user_prompt(&UserPromptContext {
                context: String::new(),
                query: "rice".to_string(),
            })
            .unwrap();
        assert_eq!(prompt, "Q=rice");

        // Templates missing from the override dir fall back to embedded
        let ctx = SystemPromptContext::from_exemplar(builtin_exemplar()).unwrap();
        assert!(loader.system_prompt(&ctx).unwrap().contains("GROUNDING RULES"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
