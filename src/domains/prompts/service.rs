//! Prompt service implementation.
//!
//! The PromptService answers list/get requests against an immutable
//! [`PromptRegistry`]. Rendering a prompt is data-driven: the declared
//! arguments are checked against the supplied bindings, defaults are merged
//! in, and the merged map is handed to the registry's formatter.

use rmcp::model::{GetPromptResult, Prompt, PromptArgument, PromptMessage, PromptMessageRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::PromptError;
use super::model::{Bindings, PromptDescriptor};
use super::registry::PromptRegistry;

/// What to do with bindings for arguments a prompt does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentPolicy {
    /// Reject them with [`PromptError::UnknownArgument`].
    #[default]
    Strict,
    /// Drop them before rendering.
    Lenient,
}

/// Service for listing and rendering prompts.
#[derive(Debug, Clone)]
pub struct PromptService {
    registry: Arc<PromptRegistry>,
    policy: ArgumentPolicy,
}

impl PromptService {
    /// Create a new PromptService over a built registry.
    pub fn new(registry: Arc<PromptRegistry>, policy: ArgumentPolicy) -> Self {
        info!(
            "Initializing PromptService with {} prompts ({:?} arguments)",
            registry.len(),
            policy
        );
        Self { registry, policy }
    }

    /// The registry this service reads from.
    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    /// List all available prompts, sorted by name.
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.registry
            .list()
            .map(|descriptor| Prompt {
                name: descriptor.name.clone(),
                title: Some(descriptor.title.clone()),
                description: Some(descriptor.description.clone()),
                arguments: Some(
                    descriptor
                        .arguments
                        .iter()
                        .map(|arg| PromptArgument {
                            name: arg.name.clone(),
                            title: None,
                            description: Some(arg.description.clone()),
                            required: Some(arg.is_required()),
                        })
                        .collect(),
                ),
                icons: None,
                meta: None,
            })
            .collect()
    }

    /// Validate `supplied` against the prompt's declared arguments and merge
    /// in defaults.
    pub fn bind_arguments(
        &self,
        descriptor: &PromptDescriptor,
        mut supplied: Bindings,
    ) -> Result<Bindings, PromptError> {
        for arg in &descriptor.arguments {
            if supplied.contains_key(&arg.name) {
                continue;
            }
            match &arg.default {
                Some(default) => {
                    supplied.insert(arg.name.clone(), default.clone());
                }
                None => return Err(PromptError::missing_argument(&arg.name)),
            }
        }

        let mut unknown: Vec<String> = supplied
            .keys()
            .filter(|key| descriptor.argument(key).is_none())
            .cloned()
            .collect();
        unknown.sort();

        if let Some(first) = unknown.first() {
            match self.policy {
                ArgumentPolicy::Strict => return Err(PromptError::unknown_argument(first)),
                ArgumentPolicy::Lenient => {
                    debug!("Ignoring undeclared arguments {:?}", unknown);
                    for key in &unknown {
                        supplied.remove(key);
                    }
                }
            }
        }

        Ok(supplied)
    }

    /// Render a prompt's body with the given arguments.
    pub fn render(&self, name: &str, arguments: Option<Bindings>) -> Result<String, PromptError> {
        let descriptor = self.registry.lookup(name)?;
        let bindings = self.bind_arguments(descriptor, arguments.unwrap_or_default())?;
        self.registry.formatter().render(&descriptor.body, &bindings)
    }

    /// Get a prompt with arguments substituted.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Bindings>,
    ) -> Result<GetPromptResult, PromptError> {
        let content = self.render(name, arguments)?;
        let descriptor = self.registry.lookup(name)?;

        Ok(GetPromptResult {
            description: Some(descriptor.description.clone()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, content)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::model::Argument;
    use crate::domains::prompts::registry::RegistryOptions;
    use crate::domains::prompts::templates::{FormatterKind, get_formatter};
    use std::path::PathBuf;

    fn greeting() -> PromptDescriptor {
        PromptDescriptor {
            name: "greeting".into(),
            title: "Greeting".into(),
            description: "Greets someone".into(),
            arguments: vec![
                Argument {
                    name: "user".into(),
                    description: "Who to greet".into(),
                    default: None,
                },
                Argument {
                    name: "project".into(),
                    description: String::new(),
                    default: Some("MyApp".into()),
                },
            ],
            body: "Hello {user}! Welcome to {project}.".into(),
            source_path: PathBuf::from("greeting.md"),
        }
    }

    fn service(policy: ArgumentPolicy) -> PromptService {
        let (registry, _) = PromptRegistry::build(
            vec![greeting()],
            get_formatter(FormatterKind::Brace),
            RegistryOptions::default(),
        );
        PromptService::new(Arc::new(registry), policy)
    }

    fn args(pairs: &[(&str, &str)]) -> Option<Bindings> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_list_prompts() {
        let prompts = service(ArgumentPolicy::Strict).list_prompts();

        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, "greeting");
        assert_eq!(prompts[0].title.as_deref(), Some("Greeting"));

        let arguments = prompts[0].arguments.as_ref().unwrap();
        assert_eq!(arguments[0].name, "user");
        assert_eq!(arguments[0].required, Some(true));
        assert_eq!(arguments[1].required, Some(false));
    }

    #[test]
    fn test_render_merges_defaults() {
        let service = service(ArgumentPolicy::Strict);

        let text = service.render("greeting", args(&[("user", "Ann")])).unwrap();
        assert_eq!(text, "Hello Ann! Welcome to MyApp.");

        let text = service
            .render("greeting", args(&[("user", "Ann"), ("project", "Mars")]))
            .unwrap();
        assert_eq!(text, "Hello Ann! Welcome to Mars.");
    }

    #[test]
    fn test_missing_required_argument() {
        let err = service(ArgumentPolicy::Strict)
            .render("greeting", None)
            .unwrap_err();
        assert!(matches!(err, PromptError::MissingRequiredArgument(ref n) if n == "user"));
    }

    #[test]
    fn test_unknown_argument_strict() {
        let err = service(ArgumentPolicy::Strict)
            .render("greeting", args(&[("user", "Ann"), ("usr", "typo")]))
            .unwrap_err();
        assert!(matches!(err, PromptError::UnknownArgument(ref n) if n == "usr"));
    }

    #[test]
    fn test_unknown_argument_lenient() {
        let text = service(ArgumentPolicy::Lenient)
            .render("greeting", args(&[("user", "Ann"), ("a b", "ignored")]))
            .unwrap();
        assert_eq!(text, "Hello Ann! Welcome to MyApp.");
    }

    #[test]
    fn test_get_nonexistent_prompt() {
        let err = service(ArgumentPolicy::Strict)
            .get_prompt("nonexistent", None)
            .unwrap_err();
        assert!(matches!(err, PromptError::NotFound(_)));
    }

    #[test]
    fn test_get_prompt_wraps_single_user_message() {
        let result = service(ArgumentPolicy::Strict)
            .get_prompt("greeting", args(&[("user", "Ann")]))
            .unwrap();

        assert_eq!(result.description.as_deref(), Some("Greets someone"));
        assert_eq!(result.messages.len(), 1);

        let json = serde_json::to_value(&result.messages[0]).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"]["type"], "text");
        assert_eq!(json["content"]["text"], "Hello Ann! Welcome to MyApp.");
    }
}
