//! Handler objects built from config entries. Each one answers every request
//! by running its template through [`template::process`].

use crate::config::{PromptConfig, ResourceConfig, ToolConfig};
use crate::server::{McpPrompt, McpResource, McpTool};
use crate::template;
use crate::types::*;
use crate::variables::{self, Variables};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ensure every name is non-empty and appears once.
fn check_names<'a>(
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), McpError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(McpError::InvalidDeclaration(format!(
                "{} name must not be empty",
                what
            )));
        }
        if !seen.insert(name) {
            return Err(McpError::InvalidDeclaration(format!(
                "duplicate {} name: {}",
                what, name
            )));
        }
    }
    Ok(())
}

pub struct MockTool {
    name: String,
    description: String,
    schema: Value,
    template: String,
}

impl MockTool {
    pub fn new(config: &ToolConfig) -> Result<Self, McpError> {
        check_names("parameter", config.parameters.iter().map(|p| p.name.as_str()))?;

        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &config.parameters {
            if param.kind != "string" {
                debug!(
                    "Parameter {}.{} declared as {}, exposed as string",
                    config.name, param.name, param.kind
                );
            }

            let mut property = json!({"type": "string"});
            if !param.description.is_empty() {
                property["description"] = json!(param.description);
            }
            properties.insert(param.name.clone(), property);

            if param.required {
                required.push(param.name.clone());
            }
        }

        let mut schema = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            schema["required"] = json!(required);
        }

        Ok(Self {
            name: config.name.clone(),
            description: config.description.clone(),
            schema,
            template: config.mock_template.clone(),
        })
    }
}

impl McpTool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    fn execute(&self, args: Option<&Value>) -> Result<CallToolResponse, McpError> {
        let variables = variables::from_tool_arguments(args);
        Ok(CallToolResponse::text(template::process(
            &self.template,
            &variables,
        )))
    }
}

pub struct MockPrompt {
    name: String,
    description: String,
    arguments: Vec<PromptArgument>,
    template: String,
}

impl MockPrompt {
    pub fn new(config: &PromptConfig) -> Result<Self, McpError> {
        check_names("argument", config.arguments.iter().map(|a| a.name.as_str()))?;

        let arguments = config
            .arguments
            .iter()
            .map(|arg| PromptArgument {
                name: arg.name.clone(),
                description: (!arg.description.is_empty()).then(|| arg.description.clone()),
                required: arg.required.then_some(true),
            })
            .collect();

        Ok(Self {
            name: config.name.clone(),
            description: config.description.clone(),
            arguments,
            template: config.mock_template.clone(),
        })
    }
}

impl McpPrompt for MockPrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn arguments(&self) -> Vec<PromptArgument> {
        self.arguments.clone()
    }

    fn get(
        &self,
        arguments: Option<&HashMap<String, String>>,
    ) -> Result<GetPromptResponse, McpError> {
        let variables = variables::from_prompt_arguments(arguments);
        let text = template::process(&self.template, &variables);

        Ok(GetPromptResponse {
            description: Some(self.description.clone()),
            messages: vec![PromptMessage {
                role: Role::User,
                content: PromptContent::Text(TextContent { text }),
            }],
            meta: None,
        })
    }
}

pub struct MockResource {
    uri: String,
    name: String,
    description: String,
    mime_type: String,
    content: String,
}

impl MockResource {
    /// The URI is an opaque key: any non-empty string is accepted and kept as written.
    pub fn new(config: &ResourceConfig) -> Result<Self, McpError> {
        if config.uri.is_empty() {
            return Err(McpError::InvalidDeclaration("resource uri must not be empty".into()));
        }
        Ok(Self {
            uri: config.uri.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            mime_type: config.mime_type.clone(),
            content: config.mock_content.clone(),
        })
    }
}

impl McpResource for MockResource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read(&self, uri: &str) -> Result<ReadResourceResponse, McpError> {
        // Resources take no arguments, so placeholders are always left as is.
        let text = template::process(&self.content, &Variables::new());

        Ok(ReadResourceResponse {
            contents: vec![TextResourceContents {
                uri: uri.to_string(),
                text,
                mime_type: (!self.mime_type.is_empty()).then(|| self.mime_type.clone()),
            }],
            meta: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PromptArgumentConfig, ToolParameter};

    fn greet() -> ToolConfig {
        ToolConfig {
            name: "greet".into(),
            description: "Say hello".into(),
            parameters: vec![
                ToolParameter {
                    name: "name".into(),
                    description: "Who to greet".into(),
                    required: true,
                    ..Default::default()
                },
                ToolParameter {
                    name: "count".into(),
                    kind: "number".into(),
                    ..Default::default()
                },
            ],
            mock_template: "Hello, {{name}}! ({{count}})".into(),
        }
    }

    fn text_of(response: &CallToolResponse) -> &str {
        match &response.content[0] {
            ToolResponseContent::Text { text } => text,
        }
    }

    #[test]
    fn test_tool_schema() {
        let tool = MockTool::new(&greet()).unwrap();
        assert_eq!(
            tool.schema(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Who to greet"},
                    "count": {"type": "string"}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_tool_schema_without_parameters() {
        let tool = MockTool::new(&ToolConfig {
            name: "noop".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(tool.schema(), json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_tool_execute_substitutes_strings_only() {
        let tool = MockTool::new(&greet()).unwrap();
        let response = tool
            .execute(Some(&json!({"name": "Ada", "count": 3})))
            .unwrap();
        assert_eq!(text_of(&response), "Hello, Ada! ({{count}})");
    }

    #[test]
    fn test_tool_execute_without_arguments() {
        let tool = MockTool::new(&greet()).unwrap();
        let response = tool.execute(None).unwrap();
        assert_eq!(text_of(&response), "Hello, {{name}}! ({{count}})");
    }

    #[test]
    fn test_tool_rejects_duplicate_parameters() {
        let mut config = greet();
        config.parameters[1].name = "name".into();
        let err = MockTool::new(&config).err().unwrap();
        assert_eq!(err.to_string(), "Invalid declaration: duplicate parameter name: name");
    }

    #[test]
    fn test_tool_rejects_empty_parameter_name() {
        let mut config = greet();
        config.parameters[0].name = " ".into();
        assert!(matches!(
            MockTool::new(&config),
            Err(McpError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn test_prompt_get() {
        let prompt = MockPrompt::new(&PromptConfig {
            name: "review".into(),
            description: "Review code".into(),
            arguments: vec![PromptArgumentConfig {
                name: "lang".into(),
                description: "Language".into(),
                required: true,
            }],
            mock_template: "Review this {{lang}} code".into(),
        })
        .unwrap();

        assert_eq!(
            prompt.arguments(),
            vec![PromptArgument {
                name: "lang".into(),
                description: Some("Language".into()),
                required: Some(true),
            }]
        );

        let args = HashMap::from([("lang".to_string(), "Rust".to_string())]);
        let response = prompt.get(Some(&args)).unwrap();
        assert_eq!(response.description.as_deref(), Some("Review code"));
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].role, Role::User);
        assert_eq!(
            response.messages[0].content.text_content(),
            Some("Review this Rust code")
        );
    }

    #[test]
    fn test_resource_read_echoes_requested_uri() {
        let resource = MockResource::new(&ResourceConfig {
            name: "static".into(),
            mime_type: "text/plain".into(),
            uri: "res://static".into(),
            mock_content: "v1 {{x}}".into(),
            ..Default::default()
        })
        .unwrap();

        let response = resource.read("res://static").unwrap();
        assert_eq!(
            response.contents,
            vec![TextResourceContents {
                uri: "res://static".into(),
                text: "v1 {{x}}".into(),
                mime_type: Some("text/plain".into()),
            }]
        );
    }

    #[test]
    fn test_resource_uri_is_kept_verbatim() {
        for uri in ["HTTP://Example.com", "greeting", "file:///tmp/a b.txt"] {
            let resource = MockResource::new(&ResourceConfig {
                name: "opaque".into(),
                uri: uri.into(),
                ..Default::default()
            })
            .unwrap();

            assert_eq!(resource.uri(), uri);
            assert_eq!(resource.read(uri).unwrap().contents[0].uri, uri);
        }
    }

    #[test]
    fn test_resource_rejects_empty_uri() {
        let err = MockResource::new(&ResourceConfig {
            name: "bad".into(),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, McpError::InvalidDeclaration(_)));
    }
}
