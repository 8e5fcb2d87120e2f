//! Tool manifest types sent to the completion backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the tool manifest
///
/// Describes a tool the model may call: its name, what it does, and a
/// JSON Schema for its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in the agent's registry)
    pub name: String,

    /// Description shown to the model
    pub description: String,

    /// JSON schema for the tool's arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers to build JSON schemas for tool arguments
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use agent_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "query": schema::string("Requête de recherche") }),
    ///     vec!["query"],
    /// );
    /// assert_eq!(schema["required"][0], "query");
    /// ```
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }

    /// Object schema with a single required string property
    pub fn single_string(property: &str, description: &str) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(property.to_string(), string(description));
        object(Value::Object(properties), vec![property])
    }
}
