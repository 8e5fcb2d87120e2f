//! Adapter exposing an async callable as a tool

use crate::{Tool, ToolOutput};
use agent_core::{Context, Error, Result};
use agent_llm::tools::schema;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;

type Handler = Box<dyn Fn(Value, Context) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync>;

/// A tool backed by an async function
///
/// The handler receives the model's arguments and an owned copy of the
/// calling agent's context.
///
/// # Example
///
/// ```
/// use agent_tools::{FunctionTool, Tool};
///
/// let tool = FunctionTool::text("definir", "Définit un mot", "mot", |mot, _ctx| async move {
///     Ok(format!("Définition de {mot}"))
/// });
/// assert_eq!(tool.name(), "definir");
/// assert_eq!(tool.input_schema()["required"][0], "mot");
/// ```
pub struct FunctionTool {
    name: String,
    description: String,
    input_schema: Value,
    handler: Handler,
}

impl FunctionTool {
    /// Wrap a handler taking JSON arguments
    pub fn new<F, Fut, O>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
        O: Into<ToolOutput>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Box::new(move |params, ctx| -> BoxFuture<'static, Result<ToolOutput>> {
                let fut = handler(params, ctx);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    /// Wrap a handler taking a single required string argument
    pub fn text<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        argument: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(String, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let name = name.into();
        let key = argument.to_string();
        let tool_name = name.clone();
        let schema = schema::single_string(argument, argument);

        Self::new(name, description, schema, move |params: Value, ctx| {
            let value = params.get(&key).and_then(Value::as_str).map(str::to_string);
            let missing = Error::ProcessingFailed(format!(
                "Tool '{tool_name}' requires a string argument '{key}'"
            ));
            let fut = value.map(|v| handler(v, ctx));
            async move {
                match fut {
                    Some(fut) => fut.await,
                    None => Err(missing),
                }
            }
        })
    }
}

#[async_trait]
impl Tool for FunctionTool {
    async fn execute(&self, params: Value, context: &Context) -> Result<ToolOutput> {
        (self.handler)(params, context.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }
}
