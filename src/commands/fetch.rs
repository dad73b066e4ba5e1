//! `wardview fetch` command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::context::ServiceContext;
use crate::options::{OptionSource, WorkspacesConfig};
use crate::pipeline::{WorkspacesPipeline, WorkspacesView};
use crate::ports::QueryClient;

/// Arguments of the `fetch` command.
#[derive(Debug, Default)]
pub struct FetchArgs<'a> {
    /// Live GraphQL endpoint.
    pub endpoint: Option<&'a str>,
    /// Cassette to replay instead of going to the network.
    pub cassette: Option<&'a Path>,
    /// Cassette to record live traffic into.
    pub record: Option<&'a Path>,
    /// Pipeline argument document.
    pub config: Option<&'a Path>,
    /// Input context document.
    pub context: Option<&'a Path>,
    /// Idle timeout in milliseconds.
    pub idle_ms: u64,
}

/// Execute the `fetch` command.
///
/// Prints the input context with the named view added under its key. When
/// the pipeline argument is unusable the context is printed unchanged.
///
/// # Errors
///
/// Returns an error string if no query source is configured, an input file
/// cannot be read, or a recorded cassette cannot be written.
pub fn run(args: &FetchArgs<'_>) -> Result<(), String> {
    let ctx = service_context(args)?;
    let argument = args.config.map(super::read_document).transpose()?;
    let context = match args.context.map(super::read_document).transpose()? {
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err("Context document must be an object".to_string()),
        None => Map::new(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;
    let view = runtime.block_on(settled_view(
        Arc::clone(&ctx.client),
        argument.as_ref(),
        context.clone(),
        Duration::from_millis(args.idle_ms),
    ));

    if let Some(path) = ctx.finish()? {
        eprintln!("Recording saved to: {}", path.display());
    }

    let output = match view {
        Some(view) => with_view(context, &view)?,
        None => Value::Object(context),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("Failed to serialize view: {e}"))?;
    println!("{json}");
    Ok(())
}

fn service_context(args: &FetchArgs<'_>) -> Result<ServiceContext, String> {
    match (args.cassette, args.endpoint, args.record) {
        (Some(cassette), _, _) => ServiceContext::replaying(cassette),
        (None, Some(endpoint), Some(record)) => Ok(ServiceContext::recording(endpoint, record)),
        (None, Some(endpoint), None) => Ok(ServiceContext::live(endpoint)),
        (None, None, _) => Err(
            "No query source: pass --endpoint (or set WARDVIEW_ENDPOINT) or --cassette"
                .to_string(),
        ),
    }
}

/// Runs a pipeline until it settles or `idle` elapses and returns its view.
///
/// The context object is also offered as the last option source, so keys
/// such as `visitIds` or `assignedOnly` in it override the argument.
async fn settled_view(
    client: Arc<dyn QueryClient>,
    argument: Option<&Value>,
    context: Map<String, Value>,
    idle: Duration,
) -> Option<WorkspacesView> {
    let config = match WorkspacesConfig::from_argument(argument) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid workspaces argument; passing through without fetching");
            return None;
        }
    };
    let config = config
        .with_options(OptionSource::derived(|context: &Map<String, Value>| {
            Value::Object(context.clone())
        }));

    let mut pipeline = WorkspacesPipeline::new(client, config, context);
    if tokio::time::timeout(idle, pipeline.settle()).await.is_err() {
        warn!(?idle, "queries still loading; printing partial view");
    } else {
        info!("workspace queries settled");
    }
    pipeline.view()
}

fn with_view(mut context: Map<String, Value>, view: &WorkspacesView) -> Result<Value, String> {
    match view.to_json().map_err(|e| format!("Failed to serialize view: {e}"))? {
        Value::Object(named) => context.extend(named),
        other => return Ok(other),
    }
    Ok(Value::Object(context))
}
