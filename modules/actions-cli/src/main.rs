use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use actions_core::{
    settings_schema, ActionRunner, BatchOutcome, Destination, Event, ExtendedTransport,
    HttpTransport, Mapping, Response,
};
use destination_metronome::Metronome;
use destination_twilio_messaging::PersonasMessagingTwilio;

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "actions")]
#[command(about = "Run destination actions against events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a destination's actions, field schemas and settings schema
    Describe { destination: DestinationName },

    /// Resolve events and deliver them through one action
    Send {
        destination: DestinationName,
        action: String,

        /// JSON file holding one event object or an array of events
        #[arg(long)]
        events: PathBuf,

        /// JSON file mapping field names to expressions
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Only use the mapping; ignore schema defaults
        #[arg(long)]
        no_default_mappings: bool,
    },

    /// Issue the destination's credential test call
    TestAuth { destination: DestinationName },
}

#[derive(Clone, Copy, ValueEnum)]
enum DestinationName {
    Metronome,
    PersonasMessagingTwilio,
}

struct SendArgs {
    action: String,
    events: PathBuf,
    mapping: Option<PathBuf>,
    use_default_mappings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("actions_cli=info".parse()?)
                .add_directive("actions_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_redacted();

    let output = match cli.command {
        Commands::Describe { destination } => match destination {
            DestinationName::Metronome => describe(&Metronome::new()?)?,
            DestinationName::PersonasMessagingTwilio => describe(&PersonasMessagingTwilio::new())?,
        },
        Commands::Send {
            destination,
            action,
            events,
            mapping,
            no_default_mappings,
        } => {
            let args = SendArgs {
                action,
                events,
                mapping,
                use_default_mappings: !no_default_mappings,
            };
            match destination {
                DestinationName::Metronome => {
                    send(&Metronome::new()?, config.metronome_settings()?, &args, &config).await?
                }
                DestinationName::PersonasMessagingTwilio => {
                    send(&PersonasMessagingTwilio::new(), config.twilio_settings()?, &args, &config)
                        .await?
                }
            }
        }
        Commands::TestAuth { destination } => match destination {
            DestinationName::Metronome => {
                test_auth(&Metronome::new()?, config.metronome_settings()?, &config).await?
            }
            DestinationName::PersonasMessagingTwilio => {
                test_auth(&PersonasMessagingTwilio::new(), config.twilio_settings()?, &config)
                    .await?
            }
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn describe<D: Destination>(destination: &D) -> Result<Value> {
    Ok(json!({
        "destination": serde_json::to_value(destination.definition())?,
        "settings": serde_json::to_value(settings_schema::<D>())?,
    }))
}

fn transport<D: Destination>(
    destination: &D,
    settings: &D::Settings,
    config: &Config,
) -> Result<ExtendedTransport<HttpTransport>> {
    let http = HttpTransport::new(config.http_timeout)?;
    Ok(ExtendedTransport::new(http, destination.extend_request(settings)))
}

async fn send<D: Destination>(
    destination: &D,
    settings: D::Settings,
    args: &SendArgs,
    config: &Config,
) -> Result<Value> {
    let action = destination.definition().find_action(&args.action)?.clone();

    let mut runner = ActionRunner::new(action, transport(destination, &settings, config)?)
        .use_default_mappings(args.use_default_mappings);
    if let Some(path) = &args.mapping {
        runner = runner.with_mapping(Mapping::from_json(&read_json(path)?)?)?;
    }

    let input = read_json(&args.events)?;
    match events_input(input).with_context(|| format!("reading events from {}", args.events.display()))? {
        EventsInput::Many(events) => {
            info!(action = %args.action, count = events.len(), "Sending batch");
            let outcome = runner.execute_batch(&events).await?;
            Ok(outcome_json(&outcome))
        }
        EventsInput::One(event) => {
            info!(action = %args.action, "Sending event");
            let response = runner.execute(&event).await?;
            Ok(response_json(&response))
        }
    }
}

#[derive(Debug)]
enum EventsInput {
    One(Event),
    Many(Vec<Event>),
}

/// An object is one event; an array must hold only objects.
fn events_input(value: Value) -> Result<EventsInput> {
    match value {
        Value::Object(_) => Ok(EventsInput::One(Event::new(value))),
        Value::Array(items) => {
            let events = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(_) => Ok(Event::new(item)),
                    other => bail!("event at index {index} is a JSON {}, not an object", kind(&other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(EventsInput::Many(events))
        }
        other => bail!(
            "expected a JSON object or an array of objects, found a JSON {}",
            kind(&other)
        ),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

async fn test_auth<D: Destination>(destination: &D, settings: D::Settings, config: &Config) -> Result<Value> {
    let transport = transport(destination, &settings, config)?;
    let response = destination.definition().authentication.test(&transport).await?;
    Ok(match response {
        Some(response) => response_json(&response),
        None => json!({ "tested": false }),
    })
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn response_json(response: &Response) -> Value {
    json!({ "status": response.status, "body": response.body })
}

fn outcome_json(outcome: &BatchOutcome) -> Value {
    json!({
        "responses": outcome
            .responses
            .iter()
            .map(|d| {
                json!({
                    "indices": d.indices,
                    "status": d.response.status,
                    "body": d.response.body,
                })
            })
            .collect::<Vec<_>>(),
        "rejected": outcome
            .rejected
            .iter()
            .map(|r| json!({ "index": r.index, "error": r.error.to_string() }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_object_is_one_event() {
        let input = events_input(json!({ "messageId": "m1" })).unwrap();
        assert!(matches!(input, EventsInput::One(e) if e.as_value()["messageId"] == "m1"));
    }

    #[test]
    fn an_array_of_objects_is_a_batch() {
        let input = events_input(json!([{ "messageId": "m1" }, { "messageId": "m2" }])).unwrap();
        assert!(matches!(input, EventsInput::Many(events) if events.len() == 2));
    }

    #[test]
    fn scalars_are_not_events() {
        for value in [json!("m1"), json!(42), json!(true), json!(null)] {
            let err = events_input(value.clone()).unwrap_err();
            assert!(
                err.to_string().starts_with("expected a JSON object or an array of objects"),
                "input {value}: {err}"
            );
        }
    }

    #[test]
    fn non_object_array_elements_are_named_by_index() {
        let err = events_input(json!([{ "messageId": "m1" }, "m2"])).unwrap_err();
        assert_eq!(err.to_string(), "event at index 1 is a JSON string, not an object");
    }
}
