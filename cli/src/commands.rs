//! Command handlers. Each one builds a participant and routes it through the
//! sync engine.

use crate::error::{AppError, Result};
use clap::Subcommand;
use keysync_engine::{CollectionRef, Model, Outcome, Participant, SyncEngine, Verb};
use serde_json::Value;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read one record
    Read { key: String },
    /// List every record under a key prefix
    List { prefix: String },
    /// Create a record from a JSON object
    Create { key: String, json: String },
    /// Replace a record with a JSON object
    Update { key: String, json: String },
    /// Delete a record
    Delete { key: String },
    /// Run a verb given by name
    Exec {
        verb: String,
        key: String,
        json: Option<String>,
        /// Treat the key as a collection prefix
        #[arg(long)]
        collection: bool,
    },
}

impl Command {
    /// Execute against `engine` and return the outcome.
    pub async fn run(self, engine: &SyncEngine) -> Result<Outcome> {
        let outcome = match self {
            Command::Read { key } => engine.execute(Verb::Read, &Model::at(key)).await?,
            Command::List { prefix } => {
                engine
                    .execute(Verb::Read, &CollectionRef::new(prefix))
                    .await?
            }
            Command::Create { key, json } => {
                let model = model_with(key, Some(&json))?;
                engine.execute(Verb::Create, &model).await?
            }
            Command::Update { key, json } => {
                let model = model_with(key, Some(&json))?;
                engine.execute(Verb::Update, &model).await?
            }
            Command::Delete { key } => engine.execute(Verb::Delete, &Model::at(key)).await?,
            Command::Exec {
                verb,
                key,
                json,
                collection,
            } => {
                let participant: Box<dyn Participant> = if collection {
                    Box::new(CollectionRef::new(key))
                } else {
                    Box::new(model_with(key, json.as_deref())?)
                };
                engine.execute_named(&verb, participant.as_ref()).await?
            }
        };
        Ok(outcome)
    }
}

/// Build a model at `key`, optionally filled from a JSON object.
fn model_with(key: String, json: Option<&str>) -> Result<Model> {
    let Some(json) = json else {
        return Ok(Model::at(key));
    };

    let record: Value =
        serde_json::from_str(json).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !record.is_object() {
        return Err(AppError::BadRequest(
            "record must be a JSON object".to_string(),
        ));
    }
    Ok(Model::from_record(key, &record))
}
