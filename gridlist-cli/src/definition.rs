//! Loading list definitions and record fixtures.

use std::fs;
use std::path::Path;

use gridlist_lib::ListConfig;
use gridlist_lib::model::EntityDefinition;
use gridlist_lib::model::Record;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::CliError;

/// A list definition file.
#[derive(Debug, Deserialize)]
pub struct Definition {
    #[serde(default = "default_id")]
    pub id: String,
    pub model: EntityDefinition,
    #[serde(default)]
    pub list: ListConfig,
}

fn default_id() -> String {
    "list".to_string()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_definition(path: &Path) -> Result<Definition, CliError> {
    read_json(path)
}

/// Loads records, routing relation keys of `entity` into loaded relations.
pub fn load_records(path: &Path, entity: &EntityDefinition) -> Result<Vec<Record>, CliError> {
    let serde_json::Value::Array(items) = read_json(path)? else {
        return Err(CliError::NotAnArray {
            path: path.to_path_buf(),
        });
    };
    Ok(items
        .into_iter()
        .map(|item| Record::from_json(entity, item))
        .collect())
}
