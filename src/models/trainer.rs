use serde::{Deserialize, Serialize};

/// Roster entry for a person assignable to training events. The roster is
/// owned by an external account system; the engine only ever reads it.
/// Whatever that system looks like (dedicated profile table, user with a
/// role flag), the adapter must hand the engine exactly this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerCreateInput {
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
}
