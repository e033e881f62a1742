use crate::{ModelName, ObjectId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ToggleRequest {
    pub model: ModelName,
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: ReactionKind,
}

/// What the server did with a toggle request
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Created,
    Switched,
    Removed,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ToggleResponse {
    pub action: ToggleAction,
    pub current: Option<ReactionKind>,

    /// Counts after the toggle, when the server reports them
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub dislikes: Option<u64>,
}

impl ToggleResponse {
    /// The reaction the user now has on the object according to the server
    pub fn resulting_reaction(&self) -> Option<ReactionKind> {
        match self.action {
            ToggleAction::Created | ToggleAction::Switched => self.current,
            ToggleAction::Removed => None,
        }
    }
}
