use std::fmt;

use crate::{Error, ModelName, ObjectId, Scope, Timestamp};

/// Name shown for comments posted without a nickname
pub const DEFAULT_NICKNAME: &str = "匿名书友";

/// Maximum nickname length accepted by the backend, in characters
pub const MAX_NICKNAME_LEN: usize = 50;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,

    #[serde(default)]
    pub nickname: String,

    pub content: String,

    pub created_at: Timestamp,

    /// None for top-level comments
    #[serde(default, rename = "parent")]
    pub parent_id: Option<CommentId>,

    /// Child comments, only filled in when the server sends a pre-nested tree
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn display_name(&self) -> &str {
        match self.nickname.trim() {
            "" => DEFAULT_NICKNAME,
            name => name,
        }
    }
}

/// A comment as composed client-side, before the server assigned it an id
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Draft {
    pub model: ModelName,
    pub object_id: ObjectId,
    pub content: String,
    pub nickname: String,
    pub parent: Option<CommentId>,
}

impl Draft {
    /// Returns None if `content` is blank, as there is nothing to send then
    pub fn new(
        scope: &Scope,
        content: &str,
        nickname: &str,
        parent: Option<CommentId>,
    ) -> Option<Draft> {
        if content.trim().is_empty() {
            return None;
        }
        let nickname = match nickname.trim() {
            "" => DEFAULT_NICKNAME,
            name => name,
        };
        Some(Draft {
            model: scope.model.clone(),
            object_id: scope.object_id,
            content: String::from(content),
            nickname: String::from(nickname),
            parent,
        })
    }

    pub fn scope(&self) -> Scope {
        Scope {
            model: self.model.clone(),
            object_id: self.object_id,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(self.model.as_str())?;
        crate::validate_string(&self.content)?;
        crate::validate_string(&self.nickname)?;
        if self.content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }
        let nickname_len = self.nickname.chars().count();
        if nickname_len > MAX_NICKNAME_LEN {
            return Err(Error::NicknameTooLong(nickname_len));
        }
        Ok(())
    }
}
