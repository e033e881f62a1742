mod article;
pub use article::{Article, ArticleSummary, ListQuery, Ordering, Page, SortField, PAGE_SIZE};

mod category;
pub use category::{Attachment, Category, CATEGORIES};

mod comment;
pub use comment::{Comment, CommentId, Draft, DEFAULT_NICKNAME, MAX_NICKNAME_LEN};

mod error;
pub use error::Error;

mod reaction;
pub use reaction::{ReactionKind, ToggleAction, ToggleRequest, ToggleResponse};

mod scope;
pub use scope::{ModelName, ObjectId, Scope};

mod time;
pub use time::Timestamp;

pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}
