use crate::{Error, ModelName};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attachment {
    None,
    Image,
    Pdf,
}

/// A section of the site, eg. news or papers
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Category {
    /// Key used in the front-end's URLs
    pub key: &'static str,
    pub label: &'static str,
    /// Path segment under `/articles/`
    pub api_path: &'static str,
    /// Server-side model name, used to scope comments and reactions
    pub model: &'static str,
    pub attachment: Attachment,
}

macro_rules! category {
    ( $key:expr, $label:expr, $api_path:expr, $model:expr, $attachment:ident ) => {
        Category {
            key: $key,
            label: $label,
            api_path: $api_path,
            model: $model,
            attachment: Attachment::$attachment,
        }
    };
}

pub const CATEGORIES: &[Category] = &[
    category!("news", "通讯", "news", "news", Image),
    category!("books", "书讯", "books", "bookinfo", Image),
    category!("reviews", "书评", "reviews", "bookreview", Image),
    category!("opinions", "观点", "opinions", "opinion", Image),
    category!("literature", "文艺", "literature", "literature", Image),
    category!("history", "文史", "history", "history", Image),
    category!("library", "书库", "library", "library", Pdf),
    category!("papers", "论文", "papers", "paper", Pdf),
    category!("classics", "古籍", "classics", "classicbook", Pdf),
    category!("translations", "译林", "translations", "translation", Image),
    category!("qa", "问答", "qa", "qa", None),
    category!("scriptures", "经训", "scriptures", "scripture", None),
];

impl Category {
    pub fn by_key(key: &str) -> Result<&'static Category, Error> {
        CATEGORIES
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| Error::ScopeNotFound(String::from(key)))
    }

    pub fn by_api_path(path: &str) -> Result<&'static Category, Error> {
        CATEGORIES
            .iter()
            .find(|c| c.api_path == path)
            .ok_or_else(|| Error::ScopeNotFound(String::from(path)))
    }

    pub fn by_model(model: &ModelName) -> Result<&'static Category, Error> {
        CATEGORIES
            .iter()
            .find(|c| c.model == model.as_str())
            .ok_or_else(|| Error::ScopeNotFound(model.0.clone()))
    }

    pub fn model_name(&self) -> ModelName {
        ModelName::new(self.model)
    }
}
