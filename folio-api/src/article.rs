use std::{fmt, str::FromStr};

use crate::{Error, ModelName, ObjectId, Timestamp};

/// Default page size of the article list endpoints
pub const PAGE_SIZE: usize = 12;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Article {
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub today_views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,

    /// Model name the comments and reactions of this article are scoped to
    #[serde(default, rename = "type")]
    pub model: Option<ModelName>,

    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ArticleSummary {
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub likes: u64,
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<&Article> for ArticleSummary {
    fn from(a: &Article) -> ArticleSummary {
        ArticleSummary {
            id: a.id,
            title: a.title.clone(),
            author: a.author.clone(),
            total_views: a.total_views,
            likes: a.likes,
            updated_at: a.updated_at,
            image_url: a.image_url.clone(),
        }
    }
}

/// One page of a paginated listing
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Field article listings can be sorted on
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    TotalViews,
}

impl SortField {
    pub fn name(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::TotalViews => "total_views",
        }
    }
}

/// Sort order of a listing, written `field` or `-field` on the wire
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ordering {
    pub field: SortField,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: SortField) -> Ordering {
        Ordering {
            field,
            descending: false,
        }
    }

    pub fn desc(field: SortField) -> Ordering {
        Ordering {
            field,
            descending: true,
        }
    }
}

/// Most recently updated first
impl Default for Ordering {
    fn default() -> Ordering {
        Ordering::desc(SortField::UpdatedAt)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.descending { "-" } else { "" };
        write!(f, "{sign}{}", self.field.name())
    }
}

impl FromStr for Ordering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Ordering, Error> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, s),
        };
        let field = [SortField::CreatedAt, SortField::UpdatedAt, SortField::TotalViews]
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::Invalid(format!("cannot order by {s:?}")))?;
        Ok(Ordering { field, descending })
    }
}

impl TryFrom<String> for Ordering {
    type Error = Error;

    fn try_from(s: String) -> Result<Ordering, Error> {
        s.parse()
    }
}

impl From<Ordering> for String {
    fn from(o: Ordering) -> String {
        o.to_string()
    }
}

/// Parameters of an article list request
///
/// Serializes to the query string of the list endpoint.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ListQuery {
    /// Starts at 1
    #[serde(default = "first_page")]
    pub page: u32,
    /// Whitespace-separated terms, each of which must appear in the article
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub ordering: Ordering,
}

fn first_page() -> u32 {
    1
}

impl Default for ListQuery {
    fn default() -> ListQuery {
        ListQuery::page(1)
    }
}

impl ListQuery {
    pub fn page(page: u32) -> ListQuery {
        ListQuery {
            page,
            search: None,
            ordering: Ordering::default(),
        }
    }

    /// Blank searches are dropped
    pub fn search(mut self, terms: &str) -> ListQuery {
        let terms = terms.trim();
        self.search = (!terms.is_empty()).then(|| String::from(terms));
        self
    }

    pub fn ordering(mut self, ordering: Ordering) -> ListQuery {
        self.ordering = ordering;
        self
    }

    /// Whether all search terms appear, case-insensitively, in one of `fields`
    pub fn matches(&self, fields: &[&str]) -> bool {
        let search = match &self.search {
            Some(s) => s.to_lowercase(),
            None => return true,
        };
        let fields = fields.iter().map(|f| f.to_lowercase()).collect::<Vec<_>>();
        search
            .split_whitespace()
            .all(|term| fields.iter().any(|f| f.contains(term)))
    }
}
