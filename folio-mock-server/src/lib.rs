use std::collections::{BTreeMap, HashMap, HashSet};

use folio_client::api::{
    Article, ArticleSummary, Category, Comment, CommentId, Draft, Error, ListQuery, ModelName,
    ObjectId, Page, ReactionKind, Scope, SortField, Timestamp, ToggleAction, ToggleRequest,
    ToggleResponse, DEFAULT_NICKNAME, PAGE_SIZE,
};

mod http;
pub use http::{router, spawn, ErrorResponse, SharedServer, SESSION_HEADER};

mod transport;
pub use transport::{Call, MockTransport};

/// Identifies an anonymous visitor, for reactions
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> SessionKey {
        SessionKey(key.into())
    }
}

/// Initial content of a mock server
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Seed {
    /// Each article must have its `type` set
    pub articles: Vec<Article>,
    pub comments: Vec<SeedComment>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedComment {
    pub model: ModelName,
    pub object_id: ObjectId,
    /// Flat: `replies` is ignored, `parent` links to earlier comments
    #[serde(flatten)]
    pub comment: Comment,
}

#[derive(Debug)]
struct DbComment {
    comment: Comment,
    active: bool,
}

/// In-memory implementation of the backend
#[derive(Debug, Default)]
pub struct MockServer {
    comments: BTreeMap<Scope, Vec<DbComment>>,
    last_comment_id: i64,
    articles: BTreeMap<ModelName, BTreeMap<ObjectId, Article>>,
    reactions: HashMap<SessionKey, HashMap<(ModelName, ObjectId), ReactionKind>>,
    moderate: bool,
    flat_payloads: bool,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn from_seed(seed: Seed) -> Result<MockServer, Error> {
        let mut res = MockServer::new();
        for a in seed.articles {
            res.add_article(a)?;
        }
        for c in seed.comments {
            res.add_comment(
                Scope {
                    model: c.model,
                    object_id: c.object_id,
                },
                c.comment,
            )?;
        }
        Ok(res)
    }

    /// When set, new comments are hidden until `set_active` is called on them
    pub fn set_moderation(&mut self, moderate: bool) {
        self.moderate = moderate;
    }

    /// When set, comments are listed flat instead of as a tree of replies
    pub fn set_flat_payloads(&mut self, flat: bool) {
        self.flat_payloads = flat;
    }

    pub fn add_article(&mut self, article: Article) -> Result<(), Error> {
        let model = article
            .model
            .clone()
            .ok_or_else(|| Error::Invalid(format!("article {} has no type", article.id)))?;
        Category::by_model(&model)?;
        self.articles
            .entry(model)
            .or_default()
            .insert(article.id, article);
        Ok(())
    }

    /// Inserts a comment as-is, keeping its id and timestamp
    pub fn add_comment(&mut self, scope: Scope, mut comment: Comment) -> Result<(), Error> {
        if self.find_comment(comment.id).is_some() {
            return Err(Error::Invalid(format!("comment id {} already used", comment.id)));
        }
        self.check_parent(&scope, comment.parent_id)?;
        comment.replies.clear();
        self.last_comment_id = self.last_comment_id.max(comment.id.0);
        self.comments.entry(scope).or_default().push(DbComment {
            comment,
            active: true,
        });
        Ok(())
    }

    pub fn set_active(&mut self, id: CommentId, active: bool) -> Result<(), Error> {
        let c = self
            .comments
            .values_mut()
            .flat_map(|cs| cs.iter_mut())
            .find(|c| c.comment.id == id)
            .ok_or_else(|| Error::NotFound(format!("comment {id}")))?;
        c.active = active;
        Ok(())
    }

    /// Number of comments stored for `scope`, including hidden ones
    pub fn comment_count(&self, scope: &Scope) -> usize {
        self.comments.get(scope).map(|cs| cs.len()).unwrap_or(0)
    }

    fn find_comment(&self, id: CommentId) -> Option<(&Scope, &Comment)> {
        self.comments.iter().find_map(|(scope, cs)| {
            cs.iter()
                .find(|c| c.comment.id == id)
                .map(|c| (scope, &c.comment))
        })
    }

    fn check_parent(&self, scope: &Scope, parent: Option<CommentId>) -> Result<(), Error> {
        let parent = match parent {
            None => return Ok(()),
            Some(p) => p,
        };
        match self.find_comment(parent) {
            Some((parent_scope, _)) if parent_scope == scope => Ok(()),
            Some(_) => Err(Error::Invalid(format!("comment {parent} belongs to another article"))),
            None => Err(Error::Invalid(format!("parent comment {parent} does not exist"))),
        }
    }

    /// Active comments of the scope, newest first at every level
    ///
    /// Replies to hidden comments are hidden along with them. Unknown models
    /// have no comments.
    pub fn fetch_comments(&self, scope: &Scope) -> Vec<Comment> {
        let comments = match self.comments.get(scope) {
            Some(cs) => cs,
            None => return Vec::new(),
        };
        let mut children = HashMap::<Option<CommentId>, Vec<&Comment>>::new();
        for c in comments.iter().filter(|c| c.active) {
            children
                .entry(c.comment.parent_id)
                .or_default()
                .push(&c.comment);
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        }

        let mut res = Vec::new();
        match self.flat_payloads {
            true => {
                let mut stack = vec![None];
                while let Some(parent) = stack.pop() {
                    for c in children.get(&parent).into_iter().flatten() {
                        res.push(Comment {
                            replies: Vec::new(),
                            ..(*c).clone()
                        });
                        stack.push(Some(c.id));
                    }
                }
                res.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            }
            false => {
                let mut seen = HashSet::new();
                for c in children.get(&None).into_iter().flatten() {
                    res.push(nest(c, &children, &mut seen));
                }
            }
        }
        res
    }

    pub fn post_comment(&mut self, draft: Draft) -> Result<Comment, Error> {
        draft.validate()?;
        Category::by_model(&draft.model)?;
        let scope = draft.scope();
        self.check_parent(&scope, draft.parent)?;

        self.last_comment_id += 1;
        let comment = Comment {
            id: CommentId(self.last_comment_id),
            nickname: match draft.nickname.trim() {
                "" => String::from(DEFAULT_NICKNAME),
                name => String::from(name),
            },
            content: draft.content,
            created_at: Timestamp::now(),
            parent_id: draft.parent,
            replies: Vec::new(),
        };
        self.comments.entry(scope).or_default().push(DbComment {
            comment: comment.clone(),
            active: !self.moderate,
        });
        Ok(comment)
    }

    pub fn toggle_reaction(
        &mut self,
        session: &SessionKey,
        req: ToggleRequest,
    ) -> Result<ToggleResponse, Error> {
        Category::by_model(&req.model)?;
        let article = self
            .articles
            .get_mut(&req.model)
            .and_then(|a| a.get_mut(&req.id))
            .ok_or_else(|| Error::NotFound(format!("{} {}", req.model, req.id)))?;
        let reactions = self.reactions.entry(session.clone()).or_default();
        let key = (req.model, req.id);

        let previous = reactions.get(&key).copied();
        let (action, current) = match previous {
            Some(p) if p == req.kind => {
                reactions.remove(&key);
                (ToggleAction::Removed, None)
            }
            Some(_) => {
                reactions.insert(key, req.kind);
                (ToggleAction::Switched, Some(req.kind))
            }
            None => {
                reactions.insert(key, req.kind);
                (ToggleAction::Created, Some(req.kind))
            }
        };
        if let Some(p) = previous {
            let n = counter(article, p);
            *n = n.saturating_sub(1);
        }
        if let Some(c) = current {
            *counter(article, c) += 1;
        }
        Ok(ToggleResponse {
            action,
            current,
            likes: Some(article.likes),
            dislikes: Some(article.dislikes),
        })
    }

    /// Article detail, counting one view
    pub fn article(&mut self, api_path: &str, id: ObjectId) -> Result<Article, Error> {
        let category = Category::by_api_path(api_path)?;
        let article = self
            .articles
            .get_mut(&category.model_name())
            .and_then(|a| a.get_mut(&id))
            .ok_or_else(|| Error::NotFound(format!("{} {id}", category.key)))?;
        article.total_views += 1;
        article.today_views += 1;
        Ok(article.clone())
    }

    /// Articles of a category matching `query`, ties broken by id
    pub fn articles(
        &self,
        api_path: &str,
        query: &ListQuery,
    ) -> Result<Page<ArticleSummary>, Error> {
        let category = Category::by_api_path(api_path)?;
        let mut all = self
            .articles
            .get(&category.model_name())
            .map(|a| a.values().collect::<Vec<_>>())
            .unwrap_or_default();
        all.retain(|a| query.matches(&[&a.title, &a.content, &a.author]));
        let ordering = query.ordering;
        all.sort_by(|a, b| {
            let ord = match ordering.field {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::TotalViews => a.total_views.cmp(&b.total_views),
            };
            let ord = ord.then(a.id.cmp(&b.id));
            match ordering.descending {
                true => ord.reverse(),
                false => ord,
            }
        });

        let pages = ((all.len() + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let page = query.page as usize;
        if page == 0 || page > pages {
            return Err(Error::NotFound(String::from("Invalid page.")));
        }
        // search terms are not echoed back, clients page with their own query
        let link = |p: usize| match ordering == Default::default() {
            true => format!("/api/articles/{}/?page={p}", category.api_path),
            false => format!("/api/articles/{}/?ordering={ordering}&page={p}", category.api_path),
        };
        Ok(Page {
            count: all.len(),
            next: (page < pages).then(|| link(page + 1)),
            previous: (page > 1).then(|| link(page - 1)),
            results: all
                .into_iter()
                .skip((page - 1) * PAGE_SIZE)
                .take(PAGE_SIZE)
                .map(ArticleSummary::from)
                .collect(),
        })
    }
}

fn counter(article: &mut Article, kind: ReactionKind) -> &mut u64 {
    match kind {
        ReactionKind::Like => &mut article.likes,
        ReactionKind::Dislike => &mut article.dislikes,
    }
}

fn nest(
    c: &Comment,
    children: &HashMap<Option<CommentId>, Vec<&Comment>>,
    seen: &mut HashSet<CommentId>,
) -> Comment {
    seen.insert(c.id);
    let replies = children
        .get(&Some(c.id))
        .into_iter()
        .flatten()
        .filter(|r| !seen.contains(&r.id))
        .copied()
        .collect::<Vec<_>>();
    Comment {
        replies: replies
            .into_iter()
            .map(|r| nest(r, children, seen))
            .collect(),
        ..c.clone()
    }
}
