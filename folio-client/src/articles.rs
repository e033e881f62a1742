use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    api::{Article, ArticleSummary, Category, ListQuery, ModelName, ObjectId, Page},
    FetchError, Transport,
};

struct Cached<V> {
    value: Rc<V>,
    stale: bool,
}

impl<V> Cached<V> {
    fn fresh(&self) -> Option<Rc<V>> {
        (!self.stale).then(|| self.value.clone())
    }
}

#[derive(Default)]
struct Cache {
    details: HashMap<(&'static str, ObjectId), Cached<Article>>,
    lists: HashMap<(&'static str, ListQuery), Cached<Page<ArticleSummary>>>,
}

/// Cache of article details and list pages, keyed by category and query
pub struct ArticleStore<T> {
    transport: Rc<T>,
    cache: Rc<RefCell<Cache>>,
}

impl<T> Clone for ArticleStore<T> {
    fn clone(&self) -> Self {
        ArticleStore {
            transport: self.transport.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T> ArticleStore<T> {
    pub fn new(transport: Rc<T>) -> ArticleStore<T> {
        ArticleStore {
            transport,
            cache: Rc::new(RefCell::new(Cache::default())),
        }
    }

    pub fn transport(&self) -> &Rc<T> {
        &self.transport
    }

    /// Marks the article and the list pages of its category stale, eg. after
    /// its counts changed
    pub fn invalidate_object(&self, model: &ModelName, id: ObjectId) {
        let category = match Category::by_model(model) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(%model, %id, "not invalidating articles: {e}");
                return;
            }
        };
        tracing::debug!(category = category.key, %id, "invalidating article");
        let mut cache = self.cache.borrow_mut();
        if let Some(c) = cache.details.get_mut(&(category.key, id)) {
            c.stale = true;
        }
        for ((key, _), c) in cache.lists.iter_mut() {
            if *key == category.key {
                c.stale = true;
            }
        }
    }
}

impl<T: Transport> ArticleStore<T> {
    pub async fn article(
        &self,
        category_key: &str,
        id: ObjectId,
    ) -> Result<Rc<Article>, FetchError> {
        let category = Category::by_key(category_key).map_err(FetchError::ScopeNotFound)?;
        let key = (category.key, id);
        let cached = self
            .cache
            .borrow()
            .details
            .get(&key)
            .and_then(Cached::fresh);
        if let Some(article) = cached {
            return Ok(article);
        }

        let article = self
            .transport
            .fetch_article(category, id)
            .await
            .map_err(|e| FetchError::transport(format!("{} article {id}", category.key), e))?;
        let article = Rc::new(article);
        self.cache.borrow_mut().details.insert(
            key,
            Cached {
                value: article.clone(),
                stale: false,
            },
        );
        Ok(article)
    }

    /// Pages start at 1, page 0 is read as the first one
    pub async fn list(
        &self,
        category_key: &str,
        query: &ListQuery,
    ) -> Result<Rc<Page<ArticleSummary>>, FetchError> {
        let category = Category::by_key(category_key).map_err(FetchError::ScopeNotFound)?;
        let mut query = query.clone();
        query.page = query.page.max(1);
        let key = (category.key, query);
        let cached = self.cache.borrow().lists.get(&key).and_then(Cached::fresh);
        if let Some(page) = cached {
            return Ok(page);
        }

        let (_, query) = &key;
        let what = format!("{} page {}", category.key, query.page);
        let res = self
            .transport
            .fetch_articles(category, query)
            .await
            .map_err(|e| FetchError::transport(what, e))?;
        let res = Rc::new(res);
        self.cache.borrow_mut().lists.insert(
            key,
            Cached {
                value: res.clone(),
                stale: false,
            },
        );
        Ok(res)
    }
}
