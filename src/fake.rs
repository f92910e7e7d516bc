//! In-memory [`MemeApi`] used by the unit tests.

use crate::{
    credentials::Credentials,
    domain::MemeApi,
    errors::ApiError,
    models::{Author, Comment, LoginResponse, Meme, MemeText, NewMeme, Page},
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};
use tokio::sync::Semaphore;

pub(crate) struct FakeApi {
    users: HashMap<String, Author>,
    meme_pages: Vec<Page<Meme>>,
    comment_pages: Mutex<HashMap<String, Vec<Page<Comment>>>>,
    user_gate: Option<Semaphore>,
    page_gate: Option<Semaphore>,
    unauthorized: AtomicBool,
    user_calls: Mutex<HashMap<String, usize>>,
    meme_page_calls: Mutex<Vec<u32>>,
    comment_page_calls: Mutex<Vec<(String, u32)>>,
    created_comments: AtomicUsize,
    created_memes: Mutex<Vec<NewMeme>>,
}

pub(crate) fn author(n: usize) -> Author {
    Author {
        id: format!("dummy_user_id_{}", n),
        username: format!("dummy_user_{}", n),
        picture_url: format!("https://dummy.url/user/{}", n),
    }
}

pub(crate) fn meme(n: usize, author: usize) -> Meme {
    Meme {
        id: format!("dummy_meme_id_{}", n),
        author_id: format!("dummy_user_id_{}", author),
        picture_url: format!("https://dummy.url/meme/{}", n),
        description: format!("dummy meme {}", n),
        comments_count: 3,
        texts: vec![
            MemeText { content: "dummy text 1".into(), x: 0.0, y: 0.0 },
            MemeText { content: "dummy text 2".into(), x: 100.0, y: 100.0 },
        ],
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub(crate) fn comment(n: usize, meme: usize, author: usize) -> Comment {
    Comment {
        id: format!("dummy_comment_id_{}", n),
        content: format!("dummy comment {}", n),
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        author_id: format!("dummy_user_id_{}", author),
        meme_id: format!("dummy_meme_id_{}", meme),
    }
}

impl FakeApi {
    pub fn new(meme_pages: Vec<Page<Meme>>) -> Self {
        Self {
            users: (1..=3).map(|n| (author(n).id.clone(), author(n))).collect(),
            meme_pages,
            comment_pages: Mutex::new(HashMap::new()),
            user_gate: None,
            page_gate: None,
            unauthorized: AtomicBool::new(false),
            user_calls: Mutex::new(HashMap::new()),
            meme_page_calls: Mutex::new(Vec::new()),
            comment_page_calls: Mutex::new(Vec::new()),
            created_comments: AtomicUsize::new(0),
            created_memes: Mutex::new(Vec::new()),
        }
    }

    /// Three one-meme pages; meme 1 has three comments on a single page.
    pub fn with_feed() -> Self {
        let pages = (1..=3)
            .map(|n| Page { total: 3, page_size: 1, results: vec![meme(n, n)] })
            .collect();
        Self::new(pages).with_comments(
            "dummy_meme_id_1",
            vec![Page {
                total: 3,
                page_size: 10,
                results: vec![comment(1, 1, 1), comment(2, 1, 2), comment(3, 1, 3)],
            }],
        )
    }

    pub fn with_comments(self, meme_id: &str, pages: Vec<Page<Comment>>) -> Self {
        self.comment_pages.lock().unwrap().insert(meme_id.to_string(), pages);
        self
    }

    /// User lookups block until [`FakeApi::open_user_gate`] releases them.
    pub fn gate_users(mut self) -> Self {
        self.user_gate = Some(Semaphore::new(0));
        self
    }

    /// Page fetches block until [`FakeApi::open_page_gate`] releases them.
    pub fn gate_pages(mut self) -> Self {
        self.page_gate = Some(Semaphore::new(0));
        self
    }

    pub fn open_user_gate(&self, n: usize) {
        if let Some(gate) = &self.user_gate {
            gate.add_permits(n);
        }
    }

    pub fn open_page_gate(&self, n: usize) {
        if let Some(gate) = &self.page_gate {
            gate.add_permits(n);
        }
    }

    pub fn reject_with_401(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    pub fn user_calls(&self, id: &str) -> usize {
        self.user_calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_user_calls(&self) -> usize {
        self.user_calls.lock().unwrap().values().sum()
    }

    pub fn meme_page_calls(&self) -> Vec<u32> {
        self.meme_page_calls.lock().unwrap().clone()
    }

    pub fn comment_page_calls(&self) -> Vec<(String, u32)> {
        self.comment_page_calls.lock().unwrap().clone()
    }

    pub fn created_memes(&self) -> Vec<NewMeme> {
        self.created_memes.lock().unwrap().clone()
    }

    fn check_auth(&self, creds: &Credentials) -> Result<(), ApiError> {
        if self.unauthorized.load(Ordering::SeqCst) || !creds.is_authenticated() {
            creds.clear();
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    async fn pass(gate: &Option<Semaphore>) {
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl MemeApi for FakeApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        if username == "dummy_user_1" && password == "password" {
            Ok(LoginResponse { jwt: crate::credentials::jwt_for("dummy_user_id_1") })
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    async fn get_user(&self, creds: &Credentials, id: &str) -> Result<Author, ApiError> {
        *self.user_calls.lock().unwrap().entry(id.to_string()).or_default() += 1;
        Self::pass(&self.user_gate).await;
        self.check_auth(creds)?;
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/users/{}", id)))
    }

    async fn get_memes(&self, creds: &Credentials, page: u32) -> Result<Page<Meme>, ApiError> {
        self.meme_page_calls.lock().unwrap().push(page);
        Self::pass(&self.page_gate).await;
        self.check_auth(creds)?;
        self.meme_pages
            .get(page as usize - 1)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/memes?page={}", page)))
    }

    async fn get_meme_comments(
        &self,
        creds: &Credentials,
        meme_id: &str,
        page: u32,
    ) -> Result<Page<Comment>, ApiError> {
        self.comment_page_calls.lock().unwrap().push((meme_id.to_string(), page));
        Self::pass(&self.page_gate).await;
        self.check_auth(creds)?;
        let pages = self.comment_pages.lock().unwrap();
        match pages.get(meme_id) {
            Some(pages) => Ok(pages.get(page as usize - 1).cloned().unwrap_or(Page {
                total: 0,
                page_size: 10,
                results: vec![],
            })),
            None => Ok(Page { total: 0, page_size: 10, results: vec![] }),
        }
    }

    async fn create_comment(
        &self,
        creds: &Credentials,
        meme_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError> {
        self.check_auth(creds)?;
        let n = self.created_comments.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Comment {
            id: format!("new_comment_id_{}", n),
            content: content.to_string(),
            created_at: Utc::now(),
            author_id: creds.user_id().unwrap_or_else(|_| "dummy_user_id_1".into()),
            meme_id: meme_id.to_string(),
        })
    }

    async fn create_meme(&self, creds: &Credentials, new_meme: NewMeme) -> Result<Meme, ApiError> {
        self.check_auth(creds)?;
        self.created_memes.lock().unwrap().push(new_meme.clone());
        Ok(Meme {
            id: "new_meme_id".into(),
            author_id: "dummy_user_id_1".into(),
            picture_url: format!("https://dummy.url/{}", new_meme.picture_name),
            description: new_meme.description,
            comments_count: 0,
            texts: new_meme.texts,
            created_at: Utc::now(),
        })
    }
}
