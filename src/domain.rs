use crate::credentials::Credentials;
use crate::errors::ApiError;
use crate::models::{Author, Comment, LoginResponse, Meme, NewMeme, Page};
use async_trait::async_trait;

/// Operations of the remote meme REST API.
///
/// Every authenticated call takes the session's [`Credentials`] explicitly;
/// implementations clear them when the server answers 401.
#[async_trait]
pub trait MemeApi: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Exchanges a username/password pair for a JWT.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// `GET /users/{id}`
    async fn get_user(&self, creds: &Credentials, id: &str) -> Result<Author, ApiError>;

    /// `GET /memes?page=N`, pages are 1-based.
    async fn get_memes(&self, creds: &Credentials, page: u32) -> Result<Page<Meme>, ApiError>;

    /// `GET /memes/{id}/comments?page=N`
    async fn get_meme_comments(
        &self,
        creds: &Credentials,
        meme_id: &str,
        page: u32,
    ) -> Result<Page<Comment>, ApiError>;

    /// `POST /memes/{id}/comments`
    async fn create_comment(
        &self,
        creds: &Credentials,
        meme_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError>;

    /// `POST /memes` (multipart)
    async fn create_meme(&self, creds: &Credentials, meme: NewMeme) -> Result<Meme, ApiError>;
}
