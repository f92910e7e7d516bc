use crate::{
    credentials::Credentials,
    domain::MemeApi,
    errors::ApiError,
    models::{
        Author, Comment, CreateCommentRequest, LoginRequest, LoginResponse, Meme, NewMeme, Page,
    },
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{self, info};
use url::Url;

/// [`MemeApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMemeApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpMemeApi {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidInput(format!("not an API base URL: {}", base_url)));
        }
        info!(%base_url, "Initializing HttpMemeApi");
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.clone(),
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attaches the bearer token, if any.
    fn authed(&self, builder: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        match creds.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and decodes a successful JSON body.
    async fn send<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        creds: Option<&Credentials>,
    ) -> Result<R, ApiError> {
        let resp = builder.send().await?;
        let resp = check_status(resp, creds).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }
}

/// Maps status codes onto the error taxonomy.
///
/// A 401 clears `creds` before returning, so every holder of the session sees
/// the sign-out.
async fn check_status(resp: Response, creds: Option<&Credentials>) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!(url = %resp.url(), "API answered 401, clearing credentials");
        if let Some(creds) = creds {
            creds.clear();
        }
        return Err(ApiError::Unauthorized);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(resp.url().path().to_string()));
    }
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp)
}

/// Builds the multipart body of `POST /memes`.
fn meme_form(meme: NewMeme) -> Result<Form, ApiError> {
    let mime = mime_guess::from_path(&meme.picture_name)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let picture = Part::bytes(meme.picture)
        .file_name(meme.picture_name)
        .mime_str(mime)?;

    let mut form = Form::new()
        .part("picture", picture)
        .text("description", meme.description);
    for (index, text) in meme.texts.into_iter().enumerate() {
        form = form
            .text(format!("texts[{}][content]", index), text.content)
            .text(format!("texts[{}][x]", index), (text.x.round() as i64).to_string())
            .text(format!("texts[{}][y]", index), (text.y.round() as i64).to_string());
    }
    Ok(form)
}

#[async_trait]
impl MemeApi for HttpMemeApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        tracing::debug!(%username, "Logging in");
        let req = self.http.post(self.url(&["authentication", "login"])).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        self.send(req, None).await
    }

    async fn get_user(&self, creds: &Credentials, id: &str) -> Result<Author, ApiError> {
        tracing::debug!(user_id = %id, "Fetching user");
        let req = self.authed(self.http.get(self.url(&["users", id])), creds);
        self.send(req, Some(creds)).await
    }

    async fn get_memes(&self, creds: &Credentials, page: u32) -> Result<Page<Meme>, ApiError> {
        tracing::debug!(page, "Fetching memes page");
        let req = self.authed(
            self.http.get(self.url(&["memes"])).query(&[("page", page)]),
            creds,
        );
        self.send(req, Some(creds)).await
    }

    async fn get_meme_comments(
        &self,
        creds: &Credentials,
        meme_id: &str,
        page: u32,
    ) -> Result<Page<Comment>, ApiError> {
        tracing::debug!(%meme_id, page, "Fetching comments page");
        let req = self.authed(
            self.http
                .get(self.url(&["memes", meme_id, "comments"]))
                .query(&[("page", page)]),
            creds,
        );
        self.send(req, Some(creds)).await
    }

    async fn create_comment(
        &self,
        creds: &Credentials,
        meme_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let req = self.authed(
            self.http
                .post(self.url(&["memes", meme_id, "comments"]))
                .json(&CreateCommentRequest {
                    content: content.to_string(),
                }),
            creds,
        );
        let comment: Comment = self.send(req, Some(creds)).await?;
        tracing::info!(%meme_id, comment_id = %comment.id, "Comment created");
        Ok(comment)
    }

    async fn create_meme(&self, creds: &Credentials, meme: NewMeme) -> Result<Meme, ApiError> {
        tracing::debug!(picture = %meme.picture_name, captions = meme.texts.len(), "Uploading meme");
        let form = meme_form(meme)?;
        let req = self.authed(self.http.post(self.url(&["memes"])).multipart(form), creds);
        let meme: Meme = self.send(req, Some(creds)).await?;
        tracing::info!(meme_id = %meme.id, "Meme created");
        Ok(meme)
    }
}
