use crate::{
    credentials::Credentials,
    domain::MemeApi,
    errors::ApiError,
    models::{Meme, MemeText, NewMeme},
    picture::{self, PictureLayout},
};
use rand::Rng;
use std::path::{Path, PathBuf};

/// A meme being composed: picture, description and draggable captions.
#[derive(Debug, Clone, Default)]
pub struct MemeDraft {
    picture: Option<PathBuf>,
    pub description: String,
    texts: Vec<MemeText>,
}

impl MemeDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_picture(&mut self, path: impl Into<PathBuf>) {
        self.picture = Some(path.into());
    }

    pub fn picture(&self) -> Option<&Path> {
        self.picture.as_deref()
    }

    pub fn captions(&self) -> &[MemeText] {
        &self.texts
    }

    /// Adds "New caption N" somewhere in the top-left quarter of the picture.
    ///
    /// There is nothing to place a caption on until a picture is chosen.
    pub fn add_caption(&mut self) -> Result<usize, ApiError> {
        self.add_caption_with(&mut rand::thread_rng())
    }

    pub fn add_caption_with<R: Rng>(&mut self, rng: &mut R) -> Result<usize, ApiError> {
        if self.picture.is_none() {
            return Err(ApiError::InvalidInput("choose a picture before adding captions".into()));
        }
        let text = MemeText {
            content: format!("New caption {}", self.texts.len() + 1),
            x: rng.gen_range(0.0..picture::REF_WIDTH / 2.0),
            y: rng.gen_range(0.0..picture::REF_HEIGHT / 2.0),
        };
        self.texts.push(text);
        Ok(self.texts.len() - 1)
    }

    /// Adds a caption with explicit content and reference-frame position.
    pub fn push_caption(&mut self, content: impl Into<String>, x: f64, y: f64) {
        self.texts.push(MemeText {
            content: content.into(),
            x,
            y,
        });
    }

    pub fn update_caption(&mut self, index: usize, content: impl Into<String>) -> Result<(), ApiError> {
        self.caption_mut(index)?.content = content.into();
        Ok(())
    }

    pub fn delete_caption(&mut self, index: usize) -> Result<MemeText, ApiError> {
        self.caption_mut(index)?;
        Ok(self.texts.remove(index))
    }

    /// Moves a caption to a position in the reference frame.
    pub fn move_caption(&mut self, index: usize, x: f64, y: f64) -> Result<(), ApiError> {
        let text = self.caption_mut(index)?;
        text.x = x;
        text.y = y;
        Ok(())
    }

    /// Moves a caption to where it was dropped on a picture displayed at the given size.
    pub fn drag_caption(
        &mut self,
        index: usize,
        container_width: f64,
        container_height: f64,
        x: f64,
        y: f64,
    ) -> Result<(), ApiError> {
        let (x, y) = picture::drag_to(container_width, container_height, x, y);
        self.move_caption(index, x, y)
    }

    /// Caption layout for a preview, once a picture is chosen.
    pub fn preview(&self, box_width: Option<f64>) -> Option<PictureLayout> {
        self.picture.as_ref()?;
        Some(picture::layout(&self.texts, box_width))
    }

    /// Reads the picture and builds the upload payload.
    pub async fn build_upload(&self) -> Result<NewMeme, ApiError> {
        let path = self
            .picture
            .as_ref()
            .ok_or_else(|| ApiError::InvalidInput("a picture is required".into()))?;
        let picture = tokio::fs::read(path).await?;
        if picture.is_empty() {
            return Err(ApiError::InvalidInput("picture data cannot be empty".into()));
        }
        let picture_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "picture".to_string());

        Ok(NewMeme {
            picture_name,
            picture,
            description: self.description.clone(),
            texts: self.texts.clone(),
        })
    }

    pub async fn publish(&self, api: &dyn MemeApi, creds: &Credentials) -> Result<Meme, ApiError> {
        let new_meme = self.build_upload().await?;
        api.create_meme(creds, new_meme).await
    }

    fn caption_mut(&mut self, index: usize) -> Result<&mut MemeText, ApiError> {
        let len = self.texts.len();
        self.texts
            .get_mut(index)
            .ok_or_else(|| ApiError::InvalidInput(format!("no caption {} (have {})", index, len)))
    }
}
