use std::sync::Arc;

use crate::data::posting_repository::PostingRepository;
use crate::domain::error::DomainError;
use crate::domain::listing::PostingQuery;
use crate::domain::posting::{
    NewPosting, Posting, PostingDetail, PostingSummary, PostingTitle, Report, UpdatePosting,
};
use crate::infrastructure::storage::{FileStorage, StoredFile, UploadedFile};
use tracing::{instrument, warn};
use uuid::Uuid;

/// Storage namespace for posting thumbnails.
pub const THUMBNAIL_NAMESPACE: &str = "postings";

pub fn ensure_writer(posting: &Posting, user_id: Uuid) -> Result<(), DomainError> {
    if posting.writer_id != user_id {
        Err(DomainError::Forbidden)
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostingService<R: PostingRepository + 'static, S: FileStorage + 'static> {
    repo: Arc<R>,
    storage: Arc<S>,
}

impl<R, S> PostingService<R, S>
where
    R: PostingRepository + 'static,
    S: FileStorage + 'static,
{
    pub fn new(repo: Arc<R>, storage: Arc<S>) -> Self {
        Self { repo, storage }
    }

    #[cfg(test)]
    fn storage(&self) -> &S {
        &self.storage
    }

    async fn resolve_thumbnail(&self, posting: &mut Posting) -> Result<(), DomainError> {
        if let Some(key) = posting.thumbnail.take() {
            posting.thumbnail = Some(self.storage.image_url(&key).await?);
        }
        Ok(())
    }

    async fn resolve_all(
        &self,
        mut summaries: Vec<PostingSummary>,
    ) -> Result<Vec<PostingSummary>, DomainError> {
        for summary in &mut summaries {
            self.resolve_thumbnail(&mut summary.posting).await?;
        }
        Ok(summaries)
    }

    /// Removes a stored file the database no longer points at.
    async fn discard(&self, path: &str) {
        if let Err(err) = self.storage.delete(path).await {
            warn!(path = %path, error = %err, "failed to remove stored file");
        }
    }

    async fn owned_posting(&self, writer_id: Uuid, id: Uuid) -> Result<Posting, DomainError> {
        let detail = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostingNotFound(id))?;
        ensure_writer(&detail.posting, writer_id)?;
        Ok(detail.posting)
    }

    #[instrument(skip(self, new, thumbnail))]
    pub async fn create_posting(
        &self,
        writer_id: Uuid,
        new: NewPosting,
        thumbnail: Option<UploadedFile>,
    ) -> Result<Posting, DomainError> {
        let thumbnail = match thumbnail {
            Some(file) => Some(self.storage.upload(THUMBNAIL_NAMESPACE, file).await?.path),
            None => None,
        };

        let posting = Posting::new(writer_id, new, thumbnail.clone());
        match self.repo.create(posting).await {
            Ok(posting) => Ok(posting),
            Err(err) => {
                if let Some(path) = &thumbnail {
                    self.discard(path).await;
                }
                Err(err)
            }
        }
    }

    pub async fn get_posting(&self, id: Uuid) -> Result<PostingDetail, DomainError> {
        let mut detail = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostingNotFound(id))?;
        self.resolve_thumbnail(&mut detail.posting).await?;
        Ok(detail)
    }

    pub async fn list_postings(
        &self,
        query: &PostingQuery,
    ) -> Result<Vec<PostingSummary>, DomainError> {
        let postings = self.repo.find_all(query).await?;
        self.resolve_all(postings).await
    }

    pub async fn search_titles(&self, keyword: &str) -> Result<Vec<PostingTitle>, DomainError> {
        self.repo.find_titles(keyword).await
    }

    pub async fn list_by_writer(&self, writer_id: Uuid) -> Result<Vec<PostingSummary>, DomainError> {
        let postings = self.repo.find_by_writer(writer_id).await?;
        self.resolve_all(postings).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_posting(
        &self,
        writer_id: Uuid,
        id: Uuid,
        update: UpdatePosting,
    ) -> Result<Posting, DomainError> {
        let current = self.owned_posting(writer_id, id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        self.repo
            .update(id, writer_id, update)
            .await?
            .ok_or(DomainError::PostingNotFound(id))
    }

    /// Stores a new thumbnail and drops the file it replaces.
    #[instrument(skip(self, file))]
    pub async fn replace_thumbnail(
        &self,
        writer_id: Uuid,
        id: Uuid,
        file: UploadedFile,
    ) -> Result<StoredFile, DomainError> {
        let current = self.owned_posting(writer_id, id).await?;

        let stored = self.storage.upload(THUMBNAIL_NAMESPACE, file).await?;
        if let Err(err) = self.repo.update_thumbnail(id, &stored.path).await {
            self.discard(&stored.path).await;
            return Err(err);
        }

        if let Some(previous) = current.thumbnail {
            self.discard(&previous).await;
        }
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn delete_posting(&self, writer_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let current = self.owned_posting(writer_id, id).await?;
        self.repo.delete(id, writer_id).await?;

        if let Some(thumbnail) = current.thumbnail {
            self.discard(&thumbnail).await;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn like(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.repo.set_liked(id, user_id, true).await
    }

    #[instrument(skip(self))]
    pub async fn unlike(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.repo.set_liked(id, user_id, false).await
    }

    #[instrument(skip(self, reason))]
    pub async fn report(
        &self,
        reporter_id: Uuid,
        id: Uuid,
        reason: String,
    ) -> Result<Report, DomainError> {
        self.repo.report(Report::new(id, reporter_id, reason)).await
    }
}
