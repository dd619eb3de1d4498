use crate::{
    dto::{CreateNoteRequest, NoteResponse, UpdateNoteRequest},
    repository::Database,
};

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Note {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Clone)]
pub struct NoteService {
    db: Arc<Database>,
}

impl NoteService {
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_note(
        &self,
        request: CreateNoteRequest,
    ) -> Result<NoteResponse, ServiceError> {
        let note = self.db.session().insert_note(request.into())?;

        tracing::info!("Created note {}", note.id);

        Ok(note.into())
    }

    pub async fn list_notes(&self, is_done: Option<bool>) -> Result<Vec<NoteResponse>, ServiceError> {
        let notes = self.db.session().list_notes(is_done)?;

        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }

    pub async fn get_note(&self, id: i64) -> Result<NoteResponse, ServiceError> {
        self.db
            .session()
            .get_note(id)?
            .map(NoteResponse::from)
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: UpdateNoteRequest,
    ) -> Result<NoteResponse, ServiceError> {
        let note = self
            .db
            .session()
            .update_note(id, request.into())?
            .ok_or(ServiceError::NotFound(id))?;

        tracing::info!("Updated note {}", note.id);

        Ok(note.into())
    }

    pub async fn delete_note(&self, id: i64) -> Result<(), ServiceError> {
        if !self.db.session().delete_note(id)? {
            return Err(ServiceError::NotFound(id));
        }

        tracing::info!("Deleted note {id}");

        Ok(())
    }
}
