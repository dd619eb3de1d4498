use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::{IntoParams, ToSchema};

use crate::models::{NewNote, Note, NotePatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
    /// Completion flag
    pub is_done: bool,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
    /// Completion flag, `false` when omitted
    #[serde(default, deserialize_with = "flag")]
    pub is_done: bool,
}

/// Every field is optional. Only the fields present in the body are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New content
    #[serde(default)]
    pub content: Option<String>,
    /// New completion flag
    #[serde(default, deserialize_with = "optional_flag")]
    #[schema(value_type = Option<bool>)]
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotesQuery {
    /// Only return notes with this completion state
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteNoteResponse {
    /// Always `true` on success
    #[serde(rename = "OK")]
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Greeting text
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub detail: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            is_done: note.is_done,
            created_at: note.created_at,
        }
    }
}

impl From<CreateNoteRequest> for NewNote {
    fn from(request: CreateNoteRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            is_done: request.is_done,
        }
    }
}

impl From<UpdateNoteRequest> for NotePatch {
    fn from(request: UpdateNoteRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            is_done: request.is_done,
        }
    }
}

const FLAG_EXPECTED: &str = "a boolean, 0/1, true/false, t/f, yes/no, y/n or on/off";

// Older clients send the flag as a string or a number, in a body or a query
// string. Both accept the same spellings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Flag {
    fn into_bool<E: de::Error>(self) -> Result<bool, E> {
        match self {
            Self::Bool(value) => Ok(value),
            Self::Int(1) => Ok(true),
            Self::Int(0) => Ok(false),
            Self::Int(other) => Err(E::invalid_value(
                de::Unexpected::Signed(other),
                &FLAG_EXPECTED,
            )),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
                "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &FLAG_EXPECTED)),
            },
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Flag::deserialize(deserializer)?.into_bool()
}

fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Option::<Flag>::deserialize(deserializer)?
        .map(Flag::into_bool)
        .transpose()
}
