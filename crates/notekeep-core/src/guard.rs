//! Ownership guard.
//!
//! A record is visible and mutable only by its owner. Existence is checked
//! first, so a missing record is `NotFound` for everybody and an existing
//! record owned by someone else is `Unauthorized`.

use std::fmt;

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Label, Note};
use crate::object_id::ObjectId;

/// Records that belong to a single user.
pub trait Owned {
    fn owner(&self) -> ObjectId;
}

impl Owned for Note {
    fn owner(&self) -> ObjectId {
        self.owner
    }
}

impl Owned for Label {
    fn owner(&self) -> ObjectId {
        self.owner
    }
}

/// Kind of record being guarded, used for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Note,
    Label,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Note => "note",
            Resource::Label => "label",
        }
    }

    pub fn not_found(&self) -> Error {
        match self {
            Resource::Note => Error::NotFound("Note not found".to_string()),
            Resource::Label => Error::NotFound("Label not found".to_string()),
        }
    }

    pub fn unauthorized(&self) -> Error {
        Error::Unauthorized(format!("Not authorized to access this {}", self.as_str()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admit `caller` to `record`, or explain why not.
pub fn authorize<T: Owned>(record: Option<T>, caller: ObjectId, resource: Resource) -> Result<T> {
    let record = record.ok_or_else(|| resource.not_found())?;
    if record.owner() != caller {
        warn!(
            subsystem = "service",
            component = "guard",
            resource = %resource,
            owner_id = %caller,
            "Ownership check rejected caller"
        );
        return Err(resource.unauthorized());
    }
    Ok(record)
}
