use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("empty roof")]
    EmptyRoof,

    #[error("empty id")]
    EmptyId,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("id error: {0}")]
    Id(#[from] imsto_types::IdError),

    #[error("entry error: {0}")]
    Entry(#[from] imsto_entry::EntryError),

    #[error("store error: {0}")]
    Store(#[from] imsto_store::StoreError),

    #[error("registry error: {0}")]
    Registry(#[from] imsto_store::RegistryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SdkError {
    pub fn is_not_found(&self) -> bool {
        match self {
            SdkError::NotFound(_) => true,
            SdkError::Store(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
