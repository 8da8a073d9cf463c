//! Azure declaration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Invalid argument for {resource}: {message}")]
    InvalidArgument { resource: String, message: String },

    #[error("Cloud error: {0}")]
    Cloud(#[from] stackflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, AzureError>;

