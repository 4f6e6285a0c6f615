//! Bounded body collection.

use axum::body::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a body could not be collected.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read body: {0}")]
    Read(BoxError),
}

/// Collect `body` into memory, failing once more than `limit` bytes arrive.
pub async fn collect_limited<B>(body: B, limit: usize) -> Result<Bytes, BodyError>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(BodyError::TooLarge { limit })
        }
        Err(err) => Err(BodyError::Read(err)),
    }
}
