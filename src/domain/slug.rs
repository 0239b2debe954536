//! Deterministic, human-friendly slugs for group titles.
//!
//! Slugification itself comes from the `slug` crate; consumers supply a
//! uniqueness predicate (typically a repository lookup) and collisions are
//! resolved with a monotonic numeric suffix.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors from generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// `is_unique` must return `true` when the candidate is free. Collisions are
/// retried with `-2`, `-3`, … suffixes up to a fixed bound.
pub async fn generate_unique_slug<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(base.clone())
        .await
        .map_err(SlugAsyncError::Predicate)?
    {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}
