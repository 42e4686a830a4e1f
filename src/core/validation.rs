//! Typed settings validation support.

use crate::error::ValidationError;

/// A typed view of the settings that can check itself.
///
/// The view is extracted from the merged settings with top-level keys
/// lowercased, so `DATABASE_URL` lands in a `database_url` field. Register it
/// with `LazySettingsBuilder::with_typed_validation` and setup or reload fails
/// when the check does.
///
/// # Examples
///
/// ```rust
/// use lazy_settings::core::Validate;
/// use lazy_settings::error::ValidationError;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct StoreSettings {
///     database_url: Option<String>,
///     #[serde(default)]
///     pool_size: u32,
/// }
///
/// impl Validate for StoreSettings {
///     fn validate(&self) -> Result<(), ValidationError> {
///         let Some(url) = &self.database_url else {
///             return Err(ValidationError::missing("DATABASE_URL"));
///         };
///         if !url.starts_with("postgres://") {
///             return Err(ValidationError::invalid_field("DATABASE_URL", "expected postgres://"));
///         }
///         if self.pool_size == 0 {
///             return Err(ValidationError::invalid_field("POOL_SIZE", "must be at least 1"));
///         }
///         Ok(())
///     }
/// }
///
/// let view = StoreSettings { database_url: None, pool_size: 4 };
/// assert!(view.validate().is_err());
/// ```
pub trait Validate {
    /// Check the view, describing the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` that setup or reload will report.
    fn validate(&self) -> Result<(), ValidationError>;
}
