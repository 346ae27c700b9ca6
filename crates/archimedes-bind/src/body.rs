//! Body binding with validation.
//!
//! [`Binder`] is the entry point handlers call: it dispatches on the content
//! type, populates a record and then runs the record's validation hook.

use serde::de::DeserializeOwned;

use crate::config::BindConfig;
use crate::descriptor::Bindable;
use crate::dispatch::dispatch;
use crate::error::BindError;
use crate::request::BindRequest;
use crate::validate::ValidationError;

/// Binds request bodies into records.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindRequest, Binder};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, Bind)]
/// #[serde(default)]
/// struct CreateUser {
///     #[bind(form = "name")]
///     name: String,
///     #[bind(form = "age")]
///     age: u32,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let request = BindRequest::builder()
///     .content_type("application/x-www-form-urlencoded")
///     .body("name=Alice&age=30")
///     .build();
///
/// let user: CreateUser = Binder::new().bind_body(request).await.unwrap();
/// assert_eq!(user.name, "Alice");
/// assert_eq!(user.age, 30);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BindConfig,
}

impl Binder {
    /// Creates a binder with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binder with the given limits.
    #[must_use]
    pub fn with_config(config: BindConfig) -> Self {
        Self { config }
    }

    /// Returns the limits in use.
    #[must_use]
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Binds the request body into a fresh `T`.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error, or [`BindError::Validation`] if the
    /// populated record reports violations.
    pub async fn bind_body<T>(&self, request: BindRequest) -> Result<T, BindError>
    where
        T: Bindable + DeserializeOwned,
    {
        let mut target = T::default();
        self.bind_body_into(&mut target, request).await?;
        Ok(target)
    }

    /// Binds the request body into an existing record.
    ///
    /// Form bodies only touch tagged fields present on the wire, so values
    /// already in `target` act as defaults. Whole-body formats replace it.
    /// Validation is skipped when binding fails.
    ///
    /// # Errors
    ///
    /// See [`Binder::bind_body`].
    pub async fn bind_body_into<T>(
        &self,
        target: &mut T,
        request: BindRequest,
    ) -> Result<(), BindError>
    where
        T: Bindable + DeserializeOwned,
    {
        dispatch(request, target, &self.config).await?;

        let violations = target.violations();
        if !violations.is_empty() {
            tracing::debug!(
                record = std::any::type_name::<T>(),
                violations = violations.len(),
                "bound record failed validation"
            );
            return Err(ValidationError::new(violations).into());
        }

        Ok(())
    }
}

/// Binds the request body into a fresh `T` with default limits.
///
/// Shorthand for `Binder::new().bind_body(request)`.
pub async fn bind_body<T>(request: BindRequest) -> Result<T, BindError>
where
    T: Bindable + DeserializeOwned,
{
    Binder::new().bind_body(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bind, FieldViolation, Validate};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, Bind)]
    #[serde(default)]
    #[bind(validate)]
    struct Signup {
        #[bind(form = "name")]
        name: String,
        #[bind(form = "age")]
        age: u8,
    }

    impl Validate for Signup {
        fn validate(&self) -> Vec<FieldViolation> {
            let mut violations = Vec::new();
            if self.name.is_empty() {
                violations.push(FieldViolation::new("name", "is required"));
            }
            if self.age < 18 {
                violations.push(FieldViolation::new("age", "must be at least 18"));
            }
            violations
        }
    }

    #[derive(Debug, Default, Deserialize, Bind)]
    #[serde(default)]
    struct Plain {
        #[bind(form = "name")]
        name: String,
    }

    fn form(body: &'static str) -> BindRequest {
        BindRequest::builder()
            .content_type("application/x-www-form-urlencoded")
            .body(body)
            .build()
    }

    #[tokio::test]
    async fn test_valid_record() {
        let signup: Signup = bind_body(form("name=Ana&age=30")).await.unwrap();
        assert_eq!(signup.name, "Ana");
        assert_eq!(signup.age, 30);
    }

    #[tokio::test]
    async fn test_violations_reported() {
        let err = bind_body::<Signup>(form("age=12")).await.unwrap_err();

        let validation = err.as_validation().unwrap();
        let fields: Vec<_> = validation.violations().iter().map(|v| v.field()).collect();
        assert_eq!(fields, ["name", "age"]);
    }

    #[tokio::test]
    async fn test_bind_error_skips_validation() {
        let err = bind_body::<Signup>(form("age=old")).await.unwrap_err();
        assert!(err.as_conversion().is_some());
    }

    #[tokio::test]
    async fn test_empty_body_still_validated() {
        let err = bind_body::<Signup>(form("")).await.unwrap_err();
        assert!(err.as_validation().is_some());
    }

    #[tokio::test]
    async fn test_without_hook_nothing_is_checked() {
        let plain: Plain = bind_body(form("")).await.unwrap();
        assert!(plain.name.is_empty());
    }

    #[tokio::test]
    async fn test_bind_into_keeps_existing_values() {
        let mut signup = Signup {
            name: "Preset".into(),
            age: 40,
        };
        Binder::new()
            .bind_body_into(&mut signup, form("age=21"))
            .await
            .unwrap();

        assert_eq!(signup.name, "Preset");
        assert_eq!(signup.age, 21);
    }

    #[tokio::test]
    async fn test_custom_config() {
        let binder = Binder::with_config(BindConfig {
            max_body_size: Some(4),
            ..BindConfig::default()
        });
        assert_eq!(binder.config().max_body_size, Some(4));

        let err = binder
            .bind_body::<Plain>(form("name=too-long"))
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::PayloadTooLarge { limit: 4 }));
    }
}
