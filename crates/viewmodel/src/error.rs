use std::borrow::Cow;

/// Errors surfaced by component construction and the reference host.
///
/// Dispatch itself never fails: publishing, watch firing and teardown contain their faults.
#[derive(Debug, thiserror::Error)]
pub enum ViewModelError {
    /// No constructor is registered under the requested type name.
    #[error("Unknown component type{}: {type_name}", format_context(.context))]
    UnknownComponent { type_name: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A constructor ran but could not produce the component.
    #[error("Component construction failed{}: {message}", format_context(.context))]
    Construction { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Watchers kept changing each other for more passes than the digest allows.
    #[error("Digest did not stabilize{}: {message}", format_context(.context))]
    DigestOverflow { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal view-model error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Attaches a human readable context to a failed step.
pub trait ViewModelErrorExt<T> {
    /// # Errors
    /// Returns the original error with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ViewModelError>;
}

impl<T> ViewModelErrorExt<T> for Result<T, ViewModelError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                ViewModelError::UnknownComponent { context: c, .. }
                | ViewModelError::Construction { context: c, .. }
                | ViewModelError::DigestOverflow { context: c, .. }
                | ViewModelError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl From<&'static str> for ViewModelError {
    fn from(s: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(s), context: None }
    }
}

impl From<String> for ViewModelError {
    fn from(s: String) -> Self {
        Self::Internal { message: Cow::Owned(s), context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
