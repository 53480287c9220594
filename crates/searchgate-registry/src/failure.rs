//! Message-plus-source errors reported by backend modules.

/// Declares an error struct carrying a message and an optional boxed source.
macro_rules! backend_failure {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, thiserror::Error)]
        #[error("{message}")]
        pub struct $name {
            message: String,
            #[source]
            source: Option<Box<dyn std::error::Error + Send + Sync>>,
        }

        impl $name {
            /// Builds an error without an underlying source.
            #[must_use]
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    message: message.into(),
                    source: None,
                }
            }

            /// Builds an error that wraps the client or I/O failure behind it.
            #[must_use]
            pub fn with_source(
                message: impl Into<String>,
                source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
            ) -> Self {
                Self {
                    message: message.into(),
                    source: Some(source.into()),
                }
            }
        }
    };
}

pub(crate) use backend_failure;
