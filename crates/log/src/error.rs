//! Logger setup errors.

/// Failure to install the logger.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directive did not parse.
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        /// Directive as configured.
        filter: String,
        /// Parser diagnostic.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed.
    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
