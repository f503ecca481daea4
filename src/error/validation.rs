use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Port must be a positive integer, got '{value}'.")]
    InvalidPort { value: String },
    #[error("Address must be host:port, got '{value}'.")]
    InvalidAddressFormat { value: String },
    #[error("Address '{value}' has an invalid port: {source}")]
    InvalidAddressPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Address '{value}' has an empty host.")]
    AddressHostEmpty { value: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
