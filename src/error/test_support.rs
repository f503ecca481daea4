use super::{ManagerError, ProtocolError, TraceError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ProtocolError {
    fn from(message: &'static str) -> Self {
        ProtocolError::TestExpectation { message }
    }
}

impl From<String> for ProtocolError {
    fn from(value: String) -> Self {
        ProtocolError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ManagerError {
    fn from(message: &'static str) -> Self {
        ManagerError::TestExpectation { message }
    }
}

impl From<String> for ManagerError {
    fn from(value: String) -> Self {
        ManagerError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for TraceError {
    fn from(message: &'static str) -> Self {
        TraceError::TestExpectation { message }
    }
}

impl From<String> for TraceError {
    fn from(value: String) -> Self {
        TraceError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
