use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No remote host available.")]
    NoHostAvailable,
    #[error("Callback address {addr} is a loopback address; a worker on a remote host could not reach it.")]
    LoopbackCallback { addr: String },
    #[error("Empty worker invocation.")]
    EmptyInvocation,
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
