use snafu::Snafu;

/// Failure while setting up the HTTP chat client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("chat base URL '{base_url}' is invalid on `{stage}`: {details}"))]
    InvalidBaseUrl {
        stage: &'static str,
        base_url: String,
        details: String,
    },
    #[snafu(display("chat base URL '{base_url}' cannot carry path segments"))]
    OpaqueBaseUrl {
        stage: &'static str,
        base_url: String,
    },
    #[snafu(display("failed to build HTTP client on `{stage}`: {source}"))]
    BuildHttpClient {
        stage: &'static str,
        source: reqwest::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
