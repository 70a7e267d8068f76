use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("Repository '{repo}' declares unsupported attribute '{attribute}'")]
    UnsupportedAttribute { repo: String, attribute: &'static str },

    #[error("Repository '{repo}' declares no base URL")]
    MissingBaseUrl { repo: String },

    #[error("Repository '{repo}' base URL '{url}' does not end in <bucket>/<arch>")]
    MalformedBaseUrl { repo: String, url: String },
}

pub type Result<T> = std::result::Result<T, AdaptError>;
