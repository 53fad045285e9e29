use failure;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Trace writer failed: {}", inner)]
    WriterError { inner: String },

    #[fail(display = "Invalid sampler configuration: {}", reason)]
    ConfigError { reason: String },

    #[fail(display = "Encountered an unknown error: {}", inner)]
    Misc { inner: failure::Error },
}

impl From<::std::io::Error> for Error {
    fn from(inner: ::std::io::Error) -> Self {
        Error::WriterError {
            inner: inner.to_string(),
        }
    }
}

impl From<failure::Error> for Error {
    fn from(inner: failure::Error) -> Self {
        Error::Misc { inner }
    }
}
