//! Outcome reported to the user after each vault action.

use std::fmt;

use lockbox_common::Error;

/// User-facing result of a vault action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoMaster,
    WrongMaster,
    InvalidInput,
    NameNotFound,
    InternalError,
}

impl Status {
    /// Human readable message for this status.
    pub fn message(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NoMaster => "No master passphrase exists, create one first",
            Status::WrongMaster => "Incorrect master passphrase",
            Status::InvalidInput => "Invalid input",
            Status::NameNotFound => "Requested name is not in the vault",
            Status::InternalError => "Internal error",
        }
    }

    /// Status for the result of an action.
    pub fn of<T>(result: &lockbox_common::Result<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => Status::from(e),
        }
    }
}

impl From<&Error> for Status {
    fn from(error: &Error) -> Self {
        match error {
            Error::NoMaster | Error::VaultNotFound(_) => Status::NoMaster,
            // A wrong passphrase and corrupted data look the same from outside.
            Error::WrongMaster | Error::Authentication => Status::WrongMaster,
            Error::InvalidInput(_) => Status::InvalidInput,
            Error::NotFound(_) => Status::NameNotFound,
            Error::KeyDerivation(_)
            | Error::Format(_)
            | Error::CorruptCredential(_)
            | Error::Crypto(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Serialization(_) => Status::InternalError,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(Status::from(&Error::NoMaster), Status::NoMaster);
        assert_eq!(
            Status::from(&Error::VaultNotFound("/tmp/v".to_string())),
            Status::NoMaster
        );
        assert_eq!(Status::from(&Error::Authentication), Status::WrongMaster);
        assert_eq!(Status::from(&Error::WrongMaster), Status::WrongMaster);
        assert_eq!(
            Status::from(&Error::NotFound("email".to_string())),
            Status::NameNotFound
        );
        assert_eq!(
            Status::from(&Error::KeyDerivation("oom".to_string())),
            Status::InternalError
        );
        assert_eq!(
            Status::from(&Error::Format("short".to_string())),
            Status::InternalError
        );
    }

    #[test]
    fn test_status_of_result() {
        let ok: lockbox_common::Result<()> = Ok(());
        let err: lockbox_common::Result<()> = Err(Error::InvalidInput("x".to_string()));

        assert_eq!(Status::of(&ok), Status::Ok);
        assert_eq!(Status::of(&err), Status::InvalidInput);
        assert_eq!(Status::Ok.to_string(), "OK");
    }
}
