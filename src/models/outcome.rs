// Closed result sets for the credential and metering checks.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOutcome {
    Valid,
    UnknownUser,
    WrongPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterOutcome {
    Allowed,
    Exhausted,
}
