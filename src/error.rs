use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Voter {0} was not found in the directory")]
    IdentityNotFound(String),

    #[error("Invalid voter id: {0}")]
    InvalidVoterId(String),

    #[error("This voter has already voted")]
    AlreadyVoted,

    #[error("No voter identity confirmed")]
    NoVoter,

    #[error("A vote is already being submitted")]
    VoteInFlight,

    #[error("Unknown candidate {0}")]
    UnknownCandidate(u64),

    #[error("No voting session is live")]
    NoSession,

    #[error("Voting is not open (session is {0})")]
    VotingNotOpen(&'static str),

    #[error("Wrong admin key. contract admin = {0}")]
    WrongAdminKey(String),

    #[error("Admin key is not configured")]
    MissingAdminKey,

    #[error("Ledger rejected transaction {0}")]
    Rejected(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),

    #[error("Failed to upload image for candidate {candidate}: {reason}")]
    Upload { candidate: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
