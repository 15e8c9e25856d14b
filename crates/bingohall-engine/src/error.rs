//! Why a bingo claim was turned down.

/// The first failed check of a bingo claim, in the order they are run.
///
/// The `Display` text is broadcast verbatim in `bingoInvalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClaimRejection {
    #[error("Player not found")]
    PlayerNotFound,

    #[error("Card not found")]
    CardNotFound,

    #[error("Card not selected for play")]
    CardNotSelected,

    /// A marked cell holds a number that has not been called.
    #[error("Invalid marked cells - numbers not called")]
    UncalledMarks,

    #[error("Pattern not completed")]
    PatternIncomplete,

    #[error("Already won")]
    AlreadyWon,

    #[error("Maximum winners reached")]
    MaxWinnersReached,
}
