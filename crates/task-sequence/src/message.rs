//! Message box layouts and results.
//!
//! [`MessageType`] ordinals are sent to the host's dialog engine as-is and
//! must keep their values. The codes the engine returns are decoded through
//! [`ResultCodes`], whose defaults follow the platform message box convention
//! and can be overridden from configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskSequenceError};

/// Button layout of a message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum MessageType {
    /// Ok
    #[default]
    Ok = 0,
    /// Ok / Cancel
    OkCancel = 1,
    /// Abort / Retry / Ignore
    AbortRetryIgnore = 2,
    /// Yes / No / Cancel
    YesNoCancel = 3,
    /// Yes / No
    YesNo = 4,
    /// Retry / Cancel
    RetryCancel = 5,
    /// Cancel / Try again / Continue
    CancelTryAgainContinue = 6,
}

impl MessageType {
    /// All layouts in ordinal order.
    pub const ALL: [Self; 7] = [
        Self::Ok,
        Self::OkCancel,
        Self::AbortRetryIgnore,
        Self::YesNoCancel,
        Self::YesNo,
        Self::RetryCancel,
        Self::CancelTryAgainContinue,
    ];

    /// The wire ordinal.
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Look up a layout by its wire ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Ok),
            1 => Some(Self::OkCancel),
            2 => Some(Self::AbortRetryIgnore),
            3 => Some(Self::YesNoCancel),
            4 => Some(Self::YesNo),
            5 => Some(Self::RetryCancel),
            6 => Some(Self::CancelTryAgainContinue),
            _ => None,
        }
    }

    /// The answers a user can give with this layout.
    #[must_use]
    pub const fn outcomes(self) -> &'static [DialogOutcome] {
        use DialogOutcome::{Abort, Cancel, Continue, Ignore, No, Ok, Retry, TryAgain, Yes};
        match self {
            Self::Ok => &[Ok],
            Self::OkCancel => &[Ok, Cancel],
            Self::AbortRetryIgnore => &[Abort, Retry, Ignore],
            Self::YesNoCancel => &[Yes, No, Cancel],
            Self::YesNo => &[Yes, No],
            Self::RetryCancel => &[Retry, Cancel],
            Self::CancelTryAgainContinue => &[Cancel, TryAgain, Continue],
        }
    }

    /// Check if `outcome` is a possible answer for this layout.
    #[must_use]
    pub fn allows(self, outcome: DialogOutcome) -> bool {
        self.outcomes().contains(&outcome)
    }
}

/// The button a user chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogOutcome {
    /// Ok
    Ok,
    /// Cancel
    Cancel,
    /// Abort
    Abort,
    /// Retry
    Retry,
    /// Ignore
    Ignore,
    /// Yes
    Yes,
    /// No
    No,
    /// Try again
    TryAgain,
    /// Continue
    Continue,
}

impl fmt::Display for DialogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Cancel => "Cancel",
            Self::Abort => "Abort",
            Self::Retry => "Retry",
            Self::Ignore => "Ignore",
            Self::Yes => "Yes",
            Self::No => "No",
            Self::TryAgain => "Try Again",
            Self::Continue => "Continue",
        };
        f.write_str(name)
    }
}

/// Mapping from dialog outcomes to the codes the dialog engine returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultCodes {
    /// Code for [`DialogOutcome::Ok`].
    pub ok: u32,
    /// Code for [`DialogOutcome::Cancel`].
    pub cancel: u32,
    /// Code for [`DialogOutcome::Abort`].
    pub abort: u32,
    /// Code for [`DialogOutcome::Retry`].
    pub retry: u32,
    /// Code for [`DialogOutcome::Ignore`].
    pub ignore: u32,
    /// Code for [`DialogOutcome::Yes`].
    pub yes: u32,
    /// Code for [`DialogOutcome::No`].
    pub no: u32,
    /// Code for [`DialogOutcome::TryAgain`].
    pub try_again: u32,
    /// Code for [`DialogOutcome::Continue`].
    #[serde(rename = "continue")]
    pub continue_: u32,
}

impl Default for ResultCodes {
    fn default() -> Self {
        Self {
            ok: 1,
            cancel: 2,
            abort: 3,
            retry: 4,
            ignore: 5,
            yes: 6,
            no: 7,
            try_again: 10,
            continue_: 11,
        }
    }
}

impl ResultCodes {
    /// The code for an outcome.
    #[must_use]
    pub const fn code(&self, outcome: DialogOutcome) -> u32 {
        match outcome {
            DialogOutcome::Ok => self.ok,
            DialogOutcome::Cancel => self.cancel,
            DialogOutcome::Abort => self.abort,
            DialogOutcome::Retry => self.retry,
            DialogOutcome::Ignore => self.ignore,
            DialogOutcome::Yes => self.yes,
            DialogOutcome::No => self.no,
            DialogOutcome::TryAgain => self.try_again,
            DialogOutcome::Continue => self.continue_,
        }
    }

    /// Check that no two outcomes of one layout share a code.
    ///
    /// A shared code would make one of the buttons impossible to report.
    pub fn validate(&self) -> Result<()> {
        for layout in MessageType::ALL {
            let outcomes = layout.outcomes();
            for (i, &first) in outcomes.iter().enumerate() {
                for &second in &outcomes[i + 1..] {
                    if self.code(first) == self.code(second) {
                        return Err(TaskSequenceError::config(format!(
                            "result codes for {first} and {second} are both {} in layout {layout:?}",
                            self.code(first)
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Decode a code returned for a message box with `layout`.
    ///
    /// Only the outcomes of that layout are considered, so a code that would
    /// mean "Cancel" is rejected for a Yes/No box.
    pub fn decode(&self, layout: MessageType, code: u32) -> Result<MessageboxResult> {
        layout
            .outcomes()
            .iter()
            .copied()
            .find(|&outcome| self.code(outcome) == code)
            .map(|outcome| MessageboxResult {
                layout,
                outcome,
                code,
            })
            .ok_or(TaskSequenceError::UnexpectedResult { layout, code })
    }
}

/// The answer to a result-bearing message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageboxResult {
    layout: MessageType,
    outcome: DialogOutcome,
    code: u32,
}

impl MessageboxResult {
    /// The layout that was shown.
    #[must_use]
    pub const fn layout(&self) -> MessageType {
        self.layout
    }

    /// The button the user chose.
    #[must_use]
    pub const fn outcome(&self) -> DialogOutcome {
        self.outcome
    }

    /// The raw code returned by the dialog engine.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.code
    }
}

impl fmt::Display for MessageboxResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.outcome, self.code)
    }
}
