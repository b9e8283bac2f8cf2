//! Progress and dialog reporting.
//!
//! [`ProgressReporter`] wraps the host's progress UI object. Each operation
//! takes a parameter record whose unset fields are sent as "absent", so the
//! host can tell an unknown step count apart from step 0.
//!
//! # Example
//!
//! ```
//! use task_sequence::{ActionProgress, ProgressReporter};
//!
//! let progress = ProgressReporter::new();
//! let update = ActionProgress::new().action("Copying drivers").step(3).max_step(10);
//! if let Err(err) = progress.report_action_progress(&update) {
//!     assert!(err.is_not_available());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ts_dispatch::{Arg, BindingState, InvokeKind, NativeObjectBinder, Resolver};

use crate::config::{AutomationConfig, DEFAULT_PROGRESS_CLASS};
use crate::error::{Result, TaskSequenceError};
use crate::message::{MessageType, MessageboxResult, ResultCodes};

/// Default caption of message boxes.
pub const DEFAULT_CAPTION: &str = "Message";

/// Default error code shown by the error dialog.
pub const DEFAULT_ERROR_CODE: u32 = 1;

/// Default time the error dialog stays open.
pub const DEFAULT_ERROR_TIMEOUT: Duration = Duration::from_secs(900);

fn seconds(duration: Duration) -> u32 {
    u32::try_from(duration.as_secs()).unwrap_or(u32::MAX)
}

/// Header fields shared by the progress, error and reboot dialogs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Banner {
    org_name: Option<String>,
    sequence_name: Option<String>,
    title: Option<String>,
}

impl Banner {
    fn args(&self) -> [Arg; 3] {
        [
            self.org_name.clone().into(),
            self.sequence_name.clone().into(),
            self.title.clone().into(),
        ]
    }
}

macro_rules! banner_setters {
    () => {
        /// Set the organization name.
        #[must_use]
        pub fn org_name(mut self, name: impl Into<String>) -> Self {
            self.banner.org_name = Some(name.into());
            self
        }

        /// Set the task sequence name.
        #[must_use]
        pub fn sequence_name(mut self, name: impl Into<String>) -> Self {
            self.banner.sequence_name = Some(name.into());
            self
        }

        /// Set the custom title.
        #[must_use]
        pub fn title(mut self, title: impl Into<String>) -> Self {
            self.banner.title = Some(title.into());
            self
        }
    };
}

/// Progress of a custom action, with an optional sub-action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionProgress {
    banner: Banner,
    action: Option<String>,
    step: Option<u32>,
    max_step: Option<u32>,
    sub_action: Option<String>,
    sub_step: Option<u32>,
    sub_max_step: Option<u32>,
}

impl ActionProgress {
    /// Create an update with every field absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    banner_setters!();

    /// Set the current action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the steps done.
    #[must_use]
    pub const fn step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the total number of steps.
    #[must_use]
    pub const fn max_step(mut self, max_step: u32) -> Self {
        self.max_step = Some(max_step);
        self
    }

    /// Set the sub-action name.
    #[must_use]
    pub fn sub_action(mut self, action: impl Into<String>) -> Self {
        self.sub_action = Some(action.into());
        self
    }

    /// Set the sub-action steps done.
    #[must_use]
    pub const fn sub_step(mut self, step: u32) -> Self {
        self.sub_step = Some(step);
        self
    }

    /// Set the sub-action total number of steps.
    #[must_use]
    pub const fn sub_max_step(mut self, max_step: u32) -> Self {
        self.sub_max_step = Some(max_step);
        self
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = self.banner.args().to_vec();
        args.extend([
            self.action.clone().into(),
            self.step.into(),
            self.max_step.into(),
            self.sub_action.clone().into(),
            self.sub_step.into(),
            self.sub_max_step.into(),
        ]);
        args
    }
}

/// Progress of the task sequence as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsProgress {
    banner: Banner,
    action: Option<String>,
    step: Option<u32>,
    max_step: Option<u32>,
}

impl TsProgress {
    /// Create an update with every field absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    banner_setters!();

    /// Set the current action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the steps done.
    #[must_use]
    pub const fn step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the total number of steps.
    #[must_use]
    pub const fn max_step(mut self, max_step: u32) -> Self {
        self.max_step = Some(max_step);
        self
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = self.banner.args().to_vec();
        args.extend([
            self.action.clone().into(),
            self.step.into(),
            self.max_step.into(),
        ]);
        args
    }
}

/// Error dialog contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    banner: Banner,
    message: Option<String>,
    error_code: u32,
    timeout: Duration,
    restart: bool,
}

impl Default for ErrorDialog {
    fn default() -> Self {
        Self {
            banner: Banner::default(),
            message: None,
            error_code: DEFAULT_ERROR_CODE,
            timeout: DEFAULT_ERROR_TIMEOUT,
            restart: false,
        }
    }
}

impl ErrorDialog {
    /// Create an error dialog with default code, timeout and no restart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    banner_setters!();

    /// Set the error message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the error code.
    #[must_use]
    pub const fn error_code(mut self, code: u32) -> Self {
        self.error_code = code;
        self
    }

    /// Set how long the dialog stays open.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restart the computer when the dialog closes or times out.
    #[must_use]
    pub const fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = self.banner.args().to_vec();
        args.extend([
            self.message.clone().into(),
            Arg::U32(self.error_code),
            Arg::U32(seconds(self.timeout)),
            Arg::I32(i32::from(self.restart)),
        ]);
        args
    }
}

/// Reboot warning contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebootPrompt {
    banner: Banner,
    message: Option<String>,
    timeout: Duration,
}

impl RebootPrompt {
    /// Create a reboot prompt with a zero timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    banner_setters!();

    /// Set the reboot message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the countdown before the reboot.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = self.banner.args().to_vec();
        args.extend([self.message.clone().into(), Arg::U32(seconds(self.timeout))]);
        args
    }
}

/// Message box contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    caption: String,
    kind: MessageType,
}

impl Message {
    /// Create a message with the default caption and an Ok button.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caption: DEFAULT_CAPTION.to_string(),
            kind: MessageType::Ok,
        }
    }

    /// Set the window caption.
    #[must_use]
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Set the button layout.
    #[must_use]
    pub const fn kind(mut self, kind: MessageType) -> Self {
        self.kind = kind;
        self
    }

    /// The button layout.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.kind
    }
}

/// Access to the progress UI of the host.
#[derive(Debug)]
pub struct ProgressReporter {
    binder: NativeObjectBinder,
    result_codes: ResultCodes,
}

impl ProgressReporter {
    /// Create a reporter bound to the default class through the platform resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(ts_dispatch::native_resolver())
    }

    /// Create a reporter bound to the default class through `resolver`.
    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            binder: NativeObjectBinder::new(DEFAULT_PROGRESS_CLASS, resolver),
            result_codes: ResultCodes::default(),
        }
    }

    /// Create a reporter bound to the configured class through `resolver`.
    #[must_use]
    pub fn from_config(config: &AutomationConfig, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            binder: NativeObjectBinder::new(config.progress_class.as_str(), resolver),
            result_codes: config.result_codes,
        }
    }

    /// Check whether the host object can be used. Never fails.
    pub fn is_available(&self) -> bool {
        self.binder.is_available()
    }

    /// Current binding state, without triggering a bind.
    #[must_use]
    pub fn binding_state(&self) -> BindingState {
        self.binder.state()
    }

    /// Close any open progress dialog.
    pub fn close(&self) -> Result<()> {
        self.call("CloseProgressDialog", &mut [])
    }

    /// Show progress of a custom action.
    pub fn report_action_progress(&self, progress: &ActionProgress) -> Result<()> {
        self.call("ShowActionProgress", &mut progress.args())
    }

    /// Show an error dialog.
    pub fn show_error(&self, dialog: &ErrorDialog) -> Result<()> {
        self.call("ShowErrorDialog", &mut dialog.args())
    }

    /// Show a message box with an Ok button.
    pub fn show_message(&self, text: &str, caption: &str) -> Result<()> {
        self.call(
            "ShowMessage",
            &mut [
                Arg::from(text),
                Arg::from(caption),
                Arg::U32(MessageType::Ok.ordinal()),
            ],
        )
    }

    /// Show a message box with an Ok button and the default caption.
    pub fn show_message_text(&self, text: &str) -> Result<()> {
        self.show_message(text, DEFAULT_CAPTION)
    }

    /// Show a message box and wait for the user's answer.
    ///
    /// The answer is always one of [`MessageType::outcomes`] for the layout;
    /// any other code fails with [`TaskSequenceError::UnexpectedResult`].
    pub fn show_message_with_result(&self, message: &Message) -> Result<MessageboxResult> {
        let mut args = [
            Arg::from(message.text.as_str()),
            Arg::from(message.caption.as_str()),
            Arg::U32(message.kind.ordinal()),
            Arg::out(),
        ];
        self.call("ShowMessageEx", &mut args)?;

        let code = args[3]
            .out_value()
            .and_then(ts_dispatch::Value::as_u32)
            .ok_or_else(|| {
                TaskSequenceError::NativeInvocationFailure(
                    ts_dispatch::DispatchError::type_mismatch("ShowMessageEx", "result code"),
                )
            })?;
        let result = self.result_codes.decode(message.kind, code)?;
        tracing::debug!(layout = ?message.kind, outcome = %result, "message box answered");
        Ok(result)
    }

    /// Show progress of the task sequence as a whole.
    pub fn report_ts_progress(&self, progress: &TsProgress) -> Result<()> {
        self.call("ShowTsProgress", &mut progress.args())
    }

    /// Show a reboot warning.
    pub fn show_reboot_prompt(&self, prompt: &RebootPrompt) -> Result<()> {
        self.call("ShowRebootDialog", &mut prompt.args())
    }

    /// Ask the user to insert another medium.
    pub fn show_swap_media_prompt(&self, sequence_name: &str, media_number: u32) -> Result<()> {
        self.call(
            "ShowSwapMediaDialog",
            &mut [Arg::from(sequence_name), Arg::U32(media_number)],
        )
    }

    /// Release the host object. The next operation binds again.
    pub fn release(&mut self) -> bool {
        self.binder.release()
    }

    fn call(&self, member: &str, args: &mut [Arg]) -> Result<()> {
        self.binder.invoke(member, InvokeKind::Method, args)?;
        Ok(())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_progress_absent_fields() {
        let args = ActionProgress::new().step(3).max_step(10).args();
        assert_eq!(args.len(), 9);
        assert_eq!(args[4], Arg::U32(3));
        assert_eq!(args[5], Arg::U32(10));
        for index in [0, 1, 2, 3, 6, 7, 8] {
            assert!(args[index].is_absent(), "argument {index} should be absent");
        }
    }

    #[test]
    fn error_dialog_defaults() {
        let args = ErrorDialog::new().args();
        assert_eq!(
            args,
            vec![
                Arg::Absent,
                Arg::Absent,
                Arg::Absent,
                Arg::Absent,
                Arg::U32(1),
                Arg::U32(900),
                Arg::I32(0),
            ]
        );
    }

    #[test]
    fn restart_is_forwarded_as_one() {
        let args = ErrorDialog::new().restart(true).args();
        assert_eq!(args[6], Arg::I32(1));
    }

    #[test]
    fn reboot_prompt_defaults_to_zero_timeout() {
        let args = RebootPrompt::new().org_name("Acme").args();
        assert_eq!(args[0], Arg::from("Acme"));
        assert_eq!(args[4], Arg::U32(0));
    }

    #[test]
    fn oversized_timeout_saturates() {
        assert_eq!(seconds(Duration::from_secs(u64::MAX)), u32::MAX);
        assert_eq!(seconds(Duration::from_millis(1500)), 1);
    }

    #[test]
    fn message_defaults() {
        let message = Message::new("Hello");
        assert_eq!(message.caption, "Message");
        assert_eq!(message.message_type(), MessageType::Ok);
    }
}
