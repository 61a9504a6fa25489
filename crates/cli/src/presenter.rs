//! Presenter for the terminal.

use std::sync::Arc;

use async_trait::async_trait;
use shopie_storefront::presenter::{ConfirmPrompt, Notice, NoticeKind, Presenter};

use crate::output;

/// Prints notices and answers confirmation prompts from the `--yes` flag.
pub struct TerminalPresenter {
    assume_yes: bool,
}

impl TerminalPresenter {
    pub fn shared(assume_yes: bool) -> Arc<dyn Presenter> {
        Arc::new(Self { assume_yes })
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::debug!(title = %notice.title, "{}", notice.message),
            NoticeKind::Error => tracing::warn!(title = %notice.title, "{}", notice.message),
        }
        output::notice(&notice);
    }

    // A one-shot command has nowhere to go back to.
    fn go_back(&self) {}

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if !self.assume_yes {
            output::declined(prompt);
        }
        self.assume_yes
    }
}
