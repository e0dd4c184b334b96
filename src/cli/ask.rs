use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use affirm::dialogs::{DialogLayout, DialogSize, TextDirection};
use affirm::{ConfirmRequest, ConfirmStore, ConfirmerConfig, Variant};

/// Show a confirmation dialog and report the answer
#[derive(Debug, Args)]
pub struct AskCommand {
    /// Question shown as the dialog title
    pub title: String,

    /// Supporting text under the title
    #[arg(short = 'm', long = "description")]
    pub description: Option<String>,

    /// default, danger, warning, info or success
    #[arg(short = 'v', long = "variant")]
    pub variant: Option<Variant>,

    /// Confirm button label
    #[arg(long = "confirm-text")]
    pub confirm_text: Option<String>,

    /// Cancel button label
    #[arg(long = "cancel-text")]
    pub cancel_text: Option<String>,

    /// Require typing this word before confirming
    #[arg(short = 'k', long = "keyword")]
    pub keyword: Option<String>,

    /// Acknowledgement only, no cancel button
    #[arg(long = "alert")]
    pub alert: bool,

    /// Ignore Escape and clicks outside the dialog
    #[arg(long = "no-dismiss")]
    pub no_dismiss: bool,

    /// default or centered
    #[arg(long = "layout")]
    pub layout: Option<DialogLayout>,

    /// sm, md, lg, xl or full
    #[arg(long = "size")]
    pub size: Option<DialogSize>,

    /// ltr, rtl or auto
    #[arg(long = "dir")]
    pub dir: Option<TextDirection>,
}

impl AskCommand {
    pub async fn execute(self, config: ConfirmerConfig) -> Result<bool> {
        debug!("Executing ask command");
        let request = self.into_request();
        info!("Asking: {}", request.title);

        let store = ConfirmStore::new();
        affirm::tui::run_dialog(store, config, request).await
    }

    fn into_request(self) -> ConfirmRequest {
        let mut request = ConfirmRequest::new(self.title);

        if let Some(description) = self.description {
            request = request.description(description);
        }
        if let Some(variant) = self.variant {
            request = request.variant(variant);
        }
        if let Some(text) = self.confirm_text {
            request = request.confirm_text(text);
        }
        if let Some(text) = self.cancel_text {
            request = request.cancel_text(text);
        }
        if let Some(keyword) = self.keyword {
            request = request.confirmation_keyword(keyword);
        }
        if let Some(layout) = self.layout {
            request = request.layout(layout);
        }
        if let Some(size) = self.size {
            request = request.size(size);
        }
        if let Some(dir) = self.dir {
            request = request.dir(dir);
        }
        if self.alert {
            request = request.hide_cancel(true);
        }
        if self.no_dismiss {
            request = request.dismissible(false);
        }

        request
    }
}
