use log::debug;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::path::PathBuf;

use crate::config::VideoFilter;

const UPLOAD: &str = "Upload";
const CANCEL: &str = "Cancel";

/// Modal questions the player window asks the user.
pub trait Dialogs {
    /// `None` when the user dismisses the picker.
    fn pick_video(&mut self, filter: &VideoFilter) -> Option<PathBuf>;

    /// Play was pressed with nothing loaded. True if the user wants to open
    /// a file now.
    fn offer_open_file(&mut self) -> bool;

    /// True only on an explicit yes.
    fn confirm_close(&mut self) -> bool;
}

/// Native dialogs through rfd. They block the UI thread until answered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    fn pick_video(&mut self, filter: &VideoFilter) -> Option<PathBuf> {
        FileDialog::new()
            .set_title("Open Video File")
            .add_filter(&filter.name, &filter.extensions)
            .pick_file()
    }

    fn offer_open_file(&mut self) -> bool {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("No Video")
            .set_description("No video has been selected. Please select a video first.")
            .set_buttons(MessageButtons::OkCancelCustom(
                UPLOAD.to_owned(),
                CANCEL.to_owned(),
            ))
            .show();
        debug!("no-video dialog answered {answer:?}");
        matches!(answer, MessageDialogResult::Ok)
            || matches!(answer, MessageDialogResult::Custom(ref label) if label == UPLOAD)
    }

    fn confirm_close(&mut self) -> bool {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Confirm Exit")
            .set_description("Are you sure you want to close?")
            .set_buttons(MessageButtons::YesNo)
            .show();
        debug!("close dialog answered {answer:?}");
        answer == MessageDialogResult::Yes
    }
}
