//! Notification text for the two deployment variants.
//!
//! The variants are kept literally distinct: the plain one names no branch
//! and never carries a commit message.

const HEADLINE: &str = "A new nrf manifest version available.";

/// Which notification an entry point sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Instructions plus branch name and the HEAD commit message.
    DevChannel,
    /// Instructions only.
    Plain,
}

impl Variant {
    /// Binary name of the entry point that sends this variant.
    pub fn program_name(self) -> &'static str {
        match self {
            Variant::DevChannel => "send-manifest-dev-message",
            Variant::Plain => "send-manifest-message",
        }
    }
}

fn instructions(folder: &str) -> String {
    format!("Please run ```git pull``` and ```west update``` in your ```{folder}``` folder")
}

pub fn dev_channel_body(folder: &str, branch: &str, commit_message: &str) -> String {
    format!(
        "{HEADLINE}\n{}, on the ```{branch}``` branch.\n\nCommit message:\n{commit_message}",
        instructions(folder)
    )
}

pub fn plain_body(folder: &str) -> String {
    format!("{HEADLINE}\n{}", instructions(folder))
}
