use std::path::Path;

use clap::Subcommand;

use crate::{storage::Storage, Result};

use self::{collect::Collect, parse::Parse};

pub(crate) mod collect;
pub(crate) mod parse;
pub(crate) mod show;

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch the list timeline, rebuild threads and save today's posts.
    Collect(Collect),
    /// Decode a saved list response offline and print the posts.
    Parse(Parse),
    /// Print the posts saved today.
    Show,
}

impl Default for Command {
    fn default() -> Self {
        Self::Collect(Collect::default())
    }
}

impl Command {
    pub(crate) async fn run(&self, data_dir: &Path) -> Result<()> {
        match &self {
            Command::Collect(cmd) => cmd.collect(&Storage::open(data_dir)?).await,
            Command::Parse(cmd) => cmd.parse().await,
            Command::Show => show::show(&Storage::open(data_dir)?),
        }
    }
}
