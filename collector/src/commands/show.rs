use crate::{storage::Storage, Result};

pub(crate) fn show(storage: &Storage) -> Result<()> {
    let posts = storage.todays_posts()?;

    println!("{}", serde_json::to_string_pretty(&posts)?);

    Ok(())
}
