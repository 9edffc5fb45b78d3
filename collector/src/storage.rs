use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::eyre::Context;
use serde::{Deserialize, Serialize};
use timeline::Post;
use tracing::warn;

use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyFileRef<'a> {
    saved_at: DateTime<Utc>,
    count: usize,
    tweets: &'a [Post],
}

#[derive(Debug, Deserialize)]
struct DailyFile {
    tweets: Vec<Post>,
}

/// One JSON file of posts per day under `<data_dir>/tweets`.
#[derive(Debug, Clone)]
pub(crate) struct Storage {
    tweets_dir: PathBuf,
}

impl Storage {
    pub(crate) fn open(data_dir: &Path) -> Result<Self> {
        let tweets_dir = data_dir.join("tweets");
        std::fs::create_dir_all(&tweets_dir)
            .wrap_err_with(|| format!("Couldn't create {}", tweets_dir.display()))?;

        Ok(Self { tweets_dir })
    }

    pub(crate) fn path_for(&self, day: NaiveDate) -> PathBuf {
        let file_name = format!("{}.json", day.format("%Y-%m-%d"));
        self.tweets_dir.join(file_name)
    }

    /// Writes `posts` to today's file, replacing whatever was there.
    pub(crate) fn save_posts(&self, posts: &[Post]) -> Result<PathBuf> {
        self.save_posts_at(posts, Utc::now())
    }

    fn save_posts_at(&self, posts: &[Post], now: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.path_for(now.date_naive());
        let file = DailyFileRef {
            saved_at: now,
            count: posts.len(),
            tweets: posts,
        };

        let json = serde_json::to_string_pretty(&file)
            .wrap_err("Couldn't serialize posts")?;
        std::fs::write(&path, json)
            .wrap_err_with(|| format!("Couldn't write {}", path.display()))?;

        Ok(path)
    }

    pub(crate) fn todays_posts(&self) -> Result<Vec<Post>> {
        self.posts_for(Utc::now().date_naive())
    }

    /// The posts saved for `day`, or nothing when that day has no file.
    pub(crate) fn posts_for(&self, day: NaiveDate) -> Result<Vec<Post>> {
        let path = self.path_for(day);
        if !path.exists() {
            warn!(%day, "No posts saved for this day");
            return Ok(vec![]);
        }

        let raw = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Couldn't read {}", path.display()))?;
        let file: DailyFile = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("{} is not a saved posts file", path.display()))?;

        Ok(file.tweets)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use timeline::Author;

    use super::*;

    #[test]
    fn test_open_creates_tweets_dir() {
        let dir = tempfile::tempdir().unwrap();

        Storage::open(&dir.path().join("nested")).unwrap();

        assert!(dir.path().join("nested/tweets").is_dir());
    }

    #[test]
    fn test_saved_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 11, 8, 15, 55).unwrap();
        let posts = vec![Post::new("1", Author::with_id("u1"))];

        let path = storage.save_posts_at(&posts, now).unwrap();

        assert_eq!(path, dir.path().join("tweets/2025-03-11.json"));
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["savedAt"], "2025-03-11T08:15:55Z");
        assert_eq!(saved["count"], 1);
        assert_eq!(saved["tweets"][0]["id"], "1");
    }

    #[test]
    fn test_saved_posts_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 11, 8, 15, 55).unwrap();
        let mut post = Post::new("1", Author::with_id("u1"));
        post.text = "hello".to_string();

        storage.save_posts_at(&[post.clone()], now).unwrap();

        assert_eq!(storage.posts_for(now.date_naive()).unwrap(), vec![post]);
    }

    #[test]
    fn test_missing_day_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        assert!(storage.posts_for(day).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        std::fs::write(storage.path_for(day), "[1, 2").unwrap();

        assert!(storage.posts_for(day).is_err());
    }
}
