//! Rebuilds same-author threads for root posts.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::{
    detail::{DetailCache, DetailSource},
    post::{Post, Thread},
};

/// Separator between post bodies in a thread's merged text.
pub const THREAD_TEXT_SEPARATOR: &str = "\n\n";

pub struct ThreadReconstructor<S> {
    cache: DetailCache<S>,
}

impl<S: DetailSource> ThreadReconstructor<S> {
    pub fn new(cache: DetailCache<S>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DetailCache<S> {
        &self.cache
    }

    /// Attaches a [`Thread`] to every root post whose conversation has
    /// same-author continuations. Order and length of `posts` are unchanged.
    ///
    /// Each conversation is looked up at most once per call.
    #[instrument(name = "ThreadReconstructor::reconstruct", skip_all, fields(posts = posts.len()))]
    pub async fn reconstruct(&mut self, mut posts: Vec<Post>) -> Vec<Post> {
        let mut processed: HashSet<String> = HashSet::new();
        let mut threads_found = 0_usize;

        for post in &mut posts {
            if processed.contains(&post.conversation_id) || post.is_reply() {
                continue;
            }
            if !post.author.is_known() {
                debug!(post.id = %post.id, "Skipping root without an author id");
                continue;
            }

            if let Some(conversation) = self.cache.lookup(&post.id).await {
                let continuations = continuations(post, conversation);
                if continuations.is_empty() {
                    debug!(post.id = %post.id, "No continuations found");
                } else {
                    debug!(post.id = %post.id, count = continuations.len(), "Attaching thread");
                    post.thread = Some(merge(post, continuations));
                    threads_found += 1;
                }
            }

            processed.insert(post.conversation_id.clone());
        }

        info!(
            conversations = processed.len(),
            threads = threads_found,
            "Thread reconstruction finished"
        );

        posts
    }
}

/// Sorts oldest first. Posts whose timestamp can't be parsed go last, in
/// their original order.
pub fn sort_by_creation(posts: &mut [Post]) {
    posts.sort_by_cached_key(|p| {
        let created_at = p.created_at();
        (created_at.is_none(), created_at)
    });
}

/// Picks the posts in `conversation` that continue `root`, oldest first.
///
/// A continuation is by the root's author and either has no reply linkage
/// or replies to the root or to an earlier continuation.
pub fn continuations(root: &Post, conversation: Vec<Post>) -> Vec<Post> {
    let mut candidates: Vec<Post> = conversation
        .into_iter()
        .filter(|p| p.author.id == root.author.id && p.id != root.id)
        .collect();
    sort_by_creation(&mut candidates);

    let mut chain: HashSet<String> = HashSet::from([root.id.clone()]);
    let mut thread = vec![];

    for candidate in candidates {
        let continues = match &candidate.reply_to {
            None => true,
            Some(reply_to) => chain.contains(&reply_to.post_id),
        };

        if continues && chain.insert(candidate.id.clone()) {
            thread.push(candidate);
        }
    }

    thread
}

/// Combines the root with its continuations. Media repeated by URL is kept
/// once; links are kept as they come.
pub fn merge(root: &Post, posts: Vec<Post>) -> Thread {
    let full_text = std::iter::once(root.text.as_str())
        .chain(posts.iter().map(|p| p.text.as_str()))
        .collect::<Vec<_>>()
        .join(THREAD_TEXT_SEPARATOR);

    let mut media = root.media.clone();
    for item in posts.iter().flat_map(|p| &p.media) {
        if !media.iter().any(|m| m.url == item.url) {
            media.push(item.clone());
        }
    }

    let external_links = root
        .external_links
        .iter()
        .chain(posts.iter().flat_map(|p| &p.external_links))
        .cloned()
        .collect();

    Thread {
        posts,
        full_text,
        media,
        external_links,
    }
}
