//! Provider-shaped payload builders shared by the unit tests.

use serde_json::{json, Value};

pub(crate) fn raw_post(id: &str, author_id: &str, text: &str) -> Value {
    json!({
        "__typename": "Tweet",
        "rest_id": id,
        "core": {
            "user_results": {
                "result": {
                    "__typename": "User",
                    "rest_id": author_id,
                    "legacy": {
                        "name": format!("User {author_id}"),
                        "screen_name": format!("user_{author_id}"),
                        "profile_image_url_https": format!("https://pbs.example/{author_id}.jpg"),
                        "verified": false
                    }
                }
            }
        },
        "views": { "count": "6898", "state": "EnabledWithCount" },
        "legacy": {
            "id_str": id,
            "conversation_id_str": id,
            "user_id_str": author_id,
            "full_text": text,
            "created_at": "Tue Mar 11 08:15:55 +0000 2025",
            "lang": "en",
            "reply_count": 2,
            "retweet_count": 14,
            "favorite_count": 38,
            "quote_count": 1,
            "is_quote_status": false,
            "entities": { "urls": [], "hashtags": [] }
        }
    })
}

pub(crate) fn item_entry(result: Value) -> Value {
    json!({
        "entryId": "tweet-entry",
        "content": {
            "__typename": "TimelineTimelineItem",
            "itemContent": {
                "__typename": "TimelineTweet",
                "tweet_results": { "result": result }
            }
        }
    })
}

pub(crate) fn module_entry(results: Vec<Value>) -> Value {
    let items: Vec<Value> = results
        .into_iter()
        .map(|result| {
            json!({
                "entryId": "module-item",
                "item": {
                    "itemContent": {
                        "__typename": "TimelineTweet",
                        "tweet_results": { "result": result }
                    }
                }
            })
        })
        .collect();

    json!({
        "entryId": "list-conversation",
        "content": {
            "__typename": "TimelineTimelineModule",
            "items": items
        }
    })
}

pub(crate) fn cursor_entry() -> Value {
    json!({
        "entryId": "cursor-bottom",
        "content": {
            "__typename": "TimelineTimelineCursor",
            "value": "DAABCgABGQ",
            "cursorType": "Bottom"
        }
    })
}

/// A full list-timeline response body as the provider returns it.
pub(crate) fn list_response(entries: Vec<Value>) -> Value {
    json!({
        "data": {
            "list": {
                "tweets_timeline": {
                    "timeline": {
                        "instructions": [
                            { "type": "TimelineClearCache" },
                            { "type": "TimelineAddEntries", "entries": entries }
                        ]
                    }
                }
            }
        }
    })
}

pub(crate) fn detail_record(id: &str, user_id: &str, text: &str, created_at: &str) -> Value {
    json!({
        "tweet_id": id,
        "conversation_id": "100",
        "user_id": user_id,
        "user": { "name": format!("User {user_id}"), "screen_name": format!("user_{user_id}") },
        "text": text,
        "created_at": created_at,
        "is_reply": false,
        "retweet_count": "0",
        "favorite_count": "3",
        "reply_count": "0",
        "quote_count": "0",
        "medias": []
    })
}
