//! Flattens a list-timeline response into raw post results.
//!
//! The response is `instructions -> entries -> content`, where `content` is a
//! union keyed on `__typename`. Anything that does not have the expected
//! shape is skipped; decoding itself never fails.

use serde_json::Value;
use tracing::{debug, trace};

/// Where the instructions array may sit, depending on how much of the
/// provider envelope the caller already stripped.
const TIMELINE_POINTERS: [&str; 4] = [
    "/data/list/tweets_timeline/timeline",
    "/list/tweets_timeline/timeline",
    "/timeline",
    "",
];

/// The `content` of one timeline entry.
#[derive(Debug)]
enum EntryContent<'a> {
    /// `TimelineTimelineItem`: a single item.
    Item(ItemContent<'a>),
    /// `TimelineTimelineModule`: several items, e.g. a conversation.
    Module(&'a [Value]),
    /// Cursors, prompts and whatever else the provider adds later.
    Other(Option<&'a str>),
}

/// The `itemContent` of an item, which is itself a tagged union.
#[derive(Debug)]
enum ItemContent<'a> {
    /// `TimelineTweet`, with its post result when one was sent.
    Post(Option<&'a Value>),
    Other(Option<&'a str>),
}

fn typename(value: &Value) -> Option<&str> {
    value.get("__typename").and_then(Value::as_str)
}

impl<'a> EntryContent<'a> {
    fn classify(content: &'a Value) -> Self {
        match typename(content) {
            Some("TimelineTimelineItem") => Self::Item(
                content
                    .get("itemContent")
                    .map_or(ItemContent::Other(None), ItemContent::classify),
            ),
            Some("TimelineTimelineModule") => Self::Module(
                content
                    .get("items")
                    .and_then(Value::as_array)
                    .map_or(&[][..], Vec::as_slice),
            ),
            other => Self::Other(other),
        }
    }

    fn collect_into(self, out: &mut Vec<&'a Value>) {
        match self {
            Self::Item(item) => item.collect_into(out),
            Self::Module(items) => {
                for item in items {
                    item.pointer("/item/itemContent")
                        .map_or(ItemContent::Other(None), ItemContent::classify)
                        .collect_into(out);
                }
            }
            Self::Other(kind) => trace!(?kind, "Skipping non-post timeline entry"),
        }
    }
}

impl<'a> ItemContent<'a> {
    fn classify(item_content: &'a Value) -> Self {
        match typename(item_content) {
            Some("TimelineTweet") => Self::Post(
                item_content
                    .pointer("/tweet_results/result")
                    .filter(|result| !result.is_null()),
            ),
            other => Self::Other(other),
        }
    }

    fn collect_into(self, out: &mut Vec<&'a Value>) {
        match self {
            Self::Post(Some(result)) => out.push(result),
            Self::Post(None) => debug!("Timeline post item without a result"),
            Self::Other(kind) => trace!(?kind, "Skipping non-post item"),
        }
    }
}

/// Finds the instructions array in a provider response, a stripped `data`
/// object, or a bare timeline.
pub fn locate_instructions(response: &Value) -> Option<&[Value]> {
    TIMELINE_POINTERS
        .iter()
        .filter_map(|pointer| response.pointer(pointer))
        .find_map(|timeline| timeline.get("instructions").and_then(Value::as_array))
        .map(Vec::as_slice)
}

/// Returns every raw post result in the response, in source order.
///
/// Duplicates are kept. A response without instructions yields nothing.
pub fn decode_timeline(response: &Value) -> Vec<&Value> {
    let Some(instructions) = locate_instructions(response) else {
        debug!("Timeline response has no instructions");
        return vec![];
    };

    let mut results = vec![];

    for instruction in instructions {
        let Some(entries) = instruction.get("entries").and_then(Value::as_array) else {
            continue;
        };

        for entry in entries {
            let Some(content) = entry.get("content") else {
                continue;
            };

            EntryContent::classify(content).collect_into(&mut results);
        }
    }

    results
}
