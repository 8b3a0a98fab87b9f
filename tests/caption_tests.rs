// Caption merging and session tests
// Author: kelexine (https://github.com/kelexine)

use framewatch::captions::{merge, CaptionSessionStore};
use framewatch::config::SessionConfig;
use framewatch::utils::clock::ManualClock;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_rolling_captions_build_one_transcript() {
    let fragments = [
        "welcome back to the channel",
        "to the channel today we are",
        "today we are cooking pasta",
        "cooking pasta",
    ];

    let transcript = fragments
        .iter()
        .fold(String::new(), |history, fragment| merge(&history, fragment));

    assert_eq!(
        transcript,
        "welcome back to the channel today we are cooking pasta"
    );
}

#[test]
fn test_unrelated_fragments_are_joined_with_space() {
    assert_eq!(merge("hello there", "general kenobi"), "hello there general kenobi");
}

#[test]
fn test_concurrent_updates_are_not_lost() {
    let store = Arc::new(CaptionSessionStore::new(
        SessionConfig {
            ttl_seconds: 3600,
            max_sessions: 100,
        },
        Arc::new(ManualClock::new()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.update("viewer", "video", &format!("fragment{:02}", t));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let transcript = store.update("viewer", "video", "");
    for t in 0..8 {
        assert!(transcript.contains(&format!("fragment{:02}", t)));
    }
}

proptest! {
    #[test]
    fn prop_merge_is_idempotent(existing in "[a-z ]{0,60}", incoming in "[a-z ]{0,40}") {
        let once = merge(&existing, &incoming);
        let twice = merge(&once, &incoming);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_keeps_history_and_fragment(existing in "[a-z ]{0,60}", incoming in "[a-z ]{0,40}") {
        let merged = merge(&existing, &incoming);
        prop_assert!(merged.starts_with(existing.trim()));
        prop_assert!(merged.contains(incoming.trim()));
    }

    #[test]
    fn prop_merge_handles_multibyte(existing in "\\PC{0,30}", incoming in "\\PC{0,30}") {
        let merged = merge(&existing, &incoming);
        prop_assert!(merged.contains(incoming.trim()));
    }
}
