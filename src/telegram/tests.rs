//! Tests for command parsing, the bulk-input state machine, command
//! application, and chat formatting

use super::*;
use crate::config::AddSemantics;
use crate::monitor::{MonitorRow, RowQuote};
use rust_decimal_macros::dec;

fn idle(text: &str) -> MessageOutcome {
    let (state, outcome) = step(ChatInputState::Idle, text);
    assert_eq!(state, ChatInputState::Idle, "unexpected state for '{}'", text);
    outcome
}

fn book() -> (tempfile::TempDir, PositionBook) {
    let dir = tempfile::tempdir().unwrap();
    let book =
        PositionBook::load(dir.path().join("positions.json"), AddSemantics::Upsert).unwrap();
    (dir, book)
}

fn row(index: usize, slug: &str, distance: Decimal, out_of_range: bool) -> MonitorRow {
    MonitorRow {
        index,
        slug: slug.to_string(),
        question: format!("Question for {}?", slug),
        url: Some(format!("https://polymarket.com/event/{}", slug)),
        side: Side::Yes,
        limit_price_cents: dec!(50),
        quote: Some(RowQuote {
            current_price_cents: dec!(50) + distance,
            distance_cents: distance,
            bids_before: dec!(25),
            out_of_range,
        }),
    }
}

#[test]
fn plain_commands_dispatch() {
    assert_eq!(
        idle("/positions"),
        MessageOutcome::Dispatch(PositionCommand::List)
    );
    assert_eq!(idle("/pos"), MessageOutcome::Dispatch(PositionCommand::List));
    assert_eq!(
        idle("/out_of_range"),
        MessageOutcome::Dispatch(PositionCommand::OutOfRange)
    );
    assert_eq!(
        idle("/market fed-cuts-march"),
        MessageOutcome::Dispatch(PositionCommand::Market {
            slug_or_url: "fed-cuts-march".to_string()
        })
    );
}

#[test]
fn botname_suffix_is_stripped() {
    assert_eq!(
        idle("/positions@lp_sentinel_bot"),
        MessageOutcome::Dispatch(PositionCommand::List)
    );
}

#[test]
fn non_command_chatter_is_ignored_when_idle() {
    assert_eq!(idle("hello there"), MessageOutcome::Ignore);
}

#[test]
fn unknown_command_gets_a_pointer_to_help() {
    match idle("/frobnicate") {
        MessageOutcome::Reply(reply) => assert!(reply.contains("/help")),
        other => panic!("expected reply, got {:?}", other),
    }
}

#[test]
fn add_position_parses_with_notes() {
    assert_eq!(
        idle("/add_position fed-cuts-march YES 36.5 watch this one"),
        MessageOutcome::Dispatch(PositionCommand::Add {
            slug_or_url: "fed-cuts-march".to_string(),
            side: Side::Yes,
            price_cents: dec!(36.5),
            notes: "watch this one".to_string(),
        })
    );
}

#[test]
fn add_position_usage_errors() {
    for bad in [
        "/add_position",
        "/add_position slug YES",
        "/add_position slug MAYBE 30",
        "/add_position slug YES not-a-number",
    ] {
        match idle(bad) {
            MessageOutcome::Reply(reply) => {
                assert!(reply.contains("Usage"), "no usage hint for '{}'", bad)
            }
            other => panic!("expected usage reply for '{}', got {:?}", bad, other),
        }
    }
}

#[test]
fn edit_and_remove_parse() {
    assert_eq!(
        idle("/edit_position 2 41"),
        MessageOutcome::Dispatch(PositionCommand::Edit {
            index: 2,
            new_price: dec!(41)
        })
    );
    assert_eq!(
        idle("/remove_position 3 1 junk 3"),
        MessageOutcome::Dispatch(PositionCommand::Remove {
            indices: vec![3, 1, 3]
        })
    );
    match idle("/remove_position junk") {
        MessageOutcome::Reply(reply) => assert!(reply.contains("No valid indices")),
        other => panic!("expected reply, got {:?}", other),
    }
}

#[test]
fn bulk_mode_arms_consumes_one_message_and_disarms() {
    let (state, outcome) = step(ChatInputState::Idle, "/bulk_add");
    assert_eq!(state, ChatInputState::AwaitingBulkLines);
    assert!(matches!(outcome, MessageOutcome::Reply(_)));

    let payload = "alpha YES 25\nbeta NO 60";
    let (state, outcome) = step(state, payload);
    assert_eq!(state, ChatInputState::Idle);
    assert_eq!(
        outcome,
        MessageOutcome::Dispatch(PositionCommand::BulkAdd {
            text: payload.to_string()
        })
    );
}

#[test]
fn bulk_mode_consumes_even_an_unparseable_payload() {
    let (state, _) = step(ChatInputState::Idle, "/bulk_add");
    let (state, outcome) = step(state, "complete nonsense");
    // The payload is dispatched anyway; the book reports it skipped.
    // Either way the state machine is back to idle.
    assert_eq!(state, ChatInputState::Idle);
    assert!(matches!(
        outcome,
        MessageOutcome::Dispatch(PositionCommand::BulkAdd { .. })
    ));
}

#[test]
fn command_during_bulk_mode_cancels_it() {
    let (state, _) = step(ChatInputState::Idle, "/bulk_add");
    let (state, outcome) = step(state, "/positions");
    assert_eq!(state, ChatInputState::Idle);
    assert_eq!(outcome, MessageOutcome::Dispatch(PositionCommand::List));
}

#[test]
fn apply_add_edit_remove_round_trip() {
    let (_dir, mut b) = book();

    let replies = apply(
        &mut b,
        &[],
        PositionCommand::Add {
            slug_or_url: "fed-cuts-march".to_string(),
            side: Side::Yes,
            price_cents: dec!(36),
            notes: String::new(),
        },
    );
    assert!(replies[0].contains("Added position"));
    assert_eq!(b.len(), 1);

    let replies = apply(
        &mut b,
        &[],
        PositionCommand::Edit {
            index: 1,
            new_price: dec!(38),
        },
    );
    assert!(replies[0].contains("Old price: 36.0¢"));
    assert!(replies[0].contains("New price: 38.0¢"));

    let replies = apply(&mut b, &[], PositionCommand::Remove { indices: vec![1, 9] });
    assert!(replies[0].contains("Removed position(s):"));
    assert!(replies[0].contains("Ignored out-of-range index/indices: 9"));
    assert!(b.is_empty());
}

#[test]
fn apply_rejects_bad_edit_with_reason() {
    let (_dir, mut b) = book();
    let replies = apply(
        &mut b,
        &[],
        PositionCommand::Edit {
            index: 5,
            new_price: dec!(38),
        },
    );
    assert!(replies[0].contains("out of range"));
    assert!(replies[0].contains("/positions"));
}

#[test]
fn apply_bulk_reports_counts() {
    let (_dir, mut b) = book();
    let replies = apply(
        &mut b,
        &[],
        PositionCommand::BulkAdd {
            text: "alpha YES 25\nbroken\nbeta NO 60".to_string(),
        },
    );
    assert_eq!(
        replies[0],
        "Bulk add complete. Added 2 position(s), skipped 1 malformed line(s)."
    );
    assert_eq!(b.len(), 2);
}

#[test]
fn apply_list_on_empty_book() {
    let (_dir, mut b) = book();
    assert_eq!(apply(&mut b, &[], PositionCommand::List), vec![
        "No positions saved.".to_string()
    ]);
}

#[test]
fn apply_out_of_range_filters_rows() {
    let (_dir, mut b) = book();
    apply(
        &mut b,
        &[],
        PositionCommand::Add {
            slug_or_url: "a".to_string(),
            side: Side::Yes,
            price_cents: dec!(50),
            notes: String::new(),
        },
    );

    let rows = vec![
        row(1, "a", dec!(0.5), false),
        row(2, "b", dec!(7.0), true),
    ];
    let replies = apply(&mut b, &rows, PositionCommand::OutOfRange);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Question for b?"));
    assert!(!replies[0].contains("Question for a?"));
    assert!(replies[0].contains("OUT OF RANGE"));
}

#[test]
fn apply_market_filters_by_normalized_slug() {
    let (_dir, mut b) = book();
    apply(
        &mut b,
        &[],
        PositionCommand::Add {
            slug_or_url: "a".to_string(),
            side: Side::Yes,
            price_cents: dec!(50),
            notes: String::new(),
        },
    );

    let rows = vec![row(1, "a", dec!(1.0), false), row(2, "b", dec!(2.0), false)];
    let replies = apply(
        &mut b,
        &rows,
        PositionCommand::Market {
            slug_or_url: "https://polymarket.com/event/something/a".to_string(),
        },
    );
    assert!(replies[0].contains("Question for a?"));
    assert!(!replies[0].contains("Question for b?"));

    let replies = apply(
        &mut b,
        &rows,
        PositionCommand::Market {
            slug_or_url: "unknown-market".to_string(),
        },
    );
    assert!(replies[0].contains("No positions found"));
}

#[test]
fn unresolved_rows_render_a_distinct_status() {
    let unresolved = MonitorRow {
        index: 4,
        slug: "gone".to_string(),
        question: "gone".to_string(),
        url: None,
        side: Side::No,
        limit_price_cents: dec!(30),
        quote: None,
    };
    let line = format_row(&unresolved);
    assert!(line.contains("market not found"));
    assert!(line.contains("n/a"));
}

#[test]
fn long_listings_chunk_under_the_message_limit() {
    let rows: Vec<MonitorRow> = (1..=60)
        .map(|i| {
            let mut r = row(i, "m", dec!(2.0), false);
            r.question = format!("{} {}", "A rather long market question".repeat(3), i);
            r
        })
        .collect();

    let header = "<b>Current positions</b>";
    let chunks = format_rows(header, rows.iter());
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.len() <= CHUNK_LIMIT + 200);
        assert!(chunk.starts_with(header));
    }
    // Every row appears exactly once across chunks
    let merged = chunks.join("");
    for i in 1..=60 {
        assert_eq!(merged.matches(&format!("<b>{}. ", i)).count(), 1);
    }
}
