//! Telegram bot command surface
//!
//! Polls getUpdates in a background task, parses free text into
//! structured [`PositionCommand`] values, and forwards them over an
//! mpsc channel to the monitor loop, which applies them between poll
//! cycles. Formatting of monitor rows for chat lives here too.
//!
//! Supported commands: /positions, /out_of_range, /market,
//! /add_position, /edit_position, /bulk_add, /remove_position, /help

#[cfg(test)]
mod tests;

use crate::monitor::MonitorRow;
use crate::positions::{normalize_market_slug, AddOutcome, PositionBook};
use crate::types::Side;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Keep each message comfortably under Telegram's 4096-char cap
const CHUNK_LIMIT: usize = 3500;

const QUESTION_DISPLAY_LIMIT: usize = 120;

/// Structured position-management operations the bot forwards to the
/// monitor loop
#[derive(Debug, Clone, PartialEq)]
pub enum PositionCommand {
    /// List all positions, risk-ordered
    List,
    /// List only out-of-range positions
    OutOfRange,
    /// List positions on one market
    Market { slug_or_url: String },
    Add {
        slug_or_url: String,
        side: Side,
        price_cents: Decimal,
        notes: String,
    },
    Edit {
        index: usize,
        new_price: Decimal,
    },
    /// Raw bulk payload, one position per line
    BulkAdd { text: String },
    Remove { indices: Vec<usize> },
}

/// Per-chat input state: /bulk_add arms bulk mode, and the very next
/// message (payload or not) disarms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatInputState {
    #[default]
    Idle,
    AwaitingBulkLines,
}

/// What one incoming message produces
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Forward to the monitor loop
    Dispatch(PositionCommand),
    /// Answer directly (help text, usage errors)
    Reply(String),
    /// Non-command chatter outside bulk mode
    Ignore,
}

/// Advance the input state machine with one incoming message.
/// Pure, so the transitions are testable without a live bot.
pub fn step(state: ChatInputState, text: &str) -> (ChatInputState, MessageOutcome) {
    let text = text.trim();

    if state == ChatInputState::AwaitingBulkLines {
        if !text.starts_with('/') && !text.is_empty() {
            return (
                ChatInputState::Idle,
                MessageOutcome::Dispatch(PositionCommand::BulkAdd {
                    text: text.to_string(),
                }),
            );
        }
        // A command cancels bulk mode and is handled normally
        return step(ChatInputState::Idle, text);
    }

    if !text.starts_with('/') {
        return (ChatInputState::Idle, MessageOutcome::Ignore);
    }

    let mut parts = text.split_whitespace();
    let raw_cmd = parts.next().unwrap_or("");
    // Clients may send /cmd@botname
    let cmd = raw_cmd.split('@').next().unwrap_or(raw_cmd).to_lowercase();
    let args: Vec<&str> = parts.collect();

    let outcome = match cmd.as_str() {
        "/positions" | "/pos" => MessageOutcome::Dispatch(PositionCommand::List),
        "/out_of_range" => MessageOutcome::Dispatch(PositionCommand::OutOfRange),
        "/market" => match args.first() {
            Some(target) => MessageOutcome::Dispatch(PositionCommand::Market {
                slug_or_url: target.to_string(),
            }),
            None => MessageOutcome::Reply("Usage: /market <slug-or-url>".to_string()),
        },
        "/add_position" => parse_add(&args),
        "/edit_position" => parse_edit(&args),
        "/remove_position" => parse_remove(&args),
        "/bulk_add" => {
            return (
                ChatInputState::AwaitingBulkLines,
                MessageOutcome::Reply(
                    "Send positions in the next message, one per line, in this format:\n\
                    <slug-or-url> <YES/NO> <price-in-cents>\n\n\
                    Example:\n\
                    https://polymarket.com/event/fed-decision/fed-cuts-march YES 36\n\
                    will-shutdown-end-by-march NO 43.5"
                        .to_string(),
                ),
            );
        }
        "/help" | "/start" => MessageOutcome::Reply(help_text()),
        other => MessageOutcome::Reply(format!(
            "Unknown command: {}\nUse /help for available commands",
            other
        )),
    };

    (ChatInputState::Idle, outcome)
}

fn parse_add(args: &[&str]) -> MessageOutcome {
    const USAGE: &str = "Usage: /add_position <slug> <YES/NO> <price-in-cents> [notes]";
    if args.len() < 3 {
        return MessageOutcome::Reply(USAGE.to_string());
    }
    let Ok(side) = Side::from_str(args[1]) else {
        return MessageOutcome::Reply(format!("Side must be YES or NO. {}", USAGE));
    };
    let Ok(price_cents) = Decimal::from_str(args[2]) else {
        return MessageOutcome::Reply(format!("Invalid price. {}", USAGE));
    };
    MessageOutcome::Dispatch(PositionCommand::Add {
        slug_or_url: args[0].to_string(),
        side,
        price_cents,
        notes: args[3..].join(" "),
    })
}

fn parse_edit(args: &[&str]) -> MessageOutcome {
    const USAGE: &str = "Usage: /edit_position <index> <new-price-in-cents>";
    if args.len() < 2 {
        return MessageOutcome::Reply(USAGE.to_string());
    }
    let Ok(index) = args[0].parse::<usize>() else {
        return MessageOutcome::Reply(format!("Index must be a number. {}", USAGE));
    };
    let Ok(new_price) = Decimal::from_str(args[1]) else {
        return MessageOutcome::Reply(format!("Invalid price. {}", USAGE));
    };
    MessageOutcome::Dispatch(PositionCommand::Edit { index, new_price })
}

fn parse_remove(args: &[&str]) -> MessageOutcome {
    const USAGE: &str = "Usage: /remove_position <index> [index2 index3 ...]";
    let indices: Vec<usize> = args.iter().filter_map(|t| t.parse().ok()).collect();
    if indices.is_empty() {
        return MessageOutcome::Reply(format!("No valid indices provided. {}", USAGE));
    }
    MessageOutcome::Dispatch(PositionCommand::Remove { indices })
}

fn help_text() -> String {
    "Commands:\n\
    /positions — list current positions (risk-ordered)\n\
    /out_of_range — list only OUT OF RANGE positions (distance ≥ 5¢)\n\
    /market <slug-or-url> — show only positions for a specific market\n\
    /add_position <slug> <YES/NO> <price-in-cents> [notes]\n\
    /edit_position <index> <new-price> — change the price of an existing position\n\
    /bulk_add — add many positions; next message: one '<slug> <YES/NO> <price>' per line\n\
    /remove_position <index...> — remove by index from /positions\n\
    /help — show this message"
        .to_string()
}

/// Apply a structured command against the book and the latest monitor
/// rows, returning the chat replies. Mutations persist before the
/// reply goes out; a failed save is reported instead of hidden.
pub fn apply(
    book: &mut PositionBook,
    latest_rows: &[MonitorRow],
    command: PositionCommand,
) -> Vec<String> {
    match command {
        PositionCommand::List => {
            if book.is_empty() {
                return vec!["No positions saved.".to_string()];
            }
            format_rows(
                "<b>Current positions</b>\n(sorted by risk — closest & thinnest first):",
                latest_rows.iter(),
            )
        }
        PositionCommand::OutOfRange => {
            if book.is_empty() {
                return vec!["No positions saved.".to_string()];
            }
            let rows: Vec<&MonitorRow> = latest_rows
                .iter()
                .filter(|r| r.quote.as_ref().is_some_and(|q| q.out_of_range))
                .collect();
            if rows.is_empty() {
                return vec!["No OUT OF RANGE positions (distance ≥ 5¢).".to_string()];
            }
            format_rows(
                "<b>OUT OF RANGE positions</b>\n(distance ≥ 5¢; closest & thinnest first):",
                rows.into_iter(),
            )
        }
        PositionCommand::Market { slug_or_url } => {
            if book.is_empty() {
                return vec!["No positions saved.".to_string()];
            }
            let target = normalize_market_slug(&slug_or_url);
            let rows: Vec<&MonitorRow> =
                latest_rows.iter().filter(|r| r.slug == target).collect();
            if rows.is_empty() {
                return vec![
                    "No positions found for that market. \
                    Make sure you used the slug or URL of a market you have saved."
                        .to_string(),
                ];
            }
            let title = truncate(&rows[0].question, QUESTION_DISPLAY_LIMIT);
            format_rows(
                &format!(
                    "<b>Positions for market</b>\n{}\n(sorted by risk — closest & thinnest first):",
                    title
                ),
                rows.into_iter(),
            )
        }
        PositionCommand::Add {
            slug_or_url,
            side,
            price_cents,
            notes,
        } => match book.add_or_update(&slug_or_url, side, price_cents, &notes) {
            Ok(AddOutcome::Added) => with_save(
                book,
                format!(
                    "Added position: {} @ {:.1}¢ on {}",
                    side,
                    price_cents,
                    normalize_market_slug(&slug_or_url)
                ),
            ),
            Ok(AddOutcome::Updated { old_price }) => with_save(
                book,
                format!(
                    "Updated existing position on this market/side.\n\
                    {} on {}\n\
                    Old price: {:.1}¢\n\
                    New price: {:.1}¢",
                    side,
                    normalize_market_slug(&slug_or_url),
                    old_price,
                    price_cents
                ),
            ),
            Err(e) => vec![e.to_string()],
        },
        PositionCommand::Edit { index, new_price } => match book.edit_price(index, new_price) {
            Ok(outcome) => with_save(
                book,
                format!(
                    "Updated position {}: {} on {}\n\
                    Old price: {:.1}¢\n\
                    New price: {:.1}¢",
                    index,
                    outcome.side,
                    normalize_market_slug(&outcome.market_slug),
                    outcome.old_price,
                    outcome.new_price
                ),
            ),
            Err(e) => vec![format!("{}\nUse /positions to see valid indices.", e)],
        },
        PositionCommand::BulkAdd { text } => {
            let report = book.bulk_add(&text);
            let mut msg = format!("Bulk add complete. Added {} position(s)", report.added);
            if report.updated > 0 {
                msg.push_str(&format!(", updated {} existing position(s)", report.updated));
            }
            if report.skipped > 0 {
                msg.push_str(&format!(", skipped {} malformed line(s)", report.skipped));
            }
            msg.push('.');
            if report.added > 0 || report.updated > 0 {
                with_save(book, msg)
            } else {
                vec![msg]
            }
        }
        PositionCommand::Remove { indices } => match book.remove(&indices) {
            Ok(report) => {
                let mut lines = vec!["Removed position(s):".to_string()];
                for removed in &report.removed {
                    lines.push(format!(
                        "{}. {} @ {:.1}¢ on {}",
                        removed.index,
                        removed.position.side,
                        removed.position.limit_price_cents,
                        normalize_market_slug(&removed.position.market_slug)
                    ));
                }
                if !report.out_of_range.is_empty() {
                    lines.push(format!(
                        "Ignored out-of-range index/indices: {}",
                        report
                            .out_of_range
                            .iter()
                            .map(|i| i.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                }
                with_save(book, lines.join("\n"))
            }
            Err(e) => vec![format!("{}\nUse /positions to see valid indices.", e)],
        },
    }
}

fn with_save(book: &PositionBook, message: String) -> Vec<String> {
    match book.save() {
        Ok(()) => vec![message],
        Err(e) => vec![format!("{}\n⚠️ Saving positions failed: {}", message, e)],
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Render one monitor row the way the terminal does, as an HTML line
pub fn format_row(row: &MonitorRow) -> String {
    let question = truncate(&row.question, QUESTION_DISPLAY_LIMIT);
    match &row.quote {
        Some(quote) => {
            let dist = if quote.out_of_range {
                format!("{:.1}¢ OUT OF RANGE", quote.distance_cents)
            } else {
                format!("{:.1}¢", quote.distance_cents)
            };
            format!(
                "\n\n<b>{}. {}</b>\n\
                Side: <b>{}</b> • \
                Current: <b>{:.1}¢</b> • \
                Limit: <b>{:.1}¢</b> • \
                Distance: <b>{}</b> • \
                Bids before: <b>${:.2}</b>",
                row.index,
                question,
                row.side,
                quote.current_price_cents,
                row.limit_price_cents,
                dist,
                quote.bids_before,
            )
        }
        None => format!(
            "\n\n<b>{}. {}</b>\n\
            Side: <b>{}</b> • \
            Limit: <b>{:.1}¢</b> • \
            Current: <b>n/a</b> • \
            Distance: <b>n/a</b> • \
            Bids before: <b>n/a</b> — market not found, consider /remove_position",
            row.index, question, row.side, row.limit_price_cents,
        ),
    }
}

/// Chunk formatted rows under the Telegram message limit, repeating
/// the header on every chunk
pub fn format_rows<'a>(
    header: &str,
    rows: impl Iterator<Item = &'a MonitorRow>,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = header.to_string();

    for row in rows {
        let line = format_row(row);
        if current.len() + line.len() > CHUNK_LIMIT {
            chunks.push(current);
            current = format!("{}{}", header, line);
        } else {
            current.push_str(&line);
        }
    }
    chunks.push(current);
    chunks
}

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    #[allow(dead_code)]
    ok: bool,
    result: Vec<TelegramUpdate>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
    edited_message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// The polling half of the command surface
pub struct TelegramBot {
    http: Client,
    bot_token: String,
    chat_id: String,
    command_tx: mpsc::Sender<PositionCommand>,
}

impl TelegramBot {
    pub fn new(
        bot_token: String,
        chat_id: String,
        command_tx: mpsc::Sender<PositionCommand>,
    ) -> Self {
        Self {
            http: Client::new(),
            bot_token,
            chat_id,
            command_tx,
        }
    }

    /// Long-poll getUpdates forever, feeding the command channel.
    /// Only the configured chat is honored.
    pub async fn start_polling(self: Arc<Self>) {
        tracing::info!("Starting Telegram command listener...");

        let mut last_update_id: i64 = 0;
        let mut input_state = ChatInputState::Idle;

        loop {
            match self.poll_updates(last_update_id).await {
                Ok(updates) => {
                    for update in updates {
                        last_update_id = last_update_id.max(update.update_id + 1);

                        let Some(msg) = update.message.or(update.edited_message) else {
                            continue;
                        };
                        if msg.chat.id.to_string() != self.chat_id {
                            continue;
                        }
                        let Some(text) = msg.text else {
                            continue;
                        };

                        let (next_state, outcome) = step(input_state, &text);
                        input_state = next_state;

                        match outcome {
                            MessageOutcome::Dispatch(command) => {
                                if self.command_tx.send(command).await.is_err() {
                                    tracing::warn!("Command channel closed, stopping listener");
                                    return;
                                }
                            }
                            MessageOutcome::Reply(reply) => self.reply(&reply).await,
                            MessageOutcome::Ignore => {}
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to poll Telegram updates: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        }
    }

    async fn poll_updates(&self, offset: i64) -> crate::error::Result<Vec<TelegramUpdate>> {
        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates?offset={}&timeout=30",
            self.bot_token, offset
        );

        let response: GetUpdatesResponse = self.http.get(&url).send().await?.json().await?;
        Ok(response.result)
    }

    async fn reply(&self, text: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        if let Err(e) = self.http.post(&url).json(&body).send().await {
            tracing::error!("Failed to send Telegram reply: {}", e);
        }
    }
}
