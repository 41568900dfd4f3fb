//! Telegram notifications
//!
//! Thin sendMessage wrapper. Delivery failures are logged and
//! swallowed; an unreachable Telegram must never stall the monitor.

use crate::error::Result;
use crate::monitor::{Alert, AlertDirection};
use crate::scanner::updown::UpDownOpportunity;
use reqwest::Client;
use serde::Serialize;

/// Telegram notifier; `disabled()` turns every send into a no-op
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: Option<String>,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    parse_mode: String,
    disable_web_page_preview: bool,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: Client::new(),
            bot_token: Some(bot_token),
            chat_id,
        }
    }

    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            bot_token: None,
            chat_id: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some()
    }

    /// Send an HTML-formatted message to the configured chat
    pub async fn send(&self, text: &str) -> Result<()> {
        let Some(token) = &self.bot_token else {
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let request = SendMessageRequest {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "HTML".to_string(),
            disable_web_page_preview: true,
        };

        if let Err(e) = self.http.post(&url).json(&request).send().await {
            tracing::error!("Failed to send Telegram message: {}", e);
        }
        Ok(())
    }

    /// Price-approaching-limit alert
    pub async fn price_alert(&self, alert: &Alert) -> Result<()> {
        let direction = match alert.direction {
            AlertDirection::RisingToward => "rising toward",
            AlertDirection::FallingToward => "falling toward",
        };
        let question: String = alert.question.chars().take(80).collect();

        let text = format!(
            "🚨 <b>PRICE ALERT</b>\n\n\
            <b>{}. {}</b>\n\n\
            Price {} your limit on <b>{}</b>.\n\
            • Current: <b>{:.1}¢</b>\n\
            • Your limit: <b>{:.1}¢</b>\n\
            • Distance: <b>{:.1}¢</b>\n\
            • Bids before: <b>${:.2}</b>\n\n\
            <a href='{}'>View market</a>",
            alert.index,
            question,
            direction,
            alert.side,
            alert.current_price_cents,
            alert.limit_price_cents,
            alert.distance_cents,
            alert.bids_before,
            alert.url,
        );
        self.send(&text).await
    }

    /// Soon-starting Up/Down market notification
    pub async fn updown_alert(&self, opp: &UpDownOpportunity) -> Result<()> {
        let text = format!(
            "🚀 <b>UP/DOWN MARKET OPPORTUNITY</b>\n\n\
            <b>{}</b>\n\n\
            • Start: <b>{}</b> ({:.1} hours from now)\n\
            • Daily rewards: <b>${:.2}</b>\n\
            • <b>Zero risk until market opens</b> (price cannot move when closed)\n\n\
            <a href='{}'>View market</a>",
            opp.question,
            opp.start_time.format("%Y-%m-%d %H:%M UTC"),
            opp.hours_until_start,
            opp.daily_rewards,
            opp.url,
        );
        self.send(&text).await
    }

    /// Operational error notification
    pub async fn error(&self, context: &str, message: &str) -> Result<()> {
        let text = format!("⚠️ <b>{}</b>\n\n{}", context, message);
        self.send(&text).await
    }
}
