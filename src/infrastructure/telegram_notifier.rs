use std::sync::Arc;

use async_trait::async_trait;

use crate::application::{AppError, AppResult, ChatNotifier, WatchStore};
use crate::domain::patreon::{CampaignData, RewardData};
use crate::domain::RewardId;

/// Send-only Telegram Bot API client. The interactive command surface lives
/// outside this crate; all it shares with us is the chat id.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_key: String,
    base_domain: String,
    store: Arc<dyn WatchStore>,
    default_locale: String,
}

impl TelegramNotifier {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        base_domain: String,
        store: Arc<dyn WatchStore>,
        default_locale: String,
    ) -> Self {
        Self {
            http,
            api_key,
            base_domain,
            store,
            default_locale,
        }
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.api_key);

        self.http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::Notifier(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Notifier(e.to_string()))?;

        Ok(())
    }

    /// Stored chat locale, falling back to the configured default.
    async fn locale_for_chat(&self, chat_id: i64) -> String {
        match self.store.chat_locale(chat_id).await {
            Ok(Some(locale)) => locale,
            Ok(None) => self.default_locale.clone(),
            Err(e) => {
                tracing::warn!(chat = chat_id, error = %e, "locale lookup failed, using default");
                self.default_locale.clone()
            }
        }
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    async fn send_available(
        &self,
        chat_id: i64,
        reward: &RewardData,
        campaign: &CampaignData,
    ) -> AppResult<()> {
        let locale = self.locale_for_chat(chat_id).await;
        let ra = &reward.attributes;
        let ca = &campaign.attributes;

        let text = format!(
            "New reward available for <a href=\"{}\">{}</a>\n\n\
             <a href=\"{}\"><b>{}</b></a>\nfor <b>{}</b>\n\n\
             ID: <code>{}</code>",
            ca.url,
            html_escape(&ca.name),
            ra.full_url(&self.base_domain),
            html_escape(&ra.title),
            format_amount(ra.amount_cents, &ra.currency, &locale),
            reward.id,
        );

        self.send_message(chat_id, &text).await
    }

    async fn send_missing(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        self.send_message(
            chat_id,
            &format!(
                "WARNING: Reward with ID <code>{reward_id}</code> could not be found. \
                 It may have been removed."
            ),
        )
        .await
    }

    async fn send_forbidden(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        self.send_message(
            chat_id,
            &format!(
                "WARNING: Access to reward with ID <code>{reward_id}</code> is forbidden. \
                 It may have been removed."
            ),
        )
        .await
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Currency string for notification text. Decimal separator follows the chat's
/// language; well-known currencies get their symbol, the rest keep the code.
fn format_amount(amount_cents: i64, currency: &str, locale: &str) -> String {
    let lang = locale
        .split(['-', '_'])
        .next()
        .unwrap_or("en")
        .to_ascii_lowercase();
    let decimal_comma = matches!(
        lang.as_str(),
        "de" | "es" | "fr" | "it" | "nl" | "pl" | "pt" | "ru" | "sv"
    );
    let sep = if decimal_comma { ',' } else { '.' };
    let number = format!("{}{}{:02}", amount_cents / 100, sep, amount_cents % 100);

    let symbol = match currency {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    };

    match symbol {
        Some(s) if decimal_comma => format!("{number} {s}"),
        Some(s) => format!("{s}{number}"),
        None => format!("{number} {currency}"),
    }
}
