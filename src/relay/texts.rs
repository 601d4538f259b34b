//! User-facing texts. Everything the bot says lives here.

use teloxide::types::ChatId;
use teloxide::utils::html;

use crate::relay::message::Sender;
use crate::relay::permissions::{Capability, PermissionReport};

pub const NOT_READY_WARNING: &str = "⚠️ البوت لا يملك الصلاحيات الكافية";
pub const FIX_PERMISSIONS_BUTTON: &str = "إصلاح الصلاحيات";
pub const VOICE_RECEIVED: &str = "✅ تم استلام تسجيلكِ بنجاح وسيتم المراجعة قريباً";
pub const FORWARD_FAILED: &str = "❌ تعذر إرسال التسجيل. يرجى المحاولة لاحقاً";
pub const BLOCKED_FROM_CHANNEL: &str = "🔒 البوت محظور من القناة!";
pub const INVALID_CHANNEL: &str = "⚠️ معرف القناة غير صالح";
pub const VOICE_ONLY: &str = "📢 يرجى إرسال تسجيل صوتي فقط\nاستخدمي /start لمعرفة التعليمات";

const UNKNOWN_NAME: &str = "مستخدم";
const UNKNOWN_USERNAME: &str = "غير متوفر";

/// Welcome text for `/start` and `/help`. HTML.
pub fn welcome(channel_title: &str, channel_link: &str) -> String {
    let title = html::escape(channel_title);
    let channel = format!("<a href=\"{}\">قناة {}</a>", html::escape(channel_link), title);
    format!(
        "السلام عليكم ورحمة الله وبركاته 🌸\n\n\
         أهلاً بكِ في بوت {title} لحفظ القرآن الكريم.\n\n\
         📌 كيفية الإرسال:\n\
         1. اضغط على أيقونة الميكروفون\n\
         2. سجلي الوجه المطلوب\n\
         3. اكتبي اسمك في وصف الرسالة\n\n\
         التسجيلات ترسل إلى: {channel}"
    )
}

pub fn status(channel_title: &str, channel_id: ChatId, ready: bool) -> String {
    let readiness = if ready { "✅ جاهز" } else { "❌ تحتاج إصلاح" };
    format!(
        "✅ حالة البوت:\n- القناة: {}\n- المعرف: {}\n- الصلاحيات: {}",
        channel_title, channel_id, readiness
    )
}

fn mark(ok: bool) -> &'static str {
    if ok { "✅" } else { "❌" }
}

fn capability_label(capability: Capability) -> &'static str {
    match capability {
        Capability::PostMessages => "إرسال رسائل",
        Capability::SendMedia => "إرسال وسائط",
    }
}

pub fn permissions(channel_title: &str, report: &PermissionReport) -> String {
    let mut lines = vec![
        format!("صلاحيات البوت في {}:", channel_title),
        format!("- الحالة: {}", report.status),
    ];
    for capability in Capability::REQUIRED {
        lines.push(format!(
            "- {}: {}",
            capability_label(capability),
            mark(report.has(capability))
        ));
    }
    lines.join("\n")
}

pub fn permissions_check_failed(reason: &str) -> String {
    format!("خطأ في التحقق: {}", reason)
}

/// Caption attached to the forwarded recording. HTML.
pub fn voice_caption(sender: Option<&Sender>) -> String {
    let name = sender
        .and_then(|s| s.first_name.as_deref())
        .map(html::escape)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let username = sender
        .and_then(|s| s.username.as_deref())
        .map(html::escape)
        .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
    let id = sender
        .map(|s| s.id.to_string())
        .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
    format!("تسجيل جديد من: {}\nالمعرف: @{}\nالرقم: {}", name, username, id)
}

/// Deep link that opens Telegram's "add bot to channel" flow.
pub fn add_to_channel_url(bot_username: &str) -> String {
    format!("https://t.me/{}?startchannel=true", bot_username)
}

pub fn sender_label(sender: Option<&Sender>) -> String {
    match sender {
        Some(Sender { id, username: Some(username), .. }) => format!("@{} ({})", username, id),
        Some(Sender { id, first_name: Some(name), .. }) => format!("{} ({})", name, id),
        Some(Sender { id, .. }) => id.to_string(),
        None => "unknown sender".to_string(),
    }
}
