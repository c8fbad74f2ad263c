use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Message;

use super::dispatcher::{CommandRouter, InboundMessage};
use crate::errors::AppError;

/// 转换为内部消息；没有发送者、来自机器人或不含文本的消息返回 None
fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let user = msg.from.as_ref()?;
    if user.is_bot {
        return None;
    }
    let text = msg.text()?;

    Some(InboundMessage {
        chat_id: msg.chat.id.0,
        sender_id: i64::try_from(user.id.0).ok()?,
        username: user.username.clone().unwrap_or_default(),
        text: text.to_string(),
    })
}

/// 长轮询接收消息，每条消息处理完成后把回复发回原会话
pub async fn run_polling(bot: Bot, router: Arc<CommandRouter>) {
    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let router = Arc::clone(&router);
        async move {
            let Some(inbound) = to_inbound(&msg) else {
                return respond(());
            };

            let reply = router.dispatch(&inbound).await;
            if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                let err = AppError::from(e);
                tracing::error!(chat_id = inbound.chat_id, "{}", err.format_simple());
            }
            respond(())
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            tracing::trace!("unhandled update: {:?}", upd.kind);
        })
        .build();

    tracing::info!("Telegram polling started");
    dispatcher.dispatch().await;
    tracing::info!("Telegram polling stopped");
}
