//! Messenger tests: deletable sends, media-kind probing, edit fallbacks, and
//! the admin alert channel, all against the recording mock.

mod common;

use std::sync::Arc;

use minibot_core::{
    ApiResponse, Chat, MediaKind, Message, Messenger, OutgoingMessage, SendTarget,
};

use common::{ok_response, rejected, ApiCall, MockApi, ADMIN_CHAT};

const CHAT: i64 = 5;

fn build() -> (Arc<MockApi>, Messenger) {
    let api = Arc::new(MockApi::new());
    (api.clone(), Messenger::new(api, ADMIN_CHAT))
}

fn existing_message(message_id: i64) -> Message {
    Message {
        message_id,
        date: 0,
        chat: Chat {
            id: CHAT,
            kind: "private".to_string(),
        },
        from: None,
        text: Some("previous".to_string()),
        entities: None,
        reply_to_message: None,
    }
}

fn with_file(file: &str) -> OutgoingMessage {
    OutgoingMessage {
        text: "caption".to_string(),
        file: Some(file.to_string()),
        ..Default::default()
    }
}

/// **Test: a text send to a chat id goes out once, with the delete button.**
#[tokio::test]
async fn plain_deletable_send_to_chat() {
    let (api, messenger) = build();
    let resp = messenger
        .send_deletable(SendTarget::Chat(CHAT), OutgoingMessage::text("hi"))
        .await
        .unwrap();
    assert!(resp.ok);
    assert!(matches!(
        api.calls().as_slice(),
        [ApiCall::SendMessage { chat_id: CHAT, text, has_delete_button: true }]
            if text == "hi"
    ));
}

/// **Test: an attachment is probed through the type-specific sends in order,
/// stopping at the first acceptance.**
#[tokio::test]
async fn file_send_probes_in_order() {
    let (api, messenger) = build();
    api.push_response("sendPhoto", rejected("Bad Request: not a photo"));
    api.push_response("sendAudio", ok_response());

    let resp = messenger
        .send_deletable(SendTarget::Chat(CHAT), with_file("file-1"))
        .await
        .unwrap();
    assert!(resp.ok);

    let methods: Vec<&str> = api
        .calls()
        .iter()
        .filter_map(|c| match c {
            ApiCall::SendFile { method, .. } => Some(*method),
            _ => None,
        })
        .collect();
    assert_eq!(methods, vec!["sendPhoto", "sendAudio"]);
    assert_eq!(api.calls().len(), 2);
}

/// **Test: when every send variant is rejected, the admin is alerted and the
/// caller gets an error.**
#[tokio::test]
async fn file_send_exhaustion_alerts_admin() {
    let (api, messenger) = build();
    for method in [
        "sendPhoto",
        "sendAudio",
        "sendVideo",
        "sendAnimation",
        "sendVoice",
        "sendVideoNote",
        "sendDocument",
    ] {
        api.push_response(method, rejected("Bad Request: rejected"));
    }

    let err = messenger
        .send_deletable(SendTarget::Chat(CHAT), with_file("file-1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("every send variant rejected"));

    let calls = api.calls();
    assert_eq!(calls.len(), 8);
    assert!(matches!(
        &calls[7],
        ApiCall::SendMessage { chat_id: ADMIN_CHAT, text, .. }
            if text.contains("every send variant was rejected for file-1")
    ));
}

/// **Test: a wrong-file-identifier rejection stops the probe immediately and
/// posts a corrupted-file notice into the chat.**
#[tokio::test]
async fn wrong_file_identifier_is_fatal() {
    let (api, messenger) = build();
    api.push_response("sendPhoto", rejected("Bad Request: wrong file identifier"));

    let err = messenger
        .send_deletable(SendTarget::Chat(CHAT), with_file("bad-file"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("corrupted file"));

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[0],
        ApiCall::SendFile { method: "sendPhoto", .. }
    ));
    assert!(matches!(
        &calls[1],
        ApiCall::SendMessage { chat_id: CHAT, text, has_delete_button: true }
            if text == "Corrupted file: bad-file"
    ));
}

/// **Test: a text edit that cannot land falls back to a fresh send and then
/// removes the superseded message.**
#[tokio::test]
async fn edit_falls_back_to_new_send() {
    let (api, messenger) = build();
    api.push_response(
        "editMessageText",
        rejected("Bad Request: message to edit not found"),
    );

    let resp = messenger
        .send_deletable(existing_message(10).into(), OutgoingMessage::text("new"))
        .await
        .unwrap();
    assert!(resp.ok);

    let calls = api.calls();
    assert!(matches!(
        &calls[0],
        ApiCall::EditMessageText { chat_id: CHAT, message_id: 10, text } if text == "new"
    ));
    assert!(matches!(
        &calls[1],
        ApiCall::SendMessage { chat_id: CHAT, has_delete_button: true, .. }
    ));
    assert!(matches!(
        &calls[2],
        ApiCall::DeleteMessage { chat_id: CHAT, message_id: 10 }
    ));
}

/// **Test: a successful in-place edit neither resends nor deletes.**
#[tokio::test]
async fn successful_edit_stands_alone() {
    let (api, messenger) = build();
    let resp = messenger
        .send_deletable(existing_message(10).into(), OutgoingMessage::text("new"))
        .await
        .unwrap();
    assert!(resp.ok);
    assert_eq!(api.calls().len(), 1);
}

/// **Test: a "message is exactly the same" rejection counts as a successful
/// media edit and stops the probe.**
#[tokio::test]
async fn identical_media_edit_counts_as_success() {
    let (api, messenger) = build();
    api.push_response(
        "editMessageMedia",
        rejected("Bad Request: message is exactly the same"),
    );

    let resp = messenger
        .send_deletable(existing_message(10).into(), with_file("file-1"))
        .await
        .unwrap();
    assert!(resp.description_contains("exactly the same"));
    assert!(matches!(
        api.calls().as_slice(),
        [ApiCall::EditMessageMedia { kind: MediaKind::Photo, chat_id: CHAT, message_id: 10 }]
    ));
}

/// **Test: media edits probe the declared kinds in order.**
#[tokio::test]
async fn media_edit_probes_kind_order() {
    let (api, messenger) = build();
    api.push_response("editMessageMedia", rejected("Bad Request: wrong type"));
    api.push_response("editMessageMedia", rejected("Bad Request: wrong type"));

    let resp = messenger
        .send_deletable(existing_message(10).into(), with_file("file-1"))
        .await
        .unwrap();
    assert!(resp.ok);

    let kinds: Vec<MediaKind> = api
        .calls()
        .iter()
        .filter_map(|c| match c {
            ApiCall::EditMessageMedia { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![MediaKind::Photo, MediaKind::Animation, MediaKind::Audio]
    );
}

/// **Test: an unlandable media edit falls back to the probing fresh send.**
#[tokio::test]
async fn media_edit_falls_back_to_new_send() {
    let (api, messenger) = build();
    api.push_response(
        "editMessageMedia",
        rejected("Bad Request: message to edit not found"),
    );

    let resp = messenger
        .send_deletable(existing_message(10).into(), with_file("file-1"))
        .await
        .unwrap();
    assert!(resp.ok);

    // Fatal on the first edit attempt, then the send probe takes over.
    let calls = api.calls();
    assert!(matches!(&calls[0], ApiCall::EditMessageMedia { .. }));
    assert!(matches!(
        &calls[1],
        ApiCall::SendFile { method: "sendPhoto", chat_id: CHAT, .. }
    ));
    assert!(matches!(
        &calls[2],
        ApiCall::DeleteMessage { chat_id: CHAT, message_id: 10 }
    ));
}

/// **Test: ask_question hides the identifier in the code-language marker and
/// requests a forced reply instead of the delete keyboard.**
#[tokio::test]
async fn ask_question_embeds_marker() {
    let (api, messenger) = build();
    let resp = messenger.ask_question(CHAT, "Favorite color?", "q1").await.unwrap();
    assert!(resp.ok);
    assert!(matches!(
        api.calls().as_slice(),
        [ApiCall::SendMessage { chat_id: CHAT, text, has_delete_button: false }]
            if text.contains("language--questionIDq1") && text.ends_with("Favorite color?")
    ));
}

/// **Test: admin alerts are truncated and never propagate failures.**
#[tokio::test]
async fn alert_admin_truncates() {
    let (api, messenger) = build();
    api.push_response("sendMessage", rejected("Bad Request: chat not found"));
    let oversized = "x".repeat(4000);
    messenger.alert_admin(&oversized).await;

    assert!(matches!(
        api.calls().as_slice(),
        [ApiCall::SendMessage { chat_id: ADMIN_CHAT, text, has_delete_button: true }]
            if text.chars().count() == "Alert: ".len() + 3000
    ));
}

/// **Test: the platform's result payload passes through to the caller.**
#[tokio::test]
async fn send_returns_platform_envelope() {
    let (api, messenger) = build();
    api.push_response(
        "sendMessage",
        ApiResponse {
            result: Some(serde_json::json!({
                "message_id": 77,
                "chat": {"id": CHAT, "type": "private"}
            })),
            ..ok_response()
        },
    );
    let resp = messenger
        .send_deletable(SendTarget::Chat(CHAT), OutgoingMessage::text("hi"))
        .await
        .unwrap();
    let sent: Message = resp.result_as().unwrap();
    assert_eq!(sent.message_id, 77);
}
