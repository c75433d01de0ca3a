use super::*;

#[test]
fn request_sets_fields() {
    let frame = Frame::request("queue:advance", Data::new());
    assert_eq!(frame.op, "queue:advance");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn reply_inherits_context() {
    let req = Frame::request("queue:get", Data::new());
    let done = req.done(Data::new());

    assert_eq!(done.parent_id, Some(req.id));
    assert_eq!(done.op, "queue:get");
    assert_eq!(done.status, Status::Done);
}

#[test]
fn error_carries_message() {
    let req = Frame::request("queue:patch", Data::new());
    let err = req.error("invalid patch");

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.data.get(FRAME_MESSAGE).and_then(|v| v.as_str()), Some("invalid patch"));
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("storage unavailable")]
    struct StorageDown;

    impl ErrorCode for StorageDown {
        fn error_code(&self) -> &'static str {
            "E_STORE"
        }
    }

    let req = Frame::request("queue:advance", Data::new());
    let err = req.error_from(&StorageDown);

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.data.get(FRAME_CODE).and_then(|v| v.as_str()), Some("E_STORE"));
    assert_eq!(
        err.data.get(FRAME_MESSAGE).and_then(|v| v.as_str()),
        Some("storage unavailable")
    );
}

#[test]
fn prefix_extraction() {
    let frame = Frame::request("queue:patch", Data::new());
    assert_eq!(frame.prefix(), "queue");

    let frame = Frame::request("noseparator", Data::new());
    assert_eq!(frame.prefix(), "noseparator");
}

#[test]
fn status_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Status::Request).unwrap(), "\"request\"");
    assert_eq!(serde_json::to_string(&Status::Done).unwrap(), "\"done\"");
    assert_eq!(serde_json::to_string(&Status::Error).unwrap(), "\"error\"");
}

#[test]
fn json_round_trip() {
    let original = Frame::request("queue:patch", Data::new()).with_data("currentNumber", 5);

    let json = serde_json::to_string(&original).expect("serialize");
    let restored: Frame = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.op, "queue:patch");
    assert_eq!(restored.status, Status::Request);
    assert_eq!(
        restored.data.get("currentNumber").and_then(serde_json::Value::as_i64),
        Some(5)
    );
}
