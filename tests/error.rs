use std::path::PathBuf;

use serde_json::Value;
use kanban::error::{exit_codes, Error, JsonError};

#[test]
fn exit_code_user_error() {
    for err in [
        Error::InvalidArgument("bad input".to_string()),
        Error::Validation("title cannot be empty".to_string()),
        Error::NotFound("01abc".to_string()),
        Error::InvalidConfig("bad config".to_string()),
    ] {
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR, "{err}");
    }
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::OperationFailed("boom".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);

    let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
    assert_eq!(io.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn details_include_missing_task_id() {
    let err = Error::NotFound("01hzx".to_string());
    let details = err.details().expect("details");
    assert_eq!(details["id"], Value::String("01hzx".to_string()));
}

#[test]
fn details_include_lock_path() {
    let err = Error::LockFailed(PathBuf::from("/data/kanbanTasks.lock"));
    let details = err.details().expect("details");
    assert_eq!(details["path"], Value::String("/data/kanbanTasks.lock".to_string()));
}

#[test]
fn json_error_includes_details() {
    let err = Error::InvalidConfig("bad config".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    let details = json.details.expect("details");
    assert_eq!(details["message"], Value::String("bad config".to_string()));
}
