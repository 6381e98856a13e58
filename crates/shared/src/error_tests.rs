use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::InvalidBody("x".into()), 400, "INVALID_BODY")]
#[case(AppError::InvalidPath("x".into()), 400, "INVALID_PATH")]
#[case(AppError::InvalidQuery("x".into()), 400, "INVALID_QUERY")]
#[case(AppError::RouteNotFound("x".into()), 404, "ROUTE_NOT_FOUND")]
fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::InvalidPath("bad uuid".into()).to_string(),
        "Invalid path parameter: bad uuid"
    );
    assert_eq!(
        AppError::RouteNotFound("GET /api/v1/nope".into()).to_string(),
        "No route for GET /api/v1/nope"
    );
}
