mod common;

use anyhow::Result;
use common::{create_user, test_service};
use divvy::application::{AppError, UserLookup, UserRequest};

fn request(email: &str, mobile: &str) -> UserRequest {
    UserRequest {
        email: Some(email.into()),
        first_name: Some("Grace".into()),
        middle_name: Some("B".into()),
        last_name: Some("Hopper".into()),
        mobile_number: Some(mobile.into()),
    }
}

#[tokio::test]
async fn test_create_and_find_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let id = service
        .create_user(request("grace@navy.mil", "9123456789"))
        .await?;

    let user = service.get_user(id).await?;
    assert_eq!(user.email, "grace@navy.mil");
    assert_eq!(user.middle_name.as_deref(), Some("B"));
    assert_eq!(user.mobile_number, "9123456789");

    let by_email = service
        .find_user(UserLookup {
            id: None,
            email: Some("grace@navy.mil".into()),
        })
        .await?;
    assert_eq!(by_email.id, id);

    // The id wins when both are given
    let by_id = service
        .find_user(UserLookup {
            id: Some(id.to_string()),
            email: Some("someone@else.org".into()),
        })
        .await?;
    assert_eq!(by_id.email, "grace@navy.mil");

    Ok(())
}

#[tokio::test]
async fn test_create_user_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut missing = request("grace@navy.mil", "9123456789");
    missing.last_name = None;
    assert!(matches!(
        service.create_user(missing).await,
        Err(AppError::MissingFields(_))
    ));

    assert!(matches!(
        service.create_user(request("grace@navy.mil", "6123456789")).await,
        Err(AppError::InvalidMobileNumber(_))
    ));
    assert!(matches!(
        service.create_user(request("grace@navy.mil", "91234")).await,
        Err(AppError::InvalidMobileNumber(_))
    ));
    assert!(matches!(
        service.create_user(request("grace@navy", "9123456789")).await,
        Err(AppError::InvalidEmail(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    create_user(&service, "ada@example.com", "Ada", "9876543210").await?;
    let err = service
        .create_user(request("ada@example.com", "9123456789"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserAlreadyExists(_)));

    Ok(())
}

#[tokio::test]
async fn test_find_user_errors() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(matches!(
        service.find_user(UserLookup::default()).await,
        Err(AppError::MissingLookupKey)
    ));
    assert!(matches!(
        service
            .find_user(UserLookup {
                id: Some("abc".into()),
                email: None,
            })
            .await,
        Err(AppError::InvalidIdFormat(_))
    ));
    assert!(matches!(
        service
            .find_user(UserLookup {
                id: Some("41".into()),
                email: None,
            })
            .await,
        Err(AppError::UserNotFound(_))
    ));
    assert!(matches!(
        service
            .find_user(UserLookup {
                id: None,
                email: Some("nobody@example.com".into()),
            })
            .await,
        Err(AppError::UserNotFound(_))
    ));

    Ok(())
}
