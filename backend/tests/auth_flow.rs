//! End-to-end tests for the authentication and contact services, driven
//! against an in-memory SQLite database with mock mail and storage
//! collaborators.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use connectbase_backend::api::common::PaginationFilter;
use connectbase_backend::api::contact::models::{CreateContactRequest, UpdateContactRequest};
use connectbase_backend::auth::models::{LoginRequest, RegisterRequest};
use connectbase_backend::auth::service::AuthService;
use connectbase_backend::errors::{ServiceError, ServiceResult};
use connectbase_backend::repositories::user_repository::UserRepository;
use connectbase_backend::services::contact_service::ContactService;
use connectbase_backend::services::email_service::Mailer;
use connectbase_backend::services::storage_service::ObjectStorage;
use connectbase_backend::utils::multipart::UploadedFile;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MockMailer {
    fail: AtomicBool,
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        _html_content: &str,
        _text_content: &str,
    ) -> ServiceResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::upstream("mail", "SMTP connection refused"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), subject.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct MockStorage {
    fail_uploads: AtomicBool,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(&self, _bytes: Vec<u8>, filename: &str) -> Option<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return None;
        }
        Some(format!("https://cdn.example.com/uploads/{filename}"))
    }

    async fn delete(&self, public_id: &str) {
        self.deleted.lock().unwrap().push(public_id.to_string());
    }
}

struct TestEnv {
    pool: SqlitePool,
    mailer: Arc<MockMailer>,
    storage: Arc<MockStorage>,
}

impl TestEnv {
    async fn new() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        TestEnv {
            pool,
            mailer: Arc::new(MockMailer::default()),
            storage: Arc::new(MockStorage::default()),
        }
    }

    fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.pool, self.mailer.clone(), self.storage.clone())
    }

    fn contacts(&self) -> ContactService<'_> {
        ContactService::new(&self.pool, self.storage.clone())
    }

    async fn stored_code(&self, email: &str) -> Option<String> {
        let repo = UserRepository::new(&self.pool);
        repo.get_user_by_email(email)
            .await
            .unwrap()
            .unwrap()
            .verification_code
    }
}

fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        phone: "0123456789".to_string(),
        gender: "female".to_string(),
        password: password.to_string(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn contact_request(first_name: &str) -> CreateContactRequest {
    CreateContactRequest {
        first_name: first_name.to_string(),
        last_name: "Hopper".to_string(),
        title: "Rear Admiral".to_string(),
        email: "grace@navy.mil".to_string(),
        phone: "0987654321".to_string(),
    }
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let env = TestEnv::new().await;
    let auth = env.auth();

    let user = auth
        .register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_ne!(user.password_hash, "secret1");

    let err = auth
        .register(register_request("a@x.com", "other-pass"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail { .. }));
}

#[tokio::test]
async fn register_survives_failed_image_upload() {
    let env = TestEnv::new().await;
    env.storage.fail_uploads.store(true, Ordering::SeqCst);

    let image = UploadedFile {
        filename: "me.png".to_string(),
        bytes: vec![1, 2, 3],
    };
    let user = env
        .auth()
        .register(register_request("a@x.com", "secret1"), Some(image))
        .await
        .unwrap();

    assert_eq!(user.profile_pic, None);
}

#[tokio::test]
async fn register_stores_uploaded_image_url() {
    let env = TestEnv::new().await;

    let image = UploadedFile {
        filename: "me.png".to_string(),
        bytes: vec![1, 2, 3],
    };
    let user = env
        .auth()
        .register(register_request("a@x.com", "secret1"), Some(image))
        .await
        .unwrap();

    assert_eq!(
        user.profile_pic.as_deref(),
        Some("https://cdn.example.com/uploads/me.png")
    );
}

#[tokio::test]
async fn login_checks_credentials() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    let err = auth
        .login(login_request("a@x.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    // Unknown email is indistinguishable from a wrong password
    let err = auth
        .login(login_request("nobody@x.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let user = auth.login(login_request("a@x.com", "secret1")).await.unwrap();
    assert_eq!(user.email, "a@x.com");
}

#[tokio::test]
async fn issue_code_unknown_email_fails() {
    let env = TestEnv::new().await;
    let err = env.auth().issue_code("nobody@x.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn issue_code_sends_email_and_stores_pair() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    auth.issue_code("a@x.com").await.unwrap();

    let code = env.stored_code("a@x.com").await.unwrap();
    assert_eq!(code.len(), 6);

    let sent = env.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@x.com");
    assert_eq!(sent[0].1, "ConnectBase: Reset Your Password");
}

#[tokio::test]
async fn issue_code_fails_when_mail_send_fails() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    env.mailer.fail.store(true, Ordering::SeqCst);
    let err = auth.issue_code("a@x.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::Upstream { .. }));
}

#[tokio::test]
async fn reset_password_full_flow() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    auth.issue_code("a@x.com").await.unwrap();
    let code = env.stored_code("a@x.com").await.unwrap();

    auth.reset_password("a@x.com", &code, "newpass1").await.unwrap();

    // New password works, old one does not
    auth.login(login_request("a@x.com", "newpass1")).await.unwrap();
    let err = auth
        .login(login_request("a@x.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn code_is_single_use() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    auth.issue_code("a@x.com").await.unwrap();
    let code = env.stored_code("a@x.com").await.unwrap();

    auth.reset_password("a@x.com", &code, "newpass1").await.unwrap();

    let err = auth
        .reset_password("a@x.com", &code, "newpass2")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOrExpiredCode));
}

#[tokio::test]
async fn new_code_supersedes_old_code() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    auth.issue_code("a@x.com").await.unwrap();
    let first = env.stored_code("a@x.com").await.unwrap();

    // Issue until the stored code actually changes, then the first code
    // must be dead.
    let second = loop {
        auth.issue_code("a@x.com").await.unwrap();
        let current = env.stored_code("a@x.com").await.unwrap();
        if current != first {
            break current;
        }
    };

    let err = auth
        .reset_password("a@x.com", &first, "newpass1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOrExpiredCode));

    auth.reset_password("a@x.com", &second, "newpass1")
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    // Plant a code whose expiry has already passed
    let repo = UserRepository::new(&env.pool);
    let user = repo.get_user_by_email("a@x.com").await.unwrap().unwrap();
    repo.set_verification_code(user.id, "123456", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let err = auth
        .reset_password("a@x.com", "123456", "newpass1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOrExpiredCode));
}

#[tokio::test]
async fn change_password_requires_old_password_and_code() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    auth.register(register_request("a@x.com", "secret1"), None)
        .await
        .unwrap();

    auth.issue_code("a@x.com").await.unwrap();
    let code = env.stored_code("a@x.com").await.unwrap();

    // Wrong old password fails even with a valid code; the old-password
    // check comes first.
    let err = auth
        .change_password("a@x.com", "wrong", "newpass1", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    // Correct old password but wrong code
    let err = auth
        .change_password("a@x.com", "secret1", "newpass1", "000000")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOrExpiredCode));

    // Both factors correct
    auth.change_password("a@x.com", "secret1", "newpass1", &code)
        .await
        .unwrap();
    auth.login(login_request("a@x.com", "newpass1")).await.unwrap();
}

#[tokio::test]
async fn contacts_are_owner_scoped() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    let alice = auth
        .register(register_request("alice@x.com", "secret1"), None)
        .await
        .unwrap();
    let bob = auth
        .register(register_request("bob@x.com", "secret1"), None)
        .await
        .unwrap();

    let contacts = env.contacts();
    let contact = contacts
        .create_contact(&alice, contact_request("Grace"), None)
        .await
        .unwrap();

    // Bob cannot read, update, or delete Alice's contact
    let err = contacts.get_contact(contact.id, &bob).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    let err = contacts
        .update_contact(contact.id, &bob, UpdateContactRequest::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    let err = contacts.delete_contact(contact.id, &bob).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    // Lists are scoped to the owner
    let pagination = PaginationFilter::default();
    let (alice_list, alice_total) = contacts.get_all_contacts(&alice, &pagination).await.unwrap();
    assert_eq!(alice_total, 1);
    assert_eq!(alice_list.len(), 1);

    let (bob_list, bob_total) = contacts.get_all_contacts(&bob, &pagination).await.unwrap();
    assert_eq!(bob_total, 0);
    assert!(bob_list.is_empty());
}

#[tokio::test]
async fn contact_search_matches_keyword_for_owner_only() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    let alice = auth
        .register(register_request("alice@x.com", "secret1"), None)
        .await
        .unwrap();
    let bob = auth
        .register(register_request("bob@x.com", "secret1"), None)
        .await
        .unwrap();

    let contacts = env.contacts();
    contacts
        .create_contact(&alice, contact_request("Grace"), None)
        .await
        .unwrap();
    contacts
        .create_contact(&alice, contact_request("Linus"), None)
        .await
        .unwrap();

    let pagination = PaginationFilter::default();
    let (results, total) = contacts
        .search_contacts(&alice, "gra", &pagination)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(results[0].first_name, "Grace");

    let (results, total) = contacts
        .search_contacts(&bob, "gra", &pagination)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(results.is_empty());
}

#[tokio::test]
async fn contact_update_clears_image_when_replacement_upload_fails() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    let alice = auth
        .register(register_request("alice@x.com", "secret1"), None)
        .await
        .unwrap();

    let contacts = env.contacts();
    let image = UploadedFile {
        filename: "old.png".to_string(),
        bytes: vec![1],
    };
    let contact = contacts
        .create_contact(&alice, contact_request("Grace"), Some(image))
        .await
        .unwrap();

    // The old object is deleted before the replacement upload runs; if
    // that upload fails the row must not keep pointing at it.
    env.storage.fail_uploads.store(true, Ordering::SeqCst);
    let replacement = UploadedFile {
        filename: "new.png".to_string(),
        bytes: vec![2],
    };
    let updated = contacts
        .update_contact(
            contact.id,
            &alice,
            UpdateContactRequest::default(),
            Some(replacement),
        )
        .await
        .unwrap();

    assert_eq!(env.storage.deleted.lock().unwrap().as_slice(), ["old"]);
    assert_eq!(updated.image, None);
}

#[tokio::test]
async fn contact_update_replaces_image_and_delete_removes_it() {
    let env = TestEnv::new().await;
    let auth = env.auth();
    let alice = auth
        .register(register_request("alice@x.com", "secret1"), None)
        .await
        .unwrap();

    let contacts = env.contacts();
    let image = UploadedFile {
        filename: "old.png".to_string(),
        bytes: vec![1],
    };
    let contact = contacts
        .create_contact(&alice, contact_request("Grace"), Some(image))
        .await
        .unwrap();
    assert_eq!(
        contact.image.as_deref(),
        Some("https://cdn.example.com/uploads/old.png")
    );

    // An update without an image part leaves the stored image alone
    let untouched = contacts
        .update_contact(
            contact.id,
            &alice,
            UpdateContactRequest {
                phone: Some("0111111111".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        untouched.image.as_deref(),
        Some("https://cdn.example.com/uploads/old.png")
    );

    // Replacing the image deletes the old object first
    let replacement = UploadedFile {
        filename: "new.png".to_string(),
        bytes: vec![2],
    };
    let updated = contacts
        .update_contact(
            contact.id,
            &alice,
            UpdateContactRequest {
                title: Some("Commodore".to_string()),
                ..Default::default()
            },
            Some(replacement),
        )
        .await
        .unwrap();
    assert_eq!(
        updated.image.as_deref(),
        Some("https://cdn.example.com/uploads/new.png")
    );
    assert_eq!(updated.title, "Commodore");
    assert_eq!(updated.first_name, "Grace");
    assert_eq!(env.storage.deleted.lock().unwrap().as_slice(), ["old"]);

    contacts.delete_contact(contact.id, &alice).await.unwrap();
    assert_eq!(
        env.storage.deleted.lock().unwrap().as_slice(),
        ["old", "new"]
    );

    let err = contacts.get_contact(contact.id, &alice).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
