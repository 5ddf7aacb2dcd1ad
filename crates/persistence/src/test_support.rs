use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use domain::models::invitation::{InvitationKey, NewInvitation};
use sqlx::SqlitePool;

use crate::db::{create_in_memory_pool, create_pool, run_migrations, DatabaseConfig};
use crate::repositories::InvitationRepository;

pub async fn pool() -> SqlitePool {
    create_in_memory_pool().await.expect("in-memory pool")
}

/// A WAL database file with several connections, removed on drop.
pub struct FileDatabase {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl FileDatabase {
    pub async fn new(max_connections: u32) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "rsvp-persistence-{}-{}-{}.db",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed),
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        ));
        let pool = create_pool(&DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 60,
        })
        .await
        .expect("file pool");
        run_migrations(&pool).await.expect("migrations");
        Self { pool, path }
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn seed_invitation(pool: &SqlitePool, key: &str, max_guests: i64) -> InvitationKey {
    let key = InvitationKey::from_stored(key);
    InvitationRepository::new(pool.clone())
        .create(
            &NewInvitation {
                key: key.clone(),
                display_name: Some("Test Family".to_string()),
                max_guests,
                contact_email: None,
                contact_phone: None,
                registration_ip_hash: None,
            },
            Utc::now(),
        )
        .await
        .expect("seed invitation");
    key
}
