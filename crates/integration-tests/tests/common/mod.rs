//! Shared fixtures for the end-to-end tests

#![allow(dead_code)]

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vanity_core::application::Scheduler;
use vanity_core::domain::{GeneratedKeypair, Job};
use vanity_core::port::{GenerationError, JobStore, KeypairGenerator};
use vanity_infra_system::verify_keypair;

/// Unique directory under the system temp dir, removed on drop
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("vanity-{}-{}", label, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Random ed25519 seed from two v4 UUIDs
fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    seed[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    seed
}

/// Deterministic keypair: (address, seed in base58)
pub fn sample_keypair(seed_byte: u8) -> (String, String) {
    let key = SigningKey::from_bytes(&[seed_byte; 32]);
    (
        bs58::encode(key.verifying_key().to_bytes()).into_string(),
        bs58::encode(key.to_bytes()).into_string(),
    )
}

/// In-process generator that grinds real ed25519 keys until the base58
/// public key ends with the suffix, then runs the same integrity check as
/// the external-tool adapter.
pub struct GrindingGenerator;

#[async_trait]
impl KeypairGenerator for GrindingGenerator {
    async fn generate_one(
        &self,
        suffix: &str,
        timeout_ms: u64,
    ) -> Result<GeneratedKeypair, GenerationError> {
        let started = Instant::now();
        let suffix = suffix.to_string();
        let deadline = Duration::from_millis(timeout_ms);

        let found = tokio::task::spawn_blocking(move || loop {
            if started.elapsed() > deadline {
                return None;
            }
            let seed = random_seed();
            let address = bs58::encode(SigningKey::from_bytes(&seed).verifying_key().to_bytes())
                .into_string();
            if address.ends_with(&suffix) {
                return Some((address, bs58::encode(seed).into_string()));
            }
        })
        .await
        .map_err(|e| GenerationError::Io(e.to_string()))?;

        let (address, seed) = found.ok_or(GenerationError::Timeout(timeout_ms))?;
        let verified = verify_keypair(&address, &seed)?;

        Ok(GeneratedKeypair {
            public_key: verified.public_key,
            secret_key: verified.secret_key,
            elapsed_ms: started.elapsed().as_millis() as u64,
            tool_elapsed_seconds: None,
        })
    }
}

pub async fn wait_idle(scheduler: &Scheduler) {
    tokio::time::timeout(Duration::from_secs(30), scheduler.wait_until_idle())
        .await
        .expect("scheduler did not become idle");
}

/// Poll the store until `predicate` holds for the record
pub async fn wait_for_job<F>(store: &dyn JobStore, id: &str, predicate: F) -> Job
where
    F: Fn(&Job) -> bool,
{
    let id = id.to_string();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(job) = store.load(&id).await.unwrap() {
            if predicate(&job) {
                return job;
            }
        }
        assert!(Instant::now() < deadline, "job {} never reached the expected state", id);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
