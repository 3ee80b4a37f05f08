//! API key lookup
//!
//! Model configurations reference secrets by id; the store maps an id to a
//! key or reports it absent. The CLI host's keychain is the process
//! environment: the secret id is the environment variable name.

pub trait SecretStore: Send + Sync {
    fn get(&self, id: &str) -> Option<String>;
}

pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get(&self, id: &str) -> Option<String> {
        std::env::var(id).ok().filter(|v| !v.is_empty())
    }
}
