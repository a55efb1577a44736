use std::collections::HashMap;
use std::sync::Mutex;

use rocket::http::{Cookie, CookieJar, SameSite};

/// Key/value storage that survives between page loads of one browser session.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// Encrypted, HTTP-only cookies.
pub struct CookieStorage<'r> {
    jar: &'r CookieJar<'r>,
}

impl<'r> CookieStorage<'r> {
    pub fn new(jar: &'r CookieJar<'r>) -> Self {
        CookieStorage { jar }
    }
}

impl SessionStorage for CookieStorage<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.jar
            .get_private(key)
            .map(|cookie| cookie.value().to_string())
    }

    fn set(&self, key: &str, value: String) {
        let cookie = Cookie::build((key.to_string(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        self.jar.add_private(cookie);
    }

    fn remove(&self, key: &str) {
        self.jar.remove_private(Cookie::new(key.to_string(), ""));
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
